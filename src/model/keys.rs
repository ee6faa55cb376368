use thiserror::Error;

pub const KEY_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("no `_` separator")]
    MissingSeparator,
    #[error("image id prefix `{0}` is not a non-negative integer")]
    InvalidImageId(String),
}

/// `"<imageId>_<annotationId>[...]"`, split on the first separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey<'a> {
    pub image_id: u64,
    pub annotation: &'a str,
}

impl<'a> CompositeKey<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, KeyError> {
        let (prefix, annotation) = raw
            .split_once(KEY_SEPARATOR)
            .ok_or(KeyError::MissingSeparator)?;
        let image_id = parse_image_id(prefix)?;
        Ok(CompositeKey {
            image_id,
            annotation,
        })
    }
}

// `u64::from_str` accepts a leading `+`; image ids are digits only.
fn parse_image_id(prefix: &str) -> Result<u64, KeyError> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidImageId(prefix.to_string()));
    }
    prefix
        .parse::<u64>()
        .map_err(|_| KeyError::InvalidImageId(prefix.to_string()))
}

/// The raw image prefix used for summary statistics: everything before the
/// first separator, or the whole key when there is none.
pub fn image_prefix(raw: &str) -> &str {
    raw.split_once(KEY_SEPARATOR).map_or(raw, |(prefix, _)| prefix)
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/keys.rs"]
mod tests;
