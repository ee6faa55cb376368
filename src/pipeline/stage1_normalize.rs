use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::input::predictions::PredictionMap;
use crate::model::keys::{CompositeKey, KeyError};
use crate::model::records::PredictionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Malformed keys abort the run.
    Strict,
    /// Malformed keys are dropped with a warning.
    #[default]
    Lenient,
}

/// What to do when several predictions share an image id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Emit every record and let the scorer decide.
    #[default]
    Keep,
    /// Keep the first record per image id in input order.
    First,
    /// Abort the run.
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stage1Params {
    pub key_mode: KeyMode,
    pub duplicates: DuplicatePolicy,
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed prediction key `{key}`: {reason}")]
    MalformedKey { key: String, reason: KeyError },
    #[error("image id {image_id} is predicted more than once (keys `{first}` and `{second}`)")]
    DuplicateImageId {
        image_id: u64,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedKey {
    pub key: String,
    pub reason: KeyError,
}

#[derive(Debug, Clone, Default)]
pub struct Stage1Output {
    pub records: Vec<PredictionRecord>,
    pub dropped: Vec<DroppedKey>,
    pub duplicates_skipped: usize,
}

impl Stage1Output {
    pub fn image_ids(&self) -> BTreeSet<u64> {
        self.records.iter().map(|r| r.image_id).collect()
    }
}

pub fn run_stage1(
    predictions: &PredictionMap,
    params: &Stage1Params,
) -> Result<Stage1Output, NormalizeError> {
    let mut out = Stage1Output {
        records: Vec::with_capacity(predictions.len()),
        ..Stage1Output::default()
    };
    // image id -> first key seen; only tracked when the policy needs it.
    let mut seen: HashMap<u64, &str> = HashMap::new();

    for (key, caption) in predictions {
        let parsed = match CompositeKey::parse(key) {
            Ok(parsed) => parsed,
            Err(reason) => match params.key_mode {
                KeyMode::Strict => {
                    return Err(NormalizeError::MalformedKey {
                        key: key.clone(),
                        reason,
                    });
                }
                KeyMode::Lenient => {
                    tracing::warn!(key = %key, %reason, "dropping malformed prediction key");
                    out.dropped.push(DroppedKey {
                        key: key.clone(),
                        reason,
                    });
                    continue;
                }
            },
        };

        if params.duplicates != DuplicatePolicy::Keep {
            if let Some(first) = seen.get(&parsed.image_id) {
                match params.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(NormalizeError::DuplicateImageId {
                            image_id: parsed.image_id,
                            first: first.to_string(),
                            second: key.clone(),
                        });
                    }
                    DuplicatePolicy::First | DuplicatePolicy::Keep => {
                        tracing::debug!(
                            image_id = parsed.image_id,
                            annotation = parsed.annotation,
                            first = %first,
                            "skipping duplicate image id"
                        );
                        out.duplicates_skipped += 1;
                        continue;
                    }
                }
            }
            seen.insert(parsed.image_id, key.as_str());
        }

        tracing::trace!(
            image_id = parsed.image_id,
            annotation = parsed.annotation,
            "prediction record"
        );
        out.records.push(PredictionRecord {
            image_id: parsed.image_id,
            caption: caption.clone(),
        });
    }

    if !out.dropped.is_empty() {
        tracing::warn!(
            dropped = out.dropped.len(),
            kept = out.records.len(),
            "some prediction keys were malformed"
        );
    }
    if out.duplicates_skipped > 0 {
        tracing::warn!(
            skipped = out.duplicates_skipped,
            "kept only the first prediction per image id"
        );
    }
    tracing::info!(records = out.records.len(), "normalized predictions");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_normalize.rs"]
mod tests;
