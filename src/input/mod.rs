use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub mod ground_truth;
pub mod predictions;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed predictions file {}: {reason}", path.display())]
    MalformedPredictions { path: PathBuf, reason: String },
    #[error("malformed ground truth {}: {reason}", path.display())]
    MalformedGroundTruth { path: PathBuf, reason: String },
    #[error("ground truth {} is missing required field `{field}`", path.display())]
    MissingField { path: PathBuf, field: &'static str },
}

impl InputError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Opens `path` for buffered reading, decompressing on the fly when the
/// file name ends in `.gz`.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|e| InputError::io(path, e))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads a whole JSON document. Parse failures are returned as plain text so
/// the caller can attach them to the right error variant.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Result<T, String>, InputError> {
    let reader = open_maybe_gz(path)?;
    match serde_json::from_reader(reader) {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.is_io() => Err(InputError::io(path, std::io::Error::other(e))),
        Err(e) => Ok(Err(e.to_string())),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
