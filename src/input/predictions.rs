use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::input::{InputError, read_json};

/// Composite key -> caption, in file order.
pub type PredictionMap = IndexMap<String, String>;

pub fn load_predictions(path: &Path) -> Result<PredictionMap, InputError> {
    let raw: IndexMap<String, Value> =
        read_json(path)?.map_err(|reason| InputError::MalformedPredictions {
            path: path.to_path_buf(),
            reason,
        })?;

    let mut out = PredictionMap::with_capacity(raw.len());
    for (key, value) in raw {
        match value {
            Value::String(caption) => {
                out.insert(key, caption);
            }
            other => {
                return Err(InputError::MalformedPredictions {
                    path: path.to_path_buf(),
                    reason: format!(
                        "caption for key `{key}` must be a string, found {}",
                        json_kind(&other)
                    ),
                });
            }
        }
    }

    tracing::info!(path = %path.display(), count = out.len(), "loaded predictions");
    Ok(out)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
