use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use indexmap::IndexMap;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::input::ground_truth::GroundTruth;
use crate::model::metrics::{MetricScoreSet, parse_non_finite_token};
use crate::pipeline::stage2_associate::ResultSet;
use crate::scorer::{Scorer, ScorerError};

pub const DEFAULT_PROGRAM: &str = "python3";
pub const BRIDGE_FILE_NAME: &str = "coco_eval_bridge.py";

const NON_FINITE_LITERALS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Absolute path of the bundled toolkit bridge.
///
/// An installed copy next to the binary (`<bin>/scripts/` or `<bin>/`) wins;
/// otherwise the script in the source tree the binary was built from.
pub fn default_bridge() -> PathBuf {
    let built_with = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("scripts")
        .join(BRIDGE_FILE_NAME);

    let installed = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .into_iter()
        .flat_map(|dir| [dir.join("scripts").join(BRIDGE_FILE_NAME), dir.join(BRIDGE_FILE_NAME)]);

    installed
        .filter(|p| p.is_absolute())
        .find(|p| p.is_file())
        .unwrap_or(built_with)
}

/// Runs an external program as the scorer.
///
/// The program is called as `<program> <args>... --gt <file> --res <file>`.
/// Its stderr is passed through so progress from slow metrics stays visible;
/// the last non-empty stdout line must be a JSON object of metric -> number.
#[derive(Debug, Clone)]
pub struct CommandScorer {
    program: String,
    args: Vec<String>,
}

impl CommandScorer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandScorer {
            program: program.into(),
            args,
        }
    }
}

impl Scorer for CommandScorer {
    fn name(&self) -> &str {
        &self.program
    }

    fn evaluate(
        &self,
        ground_truth: &GroundTruth,
        results: &ResultSet,
    ) -> Result<MetricScoreSet, ScorerError> {
        // Dropped at the end of this call on every path.
        let staged = stage_ground_truth(ground_truth)?;
        let gt_path = staged
            .as_ref()
            .map_or(ground_truth.source(), |file| file.path());

        tracing::info!(
            scorer = %self.program,
            args = ?self.args,
            gt = %gt_path.display(),
            res = %results.path().display(),
            "invoking external scorer"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--gt")
            .arg(gt_path)
            .arg("--res")
            .arg(results.path())
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ScorerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ScorerError::Failed {
                program: self.program.clone(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_metrics(&stdout).map_err(|reason| ScorerError::Output {
            program: self.program.clone(),
            reason,
        })
    }
}

/// The scorer reads plain JSON from disk, so a patched or compressed ground
/// truth has to be written out first.
fn stage_ground_truth(gt: &GroundTruth) -> Result<Option<NamedTempFile>, ScorerError> {
    let compressed = gt.source().extension().is_some_and(|ext| ext == "gz");
    if !gt.is_patched() && !compressed {
        return Ok(None);
    }

    let staging_err = |path: &Path, source: std::io::Error| ScorerError::Staging {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tempfile::Builder::new()
        .prefix("capeval-gt-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| staging_err(&std::env::temp_dir(), e))?;
    let path = file.path().to_path_buf();
    {
        let mut w = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut w, gt.dataset())
            .map_err(|e| staging_err(&path, std::io::Error::other(e)))?;
        w.flush().map_err(|e| staging_err(&path, e))?;
    }
    tracing::debug!(path = %path.display(), "staged ground truth for scorer");
    Ok(Some(file))
}

pub(crate) fn parse_metrics(stdout: &str) -> Result<MetricScoreSet, String> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .ok_or_else(|| "no output".to_string())?;

    let raw: IndexMap<String, Value> = serde_json::from_str(&quote_non_finite(line))
        .map_err(|e| format!("last line is not a JSON object of scores: {e}"))?;

    let mut scores = IndexMap::with_capacity(raw.len());
    for (name, value) in raw {
        let score = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_non_finite_token(s),
            // What JSON.stringify and friends make of NaN.
            Value::Null => Some(f64::NAN),
            _ => None,
        }
        .ok_or_else(|| format!("score for `{name}` is not a number: {value}"))?;
        if !score.is_finite() {
            tracing::warn!(metric = %name, score, "scorer reported a non-finite score");
        }
        scores.insert(name, score);
    }
    Ok(MetricScoreSet::from(scores))
}

/// Python's `json.dumps` writes bare `NaN`/`Infinity`, which strict JSON
/// rejects. Quote them when they appear outside string literals.
fn quote_non_finite(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut rest = line;
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = rest.chars().next() {
        if !in_string {
            if let Some(literal) = NON_FINITE_LITERALS.iter().find(|l| rest.starts_with(**l)) {
                out.push('"');
                out.push_str(literal);
                out.push('"');
                rest = &rest[literal.len()..];
                continue;
            }
            in_string = c == '"';
        } else if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_string = false;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/scorer/command.rs"]
mod tests;
