use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::model::metrics::MetricScoreSet;
use crate::report::delimited::write_metrics_csv;
use crate::report::json::render_metrics_json;
use crate::report::text::render_results;
use crate::report::{MetricsTable, PersistenceError};

pub const METRICS_JSON_NAME: &str = "metrics_results.json";
pub const METRICS_CSV_NAME: &str = "metrics_results.csv";

/// Where the artifacts of one run go. `None` skips that artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

impl OutputPlan {
    /// Explicit paths win over the files derived from `out_dir`.
    pub fn resolve(json: Option<PathBuf>, csv: Option<PathBuf>, out_dir: Option<&Path>) -> Self {
        OutputPlan {
            json: json.or_else(|| out_dir.map(|d| d.join(METRICS_JSON_NAME))),
            csv: csv.or_else(|| out_dir.map(|d| d.join(METRICS_CSV_NAME))),
        }
    }
}

#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<PersistenceError>,
}

pub fn print_results(scores: &MetricScoreSet, out: &mut impl Write) -> std::io::Result<()> {
    let non_canonical = scores.non_canonical();
    if !non_canonical.is_empty() {
        tracing::info!(
            metrics = ?non_canonical,
            "metrics without a canonical column are only exported to JSON"
        );
    }
    out.write_all(render_results(scores).as_bytes())?;
    out.flush()
}

/// Best-effort persistence: every failure is logged and collected, none
/// aborts the run.
pub fn write_reports(scores: &MetricScoreSet, plan: &OutputPlan) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    if let Some(path) = &plan.json {
        record(&mut outcome, path, write_metrics_json(scores, path));
    }

    if let Some(path) = &plan.csv {
        let table = MetricsTable::from_scores(scores);
        if table.is_empty() {
            tracing::warn!(path = %path.display(), "no canonical metrics; CSV not written");
        } else {
            let result = ensure_parent(path).and_then(|()| write_metrics_csv(&table, path));
            record(&mut outcome, path, result);
        }
    }

    outcome
}

fn record(outcome: &mut ReportOutcome, path: &Path, result: Result<(), PersistenceError>) {
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "saved results");
            outcome.written.push(path.to_path_buf());
        }
        Err(err) => {
            tracing::error!(%err, "could not save results");
            outcome.failures.push(err);
        }
    }
}

fn write_metrics_json(scores: &MetricScoreSet, path: &Path) -> Result<(), PersistenceError> {
    let json = render_metrics_json(scores).map_err(|e| PersistenceError::new(path, e))?;
    ensure_parent(path)?;
    write_text(path, &json).map_err(|e| PersistenceError::new(path, e))
}

fn ensure_parent(path: &Path) -> Result<(), PersistenceError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| PersistenceError::new(path, e))
        }
        _ => Ok(()),
    }
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_report.rs"]
mod tests;
