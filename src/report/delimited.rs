use std::path::Path;

use crate::pipeline::summary::CaptionSummary;
use crate::report::{MetricsTable, PersistenceError, format_f64_full};

/// Canonical columns as a header row plus one value row, full precision.
pub fn write_metrics_csv(table: &MetricsTable, path: &Path) -> Result<(), PersistenceError> {
    let mut w = csv::Writer::from_path(path).map_err(|e| PersistenceError::new(path, e))?;
    w.write_record(table.header())
        .map_err(|e| PersistenceError::new(path, e))?;
    w.write_record(table.values.iter().map(|&v| format_f64_full(v)))
        .map_err(|e| PersistenceError::new(path, e))?;
    w.flush().map_err(|e| PersistenceError::new(path, e))?;
    Ok(())
}

pub fn write_summary_csv(summary: &CaptionSummary, path: &Path) -> Result<(), PersistenceError> {
    let mut w = csv::Writer::from_path(path).map_err(|e| PersistenceError::new(path, e))?;
    w.write_record(["Metric", "Value"])
        .map_err(|e| PersistenceError::new(path, e))?;
    for (label, value) in summary.rows() {
        w.write_record([label, value.as_str()])
            .map_err(|e| PersistenceError::new(path, e))?;
    }
    w.flush().map_err(|e| PersistenceError::new(path, e))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/delimited.rs"]
mod tests;
