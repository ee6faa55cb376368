use std::path::PathBuf;

use thiserror::Error;

use crate::model::metrics::{Metric, MetricScoreSet, non_finite_token};

pub mod delimited;
pub mod json;
pub mod text;

/// Writing an artifact failed. Never fatal: scores are already on the console.
#[derive(Debug, Error)]
#[error("failed to write {}: {reason}", path.display())]
pub struct PersistenceError {
    pub path: PathBuf,
    pub reason: String,
}

impl PersistenceError {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PersistenceError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Single-row view of a score set in canonical column order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsTable {
    pub columns: Vec<Metric>,
    pub values: Vec<f64>,
}

impl MetricsTable {
    pub fn from_scores(scores: &MetricScoreSet) -> Self {
        let (columns, values) = scores.canonical().into_iter().unzip();
        MetricsTable { columns, values }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|m| m.name()).collect()
    }
}

pub fn format_f64_4(v: f64) -> String {
    match non_finite_token(v) {
        Some(token) => token.to_string(),
        None => format!("{:.4}", v),
    }
}

/// Shortest text that reads back to the same `f64`.
pub fn format_f64_full(v: f64) -> String {
    match non_finite_token(v) {
        Some(token) => token.to_string(),
        None => v.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
