//! Seam to the external captioning-metrics toolkit.
//!
//! The metric algorithms (BLEU, METEOR, ROUGE-L, CIDEr, SPICE) live outside
//! this crate. A [`Scorer`] is constructed by the caller and handed to the
//! pipeline; nothing here keeps process-wide state, so several scorers can
//! run one after another in the same process without interfering.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::input::ground_truth::GroundTruth;
use crate::model::metrics::MetricScoreSet;
use crate::pipeline::stage2_associate::ResultSet;

pub mod command;

pub use command::CommandScorer;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("failed to start scorer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("scorer `{program}` exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("scorer `{program}` produced unreadable output: {reason}")]
    Output { program: String, reason: String },
    #[error("failed to stage ground truth for the scorer at {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait Scorer {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Scores `results` against `ground_truth`. Called once per run; may block
    /// for minutes.
    fn evaluate(
        &self,
        ground_truth: &GroundTruth,
        results: &ResultSet,
    ) -> Result<MetricScoreSet, ScorerError>;
}

#[cfg(test)]
#[path = "../../tests/src_inline/scorer/fixture.rs"]
pub(crate) mod fixture;
