//! One evaluation run: load -> normalize -> associate -> evaluate -> report.
//!
//! Stages 1-3 are fatal on error and each failure names the step it came
//! from. Stage 4 (reporting) is driven by the caller and is best-effort.

use std::path::PathBuf;

use thiserror::Error;

use crate::input::InputError;
use crate::input::ground_truth::GroundTruth;
use crate::input::predictions::load_predictions;
use crate::model::metrics::MetricScoreSet;
use crate::model::records::PredictionRecord;
use crate::scorer::{Scorer, ScorerError};

pub mod stage1_normalize;
pub mod stage2_associate;
pub mod stage3_evaluate;
pub mod stage4_report;
pub mod summary;

use stage1_normalize::{DroppedKey, NormalizeError, Stage1Params, run_stage1};
use stage2_associate::{AssociationError, run_stage2};
use stage3_evaluate::run_stage3;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("loading predictions failed")]
    Predictions(#[source] InputError),
    #[error("normalizing predictions failed")]
    Normalize(#[from] NormalizeError),
    #[error("loading ground truth failed")]
    GroundTruth(#[source] InputError),
    #[error("constructing scorer results failed")]
    Association(#[from] AssociationError),
    #[error("scorer invocation failed")]
    Scorer(#[from] ScorerError),
}

#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub gt_path: PathBuf,
    pub pred_path: PathBuf,
    pub normalize: Stage1Params,
}

#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub scores: MetricScoreSet,
    pub n_predictions: usize,
    pub n_records: usize,
    pub dropped: Vec<DroppedKey>,
}

pub fn run_evaluation(config: &EvalConfig, scorer: &dyn Scorer) -> Result<EvalOutcome, EvalError> {
    tracing::info!(path = %config.pred_path.display(), "[1/4] loading predictions");
    let predictions = load_predictions(&config.pred_path).map_err(EvalError::Predictions)?;
    let stage1 = run_stage1(&predictions, &config.normalize)?;
    tracing::debug!(images = stage1.image_ids().len(), "distinct image ids predicted");

    tracing::info!(path = %config.gt_path.display(), "[2/4] loading ground truth");
    let mut ground_truth = GroundTruth::load(&config.gt_path).map_err(EvalError::GroundTruth)?;

    let scores = score_records(&mut ground_truth, &stage1.records, scorer)?;

    Ok(EvalOutcome {
        scores,
        n_predictions: predictions.len(),
        n_records: stage1.records.len(),
        dropped: stage1.dropped,
    })
}

/// Stages 2 and 3. An empty record set short-circuits to an empty score
/// set: there is nothing to associate and nothing for the scorer to do.
pub fn score_records(
    ground_truth: &mut GroundTruth,
    records: &[PredictionRecord],
    scorer: &dyn Scorer,
) -> Result<MetricScoreSet, EvalError> {
    if records.is_empty() {
        tracing::warn!("no usable predictions; skipping scorer and reporting no metrics");
        return Ok(MetricScoreSet::default());
    }

    tracing::info!("[3/4] preparing evaluation");
    let results = run_stage2(ground_truth, records)?;

    tracing::info!("[4/4] computing metrics");
    let scores = run_stage3(ground_truth, &results, scorer)?;
    Ok(scores)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
