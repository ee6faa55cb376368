use std::collections::BTreeSet;
use std::time::Instant;

use crate::input::ground_truth::GroundTruth;
use crate::model::metrics::MetricScoreSet;
use crate::pipeline::stage2_associate::ResultSet;
use crate::scorer::{Scorer, ScorerError};

/// Patches the ground truth for the toolkit and makes the single, blocking
/// scorer call. No retries and no timeout.
pub fn run_stage3(
    ground_truth: &mut GroundTruth,
    results: &ResultSet,
    scorer: &dyn Scorer,
) -> Result<MetricScoreSet, ScorerError> {
    let patched = ground_truth.ensure_compat_fields();
    if !patched.is_empty() {
        tracing::info!(fields = ?patched, "synthesized missing ground-truth fields");
    }

    let images = results
        .annotations()
        .iter()
        .map(|a| a.image_id)
        .collect::<BTreeSet<_>>()
        .len();
    tracing::info!(
        scorer = scorer.name(),
        results = results.len(),
        images,
        "computing metrics (SPICE may take minutes)"
    );
    let started = Instant::now();
    let scores = scorer.evaluate(ground_truth, results)?;
    tracing::info!(
        metrics = scores.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scorer finished"
    );
    for (name, score) in scores.iter() {
        tracing::debug!(metric = name, score, "collected");
    }
    Ok(scores)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_evaluate.rs"]
mod tests;
