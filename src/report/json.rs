use crate::model::metrics::MetricScoreSet;

/// Raw metric map, every collected metric included, scorer order kept.
pub fn render_metrics_json(scores: &MetricScoreSet) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(scores)?;
    out.push('\n');
    Ok(out)
}
