use crate::model::metrics::MetricScoreSet;
use crate::pipeline::summary::CaptionSummary;
use crate::report::{MetricsTable, format_f64_4};

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// One `name: score` line per collected metric, scorer order.
pub fn render_metric_lines(scores: &MetricScoreSet) -> String {
    let mut out = String::new();
    for (name, score) in scores.iter() {
        out.push_str(&format!("  {:<12}: {}\n", name, format_f64_4(score)));
    }
    out
}

/// Header plus a single value row, columns right-aligned to their widest cell.
pub fn render_table(table: &MetricsTable) -> String {
    if table.is_empty() {
        return "(no canonical metrics)\n".to_string();
    }
    let values: Vec<String> = table.values.iter().map(|&v| format_f64_4(v)).collect();
    let widths: Vec<usize> = table
        .header()
        .iter()
        .zip(&values)
        .map(|(h, v)| h.len().max(v.len()))
        .collect();

    let header = table
        .header()
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:>w$}", h))
        .collect::<Vec<_>>()
        .join("  ");
    let row = values
        .iter()
        .zip(&widths)
        .map(|(v, &w)| format!("{:>w$}", v))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{header}\n{row}\n")
}

pub fn render_results(scores: &MetricScoreSet) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\nRESULTS\n{}\n", rule(), rule()));
    if scores.is_empty() {
        out.push_str("  no metrics computed (empty prediction set)\n");
    } else {
        out.push_str(&render_metric_lines(scores));
    }
    out.push_str(&format!("{}\n\nFormatted Results Table:\n{}\n", rule(), rule()));
    out.push_str(&render_table(&MetricsTable::from_scores(scores)));
    out.push_str(&rule());
    out.push('\n');
    out
}

pub fn render_summary(summary: &CaptionSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\nCAPTION STATISTICS\n{}\n", rule(), rule()));
    if let Some(gt) = &summary.ground_truth {
        out.push_str(&format!(
            "  Ground truth:             {} images, {} annotations\n",
            gt.images, gt.annotations
        ));
    }
    out.push_str(&format!("  Total predictions:        {}\n", summary.total));
    out.push_str(&format!(
        "  Average caption length:   {:.1} words\n",
        summary.avg_words
    ));
    out.push_str(&format!(
        "  Min caption length:       {} words\n",
        summary.min_words
    ));
    out.push_str(&format!(
        "  Max caption length:       {} words\n",
        summary.max_words
    ));
    out.push_str(&rule());
    out.push('\n');

    if !summary.samples.is_empty() {
        out.push_str(&format!("\n{}\nSAMPLE PREDICTIONS\n{}\n", rule(), rule()));
        for sample in &summary.samples {
            match &sample.annotation {
                Some(ann) => out.push_str(&format!(
                    "\nImage {}, Annotation {}:\n",
                    sample.image, ann
                )),
                None => out.push_str(&format!("\nKey {}:\n", sample.image)),
            }
            out.push_str(&format!("  {}\n", sample.caption));
        }
        out.push_str(&format!("\n{}\n", rule()));
    }

    out.push_str(&format!("\nSUMMARY TABLE\n{}\n", rule()));
    let rows = summary.rows();
    let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0).max(6);
    out.push_str(&format!("{:>label_width$}  Value\n", "Metric"));
    for (label, value) in &rows {
        out.push_str(&format!("{:>label_width$}  {}\n", label, value));
    }
    out.push_str(&rule());
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/text.rs"]
mod tests;
