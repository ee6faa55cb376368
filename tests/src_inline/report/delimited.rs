use std::fs;

use super::*;
use crate::model::metrics::MetricScoreSet;
use crate::pipeline::summary::summarize;

#[test]
fn test_metrics_csv_full_precision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.csv");
    let scores: MetricScoreSet = [
        ("SPICE".to_string(), 0.123456789),
        ("Bleu_4".to_string(), 0.25),
    ]
    .into_iter()
    .collect();

    write_metrics_csv(&MetricsTable::from_scores(&scores), &path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Bleu_4,SPICE\n0.25,0.123456789\n"
    );
}

#[test]
fn test_summary_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("summary.csv");
    let preds = [("1_1".to_string(), "a cat".to_string())]
        .into_iter()
        .collect();

    write_summary_csv(&summarize(&preds, None), &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Metric,Value");
    assert_eq!(lines[1], "Total Predictions,1");
    assert_eq!(lines[3], "Avg Caption Length (words),2.0");
}

#[test]
fn test_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("m.csv");
    let err = write_metrics_csv(&MetricsTable::from_scores(&MetricScoreSet::default()), &path)
        .unwrap_err();
    assert_eq!(err.path, path);
}

#[test]
fn test_metrics_csv_non_finite_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.csv");
    let scores: MetricScoreSet = [
        ("Bleu_1".to_string(), 0.5),
        ("SPICE".to_string(), f64::NAN),
        ("CIDEr".to_string(), f64::INFINITY),
    ]
    .into_iter()
    .collect();

    write_metrics_csv(&MetricsTable::from_scores(&scores), &path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Bleu_1,CIDEr,SPICE\n0.5,Infinity,NaN\n"
    );
}
