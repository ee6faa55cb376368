use std::fs;
use std::io::Write as _;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;

use super::*;
use crate::model::records::PredictionRecord;
use crate::pipeline::stage2_associate::run_stage2;
use crate::scorer::fixture::{ground_truth, single_image_gt};

#[test]
fn test_parse_metrics_uses_last_line() {
    let stdout = "loading annotations...\n{\"noise\": true}\n{\"Bleu_1\": 0.5, \"CIDEr\": 1.5}\n\n";
    let scores = parse_metrics(stdout).unwrap();
    let names: Vec<&str> = scores.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["Bleu_1", "CIDEr"]);
    assert_eq!(scores.get("CIDEr"), Some(1.5));
}

#[test]
fn test_parse_metrics_integer_scores() {
    let scores = parse_metrics("{\"SPICE\": 0}").unwrap();
    assert_eq!(scores.get("SPICE"), Some(0.0));
}

#[test]
fn test_parse_metrics_rejects_bad_output() {
    assert!(parse_metrics("").is_err());
    assert!(parse_metrics("computing...").is_err());
    let err = parse_metrics("{\"Bleu_1\": \"high\"}").unwrap_err();
    assert!(err.contains("Bleu_1"));
}

#[test]
fn test_parse_metrics_bare_non_finite_literals() {
    let scores = parse_metrics(r#"{"Bleu_1": 0.5, "SPICE": NaN, "CIDEr": -Infinity}"#).unwrap();
    assert_eq!(scores.get("Bleu_1"), Some(0.5));
    assert!(scores.get("SPICE").unwrap().is_nan());
    assert_eq!(scores.get("CIDEr"), Some(f64::NEG_INFINITY));
    assert_eq!(scores.len(), 3);
}

#[test]
fn test_parse_metrics_encoded_non_finite_scores() {
    let scores = parse_metrics(r#"{"SPICE": "NaN", "METEOR": "Infinity", "WMD": null}"#).unwrap();
    assert!(scores.get("SPICE").unwrap().is_nan());
    assert_eq!(scores.get("METEOR"), Some(f64::INFINITY));
    assert!(scores.get("WMD").unwrap().is_nan());
}

#[test]
fn test_quote_non_finite_leaves_strings_alone() {
    let line = r#"{"NaN \"Infinity\"": NaN, "x": 1}"#;
    assert_eq!(
        quote_non_finite(line),
        r#"{"NaN \"Infinity\"": "NaN", "x": 1}"#
    );
}

fn results_for_one_image() -> (crate::input::ground_truth::GroundTruth, crate::pipeline::stage2_associate::ResultSet) {
    let gt = ground_truth(single_image_gt());
    let results = run_stage2(
        &gt,
        &[PredictionRecord {
            image_id: 1,
            caption: "a cat".to_string(),
        }],
    )
    .unwrap();
    (gt, results)
}

#[cfg(unix)]
#[test]
fn test_command_scorer_reads_stdout() {
    let (mut gt, results) = results_for_one_image();
    gt.ensure_compat_fields();
    // $0 is the label, then --gt <file> --res <file>.
    let script = r#"test -f "$2" && test -f "$4" && echo progress >&2 && echo '{"Bleu_1": 0.5, "CIDEr": 1.1}'"#;
    let scorer = CommandScorer::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "capeval-test".to_string()],
    );

    let scores = scorer.evaluate(&gt, &results).unwrap();
    assert_eq!(scores.get("Bleu_1"), Some(0.5));
    assert_eq!(scores.get("CIDEr"), Some(1.1));
}

#[cfg(unix)]
#[test]
fn test_command_scorer_sees_patched_ground_truth() {
    let (mut gt, results) = results_for_one_image();
    gt.ensure_compat_fields();
    let script = r#"grep -q '"licenses":\[\]' "$2" && echo '{"METEOR": 0.3}'"#;
    let scorer = CommandScorer::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "capeval-test".to_string()],
    );

    let scores = scorer.evaluate(&gt, &results).unwrap();
    assert_eq!(scores.get("METEOR"), Some(0.3));
}

#[cfg(unix)]
#[test]
fn test_command_scorer_nan_score_keeps_the_rest() {
    let (gt, results) = results_for_one_image();
    let script = r#"echo '{"Bleu_1": 0.5, "SPICE": NaN}'"#;
    let scorer = CommandScorer::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "capeval-test".to_string()],
    );

    let scores = scorer.evaluate(&gt, &results).unwrap();
    assert_eq!(scores.get("Bleu_1"), Some(0.5));
    assert!(scores.get("SPICE").unwrap().is_nan());
}

#[cfg(unix)]
#[test]
fn test_command_scorer_failure_status() {
    let (gt, results) = results_for_one_image();
    let scorer = CommandScorer::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
    let err = scorer.evaluate(&gt, &results).unwrap_err();
    assert!(matches!(err, ScorerError::Failed { .. }));
}

#[test]
fn test_command_scorer_missing_program() {
    let (gt, results) = results_for_one_image();
    let scorer = CommandScorer::new("capeval-no-such-scorer-binary", Vec::new());
    let err = scorer.evaluate(&gt, &results).unwrap_err();
    assert!(matches!(err, ScorerError::Spawn { .. }));
}

#[test]
fn test_unpatched_plain_ground_truth_is_not_staged() {
    let gt = ground_truth(single_image_gt());
    assert!(stage_ground_truth(&gt).unwrap().is_none());
}

#[test]
fn test_staged_ground_truth_removed_on_drop() {
    let mut gt = ground_truth(single_image_gt());
    gt.ensure_compat_fields();
    let staged = stage_ground_truth(&gt).unwrap().unwrap();
    let path = staged.path().to_path_buf();

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["info"]["description"], "DLC-Bench");
    assert_eq!(on_disk["annotations"][0]["caption"], "a cat on a mat");

    drop(staged);
    assert!(!path.exists());
}

fn write_gz_ground_truth(path: &Path) {
    let dataset = json!({
        "info": {"description": "held-out"},
        "licenses": [],
        "images": [{"id": 1}],
        "annotations": [{"id": 10, "image_id": 1, "caption": "a cat on a mat"}]
    });
    let mut enc = GzEncoder::new(fs::File::create(path).unwrap(), Compression::default());
    enc.write_all(dataset.to_string().as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_compressed_ground_truth_staged_as_plain_json() {
    let dir = tempfile::tempdir().unwrap();
    let gz = dir.path().join("annotations.json.gz");
    write_gz_ground_truth(&gz);

    let mut gt = GroundTruth::load(&gz).unwrap();
    assert!(gt.ensure_compat_fields().is_empty());
    assert!(!gt.is_patched());

    let staged = stage_ground_truth(&gt).unwrap().unwrap();
    let path = staged.path().to_path_buf();
    assert_ne!(path, gz);
    assert_eq!(path.extension().unwrap(), "json");

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["info"]["description"], "held-out");
    assert_eq!(on_disk["images"][0]["id"], 1);

    drop(staged);
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn test_command_scorer_reads_staged_copy_of_compressed_ground_truth() {
    let dir = tempfile::tempdir().unwrap();
    let gz = dir.path().join("annotations.json.gz");
    write_gz_ground_truth(&gz);
    let gt = GroundTruth::load(&gz).unwrap();
    let results = run_stage2(
        &gt,
        &[PredictionRecord {
            image_id: 1,
            caption: "a cat".to_string(),
        }],
    )
    .unwrap();

    let seen = dir.path().join("seen_gt");
    // $0 carries the file that records which ground truth the scorer read.
    let script = r#"grep -q '"held-out"' "$2" && echo "$2" > "$0" && echo '{"CIDEr": 0.7}'"#;
    let scorer = CommandScorer::new(
        "sh",
        vec![
            "-c".to_string(),
            script.to_string(),
            seen.to_string_lossy().into_owned(),
        ],
    );
    let scores = scorer.evaluate(&gt, &results).unwrap();
    assert_eq!(scores.get("CIDEr"), Some(0.7));

    let staged = PathBuf::from(fs::read_to_string(&seen).unwrap().trim());
    assert_ne!(staged, gz);
    assert!(!staged.exists());
}
