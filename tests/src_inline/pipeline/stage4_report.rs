use std::fs;

use super::*;

fn scores(pairs: &[(&str, f64)]) -> MetricScoreSet {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_resolve_prefers_explicit_paths() {
    let plan = OutputPlan::resolve(
        Some(PathBuf::from("custom.json")),
        None,
        Some(Path::new("out")),
    );
    assert_eq!(plan.json, Some(PathBuf::from("custom.json")));
    assert_eq!(plan.csv, Some(PathBuf::from("out/metrics_results.csv")));
}

#[test]
fn test_resolve_without_outputs() {
    assert_eq!(OutputPlan::resolve(None, None, None), OutputPlan::default());
}

#[test]
fn test_json_keeps_all_metrics_csv_only_canonical() {
    let dir = tempfile::tempdir().unwrap();
    let plan = OutputPlan::resolve(None, None, Some(&dir.path().join("nested")));
    let set = scores(&[("CIDEr", 1.25), ("WMD", 0.3), ("Bleu_1", 0.5), ("METEOR", 0.125)]);

    let outcome = write_reports(&set, &plan);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.written.len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(plan.json.as_ref().unwrap()).unwrap()).unwrap();
    assert_eq!(json["WMD"], 0.3);
    assert_eq!(json["CIDEr"], 1.25);

    let csv = fs::read_to_string(plan.csv.as_ref().unwrap()).unwrap();
    assert_eq!(csv, "Bleu_1,METEOR,CIDEr\n0.5,0.125,1.25\n");
}

#[test]
fn test_json_preserves_scorer_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    let plan = OutputPlan {
        json: Some(path.clone()),
        csv: None,
    };
    write_reports(&scores(&[("SPICE", 0.2), ("Bleu_1", 0.5)]), &plan);

    let text = fs::read_to_string(&path).unwrap();
    let spice = text.find("SPICE").unwrap();
    let bleu = text.find("Bleu_1").unwrap();
    assert!(spice < bleu);
    assert!(text.contains("\n  \"SPICE\": 0.2"));
}

#[test]
fn test_persistence_failure_is_collected_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let plan = OutputPlan {
        json: Some(blocker.join("m.json")),
        csv: Some(dir.path().join("m.csv")),
    };

    let outcome = write_reports(&scores(&[("Bleu_1", 0.5)]), &plan);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].path, blocker.join("m.json"));
    assert_eq!(outcome.written, vec![dir.path().join("m.csv")]);
}

#[test]
fn test_empty_scores_write_json_but_no_csv() {
    let dir = tempfile::tempdir().unwrap();
    let plan = OutputPlan::resolve(None, None, Some(dir.path()));

    let outcome = write_reports(&MetricScoreSet::default(), &plan);
    assert!(outcome.failures.is_empty());
    assert_eq!(
        fs::read_to_string(plan.json.as_ref().unwrap()).unwrap(),
        "{}\n"
    );
    assert!(!plan.csv.as_ref().unwrap().exists());
}

#[test]
fn test_print_results_goes_to_writer() {
    let mut buf = Vec::new();
    print_results(&scores(&[("CIDEr", 0.98766), ("Bleu_1", 0.5)]), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("  CIDEr       : 0.9877\n"));
    assert!(text.contains("Bleu_1   CIDEr\n"));
}

#[test]
fn test_json_spells_out_non_finite_scores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.json");
    let plan = OutputPlan {
        json: Some(path.clone()),
        csv: None,
    };
    let outcome = write_reports(&scores(&[("Bleu_1", 0.5), ("SPICE", f64::NAN)]), &plan);
    assert_eq!(outcome.written, vec![path.clone()]);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["Bleu_1"], 0.5);
    assert_eq!(json["SPICE"], "NaN");
}
