mod common;

use std::fs;

use harstack_classifiers::evaluation::EstimateKind;
use harstack_classifiers::report::RunSummary;
use harstack_cli::pipeline::runner::{run_pipeline, REPORT_FILE, SUMMARY_FILE};

use common::{quick_config, CLASSES};

#[test]
fn run_writes_predictions_summary_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(dir.path());
    let output = run_pipeline(&config).unwrap();

    let out = dir.path().join("out");
    assert_eq!(output.prediction_files.len(), 20);
    for i in 1..=20 {
        let label = fs::read_to_string(out.join(format!("problem_id_{}.txt", i))).unwrap();
        assert!(CLASSES.contains(&label.as_str()), "unexpected label {:?}", label);
    }

    let summary = &output.summary;
    assert_eq!(summary.shapes.train_rows, 100);
    assert_eq!(summary.shapes.feature_columns, 4);
    assert_eq!(summary.shapes.model_rows, 80);
    assert_eq!(summary.shapes.validation_rows, 20);
    assert!(summary.pca.n_components <= 4);
    assert_eq!(summary.models.len(), 4);
    assert_eq!(summary.ensemble.resubstitution.kind, EstimateKind::Resubstitution);
    assert_eq!(summary.ensemble.held_out.kind, EstimateKind::HeldOut);
    assert!(summary.ensemble.held_out.error <= 0.2);

    let json = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
    let parsed: RunSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.predictions, summary.predictions);

    let html = fs::read_to_string(out.join(REPORT_FILE)).unwrap();
    assert!(html.contains("Held-Out Confusion Matrices"));
}

#[test]
fn run_is_reproducible_for_seed() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let a = run_pipeline(&quick_config(dir_a.path())).unwrap();
    let b = run_pipeline(&quick_config(dir_b.path())).unwrap();
    assert_eq!(a.summary.predictions, b.summary.predictions);
    assert_eq!(
        a.summary.ensemble.resubstitution.error,
        b.summary.ensemble.resubstitution.error
    );
}

#[test]
fn report_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = quick_config(dir.path());
    config.write_report = false;
    let output = run_pipeline(&config).unwrap();
    assert!(output.report_file.is_none());
    assert!(!dir.path().join("out").join(REPORT_FILE).exists());
    assert!(output.summary_file.exists());
}

#[test]
fn mismatched_feature_columns_fail() {
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(dir.path());
    let test = fs::read_to_string(&config.test_data).unwrap();
    fs::write(&config.test_data, test.replacen("accel_arm_x", "accel_arm_y", 1)).unwrap();
    let err = run_pipeline(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("feature columns differ"));
}
