//! Orchestration of one pipeline run, stage by stage.
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};

use harstack_classifiers::cleaning::{clean, clean_training};
use harstack_classifiers::data_handling::{ClassEncoding, LabeledData};
use harstack_classifiers::ensemble::StackedEnsemble;
use harstack_classifiers::evaluation::{ErrorEstimate, EstimateKind};
use harstack_classifiers::io::{read_table_with_config, write_prediction_files};
use harstack_classifiers::model_bank::ModelBank;
use harstack_classifiers::partition::stratified_split;
use harstack_classifiers::reduction::Pca;
use harstack_classifiers::report::{
    build_report, EnsembleSummary, ModelSummary, RunSummary, ShapeSummary,
};

use crate::pipeline::input::PipelineConfig;

pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "harstack_report.html";

/// Files written by a run, plus its summary.
#[derive(Debug)]
pub struct PipelineOutput {
    pub summary: RunSummary,
    pub prediction_files: Vec<PathBuf>,
    pub summary_file: PathBuf,
    pub report_file: Option<PathBuf>,
}

/// Run the pipeline on a dedicated rayon pool sized by `n_threads`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutput> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_threads)
        .build()
        .context("Failed to build the worker thread pool")?;
    log::info!("Using {} worker threads", pool.current_num_threads());
    pool.install(|| run_stages(config))
}

fn run_stages(config: &PipelineConfig) -> Result<PipelineOutput> {
    let start_time = Instant::now();
    if !(config.train_fraction > 0.0 && config.train_fraction < 1.0) {
        bail!("train_fraction must be in (0, 1), got {}", config.train_fraction);
    }

    // Load
    let raw_train = read_table_with_config(&config.train_data, &config.loader)
        .with_context(|| format!("Failed to load training data from {}", config.train_data))?;
    let raw_test = read_table_with_config(&config.test_data, &config.loader)
        .with_context(|| format!("Failed to load test data from {}", config.test_data))?;
    log::info!(
        "Loaded training table ({} x {}) and test table ({} x {})",
        raw_train.nrows(),
        raw_train.ncols(),
        raw_test.nrows(),
        raw_test.ncols()
    );

    // Clean
    let train =
        clean_training(&raw_train, &config.cleaning).context("Failed to clean training data")?;
    let test = clean(&raw_test, &config.cleaning).context("Failed to clean test data")?;
    train.log_summary("training");
    test.log_summary("test");

    // Reduce
    let pca = Pca::fit_union(&train, &test, config.pca_threshold)?;
    let x_train = pca.transform_table(&train)?;
    let x_test = pca.transform_table(&test)?;

    // Encode and partition
    let labels = train.labels.clone().unwrap_or_default();
    let encoding = ClassEncoding::fit(&labels);
    let n_classes = encoding.n_classes();
    log::info!("{} classes: {}", n_classes, encoding.classes.join(", "));
    let data = LabeledData::new(x_train, encoding.encode(&labels)?)?;
    let partition = stratified_split(&data.y.to_vec(), config.train_fraction, config.seed);
    let fit_data = data.select(&partition.train_indices);
    let validation = data.select(&partition.validation_indices);

    // Base models
    let bank = ModelBank::fit(
        &config.models,
        &fit_data.x,
        &fit_data.y,
        n_classes,
        &config.cv,
        config.seed,
    )?;
    let validation_predictions = bank.predict_all(&validation.x)?;
    let mut models = Vec::with_capacity(bank.len());
    for (trained, predicted) in bank.models().iter().zip(validation_predictions.iter()) {
        let held_out = ErrorEstimate::evaluate(
            trained.method.as_str(),
            EstimateKind::HeldOut,
            predicted,
            &validation.y,
            n_classes,
        )?;
        models.push(ModelSummary {
            method: trained.method,
            selected: trained.params.clone(),
            cv: trained.cv.clone(),
            held_out,
        });
    }

    // Ensemble
    let ensemble = StackedEnsemble::fit(
        &bank,
        &fit_data.x,
        &fit_data.y,
        n_classes,
        &config.ensemble,
        &config.cv,
        config.seed,
    )?;
    let resubstitution = ErrorEstimate::evaluate(
        "ensemble",
        EstimateKind::Resubstitution,
        &ensemble.predict(&bank, &fit_data.x)?,
        &fit_data.y,
        n_classes,
    )?;
    let held_out = ErrorEstimate::evaluate(
        "ensemble",
        EstimateKind::HeldOut,
        &ensemble.predict_from(bank.methods().as_slice(), &validation_predictions)?,
        &validation.y,
        n_classes,
    )?;

    // Predict and write
    let predictions = encoding.decode(&ensemble.predict(&bank, &x_test)?);
    let output_dir = Path::new(&config.output_dir);
    let prediction_files = write_prediction_files(output_dir, &predictions)?;

    let summary = RunSummary {
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: chrono::Local::now().to_rfc3339(),
        seed: config.seed,
        classes: encoding.classes.clone(),
        shapes: ShapeSummary {
            train_rows: raw_train.nrows(),
            test_rows: raw_test.nrows(),
            raw_columns: raw_train.ncols(),
            feature_columns: train.n_features(),
            model_rows: partition.n_train(),
            validation_rows: partition.n_validation(),
        },
        pca: pca.summary(),
        models,
        ensemble: EnsembleSummary {
            combiner: ensemble.combiner_params().clone(),
            cv: ensemble.cv().clone(),
            resubstitution,
            held_out,
        },
        predictions,
    };

    let summary_file = output_dir.join(SUMMARY_FILE);
    summary.write_json(&summary_file)?;

    let report_file = if config.write_report {
        let path = output_dir.join(REPORT_FILE);
        build_report(&summary)?.save_to_file(&path)?;
        Some(path)
    } else {
        None
    };

    log::info!(
        "Pipeline completed in {:?}: ensemble held-out error {:.4}",
        start_time.elapsed(),
        summary.ensemble.held_out.error
    );

    Ok(PipelineOutput {
        summary,
        prediction_files,
        summary_file,
        report_file,
    })
}
