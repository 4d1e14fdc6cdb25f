use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use harstack_classifiers::cleaning::CleaningConfig;
use harstack_classifiers::config::{CrossValidationConfig, ModelType};
use harstack_classifiers::io::LoaderConfig;

/// Settings of one pipeline run. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub train_data: String,
    pub test_data: String,
    pub output_dir: String,
    pub loader: LoaderConfig,
    pub cleaning: CleaningConfig,
    /// Cumulative variance the retained principal components must explain.
    pub pca_threshold: f64,
    /// Share of training rows used for model fitting; the rest is validation.
    pub train_fraction: f64,
    pub cv: CrossValidationConfig,
    pub models: Vec<ModelType>,
    pub ensemble: ModelType,
    pub seed: u64,
    /// Worker threads for model fitting, 0 uses every available core.
    pub n_threads: usize,
    pub write_report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            train_data: String::from("pml-training.csv"),
            test_data: String::from("pml-testing.csv"),
            output_dir: String::from("harstack_output"),
            loader: LoaderConfig::default(),
            cleaning: CleaningConfig::default(),
            pca_threshold: 0.95,
            train_fraction: 0.8,
            cv: CrossValidationConfig::default(),
            models: ModelType::default_bank(),
            ensemble: ModelType::default(),
            seed: 32343,
            n_threads: 0,
            write_report: true,
        }
    }
}

/// Load a pipeline configuration from a JSON file.
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: PipelineConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

impl PipelineConfig {
    /// Start from the config file (or defaults) and apply CLI overrides.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => load_pipeline_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        if let Some(test_data) = matches.get_one::<String>("test_data") {
            config.test_data = test_data.clone();
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.seed = *seed;
        }
        if let Some(threads) = matches.get_one::<usize>("threads") {
            config.n_threads = *threads;
        }
        if matches.get_flag("no_report") {
            config.write_report = false;
        }

        validate_tsv_or_csv_file(&config.train_data)?;
        validate_tsv_or_csv_file(&config.test_data)?;
        Ok(config)
    }
}

pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{"seed": 7, "cv": {"folds": 5}}"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.cv.folds, 5);
        assert_eq!(config.cv.repeats, 4);
        assert_eq!(config.pca_threshold, 0.95);
        assert_eq!(config.models.len(), 4);
        assert!(config.write_report);
    }

    #[test]
    fn default_config_round_trips() {
        let json = serde_json::to_string_pretty(&PipelineConfig::default()).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PipelineConfig::default());
    }
}
