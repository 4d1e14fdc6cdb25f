use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2};

use crate::config::{CrossValidationConfig, MethodId, ModelType};
use crate::cross_validation::{train_with_cv, TrainedModel};

/// The set of independently trained base classifiers, in configuration order.
pub struct ModelBank {
    models: Vec<TrainedModel>,
}

impl ModelBank {
    /// Train every configured model with cross-validated tuning.
    pub fn fit(
        configs: &[ModelType],
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        cv: &CrossValidationConfig,
        seed: u64,
    ) -> Result<ModelBank> {
        if configs.is_empty() {
            bail!("The model bank needs at least one model");
        }
        let mut seen = HashSet::new();
        for config in configs {
            if !seen.insert(config.method()) {
                bail!("Model bank lists {} more than once", config.method());
            }
        }

        let mut models = Vec::with_capacity(configs.len());
        for config in configs {
            log::info!(
                "Training {} on {} rows x {} features",
                config.method(),
                x.nrows(),
                x.ncols()
            );
            let trained = train_with_cv(config, x, y, n_classes, cv, seed)
                .with_context(|| format!("Failed to train {}", config.method()))?;
            models.push(trained);
        }
        Ok(ModelBank { models })
    }

    pub fn methods(&self) -> Vec<MethodId> {
        self.models.iter().map(|m| m.method).collect()
    }

    pub fn models(&self) -> &[TrainedModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Predictions of every model, in bank order.
    pub fn predict_all(&self, x: &Array2<f64>) -> Result<Vec<Array1<usize>>> {
        self.models
            .iter()
            .map(|m| m.predict(x).with_context(|| format!("{} prediction failed", m.method)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::three_blobs;

    fn quick_cv() -> CrossValidationConfig {
        CrossValidationConfig {
            folds: 3,
            repeats: 1,
            tune_length: 1,
        }
    }

    #[test]
    fn bank_predicts_in_configuration_order() {
        let (x, y) = three_blobs();
        let configs = vec![
            ModelType::LDA { shrinkage: 0.0 },
            ModelType::DecisionTree { max_depth: Some(3) },
        ];
        let bank = ModelBank::fit(&configs, &x, &y, 3, &quick_cv(), 1).unwrap();
        assert_eq!(bank.methods(), vec![MethodId::Lda, MethodId::DecisionTree]);
        let preds = bank.predict_all(&x).unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0], y);
    }

    #[test]
    fn duplicate_methods_are_rejected() {
        let (x, y) = three_blobs();
        let configs = vec![
            ModelType::LDA { shrinkage: 0.0 },
            ModelType::LDA { shrinkage: 0.5 },
        ];
        assert!(ModelBank::fit(&configs, &x, &y, 3, &quick_cv(), 1).is_err());
    }
}
