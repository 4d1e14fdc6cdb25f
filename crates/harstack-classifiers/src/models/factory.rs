use anyhow::Result;
use ndarray::{Array1, Array2};

use crate::config::ModelType;
use crate::models::classifier_trait::Classifier;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::lda::LdaClassifier;
use crate::models::random_forest::{ForestParams, RandomForestClassifier};
use crate::models::svm::{SvmClassifier, SvmSettings};

/// Cost used when an SVM configuration reaches fitting without a tuned `c`.
const DEFAULT_SVM_COST: f64 = 1.0;

/// Fit a boxed classifier described by `model_type`.
/// Currently this is a thin factory implemented as a single function.
pub fn fit_model(
    model_type: &ModelType,
    x: &Array2<f64>,
    y: &Array1<usize>,
    n_classes: usize,
    seed: u64,
) -> Result<Box<dyn Classifier>> {
    let model: Box<dyn Classifier> = match model_type {
        ModelType::DecisionTree { max_depth } => {
            Box::new(DecisionTreeClassifier::fit(x, y, *max_depth)?)
        }
        ModelType::RandomForest {
            n_trees,
            max_features,
            max_depth,
            sample_fraction,
        } => {
            let params = ForestParams {
                n_trees: *n_trees,
                max_features: *max_features,
                max_depth: *max_depth,
                sample_fraction: *sample_fraction,
            };
            Box::new(RandomForestClassifier::fit(x, y, n_classes, &params, seed)?)
        }
        ModelType::LDA { shrinkage } => Box::new(LdaClassifier::fit(x, y, n_classes, *shrinkage)?),
        ModelType::SVM {
            c,
            gaussian_kernel_eps,
            eps,
            max_samples,
        } => {
            let settings = SvmSettings {
                c: c.unwrap_or(DEFAULT_SVM_COST),
                gaussian_kernel_eps: *gaussian_kernel_eps,
                eps: *eps,
                max_samples: *max_samples,
            };
            Box::new(SvmClassifier::fit(x, y, n_classes, &settings, seed)?)
        }
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::three_blobs;

    #[test]
    fn every_bank_method_fits_and_predicts() {
        let (x, y) = three_blobs();
        for model_type in ModelType::default_bank() {
            let model = fit_model(&model_type, &x, &y, 3, 42).unwrap();
            assert_eq!(model.name(), model_type.method().as_str());
            assert_eq!(model.predict(&x).unwrap().len(), x.nrows());
        }
    }
}
