use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a classification method in the model bank.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MethodId {
    DecisionTree,
    RandomForest,
    Lda,
    SvmRadial,
}

impl MethodId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodId::DecisionTree => "decision_tree",
            MethodId::RandomForest => "random_forest",
            MethodId::Lda => "lda",
            MethodId::SvmRadial => "svm_radial",
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported model types and their hyper-parameters.
///
/// Fields left as `None` are tuned by cross-validation (see
/// [`ModelType::candidates`]) or, for the SVM kernel width, estimated from
/// the training data.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    DecisionTree {
        max_depth: Option<usize>,
    },
    RandomForest {
        n_trees: usize,
        max_features: Option<usize>,
        max_depth: Option<usize>,
        sample_fraction: f64,
    },
    LDA {
        shrinkage: f64,
    },
    SVM {
        c: Option<f64>,
        gaussian_kernel_eps: Option<f64>,
        eps: f64,
        /// Upper bound on the rows used per fit (stratified subsample).
        max_samples: Option<usize>,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            n_trees: 100,
            max_features: None,
            max_depth: None,
            sample_fraction: 1.0,
        }
    }
}

/// Upper bound on grid points per tuned hyper-parameter.
pub const MAX_TUNE_LENGTH: usize = 32;

impl ModelType {
    pub fn method(&self) -> MethodId {
        match self {
            ModelType::DecisionTree { .. } => MethodId::DecisionTree,
            ModelType::RandomForest { .. } => MethodId::RandomForest,
            ModelType::LDA { .. } => MethodId::Lda,
            ModelType::SVM { .. } => MethodId::SvmRadial,
        }
    }

    /// The four base methods of the model bank, in bank order.
    pub fn default_bank() -> Vec<ModelType> {
        ["decision_tree", "random_forest", "lda", "svm"]
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect()
    }

    /// Expand this configuration into the hyper-parameter grid searched by
    /// cross-validation. Fixed values yield a single candidate.
    pub fn candidates(&self, n_features: usize, tune_length: usize) -> Vec<ModelType> {
        let tune_length = tune_length.clamp(1, MAX_TUNE_LENGTH);
        match self {
            ModelType::DecisionTree { max_depth: None } => (0..tune_length)
                .map_while(|k| 2usize.checked_pow(k as u32 + 2))
                .map(|depth| ModelType::DecisionTree {
                    max_depth: Some(depth),
                })
                .collect(),
            ModelType::RandomForest {
                n_trees,
                max_features: None,
                max_depth,
                sample_fraction,
            } => feature_grid(n_features, tune_length)
                .into_iter()
                .map(|m| ModelType::RandomForest {
                    n_trees: *n_trees,
                    max_features: Some(m),
                    max_depth: *max_depth,
                    sample_fraction: *sample_fraction,
                })
                .collect(),
            ModelType::SVM {
                c: None,
                gaussian_kernel_eps,
                eps,
                max_samples,
            } => (0..tune_length)
                .map(|k| ModelType::SVM {
                    c: Some(0.25 * f64::powi(2.0, k as i32)),
                    gaussian_kernel_eps: *gaussian_kernel_eps,
                    eps: *eps,
                    max_samples: *max_samples,
                })
                .collect(),
            fixed => vec![fixed.clone()],
        }
    }
}

/// Evenly spaced feature-subset sizes in `[2, p]`, deduplicated.
fn feature_grid(n_features: usize, len: usize) -> Vec<usize> {
    if n_features <= 2 || len == 1 {
        return vec![((n_features as f64).sqrt().floor() as usize).clamp(1, n_features.max(1))];
    }
    let lo = 2.0;
    let hi = n_features as f64;
    let step = (hi - lo) / (len - 1) as f64;
    let mut grid: Vec<usize> = (0..len)
        .map(|i| (lo + step * i as f64).floor() as usize)
        .collect();
    grid.dedup();
    grid
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "decision_tree" | "tree" | "rpart" => Ok(ModelType::DecisionTree { max_depth: None }),
            "random_forest" | "rf" => Ok(ModelType::default()),
            "lda" => Ok(ModelType::LDA { shrinkage: 0.0 }),
            "svm" | "svm_radial" => Ok(ModelType::SVM {
                c: None,
                gaussian_kernel_eps: None,
                eps: 1e-3,
                max_samples: Some(3000),
            }),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: decision_tree, random_forest, lda, svm",
                s
            )),
        }
    }
}

/// Repeated stratified k-fold settings used for hyper-parameter selection.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub folds: usize,
    pub repeats: usize,
    pub tune_length: usize,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            folds: 4,
            repeats: 4,
            tune_length: 3,
        }
    }
}
