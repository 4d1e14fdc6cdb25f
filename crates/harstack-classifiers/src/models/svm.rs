use anyhow::{Context, Result};
use linfa::dataset::Pr;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use crate::models::classifier_trait::{argmax, Classifier};
use crate::partition::stratified_subsample;

/// Radial-kernel SVM settings, with the cost already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SvmSettings {
    pub c: f64,
    pub gaussian_kernel_eps: Option<f64>,
    pub eps: f64,
    pub max_samples: Option<usize>,
}

enum Machines {
    /// Only one class was seen during training.
    Constant(usize),
    /// Two classes: one machine scoring `positive` against `negative`.
    Binary {
        negative: usize,
        positive: usize,
        model: Svm<f64, Pr>,
    },
    /// One machine per present class, highest Platt probability wins.
    OneVsRest(Vec<(usize, Svm<f64, Pr>)>),
}

/// Gaussian-kernel support vector classifier built on `linfa-svm`.
///
/// linfa's SVM is binary; more than two classes are handled one-vs-rest
/// over Platt-scaled probabilities.
pub struct SvmClassifier {
    machines: Machines,
}

/// Mean squared pairwise distance between rows, `2 · Σ var(column)`.
pub fn estimate_kernel_eps(x: &Array2<f64>) -> f64 {
    let width: f64 = x.var_axis(Axis(0), 0.0).sum() * 2.0;
    if width > 0.0 && width.is_finite() {
        width
    } else {
        1.0
    }
}

fn fit_binary(
    x: &Array2<f64>,
    targets: Array1<bool>,
    settings: &SvmSettings,
    kernel_eps: f64,
) -> Result<Svm<f64, Pr>> {
    let dataset = Dataset::new(x.to_owned(), targets);
    let params: SvmParams<f64, Pr> = Svm::<f64, Pr>::params()
        .eps(settings.eps)
        .pos_neg_weights(settings.c, settings.c)
        .gaussian_kernel(kernel_eps);
    let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
        .context("Failed to fit SVM")?;
    Ok(model)
}

fn positive_probability(model: &Svm<f64, Pr>, x: &Array2<f64>) -> Array1<f64> {
    let probs: Array1<Pr> = linfa::traits::Predict::predict(model, x);
    probs.mapv(|p| *p as f64)
}

impl SvmClassifier {
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        settings: &SvmSettings,
        seed: u64,
    ) -> Result<Self> {
        let (x, y) = match settings.max_samples {
            Some(max) if y.len() > max => {
                let labels = y.to_vec();
                let rows = stratified_subsample(&labels, max, seed);
                log::debug!(
                    "SVM training on a stratified subsample of {} of {} rows",
                    rows.len(),
                    labels.len()
                );
                (x.select(Axis(0), &rows), y.select(Axis(0), &rows))
            }
            _ => (x.to_owned(), y.to_owned()),
        };

        let kernel_eps = settings
            .gaussian_kernel_eps
            .unwrap_or_else(|| estimate_kernel_eps(&x));

        let mut counts = vec![0usize; n_classes];
        for &label in y.iter() {
            counts[label] += 1;
        }
        let present: Vec<usize> = (0..n_classes).filter(|&k| counts[k] > 0).collect();

        let machines = match present.as_slice() {
            [] => anyhow::bail!("Cannot fit an SVM without training rows"),
            [only] => {
                log::warn!("SVM training data holds a single class; predictions are constant");
                Machines::Constant(*only)
            }
            [negative, positive] => {
                let targets = y.mapv(|label| label == *positive);
                let model = fit_binary(&x, targets, settings, kernel_eps)?;
                Machines::Binary {
                    negative: *negative,
                    positive: *positive,
                    model,
                }
            }
            classes => {
                let models = classes
                    .par_iter()
                    .map(|&class| {
                        let targets = y.mapv(|label| label == class);
                        fit_binary(&x, targets, settings, kernel_eps).map(|m| (class, m))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Machines::OneVsRest(models)
            }
        };

        log::trace!(
            "Fitted SVM (C {}, kernel eps {:.4}) on {} rows, {} classes",
            settings.c,
            kernel_eps,
            x.nrows(),
            present.len()
        );
        Ok(SvmClassifier { machines })
    }

}

impl Classifier for SvmClassifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let pred = match &self.machines {
            Machines::Constant(class) => Array1::from_elem(x.nrows(), *class),
            Machines::Binary {
                negative,
                positive,
                model,
            } => positive_probability(model, x)
                .mapv(|p| if p > 0.5 { *positive } else { *negative }),
            Machines::OneVsRest(models) => {
                let mut scores = Array2::<f64>::zeros((x.nrows(), models.len()));
                for (j, (_, model)) in models.iter().enumerate() {
                    scores.column_mut(j).assign(&positive_probability(model, x));
                }
                scores
                    .outer_iter()
                    .map(|row| models[argmax(row.iter().copied())].0)
                    .collect()
            }
        };
        Ok(pred)
    }

    fn name(&self) -> &str {
        "svm_radial"
    }
}
