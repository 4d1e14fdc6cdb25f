//! Confusion matrices and error estimates.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::DataShapeError;

/// Counts of (predicted, actual) class pairs. Rows are predicted classes,
/// columns are actual classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn from_predictions(
        predicted: &Array1<usize>,
        actual: &Array1<usize>,
        n_classes: usize,
    ) -> Result<ConfusionMatrix, DataShapeError> {
        if predicted.len() != actual.len() {
            return Err(DataShapeError::LengthMismatch {
                left: predicted.len(),
                right: actual.len(),
            });
        }
        let mut counts = Array2::<usize>::zeros((n_classes, n_classes));
        for (&p, &a) in predicted.iter().zip(actual.iter()) {
            if p >= n_classes || a >= n_classes {
                return Err(DataShapeError::DimensionMismatch {
                    expected: n_classes,
                    found: p.max(a) + 1,
                });
            }
            counts[[p, a]] += 1;
        }
        Ok(ConfusionMatrix { counts })
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    pub fn n_classes(&self) -> usize {
        self.counts.nrows()
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.counts.diag().sum() as f64 / total as f64
    }

    pub fn error(&self) -> f64 {
        1.0 - self.accuracy()
    }

    /// Cohen's kappa: agreement beyond what the marginals predict by chance.
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let predicted = self.counts.sum_axis(Axis(1));
        let actual = self.counts.sum_axis(Axis(0));
        let expected: f64 = predicted
            .iter()
            .zip(actual.iter())
            .map(|(&p, &a)| p as f64 * a as f64)
            .sum::<f64>()
            / (total * total);
        let observed = self.accuracy();
        if (1.0 - expected).abs() < f64::EPSILON {
            return if (observed - 1.0).abs() < f64::EPSILON { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }

    /// True positive rate of `class`; `None` when the class never occurs.
    pub fn sensitivity(&self, class: usize) -> Option<f64> {
        let positives = self.counts.column(class).sum();
        if positives == 0 {
            return None;
        }
        Some(self.counts[[class, class]] as f64 / positives as f64)
    }

    /// True negative rate of `class`; `None` when every row is that class.
    pub fn specificity(&self, class: usize) -> Option<f64> {
        let negatives = self.total() - self.counts.column(class).sum();
        if negatives == 0 {
            return None;
        }
        let false_positives = self.counts.row(class).sum() - self.counts[[class, class]];
        Some((negatives - false_positives) as f64 / negatives as f64)
    }

    pub fn to_rows(&self) -> Vec<Vec<usize>> {
        self.counts.outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// How an error estimate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateKind {
    /// Scored on the rows the model was trained on; optimistic.
    Resubstitution,
    /// Scored on rows withheld from training.
    HeldOut,
}

/// Serializable evaluation of one model on one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimate {
    pub model: String,
    pub kind: EstimateKind,
    pub n_rows: usize,
    pub accuracy: f64,
    pub error: f64,
    pub kappa: f64,
    pub confusion: Vec<Vec<usize>>,
    pub sensitivity: Vec<Option<f64>>,
    pub specificity: Vec<Option<f64>>,
}

impl ErrorEstimate {
    pub fn new(model: &str, kind: EstimateKind, cm: &ConfusionMatrix) -> ErrorEstimate {
        let classes = 0..cm.n_classes();
        let estimate = ErrorEstimate {
            model: model.to_string(),
            kind,
            n_rows: cm.total(),
            accuracy: cm.accuracy(),
            error: cm.error(),
            kappa: cm.kappa(),
            confusion: cm.to_rows(),
            sensitivity: classes.clone().map(|k| cm.sensitivity(k)).collect(),
            specificity: classes.map(|k| cm.specificity(k)).collect(),
        };
        match kind {
            EstimateKind::Resubstitution => log::warn!(
                "{} resubstitution error {:.4} is measured on its own training rows; it is optimistic and not a generalization estimate",
                model,
                estimate.error
            ),
            EstimateKind::HeldOut => log::info!(
                "{} held-out error {:.4} (accuracy {:.4}, kappa {:.4}) on {} rows",
                model,
                estimate.error,
                estimate.accuracy,
                estimate.kappa,
                estimate.n_rows
            ),
        }
        estimate
    }

    /// Build the confusion matrix and estimate in one step.
    pub fn evaluate(
        model: &str,
        kind: EstimateKind,
        predicted: &Array1<usize>,
        actual: &Array1<usize>,
        n_classes: usize,
    ) -> Result<ErrorEstimate, DataShapeError> {
        let cm = ConfusionMatrix::from_predictions(predicted, actual, n_classes)?;
        Ok(ErrorEstimate::new(model, kind, &cm))
    }
}
