//! Stacked ensemble: a second-stage classifier over base-model predictions.
use anyhow::{Context, Result};
use ndarray::{Array1, Array2};

use crate::config::{CrossValidationConfig, MethodId, ModelType};
use crate::cross_validation::{train_with_cv, CvSummary, TrainedModel};
use crate::error::DataShapeError;
use crate::model_bank::ModelBank;

/// One-hot encode base-model predictions.
///
/// Columns are grouped by model: model `m`, class `k` lands in column
/// `m * n_classes + k`.
pub fn encode_predictions(
    predictions: &[Array1<usize>],
    n_classes: usize,
) -> Result<Array2<f64>, DataShapeError> {
    let n_rows = predictions.first().map_or(0, |p| p.len());
    let mut frame = Array2::<f64>::zeros((n_rows, predictions.len() * n_classes));
    for (m, pred) in predictions.iter().enumerate() {
        if pred.len() != n_rows {
            return Err(DataShapeError::LengthMismatch {
                left: n_rows,
                right: pred.len(),
            });
        }
        for (row, &class) in pred.iter().enumerate() {
            if class >= n_classes {
                return Err(DataShapeError::EnsembleLayout(format!(
                    "model {} predicted class index {} but only {} classes exist",
                    m, class, n_classes
                )));
            }
            frame[[row, m * n_classes + class]] = 1.0;
        }
    }
    Ok(frame)
}

/// Second-stage model fitted on the base predictions of a [`ModelBank`].
pub struct StackedEnsemble {
    methods: Vec<MethodId>,
    n_classes: usize,
    combiner: TrainedModel,
}

impl StackedEnsemble {
    /// Fit the combiner on the bank's predictions for `x`.
    pub fn fit(
        bank: &ModelBank,
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        combiner: &ModelType,
        cv: &CrossValidationConfig,
        seed: u64,
    ) -> Result<StackedEnsemble> {
        let predictions = bank.predict_all(x)?;
        Self::fit_from_predictions(&bank.methods(), &predictions, y, n_classes, combiner, cv, seed)
    }

    pub fn fit_from_predictions(
        methods: &[MethodId],
        predictions: &[Array1<usize>],
        y: &Array1<usize>,
        n_classes: usize,
        combiner: &ModelType,
        cv: &CrossValidationConfig,
        seed: u64,
    ) -> Result<StackedEnsemble> {
        if methods.len() != predictions.len() {
            return Err(DataShapeError::EnsembleLayout(format!(
                "{} methods named but {} prediction vectors given",
                methods.len(),
                predictions.len()
            ))
            .into());
        }
        let frame = encode_predictions(predictions, n_classes)?;
        log::info!(
            "Fitting stacked {} over {} base models ({} x {} frame)",
            combiner.method(),
            methods.len(),
            frame.nrows(),
            frame.ncols()
        );
        let combiner = train_with_cv(combiner, &frame, y, n_classes, cv, seed)
            .context("Failed to train the ensemble combiner")?;
        Ok(StackedEnsemble {
            methods: methods.to_vec(),
            n_classes,
            combiner,
        })
    }

    /// Predict by first running every base model of `bank` on `x`.
    pub fn predict(&self, bank: &ModelBank, x: &Array2<f64>) -> Result<Array1<usize>> {
        self.predict_from(&bank.methods(), &bank.predict_all(x)?)
    }

    /// Predict from precomputed base predictions, given in the order of
    /// `methods`, which must match the order recorded at fit time.
    pub fn predict_from(
        &self,
        methods: &[MethodId],
        predictions: &[Array1<usize>],
    ) -> Result<Array1<usize>> {
        if methods != self.methods.as_slice() {
            return Err(DataShapeError::EnsembleLayout(format!(
                "expected base models {:?}, got {:?}",
                self.methods, methods
            ))
            .into());
        }
        let frame = encode_predictions(predictions, self.n_classes)?;
        let expected = self.methods.len() * self.n_classes;
        if frame.ncols() != expected {
            return Err(DataShapeError::EnsembleLayout(format!(
                "frame has {} columns, expected {}",
                frame.ncols(),
                expected
            ))
            .into());
        }
        self.combiner.predict(&frame)
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    pub fn combiner_params(&self) -> &ModelType {
        &self.combiner.params
    }

    pub fn cv(&self) -> &CvSummary {
        &self.combiner.cv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_cv() -> CrossValidationConfig {
        CrossValidationConfig {
            folds: 3,
            repeats: 1,
            tune_length: 1,
        }
    }

    fn combiner() -> ModelType {
        ModelType::RandomForest {
            n_trees: 15,
            max_features: Some(6),
            max_depth: None,
            sample_fraction: 1.0,
        }
    }

    fn fit(methods: &[MethodId], preds: &[Array1<usize>], y: &Array1<usize>) -> StackedEnsemble {
        StackedEnsemble::fit_from_predictions(methods, preds, y, 3, &combiner(), &quick_cv(), 7)
            .unwrap()
    }

    fn is_layout_error(result: Result<Array1<usize>>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<DataShapeError>(),
            Some(DataShapeError::EnsembleLayout(_))
        )
    }

    /// Two base models over 3 classes; the first is always right, the second
    /// confuses class 2 with class 1.
    fn base_predictions() -> (Vec<MethodId>, Vec<Array1<usize>>, Array1<usize>) {
        let y: Array1<usize> = (0..45).map(|i| i % 3).collect();
        let good = y.clone();
        let noisy = y.mapv(|c| if c == 2 { 1 } else { c });
        (vec![MethodId::Lda, MethodId::DecisionTree], vec![good, noisy], y)
    }

    #[test]
    fn one_hot_frame_layout() {
        let preds = vec![Array1::from_vec(vec![0usize, 2]), Array1::from_vec(vec![1usize, 1])];
        let frame = encode_predictions(&preds, 3).unwrap();
        assert_eq!(frame.dim(), (2, 6));
        assert_eq!(frame.row(0).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(frame.row(1).to_vec(), vec![0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn resubstitution_is_reproducible() {
        let (methods, preds, y) = base_predictions();
        let a = fit(&methods, &preds, &y);
        let b = fit(&methods, &preds, &y);
        let pa = a.predict_from(&methods, &preds).unwrap();
        let pb = b.predict_from(&methods, &preds).unwrap();
        assert_eq!(pa, pb);
        assert_eq!(pa, y);
    }

    #[test]
    fn layout_mismatch_is_rejected() {
        let (methods, preds, y) = base_predictions();
        let ens = fit(&methods, &preds, &y);
        let reversed: Vec<MethodId> = methods.iter().rev().copied().collect();
        assert!(is_layout_error(ens.predict_from(&reversed, &preds)));
        assert!(is_layout_error(ens.predict_from(&methods[..1], &preds[..1])));
        let bad = vec![preds[0].clone(), preds[1].mapv(|_| 5)];
        assert!(is_layout_error(ens.predict_from(&methods, &bad)));
    }
}
