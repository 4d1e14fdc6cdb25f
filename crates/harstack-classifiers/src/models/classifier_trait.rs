use anyhow::Result;
use ndarray::{Array1, Array2};

/// A fitted multi-class classifier.
///
/// Implementations are produced by [`crate::models::factory::fit_model`] and
/// are immutable afterwards: prediction has no side effects, and a model can
/// be shared across threads. Labels are class indices from
/// [`crate::data_handling::ClassEncoding`].
pub trait Classifier: Send + Sync {
    /// Predict one class index per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Index of the largest score, preferring the lowest index on ties.
pub(crate) fn argmax(scores: impl IntoIterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, s) in scores.into_iter().enumerate() {
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(vec![1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(vec![f64::NEG_INFINITY, 0.0]), 1);
        assert_eq!(argmax(Vec::<f64>::new()), 0);
    }
}
