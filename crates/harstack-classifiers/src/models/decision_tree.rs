use anyhow::{anyhow, bail, Result};
use ndarray::{Array1, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier as CartTree, DecisionTreeClassifierParameters, SplitCriterion,
};

use crate::models::classifier_trait::Classifier;

/// Fitted smartcore CART tree over dense `f64` rows and `u32` class labels.
pub(crate) type Tree = CartTree<f64, u32, DenseMatrix<f64>, Vec<u32>>;

fn dense_rows(x: &Array2<f64>) -> DenseMatrix<f64> {
    let rows: Vec<Vec<f64>> = x.outer_iter().map(|row| row.to_vec()).collect();
    DenseMatrix::from_2d_vec(&rows)
}

/// Fit a Gini-split CART tree.
pub(crate) fn fit_tree(
    x: &Array2<f64>,
    y: &Array1<usize>,
    max_depth: Option<usize>,
) -> Result<Tree> {
    if x.nrows() == 0 || x.ncols() == 0 {
        bail!("Cannot fit a decision tree on an empty matrix ({} x {})", x.nrows(), x.ncols());
    }
    let mut params =
        DecisionTreeClassifierParameters::default().with_criterion(SplitCriterion::Gini);
    if let Some(depth) = max_depth {
        params = params.with_max_depth(depth.min(u16::MAX as usize) as u16);
    }
    let labels: Vec<u32> = y.iter().map(|&class| class as u32).collect();
    Tree::fit(&dense_rows(x), &labels, params)
        .map_err(|e| anyhow!("Failed to fit decision tree: {}", e))
}

pub(crate) fn predict_tree(tree: &Tree, x: &Array2<f64>) -> Result<Array1<usize>> {
    let pred = tree
        .predict(&dense_rows(x))
        .map_err(|e| anyhow!("Decision tree prediction failed: {}", e))?;
    Ok(pred.into_iter().map(|class| class as usize).collect())
}

/// Single CART-style decision tree.
pub struct DecisionTreeClassifier {
    model: Tree,
}

impl DecisionTreeClassifier {
    pub fn fit(x: &Array2<f64>, y: &Array1<usize>, max_depth: Option<usize>) -> Result<Self> {
        let model = fit_tree(x, y, max_depth)?;
        log::trace!("Fitted decision tree (max_depth {:?}) on {} rows", max_depth, x.nrows());
        Ok(DecisionTreeClassifier { model })
    }
}

impl Classifier for DecisionTreeClassifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        predict_tree(&self.model, x)
    }

    fn name(&self) -> &str {
        "decision_tree"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::three_blobs;
    use ndarray::array;

    #[test]
    fn separates_blobs() {
        let (x, y) = three_blobs();
        let model = DecisionTreeClassifier::fit(&x, &y, Some(4)).unwrap();
        let pred = model.predict(&x).unwrap();
        let correct = pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        assert_eq!(correct, y.len());
    }

    #[test]
    fn refits_are_identical() {
        let (x, y) = three_blobs();
        let first = DecisionTreeClassifier::fit(&x, &y, Some(4)).unwrap().predict(&x).unwrap();
        for _ in 0..10 {
            let again = DecisionTreeClassifier::fit(&x, &y, Some(4)).unwrap().predict(&x).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn splits_tied_one_hot_columns() {
        // Stacking frames are all ties: each column only holds 0 or 1.
        let x = array![
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0, 0.0, 1.0]
        ];
        let y = Array1::from_vec(vec![0usize, 0, 1, 1, 2, 2]);
        let model = DecisionTreeClassifier::fit(&x, &y, None).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }
}
