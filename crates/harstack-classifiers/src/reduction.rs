//! Center/scale/PCA dimensionality reduction.
//!
//! The transform is fitted once on the row-wise union of the training and
//! test feature matrices and then applied to each of them independently.
//! Components are the eigenvectors of the correlation matrix, ranked by
//! explained variance; the smallest prefix reaching the variance threshold
//! is retained.

use anyhow::{anyhow, bail, Result};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{concatenate, s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data_handling::CleanedTable;
use crate::error::DataShapeError;
use crate::preprocessing::Scaler;

/// Fitted center/scale/PCA transform.
#[derive(Debug, Clone)]
pub struct Pca {
    feature_names: Vec<String>,
    scaler: Scaler,
    /// Projection matrix, shape (n_features, n_components).
    rotation: Array2<f64>,
    /// Eigenvalues of the correlation matrix for all components.
    explained_variance: Array1<f64>,
    threshold: f64,
}

/// Serializable description of a fitted [`Pca`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaSummary {
    pub n_features: usize,
    pub n_components: usize,
    pub threshold: f64,
    pub cumulative_variance_ratio: Vec<f64>,
}

/// Eigenvalues of a symmetric matrix in descending order, with the matching
/// unit eigenvectors as columns. Each eigenvector is sign-normalized so its
/// largest-magnitude entry is positive.
fn sorted_eigen(a: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    if a.iter().any(|v| !v.is_finite()) {
        bail!("Correlation matrix holds non-finite values");
    }
    let n = a.nrows();
    let m = DMatrix::from_fn(n, n, |i, j| a[(i, j)]);
    let eigen = SymmetricEigen::try_new(m, f64::EPSILON, 0)
        .ok_or_else(|| anyhow!("Eigen-decomposition of the correlation matrix did not converge"))?;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));

    let values = Array1::from_iter(order.iter().map(|&i| eigen.eigenvalues[i]));
    let mut vectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        let column = eigen.eigenvectors.column(src);
        let pivot = column
            .iter()
            .copied()
            .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for k in 0..n {
            vectors[(k, dst)] = sign * column[k];
        }
    }
    Ok((values, vectors))
}

/// Both tables must carry the same feature columns in the same order.
pub fn check_feature_columns(train: &[String], test: &[String]) -> Result<(), DataShapeError> {
    if train == test {
        return Ok(());
    }
    let missing_in_test: Vec<String> =
        train.iter().filter(|n| !test.contains(n)).cloned().collect();
    let extra_in_test: Vec<String> =
        test.iter().filter(|n| !train.contains(n)).cloned().collect();
    if missing_in_test.is_empty() && extra_in_test.is_empty() && train.len() == test.len() {
        return Err(DataShapeError::ColumnOrderMismatch);
    }
    Err(DataShapeError::FeatureMismatch {
        missing_in_test,
        extra_in_test,
    })
}

impl Pca {
    /// Fit on a single feature matrix.
    pub fn fit(x: &Array2<f64>, feature_names: Vec<String>, threshold: f64) -> Result<Pca> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            bail!("Variance threshold must be in (0, 1], got {}", threshold);
        }
        if feature_names.len() != x.ncols() {
            return Err(DataShapeError::DimensionMismatch {
                expected: x.ncols(),
                found: feature_names.len(),
            }
            .into());
        }

        let scaler = Scaler::fit(x)?;
        let z = scaler.transform(x)?;
        let n = z.nrows() as f64;
        let correlation = z.t().dot(&z) / n;

        let (values, vectors) = sorted_eigen(&correlation)?;
        let explained_variance = values.mapv(|v| v.max(0.0));
        let total: f64 = explained_variance.sum();
        if total <= 0.0 {
            bail!("Feature matrix has no variance; PCA cannot retain any component");
        }

        let mut cumulative = 0.0;
        let mut n_components = explained_variance.len();
        for (i, v) in explained_variance.iter().enumerate() {
            cumulative += v / total;
            if cumulative + 1e-12 >= threshold {
                n_components = i + 1;
                break;
            }
        }

        let rotation = vectors.slice(s![.., ..n_components]).to_owned();
        log::info!(
            "PCA retained {} of {} components ({:.2}% variance, threshold {:.0}%)",
            n_components,
            x.ncols(),
            cumulative.min(1.0) * 100.0,
            threshold * 100.0
        );

        Ok(Pca {
            feature_names,
            scaler,
            rotation,
            explained_variance,
            threshold,
        })
    }

    /// Fit on the row-wise union of the training and test features.
    ///
    /// Fails when the two tables do not share the same feature columns in the
    /// same order.
    pub fn fit_union(train: &CleanedTable, test: &CleanedTable, threshold: f64) -> Result<Pca> {
        check_feature_columns(&train.feature_names, &test.feature_names)?;
        let union = concatenate(Axis(0), &[train.x.view(), test.x.view()])?;
        Pca::fit(&union, train.feature_names.clone(), threshold)
    }

    /// Project a feature matrix onto the retained components.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, DataShapeError> {
        let z = self.scaler.transform(x)?;
        Ok(z.dot(&self.rotation))
    }

    /// Project a cleaned table after checking its feature columns.
    pub fn transform_table(&self, table: &CleanedTable) -> Result<Array2<f64>, DataShapeError> {
        check_feature_columns(&self.feature_names, &table.feature_names)?;
        self.transform(&table.x)
    }

    pub fn n_components(&self) -> usize {
        self.rotation.ncols()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn explained_variance_ratio(&self) -> Array1<f64> {
        let total = self.explained_variance.sum();
        self.explained_variance.mapv(|v| v / total)
    }

    /// Cumulative explained-variance ratio over all components.
    pub fn cumulative_variance_ratio(&self) -> Vec<f64> {
        let mut acc = 0.0;
        self.explained_variance_ratio()
            .iter()
            .map(|r| {
                acc += r;
                acc.min(1.0)
            })
            .collect()
    }

    /// Variance ratio explained by the retained components.
    pub fn retained_variance_ratio(&self) -> f64 {
        self.cumulative_variance_ratio()[self.n_components() - 1]
    }

    pub fn summary(&self) -> PcaSummary {
        PcaSummary {
            n_features: self.n_features(),
            n_components: self.n_components(),
            threshold: self.threshold,
            cumulative_variance_ratio: self.cumulative_variance_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("sensor{}", i)).collect()
    }

    fn correlated() -> Array2<f64> {
        // Column 1 is an exact multiple of column 0; column 2 is uncorrelated with both.
        array![
            [1.0, 2.0, 1.0],
            [2.0, 4.0, -1.0],
            [3.0, 6.0, 0.0],
            [4.0, 8.0, 0.0],
            [5.0, 10.0, -1.0],
            [6.0, 12.0, 1.0]
        ]
    }

    #[test]
    fn redundant_columns_collapse() {
        let pca = Pca::fit(&correlated(), names(3), 0.95).unwrap();
        assert_eq!(pca.n_components(), 2);
        assert!(pca.retained_variance_ratio() >= 0.95);
        let ratio = pca.explained_variance_ratio();
        assert!((ratio[0] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn full_threshold_keeps_all_informative_components() {
        let pca = Pca::fit(&correlated(), names(3), 1.0).unwrap();
        assert!(pca.n_components() <= 3);
        assert!(pca.retained_variance_ratio() >= 1.0 - 1e-9);
    }

    #[test]
    fn transform_is_deterministic() {
        let x = correlated();
        let pca = Pca::fit(&x, names(3), 0.95).unwrap();
        let a = pca.transform(&x).unwrap();
        let b = pca.transform(&x).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ncols(), pca.n_components());
    }

    #[test]
    fn eigenpairs_are_sorted_and_sign_fixed() {
        let (values, vectors) = sorted_eigen(&array![[1.0, 0.8], [0.8, 1.0]]).unwrap();
        assert!((values[0] - 1.8).abs() < 1e-12);
        assert!((values[1] - 0.2).abs() < 1e-12);
        let inv_sqrt2 = 1.0 / 2f64.sqrt();
        assert!((vectors[(0, 0)] - inv_sqrt2).abs() < 1e-12);
        assert!((vectors[(1, 0)] - inv_sqrt2).abs() < 1e-12);

        let diagonal = array![[1.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let (values, vectors) = sorted_eigen(&diagonal).unwrap();
        for (got, want) in values.iter().zip([3.0, 2.0, 1.0]) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((vectors[(1, 0)] - 1.0).abs() < 1e-12);
        assert!((vectors[(2, 1)] - 1.0).abs() < 1e-12);
        assert!((vectors[(0, 2)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        assert!(Pca::fit(&correlated(), names(3), 0.0).is_err());
        assert!(Pca::fit(&correlated(), names(3), 1.5).is_err());
    }

    #[test]
    fn mismatched_columns_are_reported() {
        let train: Vec<String> = names(3);
        let test: Vec<String> = vec!["sensor1".into(), "sensor2".into(), "other".into()];
        assert_eq!(
            check_feature_columns(&train, &test),
            Err(DataShapeError::FeatureMismatch {
                missing_in_test: vec!["sensor3".into()],
                extra_in_test: vec!["other".into()],
            })
        );
        let reordered: Vec<String> = vec!["sensor2".into(), "sensor1".into(), "sensor3".into()];
        assert_eq!(
            check_feature_columns(&train, &reordered),
            Err(DataShapeError::ColumnOrderMismatch)
        );
    }
}
