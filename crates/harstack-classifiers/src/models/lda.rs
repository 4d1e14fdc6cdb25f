use anyhow::{bail, Result};
use nalgebra::{Cholesky, DMatrix};
use ndarray::{Array1, Array2, Axis};

use crate::models::classifier_trait::{argmax, Classifier};

/// Relative pivot tolerance: `L_jj² ≤ PIVOT_TOLERANCE · Σ_jj` counts as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Solve `Σ W = B` by Cholesky, or `None` when `Σ` is not numerically
/// positive definite.
fn cholesky_solve(covariance: &Array2<f64>, rhs: &Array2<f64>) -> Option<Array2<f64>> {
    let n = covariance.nrows();
    let sigma = DMatrix::from_fn(n, n, |i, j| covariance[(i, j)]);
    let chol = Cholesky::new(sigma)?;
    let l = chol.l();
    let stable = (0..n).all(|j| {
        let pivot = l[(j, j)] * l[(j, j)];
        pivot.is_finite() && pivot > PIVOT_TOLERANCE * covariance[(j, j)].abs()
    });
    if !stable {
        return None;
    }
    let b = DMatrix::from_fn(rhs.nrows(), rhs.ncols(), |i, j| rhs[(i, j)]);
    let w = chol.solve(&b);
    Some(Array2::from_shape_fn((w.nrows(), w.ncols()), |(i, j)| w[(i, j)]))
}

/// Linear discriminant analysis with a pooled within-class covariance.
///
/// The discriminant for class `k` is
/// `x · Σ⁻¹μ_k − ½ μ_kᵀ Σ⁻¹ μ_k + ln π_k`. `shrinkage` blends the pooled
/// covariance toward its diagonal, `(1 − λ) Σ + λ diag(Σ)`.
pub struct LdaClassifier {
    /// Shape (n_features, n_classes).
    coefficients: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LdaClassifier {
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        shrinkage: f64,
    ) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows != y.len() {
            bail!("LDA needs one label per row ({} rows, {} labels)", n_rows, y.len());
        }
        if !(0.0..=1.0).contains(&shrinkage) {
            bail!("LDA shrinkage must be in [0, 1], got {}", shrinkage);
        }

        let mut counts = vec![0usize; n_classes];
        let mut means = Array2::<f64>::zeros((n_classes, n_features));
        for (row, &class) in x.outer_iter().zip(y.iter()) {
            counts[class] += 1;
            let mut m = means.row_mut(class);
            m += &row;
        }
        for (k, &count) in counts.iter().enumerate() {
            if count > 0 {
                means.row_mut(k).mapv_inplace(|v| v / count as f64);
            }
        }
        let present = counts.iter().filter(|&&c| c > 0).count();
        if present == 0 {
            bail!("Cannot fit LDA without training rows");
        }

        let mut covariance = Array2::<f64>::zeros((n_features, n_features));
        for (row, &class) in x.outer_iter().zip(y.iter()) {
            let d = (&row - &means.row(class)).insert_axis(Axis(1));
            covariance += &d.dot(&d.t());
        }
        let dof = n_rows.saturating_sub(present).max(1) as f64;
        covariance.mapv_inplace(|v| v / dof);
        if shrinkage > 0.0 {
            for i in 0..n_features {
                for j in 0..n_features {
                    if i != j {
                        covariance[(i, j)] *= 1.0 - shrinkage;
                    }
                }
            }
        }

        let rhs = means.t().to_owned();
        let solved = match cholesky_solve(&covariance, &rhs) {
            Some(w) => w,
            None => {
                let ridge = 1e-6 * (covariance.diag().sum() / n_features as f64).max(1e-12);
                log::warn!("Pooled covariance is singular; adding ridge {:.3e}", ridge);
                for i in 0..n_features {
                    covariance[(i, i)] += ridge;
                }
                match cholesky_solve(&covariance, &rhs) {
                    Some(w) => w,
                    None => bail!("Pooled covariance is not positive definite"),
                }
            }
        };

        let mut coefficients = Array2::<f64>::zeros((n_features, n_classes));
        let mut intercepts = Array1::<f64>::from_elem(n_classes, f64::NEG_INFINITY);
        for k in 0..n_classes {
            if counts[k] == 0 {
                continue;
            }
            let w = solved.column(k);
            let prior = counts[k] as f64 / n_rows as f64;
            intercepts[k] = -0.5 * means.row(k).dot(&w) + prior.ln();
            coefficients.column_mut(k).assign(&w);
        }

        log::trace!(
            "Fitted LDA on {} rows, {} of {} classes present",
            n_rows,
            present,
            n_classes
        );
        Ok(LdaClassifier {
            coefficients,
            intercepts,
        })
    }

    /// Discriminant scores, shape (n_rows, n_classes).
    pub fn decision_function(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut scores = x.dot(&self.coefficients);
        for mut row in scores.outer_iter_mut() {
            row += &self.intercepts;
        }
        scores
    }
}

impl Classifier for LdaClassifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self
            .decision_function(x)
            .outer_iter()
            .map(|row| argmax(row.iter().copied()))
            .collect())
    }

    fn name(&self) -> &str {
        "lda"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_data::three_blobs;
    use ndarray::array;

    #[test]
    fn lda_separates_blobs() {
        let (x, y) = three_blobs();
        let lda = LdaClassifier::fit(&x, &y, 3, 0.0).unwrap();
        assert_eq!(lda.predict(&x).unwrap(), y);
    }

    #[test]
    fn absent_class_is_never_predicted() {
        let (x, y) = three_blobs();
        let lda = LdaClassifier::fit(&x, &y, 4, 0.2).unwrap();
        assert!(lda.predict(&x).unwrap().iter().all(|&c| c < 3));
    }

    #[test]
    fn collinear_features_fall_back_to_ridge() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [10.0, 10.0], [11.0, 11.0]];
        let y = Array1::from_vec(vec![0usize, 0, 1, 1]);
        let lda = LdaClassifier::fit(&x, &y, 2, 0.0).unwrap();
        assert_eq!(lda.predict(&x).unwrap(), y);
    }

    #[test]
    fn invalid_shrinkage_is_rejected() {
        let (x, y) = three_blobs();
        assert!(LdaClassifier::fit(&x, &y, 3, 1.5).is_err());
    }
}
