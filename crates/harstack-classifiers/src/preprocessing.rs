//! Small preprocessing utilities shared by the reducer and the models.
//!
//! Provides a simple Scaler for mean/std standardization on `ndarray`
//! matrices (rows are samples, columns are features).

use ndarray::{Array1, Array2, Axis};

use crate::error::DataShapeError;

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq)]
pub struct Scaler {
    pub mean: Array1<f64>,
    pub std: Array1<f64>,
}

impl Scaler {
    /// Below this stddev a column is treated as constant and left unscaled.
    const MIN_STD: f64 = 1e-9;

    /// Fit a `Scaler` using the population standard deviation of each column.
    pub fn fit(x: &Array2<f64>) -> Result<Scaler, DataShapeError> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 || ncols == 0 {
            return Err(DataShapeError::DimensionMismatch {
                expected: 1,
                found: 0,
            });
        }
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(ncols));
        let mut std = x.std_axis(Axis(0), 0.0);
        let mut constant = 0;
        for s in std.iter_mut() {
            if *s < Self::MIN_STD || !s.is_finite() {
                *s = 1.0;
                constant += 1;
            }
        }
        if constant > 0 {
            log::warn!("{} constant feature columns will not be scaled", constant);
        }
        Ok(Scaler { mean, std })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Transform all rows using this scaler and return a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, DataShapeError> {
        if x.ncols() != self.n_features() {
            return Err(DataShapeError::DimensionMismatch {
                expected: self.n_features(),
                found: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fit_computes_mean_and_population_std() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let sc = Scaler::fit(&x).unwrap();
        assert!((sc.mean[0] - 2.5).abs() < 1e-12);
        assert!((sc.mean[1] - 25.0).abs() < 1e-12);
        assert!((sc.std[0] - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_columns_keep_unit_scale() {
        let x = array![[5.0, 1.0], [5.0, 2.0]];
        let sc = Scaler::fit(&x).unwrap();
        assert_eq!(sc.std[0], 1.0);
        let t = sc.transform(&x).unwrap();
        assert_eq!(t[(0, 0)], 0.0);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let sc = Scaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(sc.transform(&array![[1.0]]).is_err());
    }

    #[test]
    fn transform_centers_columns() {
        let x = array![[1.0, 100.0], [2.0, 200.0], [3.0, 300.0]];
        let t = Scaler::fit(&x).unwrap().transform(&x).unwrap();
        for c in 0..2 {
            assert!(t.column(c).sum().abs() < 1e-12);
        }
    }
}
