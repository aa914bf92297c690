//! Standard scaler (z-score normalization).
//!
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the column mean and `s` the population standard deviation of
//! the training samples. Constant columns get `s = 1`.
//!
//! # Example
//! ```rust
//! use ndarray::array;
//! use phone_features::preprocessing::StandardScaler;
//! use phone_features::{FittedTransformer, Transformer};
//!
//! let x = array![[1.0, 10.0], [3.0, 10.0]];
//! let fitted = StandardScaler::new().fit(&x).unwrap();
//! let z = fitted.transform(&x).unwrap();
//! assert_eq!(z, array![[-1.0, 0.0], [1.0, 0.0]]);
//! ```

use crate::error::{FeatureError, Result};
use crate::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Standard deviation of each feature, zero replaced by one.
    pub std: Vec<f64>,
}

/// StandardScaler transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        if data.nrows() == 0 {
            return Err(FeatureError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| FeatureError::EmptyData("no rows to average".to_string()))?;
        // population std (ddof = 0); constant features keep their scale
        let std = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        Ok(FittedStandardScaler { mean, std })
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedStandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn std(&self) -> ArrayView1<'_, f64> {
        self.std.view()
    }

    fn check_width(&self, cols: usize) -> Result<()> {
        if cols != self.mean.len() {
            return Err(FeatureError::FeatureMismatch {
                expected_features: self.mean.len(),
                got_features: cols,
            });
        }
        Ok(())
    }

    /// Scale a single sample.
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.std)
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Input = Array2<f64>;
    type Output = Array2<f64>;
    type Params = StandardScalerParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        self.check_width(data.ncols())?;
        Ok((data - &self.mean) / &self.std)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Input> {
        self.check_width(data.ncols())?;
        Ok(data * &self.std + &self.mean)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.mean.len() != params.std.len() {
            return Err(FeatureError::InvalidParameter(format!(
                "scaler has {} means but {} deviations",
                params.mean.len(),
                params.std.len()
            )));
        }
        if params.std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(FeatureError::InvalidParameter(
                "scaler deviations must be finite and non-zero".to_string(),
            ));
        }
        Ok(Self {
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler_basic() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.mean().to_vec(), vec![3.0, 4.0]);

        let scaled = fitted.transform(&data).unwrap();
        // mean of each column is 0 after scaling
        for col in scaled.columns() {
            assert!(col.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_keeps_unit_std() {
        let data = array![[7.0], [7.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        assert_eq!(fitted.std().to_vec(), vec![1.0]);
        assert_eq!(fitted.transform(&data).unwrap(), array![[0.0], [0.0]]);
    }

    #[test]
    fn test_inverse_transform() {
        let data = array![[1.0, -2.0], [4.0, 8.0], [2.5, 0.5]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let back = fitted
            .inverse_transform(&fitted.transform(&data).unwrap())
            .unwrap();
        for (a, b) in back.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_feature_mismatch() {
        let fitted = StandardScaler::new().fit(&array![[1.0, 2.0]]).unwrap();
        let result = fitted.transform(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(
            result,
            Err(FeatureError::FeatureMismatch {
                expected_features: 2,
                got_features: 3
            })
        ));
    }

    #[test]
    fn test_empty_data_error() {
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            StandardScaler::new().fit(&empty),
            Err(FeatureError::EmptyData(_))
        ));
    }

    #[test]
    fn test_params_round_trip() {
        let fitted = StandardScaler::new()
            .fit(&array![[1.0, 2.0], [3.0, 5.0]])
            .unwrap();
        let restored = FittedStandardScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(restored, fitted);
        assert_eq!(restored.n_features_in(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.bin");
        let fitted = StandardScaler::new()
            .fit(&array![[1.0], [2.0], [6.0]])
            .unwrap();
        fitted.save_to_file(&path).unwrap();
        let loaded = FittedStandardScaler::load_from_file(&path).unwrap();
        assert_eq!(loaded, fitted);
    }
}
