//! Linear models: `y = w^T x + b`.
//!
//! [`LinearRegressor`] returns the raw linear output; [`LogisticClassifier`]
//! passes it through the logistic function. Both hold only prediction
//! parameters and load from JSON files such as
//!
//! ```json
//! { "weights": [0.12, -0.5, 3.0], "bias": 1.5 }
//! ```

use crate::error::{FeatureError, Result};
use crate::model::{Classifier, Regressor};
use crate::serialization::{read_json, write_json};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable representation of linear model parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearParams {
    fn validate(&self) -> Result<()> {
        if self.weights.is_empty() {
            return Err(FeatureError::InvalidParameter(
                "linear model needs at least one weight".to_string(),
            ));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(FeatureError::InvalidParameter(
                "linear model parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Linear {
    weights: Array1<f64>,
    bias: f64,
}

impl Linear {
    fn new(params: LinearParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            weights: Array1::from(params.weights),
            bias: params.bias,
        })
    }

    fn forward(&self, input: ArrayView1<'_, f64>) -> Result<f64> {
        if input.len() != self.weights.len() {
            return Err(FeatureError::FeatureMismatch {
                expected_features: self.weights.len(),
                got_features: input.len(),
            });
        }
        Ok(self.weights.dot(&input) + self.bias)
    }

    fn params(&self) -> LinearParams {
        LinearParams {
            weights: self.weights.to_vec(),
            bias: self.bias,
        }
    }
}

/// Inference-only linear regression.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearRegressor {
    inner: Linear,
}

impl LinearRegressor {
    pub fn new(params: LinearParams) -> Result<Self> {
        Ok(Self {
            inner: Linear::new(params)?,
        })
    }

    pub fn params(&self) -> LinearParams {
        self.inner.params()
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(read_json(path)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(&self.params(), path)
    }
}

impl Regressor for LinearRegressor {
    fn n_features(&self) -> usize {
        self.inner.weights.len()
    }

    fn predict(&self, input: ArrayView1<'_, f64>) -> Result<f64> {
        self.inner.forward(input)
    }
}

/// Inference-only logistic regression.
#[derive(Clone, Debug, PartialEq)]
pub struct LogisticClassifier {
    inner: Linear,
}

impl LogisticClassifier {
    pub fn new(params: LinearParams) -> Result<Self> {
        Ok(Self {
            inner: Linear::new(params)?,
        })
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(read_json(path)?)
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.inner.weights.len()
    }

    fn predict_proba(&self, input: ArrayView1<'_, f64>) -> Result<f64> {
        let z = self.inner.forward(input)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}
