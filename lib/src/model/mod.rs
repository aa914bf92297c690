//! Inference-only model seam.
//!
//! Models are trained elsewhere; this crate only needs "numeric feature vector
//! in, scalar out". Implementations must be `Send + Sync` so a predictor can be
//! shared across serving threads.

pub mod linear;

pub use linear::{LinearParams, LinearRegressor, LogisticClassifier};

use crate::error::Result;
use ndarray::{Array2, ArrayView1};

/// A fitted regressor.
pub trait Regressor: Send + Sync {
    /// Number of input features the model expects.
    fn n_features(&self) -> usize;

    /// Predict on a single sample.
    fn predict(&self, input: ArrayView1<'_, f64>) -> Result<f64>;

    /// Predict on every row of a batch.
    fn predict_batch(&self, input: &Array2<f64>) -> Result<Vec<f64>> {
        input.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

/// A fitted binary classifier.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    /// Probability of the positive class, in `[0, 1]`.
    fn predict_proba(&self, input: ArrayView1<'_, f64>) -> Result<f64>;
}
