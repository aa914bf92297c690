//! Core traits for fit/transform components.
//!
//! Every component is split in two:
//! - [`Transformer`]: Used during fitting; carries configuration and learns from data.
//! - [`FittedTransformer`]: After fitting; immutable, ready for inference and serialization.

use crate::error::{FeatureError, Result};
use crate::serialization::SerializableParams;

/// Trait for unfitted transformers.
///
/// An unfitted transformer holds only configuration. `fit` consumes a training
/// batch and produces the corresponding fitted type, which owns every statistic
/// later used by `transform`.
///
/// # Example
/// ```ignore
/// use phone_features::preprocessing::PhoneTransformer;
/// use phone_features::{FittedTransformer, Transformer};
///
/// let fitted = PhoneTransformer::new().fit(&train)?;
/// let engineered = fitted.transform(&serving_batch)?;
/// ```
pub trait Transformer: Clone {
    /// Batch the transformer learns from and later transforms.
    type Input: ?Sized;
    /// Transformed batch.
    type Output;
    /// Learned statistics in persistable form.
    type Params: SerializableParams;
    /// Immutable counterpart returned by `fit`.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Learn every statistic `transform` will need from a training batch.
    ///
    /// # Errors
    /// Returns [`FeatureError`] if:
    /// - Data is empty
    /// - A feature has no valid values to learn from
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the same data in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output> {
        self.fit(data)?.transform(data)
    }
}

/// Fitted state that replays the learned statistics on new batches.
///
/// # Guarantees
/// - `transform` never mutates the learned parameters.
/// - `from_params(extract_params())` rebuilds an equal transformer.
/// - Files written by `save_to_file` load on any platform.
pub trait FittedTransformer: Clone {
    /// Batch accepted by `transform`.
    type Input: ?Sized;
    /// Transformed batch.
    type Output;
    /// Learned statistics in persistable form.
    type Params: SerializableParams;

    /// Apply the stored statistics to a batch.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output>;

    /// Map a transformed batch back to the input scale, where that exists.
    ///
    /// # Errors
    /// Returns [`FeatureError::InvalidParameter`] if the transformer is not invertible.
    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Output>;

    /// Copy of the learned statistics.
    fn extract_params(&self) -> Self::Params;

    /// Rebuild from persisted statistics, validating them first.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Number of input columns the statistics were learned over.
    fn n_features_in(&self) -> usize;

    /// Write the learned statistics to `path` as bincode.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let bytes = self
            .extract_params()
            .to_bytes()
            .map_err(|e| FeatureError::Serialization(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read statistics written by [`save_to_file`](Self::save_to_file).
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let params = Self::Params::from_bytes(&std::fs::read(path)?)
            .map_err(|e| FeatureError::Serialization(e.to_string()))?;
        Self::from_params(params)
    }
}
