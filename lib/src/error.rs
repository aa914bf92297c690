//! Error types for fitting, transforming and serving phone features.

use thiserror::Error;

/// Error type shared by every stage of the feature pipeline.
///
/// Data-integrity problems (`DataQuality`, `FeatureMissing`, `SchemaMismatch`)
/// are never recovered inside the crate; they surface to the caller so the
/// calling pipeline decides whether to drop, re-impute or abort.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A numeric feature has no valid values at fit time, so its median is undefined.
    #[error("Data quality error: feature '{feature}' has no valid values to fit a median")]
    DataQuality { feature: String },

    /// A raw attribute needed for a derivation is absent and cannot be defaulted.
    #[error("Feature missing: {0}")]
    FeatureMissing(String),

    /// The fitted state does not describe any column of the input table.
    #[error("Schema mismatch: fitted features {expected:?} do not overlap input columns {got:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Model arity does not match the number of selected features.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },

    /// A feature reference names an unknown group or feature.
    #[error("Unknown feature reference: {0}")]
    UnknownFeature(String),

    /// The feature store has no row for the requested entity key.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<bincode::Error> for FeatureError {
    fn from(err: bincode::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FeatureError {
    fn from(err: serde_json::Error) -> Self {
        FeatureError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_data_quality() {
        let err = FeatureError::DataQuality {
            feature: "ScreenSize".to_string(),
        };
        assert!(err.to_string().contains("ScreenSize"));
        assert!(err.to_string().contains("Data quality"));
    }

    #[test]
    fn test_error_display_schema_mismatch() {
        let err = FeatureError::SchemaMismatch {
            expected: vec!["ScreenSize".to_string()],
            got: vec!["color".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Schema mismatch"));
        assert!(msg.contains("color"));
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = FeatureError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert!(err.to_string().contains("expected 5 features, got 3"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: FeatureError = io_err.into();
        assert!(matches!(err, FeatureError::Io(_)));
    }

    #[test]
    fn test_error_from_bincode_error() {
        let bad_bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff];
        let bincode_result: std::result::Result<String, bincode::Error> =
            bincode::deserialize(bad_bytes);
        if let Err(e) = bincode_result {
            let err: FeatureError = e.into();
            assert!(matches!(err, FeatureError::Serialization(_)));
        }
    }

    #[test]
    fn test_error_is_std_error() {
        let err = FeatureError::InvalidParameter("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
