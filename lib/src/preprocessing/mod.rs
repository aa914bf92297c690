//! Fit/transform preprocessing for phone listings.
//!
//! # Transformers
//!
//! - [`PhoneTransformer`]: raw listing table to engineered feature frame
//! - [`TargetTransformer`]: raw prices to model targets (and back)
//! - [`StandardScaler`]: z-score scaling of numeric matrices
//!
//! Every transformer follows the same split: the unfitted type holds only
//! configuration, `fit` returns an immutable fitted type that owns the learned
//! statistics and can be saved with
//! [`FittedTransformer::save_to_file`](crate::FittedTransformer::save_to_file).
//!
//! ```ignore
//! let fitted = PhoneTransformer::new().fit(&train)?;
//! fitted.save_to_file("features.bin")?;
//!
//! // later, at serving time
//! let loaded = FittedPhoneTransformer::load_from_file("features.bin")?;
//! let engineered = loaded.transform(&incoming)?;
//! ```

pub mod cleaning;
pub mod phone;
pub mod scaling;
pub mod scores;
pub mod target;

pub use phone::{FittedPhoneTransformer, FittedTransformState, PhoneTransformer};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use scores::ScoreReferences;
pub use target::{FittedTargetTransformer, TargetParams, TargetTransformer};
