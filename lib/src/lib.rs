//! # phone-features
//!
//! Feature engineering for scraped phone listings with strict separation
//! between training and inference.
//!
//! ## Core Design Principles
//!
//! - **Fit once, replay everywhere**: every statistic a transform needs (medians,
//!   bounds, score references, scaler moments) is learned by `fit` and stored in
//!   an immutable fitted type. `transform` never re-estimates anything.
//! - **Typed boundary**: loosely typed raw tables are validated once into a
//!   typed schema before any derivation runs.
//! - **Serializable state**: fitted transformers round-trip through bincode so
//!   serving uses exactly the training-time statistics.
//!
//! ## Quick Start
//!
//! ```rust
//! use phone_features::dataset::{RawRecord, RawTable};
//! use phone_features::features::Feature;
//! use phone_features::preprocessing::PhoneTransformer;
//! use phone_features::{FittedTransformer, Transformer};
//!
//! let train = RawTable::from_records(vec![
//!     RawRecord::new()
//!         .with("ScreenSize", 6.1)
//!         .with("Resolution", "1170x2532")
//!         .with("main_camera_mp", 12.0)
//!         .with("num_cameras", 3.0)
//!         .with("NumberOfReview", 200.0)
//!         .with("DiscountedPrice", 15_000_000.0),
//!     RawRecord::new()
//!         .with("ScreenSize", 6.7)
//!         .with("Resolution", "1080x2400")
//!         .with("main_camera_mp", 50.0)
//!         .with("num_cameras", 2.0)
//!         .with("NumberOfReview", 40.0)
//!         .with("DiscountedPrice", 7_990_000.0),
//! ]);
//!
//! let fitted = PhoneTransformer::new().fit(&train).unwrap();
//! let serving = RawRecord::new()
//!     .with("ScreenSize", 6.1)
//!     .with("Resolution", "1170x2532")
//!     .with("main_camera_mp", 12.0)
//!     .with("num_cameras", 3.0)
//!     .with("NumberOfReview", 200.0)
//!     .with("DiscountedPrice", 15_000_000.0);
//! let features = fitted.transform_record(&serving).unwrap();
//! assert_eq!(features.get(Feature::IsPremium), Some(1.0));
//! ```
//!
//! ## Module Structure
//!
//! - `dataset` - raw record ingestion from CSV or code
//! - `schema` - typed row schema the raw tables are validated into
//! - `preprocessing` - phone feature transformer, target transformer, scaler
//! - `features` - feature groups, `"<group>:<feature>"` references, frames
//! - `store` - feature store seam and named feature services
//! - `model` - inference-only regressor/classifier seam
//! - `serving` - price and multi-service predictors
//! - `training` - split, fit, transform and artifact persistence
//! - `config` - TOML-loadable configuration

pub mod config;

/// Raw record ingestion.
pub mod dataset;

/// Crate error type.
pub mod error;

pub mod features;

/// Inference-only model seam.
pub mod model;

pub mod numeric;

/// Fit/transform preprocessing.
pub mod preprocessing;

pub mod schema;

/// Parameter persistence.
pub mod serialization;

pub mod serving;
pub mod store;
pub mod training;
pub mod traits;

pub use error::{FeatureError, Result};
pub use traits::{FittedTransformer, Transformer};
