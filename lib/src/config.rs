//! Configuration for the feature pipeline.
//!
//! Every struct has a `Default` matching the production constants and accepts
//! partial TOML files: missing keys fall back to the defaults.
//!
//! ```toml
//! [transformer]
//! normalize = false
//!
//! [transformer.outlier_bounds.ScreenSize]
//! low = 4.0
//! high = 8.0
//!
//! [target]
//! log_transform = true
//! outlier_threshold = 70000000.0
//! ```

use crate::error::{FeatureError, Result};
use crate::schema::RawColumn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder the scraper writes instead of a price ("price on request").
pub const PRICE_ON_REQUEST: &str = "Giá Liên Hệ";

/// Inclusive physically plausible range for a raw numeric attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub low: f64,
    pub high: f64,
}

impl Bounds {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// The two free-text phrases a capability flag is scraped as.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPhrases {
    pub positive: String,
    pub negative: String,
}

impl BinaryPhrases {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }
}

/// Weights, floors and thresholds of the derived score features.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Minimum ceiling for `main_camera_mp` in `camera_rating`.
    pub camera_mp_floor: f64,
    /// Minimum ceiling for `num_cameras` in `camera_rating`.
    pub camera_count_floor: f64,
    /// Minimum ceiling for `camera_feature_count` in `camera_rating`.
    pub camera_feature_floor: f64,
    /// Percentile of the fit batch used as the `display_score` reference.
    pub display_percentile: f64,
    /// Prices at or above this are premium.
    pub premium_threshold: f64,
    /// Prices at or below this are budget.
    pub budget_threshold: f64,
    /// Prices (in millions) at or below this get a zero `value_score`.
    pub min_price_millions: f64,
    /// Minimum reference for `camera_score` in the value numerator.
    pub camera_score_floor: f64,
    /// `value_score` of the best value seen at fit.
    pub value_scale: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            camera_mp_floor: 50.0,
            camera_count_floor: 5.0,
            camera_feature_floor: 3.0,
            display_percentile: 0.9,
            premium_threshold: 15_000_000.0,
            budget_threshold: 8_000_000.0,
            min_price_millions: 0.1,
            camera_score_floor: 1.0,
            value_scale: 10.0,
        }
    }
}

/// Configuration of the phone feature transformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Raw columns dropped before anything else runs.
    pub dropped_columns: Vec<String>,
    /// Text treated as a missing price.
    pub price_placeholder: String,
    /// Free-text phrases per capability flag column.
    pub binary_phrases: BTreeMap<String, BinaryPhrases>,
    /// Domain bounds per raw numeric column; values outside become the median.
    pub outlier_bounds: BTreeMap<String, Bounds>,
    /// Standardize the cleaned base columns in the output.
    pub normalize: bool,
    pub scores: ScoreConfig,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        let dropped_columns = [
            "Link",
            "Name",
            "Brand",
            "DiscountedPercent",
            "SoldQuantity",
            "BatteryCapacity",
            "FrontCamera",
            "GPU",
            "ChargingPort",
            "RAM",
            "ROM",
            "Rating",
            "Description",
            "data_source",
            "is_new_product",
            "has_original_accessories",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let mut binary_phrases = BTreeMap::new();
        binary_phrases.insert(
            RawColumn::HasTelephoto.name().to_string(),
            BinaryPhrases::new("Có camera tele", "Không có camera tele"),
        );
        binary_phrases.insert(
            RawColumn::HasUltrawide.name().to_string(),
            BinaryPhrases::new("Có camera siêu rộng", "Không có camera siêu rộng"),
        );
        binary_phrases.insert(
            RawColumn::HasOis.name().to_string(),
            BinaryPhrases::new("Có chống rung OIS", "Không có chống rung OIS"),
        );
        binary_phrases.insert(
            RawColumn::HasWarranty.name().to_string(),
            BinaryPhrases::new("Có bảo hành", "Không có bảo hành"),
        );

        let mut outlier_bounds = BTreeMap::new();
        for (column, low, high) in [
            (RawColumn::ScreenSize, 4.0, 8.0),
            (RawColumn::NumberOfReview, 0.0, 1000.0),
            (RawColumn::MainCameraMp, 5.0, 200.0),
            (RawColumn::NumCameras, 1.0, 5.0),
            (RawColumn::ResWidth, 720.0, 3840.0),
            (RawColumn::ResHeight, 720.0, 2160.0),
        ] {
            outlier_bounds.insert(column.name().to_string(), Bounds::new(low, high));
        }

        Self {
            dropped_columns,
            price_placeholder: PRICE_ON_REQUEST.to_string(),
            binary_phrases,
            outlier_bounds,
            normalize: false,
            scores: ScoreConfig::default(),
        }
    }
}

impl TransformerConfig {
    /// Enable or disable standard scaling of the base columns.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Override the outlier bounds of one raw column.
    pub fn with_bounds(mut self, column: RawColumn, bounds: Bounds) -> Self {
        self.outlier_bounds.insert(column.name().to_string(), bounds);
        self
    }

    /// Override the derived-score constants.
    pub fn with_scores(mut self, scores: ScoreConfig) -> Self {
        self.scores = scores;
        self
    }

    /// Outlier bounds keyed by schema column.
    pub fn resolved_bounds(&self) -> Result<BTreeMap<RawColumn, Bounds>> {
        let mut resolved = BTreeMap::new();
        for (name, bounds) in &self.outlier_bounds {
            let column = RawColumn::from_name(name).ok_or_else(|| {
                FeatureError::InvalidParameter(format!("outlier bounds for unknown column '{name}'"))
            })?;
            if bounds.low.is_nan() || bounds.high.is_nan() || bounds.low > bounds.high {
                return Err(FeatureError::InvalidParameter(format!(
                    "outlier bounds for '{name}' have low {} above high {}",
                    bounds.low, bounds.high
                )));
            }
            resolved.insert(column, *bounds);
        }
        Ok(resolved)
    }

    /// Check cross-field constraints once, before fitting.
    pub fn validate(&self) -> Result<()> {
        self.resolved_bounds()?;
        for name in self.binary_phrases.keys() {
            match RawColumn::from_name(name) {
                Some(column) if column.is_flag() => {}
                _ => {
                    return Err(FeatureError::InvalidParameter(format!(
                        "binary phrases configured for non-flag column '{name}'"
                    )))
                }
            }
        }
        let s = &self.scores;
        if !(0.0..=1.0).contains(&s.display_percentile) {
            return Err(FeatureError::InvalidParameter(format!(
                "display_percentile must be in [0, 1], got {}",
                s.display_percentile
            )));
        }
        if s.budget_threshold > s.premium_threshold {
            return Err(FeatureError::InvalidParameter(format!(
                "budget_threshold {} exceeds premium_threshold {}",
                s.budget_threshold, s.premium_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration of the target (price) transformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Apply `log1p` compression after cleaning.
    pub log_transform: bool,
    /// Replace targets above `outlier_threshold` with the fitted median.
    pub handle_outliers: bool,
    pub outlier_threshold: f64,
    pub price_placeholder: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            log_transform: true,
            handle_outliers: true,
            outlier_threshold: 70_000_000.0,
            price_placeholder: PRICE_ON_REQUEST.to_string(),
        }
    }
}

impl TargetConfig {
    pub fn with_log_transform(mut self, log_transform: bool) -> Self {
        self.log_transform = log_transform;
        self
    }

    pub fn with_handle_outliers(mut self, handle_outliers: bool) -> Self {
        self.handle_outliers = handle_outliers;
        self
    }

    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = threshold;
        self
    }
}

/// Train/test split of the training driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Top-level configuration file of the training driver and CLI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub transformer: TransformerConfig,
    pub target: TargetConfig,
    pub split: SplitConfig,
    /// Rows with this many missing cells or more are dropped before fitting.
    pub max_missing_per_row: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transformer: TransformerConfig::default(),
            target: TargetConfig::default(),
            split: SplitConfig::default(),
            max_missing_per_row: 6,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text)?;
        config.transformer.validate()?;
        if !(0.0..1.0).contains(&config.split.test_fraction) {
            return Err(FeatureError::InvalidParameter(format!(
                "test_fraction must be in [0, 1), got {}",
                config.split.test_fraction
            )));
        }
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
