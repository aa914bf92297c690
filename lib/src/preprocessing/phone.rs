//! Phone feature transformer.
//!
//! [`PhoneTransformer::fit`] learns a [`FittedTransformState`] from a raw
//! training table; [`FittedPhoneTransformer::transform`] replays the same
//! cleaning with the stored statistics and derives the engineered groups.
//! Nothing is re-estimated at transform time, so a listing transformed on its
//! own gets exactly the values it gets inside a batch.
//!
//! # Example
//! ```rust
//! use phone_features::dataset::{RawRecord, RawTable};
//! use phone_features::features::Feature;
//! use phone_features::preprocessing::PhoneTransformer;
//! use phone_features::{FittedTransformer, Transformer};
//!
//! let train = RawTable::from_records(vec![RawRecord::new()
//!     .with("ScreenSize", 6.1)
//!     .with("Resolution", "1170x2532")
//!     .with("main_camera_mp", 12.0)
//!     .with("num_cameras", 3.0)
//!     .with("NumberOfReview", 200.0)]);
//!
//! let fitted = PhoneTransformer::new().fit(&train).unwrap();
//! let frame = fitted.transform(&train).unwrap();
//! assert_eq!(frame.get(0, Feature::TotalResolution), Some(2_962_440.0));
//! ```

use crate::config::{Bounds, TransformerConfig};
use crate::dataset::{RawRecord, RawTable};
use crate::error::{FeatureError, Result};
use crate::features::{EngineeredFeatureVector, EngineeredFrame, Feature, FeatureGroup};
use crate::numeric::finite_or_zero;
use crate::preprocessing::cleaning;
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::scores::{BaseFeatures, Ratings, ScoreReferences, ValueFeatures};
use crate::schema::{Fallback, PhoneTable, RawColumn, Requirement, SCHEMA};
use crate::serialization::write_json;
use crate::traits::{FittedTransformer, Transformer};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output columns that pass a cleaned raw attribute through, and are the
/// ones standardized when normalization is on.
const SCALED_FEATURES: [Feature; 10] = [
    Feature::ScreenSize,
    Feature::ResWidth,
    Feature::ResHeight,
    Feature::MainCameraMp,
    Feature::NumCameras,
    Feature::HasTelephoto,
    Feature::HasUltrawide,
    Feature::HasOis,
    Feature::NumberOfReview,
    Feature::HasWarranty,
];

/// Everything a fitted transformer knows. Immutable after fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformState {
    pub config: TransformerConfig,
    /// Schema columns present in the fit table after cleaning.
    pub numeric_feature_names: Vec<String>,
    pub median_by_feature: BTreeMap<RawColumn, f64>,
    pub outlier_bounds_by_feature: BTreeMap<RawColumn, Bounds>,
    pub score_references: ScoreReferences,
    pub scaler: Option<StandardScalerParams>,
}

/// Unfitted phone transformer: configuration only.
#[derive(Clone, Debug, Default)]
pub struct PhoneTransformer {
    config: TransformerConfig,
}

impl PhoneTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TransformerConfig) -> Self {
        Self { config }
    }

    /// Enable standard scaling of the pass-through columns.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.config.normalize = normalize;
        self
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }
}

/// Give absent schema columns a value for every row.
///
/// Required columns take their stored median; flags default to zero; the
/// price stays absent.
fn complete_columns(table: &mut PhoneTable, medians: &BTreeMap<RawColumn, f64>) -> Result<()> {
    for spec in SCHEMA.iter() {
        let column = spec.column;
        if table.has(column) {
            continue;
        }
        match (spec.requirement, spec.fallback) {
            (Requirement::Required, _) | (_, Fallback::Median) => {
                let median = medians.get(&column).copied().ok_or_else(|| {
                    FeatureError::FeatureMissing(format!(
                        "required column '{}' is absent and has no fitted median",
                        column.name()
                    ))
                })?;
                warn!(
                    column = column.name(),
                    median, "absent column substituted with fitted median"
                );
                cleaning::fill_column(table, column, median);
            }
            (Requirement::Optional, Fallback::Zero) => cleaning::fill_column(table, column, 0.0),
            (Requirement::Optional, Fallback::Absent) => {}
        }
    }
    Ok(())
}

fn scaled_matrix(bases: &[BaseFeatures]) -> Array2<f64> {
    Array2::from_shape_fn((bases.len(), SCALED_FEATURES.len()), |(i, j)| {
        SCALED_FEATURES[j]
            .raw_column()
            .and_then(|c| bases[i].raw(c))
            .unwrap_or(0.0)
    })
}

impl Transformer for PhoneTransformer {
    type Input = RawTable;
    type Output = EngineeredFrame;
    type Params = FittedTransformState;
    type Fitted = FittedPhoneTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        if data.is_empty() {
            return Err(FeatureError::EmptyData(
                "Cannot fit PhoneTransformer on an empty table".to_string(),
            ));
        }
        self.config.validate()?;
        let bounds = self.config.resolved_bounds()?;

        let mut typed = cleaning::to_typed(data, &self.config);
        let medians = cleaning::median_snapshot(&typed)?;
        let numeric_feature_names = typed.column_names();

        complete_columns(&mut typed, &medians)?;
        let outliers = cleaning::replace_outliers(&mut typed, &bounds, &medians);
        let imputed = cleaning::impute_missing(&mut typed, &medians);

        let bases: Vec<BaseFeatures> = typed.rows.iter().map(BaseFeatures::from_row).collect();
        let score_references = ScoreReferences::fit(&bases, &self.config.scores);

        let scaler = if self.config.normalize {
            let fitted = StandardScaler::new().fit(&scaled_matrix(&bases))?;
            Some(fitted.extract_params())
        } else {
            None
        };

        info!(
            rows = data.len(),
            features = numeric_feature_names.len(),
            outliers,
            imputed,
            normalize = self.config.normalize,
            "fitted phone transformer"
        );

        FittedPhoneTransformer::from_params(FittedTransformState {
            config: self.config.clone(),
            numeric_feature_names,
            median_by_feature: medians,
            outlier_bounds_by_feature: bounds,
            score_references,
            scaler,
        })
    }
}

/// Fitted phone transformer ready for inference.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedPhoneTransformer {
    state: FittedTransformState,
    scaler: Option<FittedStandardScaler>,
}

impl FittedPhoneTransformer {
    pub fn state(&self) -> &FittedTransformState {
        &self.state
    }

    /// Whether the output carries the `phone_value` group when prices are given.
    pub fn has_value_group(&self) -> bool {
        self.state.score_references.value_ratio_max.is_some()
    }

    /// Engineered column names for inputs that carry a price.
    pub fn feature_names_out(&self) -> Vec<&'static str> {
        self.output_features(true).iter().map(|f| f.name()).collect()
    }

    fn output_features(&self, with_price: bool) -> Vec<Feature> {
        let include_value = with_price && self.has_value_group();
        Feature::ALL
            .iter()
            .copied()
            .filter(|f| include_value || f.group() != FeatureGroup::Value)
            .collect()
    }

    /// Transform a single listing.
    pub fn transform_record(&self, record: &RawRecord) -> Result<EngineeredFeatureVector> {
        let table = RawTable::from_records(vec![record.clone()]);
        let frame = self.transform(&table)?;
        frame
            .row(0)
            .ok_or_else(|| FeatureError::EmptyData("transform returned no rows".to_string()))
    }

    /// Export the fitted state as JSON for inspection.
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(&self.state, path)
    }

    fn row_values(
        &self,
        features: &[Feature],
        base: &BaseFeatures,
        ratings: &Ratings,
        value: Option<&ValueFeatures>,
    ) -> Result<Vec<f64>> {
        let mut scaled: Option<Array1<f64>> = None;
        if let Some(scaler) = &self.scaler {
            let raw = Array1::from_iter(SCALED_FEATURES.iter().map(|f| {
                f.raw_column().and_then(|c| base.raw(c)).unwrap_or(0.0)
            }));
            scaled = Some(scaler.transform_row(raw.view())?);
        }

        let values = features
            .iter()
            .map(|&feature| {
                let scaled_value = scaled.as_ref().and_then(|s| {
                    SCALED_FEATURES
                        .iter()
                        .position(|f| *f == feature)
                        .map(|j| s[j])
                });
                let v = scaled_value.unwrap_or_else(|| feature_value(feature, base, ratings, value));
                finite_or_zero(v)
            })
            .collect();
        Ok(values)
    }
}

fn feature_value(
    feature: Feature,
    base: &BaseFeatures,
    ratings: &Ratings,
    value: Option<&ValueFeatures>,
) -> f64 {
    match feature {
        Feature::Ppi => base.ppi,
        Feature::TotalResolution => base.total_resolution,
        Feature::CameraFeatureCount => base.camera_feature_count,
        Feature::CameraScore => base.camera_score,
        Feature::CameraRating => ratings.camera_rating,
        Feature::DisplayScore => ratings.display_score,
        Feature::PopularityScore => ratings.popularity_score,
        Feature::OverallScore => ratings.overall_score,
        Feature::ValueScore => value.map_or(0.0, |v| v.value_score),
        Feature::IsPremium => value.map_or(0.0, |v| v.is_premium),
        Feature::PriceSegment => value.map_or(0.0, |v| v.price_segment),
        passthrough => passthrough
            .raw_column()
            .and_then(|c| base.raw(c))
            .unwrap_or(0.0),
    }
}

impl FittedTransformer for FittedPhoneTransformer {
    type Input = RawTable;
    type Output = EngineeredFrame;
    type Params = FittedTransformState;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        let state = &self.state;
        let mut typed = cleaning::to_typed(data, &state.config);

        let overlaps = typed
            .columns()
            .any(|c| state.numeric_feature_names.iter().any(|n| n == c.name()));
        if !overlaps {
            return Err(FeatureError::SchemaMismatch {
                expected: state.numeric_feature_names.clone(),
                got: data.columns().to_vec(),
            });
        }

        complete_columns(&mut typed, &state.median_by_feature)?;
        let outliers =
            cleaning::replace_outliers(&mut typed, &state.outlier_bounds_by_feature, &state.median_by_feature);
        let imputed = cleaning::impute_missing(&mut typed, &state.median_by_feature);

        let features = self.output_features(typed.has(RawColumn::DiscountedPrice));
        let mut values = Array2::<f64>::zeros((typed.len(), features.len()));
        let refs = &state.score_references;
        for (i, row) in typed.rows.iter().enumerate() {
            let base = BaseFeatures::from_row(row);
            let ratings = refs.ratings(&base);
            let value = refs.value(&base, ratings.display_score, &state.config.scores);
            let row_values = self.row_values(&features, &base, &ratings, value.as_ref())?;
            for (j, v) in row_values.into_iter().enumerate() {
                values[(i, j)] = v;
            }
        }

        debug!(
            rows = typed.len(),
            columns = features.len(),
            outliers,
            imputed,
            "transformed phone table"
        );
        let product_ids = typed.rows.into_iter().map(|r| r.product_id).collect();
        EngineeredFrame::new(product_ids, features, values)
    }

    /// Derived scores are not invertible.
    fn inverse_transform(&self, _data: &Self::Output) -> Result<Self::Output> {
        Err(FeatureError::InvalidParameter(
            "PhoneTransformer does not support inverse_transform".to_string(),
        ))
    }

    fn extract_params(&self) -> Self::Params {
        self.state.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        for name in &params.numeric_feature_names {
            let column = RawColumn::from_name(name).ok_or_else(|| {
                FeatureError::InvalidParameter(format!("fitted state names unknown column '{name}'"))
            })?;
            if !params.median_by_feature.contains_key(&column) {
                return Err(FeatureError::InvalidParameter(format!(
                    "fitted state has no median for '{name}'"
                )));
            }
        }
        let scaler = params
            .scaler
            .clone()
            .map(FittedStandardScaler::from_params)
            .transpose()?;
        if let Some(s) = &scaler {
            if s.n_features_in() != SCALED_FEATURES.len() {
                return Err(FeatureError::FeatureMismatch {
                    expected_features: SCALED_FEATURES.len(),
                    got_features: s.n_features_in(),
                });
            }
        }
        Ok(Self {
            state: params,
            scaler,
        })
    }

    fn n_features_in(&self) -> usize {
        self.state.numeric_feature_names.len()
    }
}
