//! Feature store seam and named feature services.
//!
//! A store answers "current values of these features for this product".
//! [`InMemoryFeatureStore`] is materialized from a transformed frame; a
//! networked store would implement the same trait.

use crate::error::{FeatureError, Result};
use crate::features::{EngineeredFeatureVector, EngineeredFrame, FeatureRef};
use std::collections::BTreeMap;
use tracing::info;

pub trait FeatureStore: Send + Sync {
    /// Values of `refs`, in order, for one entity.
    ///
    /// # Errors
    /// [`FeatureError::UnknownEntity`] if the key was never materialized and
    /// [`FeatureError::UnknownFeature`] if the entity lacks a feature.
    fn online_features(&self, entity_key: &str, refs: &[FeatureRef]) -> Result<Vec<f64>>;
}

/// Online store held in memory, keyed by `product_id`.
#[derive(Clone, Debug, Default)]
pub struct InMemoryFeatureStore {
    rows: BTreeMap<String, EngineeredFeatureVector>,
}

impl InMemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every row of `frame`, replacing rows with the same key.
    pub fn materialize(&mut self, frame: &EngineeredFrame) -> usize {
        let mut loaded = 0;
        for (i, id) in frame.product_ids().iter().enumerate() {
            if let Some(row) = frame.row(i) {
                self.rows.insert(id.clone(), row);
                loaded += 1;
            }
        }
        info!(rows = loaded, entities = self.rows.len(), "materialized features");
        loaded
    }

    pub fn from_frame(frame: &EngineeredFrame) -> Self {
        let mut store = Self::new();
        store.materialize(frame);
        store
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entity_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn online_features(&self, entity_key: &str, refs: &[FeatureRef]) -> Result<Vec<f64>> {
        let row = self
            .rows
            .get(entity_key)
            .ok_or_else(|| FeatureError::UnknownEntity(entity_key.to_string()))?;
        row.select(refs)
    }
}

/// A named, fixed list of feature references consumed by one model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureService {
    name: String,
    refs: Vec<FeatureRef>,
}

const SMART_PHONE_RECOMMENDER: [&str; 11] = [
    "phone_display:ScreenSize",
    "phone_display:PPI",
    "phone_display:total_resolution",
    "phone_camera:camera_score",
    "phone_camera:has_telephoto",
    "phone_camera:has_ultrawide",
    "phone_ratings:popularity_score",
    "phone_value:value_score",
    "phone_value:price_segment",
    "phone_product:has_warranty",
    "phone_product:NumberOfReview",
];

const VALUE_FOR_MONEY_DETECTOR: [&str; 10] = [
    "phone_value:value_score",
    "phone_value:price_segment",
    "phone_ratings:overall_score",
    "phone_ratings:display_score",
    "phone_ratings:camera_rating",
    "phone_display:PPI",
    "phone_display:ScreenSize",
    "phone_camera:camera_score",
    "phone_camera:main_camera_mp",
    "phone_product:NumberOfReview",
];

const CAMERA_ENTHUSIAST_PREDICTOR: [&str; 12] = [
    "phone_camera:main_camera_mp",
    "phone_camera:num_cameras",
    "phone_camera:has_telephoto",
    "phone_camera:has_ultrawide",
    "phone_camera:has_ois",
    "phone_camera:camera_feature_count",
    "phone_display:PPI",
    "phone_display:total_resolution",
    "phone_display:ScreenSize",
    "phone_value:value_score",
    "phone_value:is_premium",
    "phone_product:NumberOfReview",
];

impl FeatureService {
    pub fn new(name: impl Into<String>, refs: Vec<FeatureRef>) -> Result<Self> {
        if refs.is_empty() {
            return Err(FeatureError::InvalidParameter(
                "a feature service needs at least one feature".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            refs,
        })
    }

    fn builtin(name: &str, refs: &[&str]) -> Result<Self> {
        Self::new(name, FeatureRef::parse_all(refs)?)
    }

    /// Features for overall-score regression.
    pub fn smart_phone_recommender() -> Result<Self> {
        Self::builtin("smart_phone_recommender", &SMART_PHONE_RECOMMENDER)
    }

    /// Features for premium classification.
    pub fn value_for_money_detector() -> Result<Self> {
        Self::builtin("value_for_money_detector", &VALUE_FOR_MONEY_DETECTOR)
    }

    /// Features for camera-rating regression.
    pub fn camera_enthusiast_predictor() -> Result<Self> {
        Self::builtin("camera_enthusiast_predictor", &CAMERA_ENTHUSIAST_PREDICTOR)
    }

    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "smart_phone_recommender" => Self::smart_phone_recommender(),
            "value_for_money_detector" => Self::value_for_money_detector(),
            "camera_enthusiast_predictor" => Self::camera_enthusiast_predictor(),
            other => Err(FeatureError::InvalidParameter(format!(
                "unknown feature service '{other}'"
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refs(&self) -> &[FeatureRef] {
        &self.refs
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Fetch this service's features for one entity.
    pub fn fetch(&self, store: &dyn FeatureStore, entity_key: &str) -> Result<Vec<f64>> {
        store.online_features(entity_key, &self.refs)
    }
}
