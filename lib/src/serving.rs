//! Serving-time predictors.
//!
//! Predictors are built explicitly from fitted parts and validate them once in
//! their constructor. They only ever call `transform` on fitted state.

use crate::dataset::{RawRecord, RawTable};
use crate::error::{FeatureError, Result};
use crate::features::{FeatureGroup, FeatureRef};
use crate::model::{Classifier, Regressor};
use crate::numeric::round_to;
use crate::preprocessing::{FittedPhoneTransformer, FittedStandardScaler, FittedTargetTransformer};
use crate::store::{FeatureService, FeatureStore};
use crate::traits::FittedTransformer;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn check_arity(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(FeatureError::FeatureMismatch {
            expected_features: expected,
            got_features: got,
        });
    }
    Ok(())
}

/// Price prediction for raw listings.
pub struct PricePredictor {
    features: FittedPhoneTransformer,
    target: FittedTargetTransformer,
    model: Box<dyn Regressor>,
    refs: Vec<FeatureRef>,
}

impl PricePredictor {
    /// # Errors
    /// - [`FeatureError::FeatureMismatch`] if the model arity differs from `refs`
    /// - [`FeatureError::InvalidParameter`] if a ref needs the price being predicted
    pub fn new(
        features: FittedPhoneTransformer,
        target: FittedTargetTransformer,
        model: Box<dyn Regressor>,
        refs: Vec<FeatureRef>,
    ) -> Result<Self> {
        check_arity(model.n_features(), refs.len())?;
        if let Some(r) = refs.iter().find(|r| r.group() == FeatureGroup::Value) {
            return Err(FeatureError::InvalidParameter(format!(
                "'{r}' is derived from the price and cannot be a price model input"
            )));
        }
        Ok(Self {
            features,
            target,
            model,
            refs,
        })
    }

    pub fn refs(&self) -> &[FeatureRef] {
        &self.refs
    }

    /// Predicted price of one listing.
    pub fn predict(&self, record: &RawRecord) -> Result<f64> {
        let vector = self.features.transform_record(record)?;
        let x = Array1::from(vector.select(&self.refs)?);
        let y = self.model.predict(x.view())?;
        Ok(self.target.inverse_value(y))
    }

    /// Predicted prices of every listing in a table.
    pub fn predict_table(&self, table: &RawTable) -> Result<Vec<f64>> {
        let frame = self.features.transform(table)?;
        let x = frame.select(&self.refs)?;
        let y = self.model.predict_batch(&x)?;
        debug!(rows = y.len(), "predicted prices");
        self.target.inverse_transform(&y)
    }
}

/// One model bound to the feature service that feeds it.
pub struct ServiceModel<M: ?Sized> {
    service: FeatureService,
    scaler: Option<FittedStandardScaler>,
    model: Box<M>,
}

impl<M: ?Sized> ServiceModel<M> {
    pub fn service(&self) -> &FeatureService {
        &self.service
    }

    /// Attach the scaler the model was trained behind.
    pub fn with_scaler(mut self, scaler: FittedStandardScaler) -> Result<Self> {
        check_arity(self.service.len(), scaler.n_features_in())?;
        self.scaler = Some(scaler);
        Ok(self)
    }

    fn inputs(&self, store: &dyn FeatureStore, entity_key: &str) -> Result<Array1<f64>> {
        let raw = Array1::from(self.service.fetch(store, entity_key)?);
        match &self.scaler {
            Some(scaler) => scaler.transform_row(raw.view()),
            None => Ok(raw),
        }
    }
}

impl ServiceModel<dyn Regressor> {
    pub fn regressor(service: FeatureService, model: Box<dyn Regressor>) -> Result<Self> {
        check_arity(model.n_features(), service.len())?;
        Ok(Self {
            service,
            scaler: None,
            model,
        })
    }

    fn predict(&self, store: &dyn FeatureStore, entity_key: &str) -> Result<f64> {
        let x = self.inputs(store, entity_key)?;
        self.model.predict(x.view())
    }
}

impl ServiceModel<dyn Classifier> {
    pub fn classifier(service: FeatureService, model: Box<dyn Classifier>) -> Result<Self> {
        check_arity(model.n_features(), service.len())?;
        Ok(Self {
            service,
            scaler: None,
            model,
        })
    }

    fn predict_proba(&self, store: &dyn FeatureStore, entity_key: &str) -> Result<f64> {
        let x = self.inputs(store, entity_key)?;
        self.model.predict_proba(x.view())
    }
}

/// Rounded predictions of the three services for one product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServicePredictions {
    pub product_id: String,
    pub overall_score: f64,
    pub is_premium: bool,
    pub premium_prob: f64,
    pub camera_rating: f64,
}

/// Overall-score regressor, premium classifier and camera-rating regressor
/// over a feature store.
pub struct MultiServicePredictor {
    overall: ServiceModel<dyn Regressor>,
    premium: ServiceModel<dyn Classifier>,
    camera: ServiceModel<dyn Regressor>,
}

impl MultiServicePredictor {
    pub fn new(
        overall: ServiceModel<dyn Regressor>,
        premium: ServiceModel<dyn Classifier>,
        camera: ServiceModel<dyn Regressor>,
    ) -> Self {
        Self {
            overall,
            premium,
            camera,
        }
    }

    /// Bind the models to their standard services.
    pub fn from_models(
        overall: Box<dyn Regressor>,
        premium: Box<dyn Classifier>,
        camera: Box<dyn Regressor>,
    ) -> Result<Self> {
        Ok(Self::new(
            ServiceModel::regressor(FeatureService::smart_phone_recommender()?, overall)?,
            ServiceModel::classifier(FeatureService::value_for_money_detector()?, premium)?,
            ServiceModel::regressor(FeatureService::camera_enthusiast_predictor()?, camera)?,
        ))
    }

    pub fn predict_all(&self, store: &dyn FeatureStore, product_id: &str) -> Result<ServicePredictions> {
        let overall = self.overall.predict(store, product_id)?;
        let prob = self.premium.predict_proba(store, product_id)?;
        let camera = self.camera.predict(store, product_id)?;
        Ok(ServicePredictions {
            product_id: product_id.to_string(),
            overall_score: round_to(overall, 1),
            is_premium: prob >= 0.5,
            premium_prob: round_to(prob, 3),
            camera_rating: round_to(camera, 1),
        })
    }
}
