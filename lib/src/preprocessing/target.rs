//! Target (price) transformer.
//!
//! Coerces raw prices, replaces missing and implausible values with the
//! fit-time median and optionally compresses with `log1p`. The inverse is
//! `expm1`, so predictions made in log space map back to prices.

use crate::config::TargetConfig;
use crate::dataset::RawValue;
use crate::error::{FeatureError, Result};
use crate::numeric;
use crate::preprocessing::cleaning::coerce_numeric;
use crate::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Learned state of the target transformer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetParams {
    pub config: TargetConfig,
    pub median: f64,
}

#[derive(Clone, Debug, Default)]
pub struct TargetTransformer {
    config: TargetConfig,
}

impl TargetTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TargetConfig) -> Self {
        Self { config }
    }

    fn coerce(&self, data: &[RawValue]) -> Vec<Option<f64>> {
        data.iter()
            .map(|v| coerce_numeric(v, &self.config.price_placeholder))
            .collect()
    }
}

impl Transformer for TargetTransformer {
    type Input = [RawValue];
    type Output = Vec<f64>;
    type Params = TargetParams;
    type Fitted = FittedTargetTransformer;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted> {
        if data.is_empty() {
            return Err(FeatureError::EmptyData(
                "Cannot fit TargetTransformer on empty data".to_string(),
            ));
        }
        let values: Vec<f64> = self.coerce(data).into_iter().flatten().collect();

        let plausible: Vec<f64> = if self.config.handle_outliers {
            values
                .iter()
                .copied()
                .filter(|v| *v >= 0.0 && *v <= self.config.outlier_threshold)
                .collect()
        } else {
            values.clone()
        };
        let median = numeric::median(&plausible)
            .or_else(|| numeric::median(&values))
            .ok_or_else(|| FeatureError::DataQuality {
                feature: "target".to_string(),
            })?;

        info!(
            rows = data.len(),
            valid = values.len(),
            median,
            "fitted target transformer"
        );
        Ok(FittedTargetTransformer {
            params: TargetParams {
                config: self.config.clone(),
                median,
            },
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FittedTargetTransformer {
    params: TargetParams,
}

impl FittedTargetTransformer {
    pub fn median(&self) -> f64 {
        self.params.median
    }

    pub fn config(&self) -> &TargetConfig {
        &self.params.config
    }

    fn clean(&self, value: Option<f64>) -> (f64, bool) {
        let config = &self.params.config;
        match value {
            None => (self.params.median, true),
            Some(v) if config.handle_outliers && (v < 0.0 || v > config.outlier_threshold) => {
                (self.params.median, true)
            }
            Some(v) => (v, false),
        }
    }

    /// Map one model output back to a price.
    pub fn inverse_value(&self, value: f64) -> f64 {
        if self.params.config.log_transform {
            value.exp_m1()
        } else {
            value
        }
    }
}

impl FittedTransformer for FittedTargetTransformer {
    type Input = [RawValue];
    type Output = Vec<f64>;
    type Params = TargetParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        let placeholder = &self.params.config.price_placeholder;
        let mut replaced = 0usize;
        let out = data
            .iter()
            .map(|raw| {
                let (v, was_replaced) = self.clean(coerce_numeric(raw, placeholder));
                replaced += usize::from(was_replaced);
                if self.params.config.log_transform {
                    v.ln_1p()
                } else {
                    v
                }
            })
            .collect();
        debug!(rows = data.len(), replaced, "transformed target");
        Ok(out)
    }

    fn inverse_transform(&self, data: &Self::Output) -> Result<Self::Output> {
        Ok(data.iter().map(|v| self.inverse_value(*v)).collect())
    }

    fn extract_params(&self) -> Self::Params {
        self.params.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if !params.median.is_finite() {
            return Err(FeatureError::InvalidParameter(format!(
                "target median must be finite, got {}",
                params.median
            )));
        }
        Ok(Self { params })
    }

    fn n_features_in(&self) -> usize {
        1
    }
}
