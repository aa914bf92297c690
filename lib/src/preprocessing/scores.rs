//! Derived score features.
//!
//! Every formula lives here once and is used by both `fit` and `transform`.
//! Scores that compare a phone against "the catalogue" read the comparison
//! points from [`ScoreReferences`], which are computed once at fit. Ratios
//! against a reference are clipped to `[0, 1]`.

use crate::config::ScoreConfig;
use crate::numeric::{self, clip, ratio_clipped, round_to};
use crate::schema::{PhoneRow, RawColumn};
use serde::{Deserialize, Serialize};

/// Cleaned raw attributes of one row plus the reference-free derivations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseFeatures {
    pub screen_size: f64,
    pub res_width: f64,
    pub res_height: f64,
    pub main_camera_mp: f64,
    pub num_cameras: f64,
    pub has_telephoto: f64,
    pub has_ultrawide: f64,
    pub has_ois: f64,
    pub has_warranty: f64,
    pub reviews: f64,
    pub price: Option<f64>,
    pub ppi: f64,
    pub total_resolution: f64,
    pub camera_feature_count: f64,
    pub camera_score: f64,
}

impl BaseFeatures {
    /// Derive from a row whose required columns are already imputed.
    pub fn from_row(row: &PhoneRow) -> Self {
        let screen_size = row.value(RawColumn::ScreenSize);
        let res_width = row.value(RawColumn::ResWidth);
        let res_height = row.value(RawColumn::ResHeight);
        let main_camera_mp = row.value(RawColumn::MainCameraMp);
        let num_cameras = row.value(RawColumn::NumCameras);
        let has_telephoto = row.get(RawColumn::HasTelephoto).unwrap_or(0.0);
        let has_ultrawide = row.get(RawColumn::HasUltrawide).unwrap_or(0.0);
        let has_ois = row.get(RawColumn::HasOis).unwrap_or(0.0);

        let ppi = if screen_size > 0.0 {
            (res_width.powi(2) + res_height.powi(2)).sqrt() / screen_size
        } else {
            0.0
        };
        let camera_feature_count = has_telephoto + has_ultrawide + has_ois;
        let camera_score = 0.4 * main_camera_mp + 0.3 * num_cameras + 0.3 * camera_feature_count;

        Self {
            screen_size,
            res_width,
            res_height,
            main_camera_mp,
            num_cameras,
            has_telephoto,
            has_ultrawide,
            has_ois,
            has_warranty: row.get(RawColumn::HasWarranty).unwrap_or(0.0),
            reviews: row.value(RawColumn::NumberOfReview),
            price: row.get(RawColumn::DiscountedPrice),
            ppi,
            total_resolution: res_width * res_height,
            camera_feature_count,
            camera_score,
        }
    }

    /// Cleaned value of a raw attribute.
    pub fn raw(&self, column: RawColumn) -> Option<f64> {
        match column {
            RawColumn::ScreenSize => Some(self.screen_size),
            RawColumn::ResWidth => Some(self.res_width),
            RawColumn::ResHeight => Some(self.res_height),
            RawColumn::MainCameraMp => Some(self.main_camera_mp),
            RawColumn::NumCameras => Some(self.num_cameras),
            RawColumn::HasTelephoto => Some(self.has_telephoto),
            RawColumn::HasUltrawide => Some(self.has_ultrawide),
            RawColumn::HasOis => Some(self.has_ois),
            RawColumn::HasWarranty => Some(self.has_warranty),
            RawColumn::NumberOfReview => Some(self.reviews),
            RawColumn::DiscountedPrice => self.price,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ratings {
    pub camera_rating: f64,
    pub display_score: f64,
    pub popularity_score: f64,
    pub overall_score: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueFeatures {
    pub value_score: f64,
    pub is_premium: f64,
    pub price_segment: f64,
}

/// Comparison points learned from the fit batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreReferences {
    pub ppi_reference: f64,
    pub resolution_reference: f64,
    pub screen_reference: f64,
    pub max_reviews: f64,
    pub camera_mp_ceiling: f64,
    pub camera_count_ceiling: f64,
    pub camera_feature_ceiling: f64,
    pub camera_score_max: f64,
    /// Best raw value ratio at fit; `None` when the fit batch had no prices.
    pub value_ratio_max: Option<f64>,
}

impl ScoreReferences {
    pub fn fit(rows: &[BaseFeatures], config: &ScoreConfig) -> Self {
        let collect = |f: fn(&BaseFeatures) -> f64| rows.iter().map(f).collect::<Vec<f64>>();
        let percentile = |values: &[f64]| {
            numeric::quantile(values, config.display_percentile).unwrap_or(0.0)
        };
        let ceiling = |values: &[f64], floor: f64| numeric::max(values).map_or(floor, |m| m.max(floor));

        let mut refs = Self {
            ppi_reference: percentile(&collect(|b| b.ppi)),
            resolution_reference: percentile(&collect(|b| b.total_resolution)),
            screen_reference: percentile(&collect(|b| b.screen_size)),
            max_reviews: numeric::max(&collect(|b| b.reviews.max(0.0))).unwrap_or(0.0),
            camera_mp_ceiling: ceiling(&collect(|b| b.main_camera_mp), config.camera_mp_floor),
            camera_count_ceiling: ceiling(&collect(|b| b.num_cameras), config.camera_count_floor),
            camera_feature_ceiling: ceiling(
                &collect(|b| b.camera_feature_count),
                config.camera_feature_floor,
            ),
            camera_score_max: ceiling(&collect(|b| b.camera_score), config.camera_score_floor),
            value_ratio_max: None,
        };

        if rows.iter().any(|b| b.price.is_some()) {
            let ratios: Vec<f64> = rows
                .iter()
                .map(|b| {
                    let display = refs.display_score(b);
                    refs.value_ratio(b, display, config)
                })
                .collect();
            refs.value_ratio_max = Some(numeric::max(&ratios).unwrap_or(0.0));
        }
        refs
    }

    pub fn camera_rating(&self, b: &BaseFeatures) -> f64 {
        let quality = 0.4 * ratio_clipped(b.main_camera_mp, self.camera_mp_ceiling)
            + 0.3 * ratio_clipped(b.num_cameras, self.camera_count_ceiling)
            + 0.3 * ratio_clipped(b.camera_feature_count, self.camera_feature_ceiling);
        round_to(4.0 * quality + 1.0, 1)
    }

    pub fn display_score(&self, b: &BaseFeatures) -> f64 {
        let score = 40.0 * ratio_clipped(b.ppi, self.ppi_reference)
            + 40.0 * ratio_clipped(b.total_resolution, self.resolution_reference)
            + 20.0 * ratio_clipped(b.screen_size, self.screen_reference);
        round_to(score, 1)
    }

    pub fn popularity_score(&self, b: &BaseFeatures) -> f64 {
        if self.max_reviews <= 0.0 {
            return 0.0;
        }
        let share = b.reviews.max(0.0).ln_1p() / self.max_reviews.ln_1p();
        round_to(100.0 * clip(share, 0.0, 1.0), 1)
    }

    pub fn ratings(&self, b: &BaseFeatures) -> Ratings {
        let camera_rating = self.camera_rating(b);
        let display_score = self.display_score(b);
        let popularity_score = self.popularity_score(b);
        let overall = (camera_rating - 1.0) / 4.0 * 100.0 * 0.3
            + 0.4 * display_score
            + 0.3 * popularity_score;
        Ratings {
            camera_rating,
            display_score,
            popularity_score,
            overall_score: round_to(overall, 1),
        }
    }

    /// Quality points per million of price, before rescaling.
    pub fn value_ratio(&self, b: &BaseFeatures, display_score: f64, config: &ScoreConfig) -> f64 {
        let Some(price) = b.price else {
            return 0.0;
        };
        let camera_part = b.camera_score / self.camera_score_max * 50.0;
        let numerator = clip(camera_part + display_score / 100.0 * 50.0, 0.0, 100.0);
        let millions = price / 1e6;
        if millions > config.min_price_millions {
            round_to(numerator / millions, 2)
        } else {
            0.0
        }
    }

    /// The value group, or `None` when the row or the fit batch had no price.
    pub fn value(&self, b: &BaseFeatures, display_score: f64, config: &ScoreConfig) -> Option<ValueFeatures> {
        let price = b.price?;
        let max_ratio = self.value_ratio_max?;
        let value_score = if max_ratio > 0.0 {
            let ratio = self.value_ratio(b, display_score, config);
            round_to(clip(ratio / max_ratio, 0.0, 1.0) * config.value_scale, 2)
        } else {
            0.0
        };
        Some(ValueFeatures {
            value_score,
            is_premium: is_premium(price, config),
            price_segment: price_segment(price, config),
        })
    }
}

pub fn is_premium(price: f64, config: &ScoreConfig) -> f64 {
    if price >= config.premium_threshold {
        1.0
    } else {
        0.0
    }
}

pub fn price_segment(price: f64, config: &ScoreConfig) -> f64 {
    if price <= config.budget_threshold {
        0.0
    } else if price < config.premium_threshold {
        1.0
    } else {
        2.0
    }
}
