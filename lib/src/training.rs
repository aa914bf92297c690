//! Training driver: split, fit once on train, transform both splits.
//!
//! The fitted transformers and a manifest are persisted as one artifact
//! directory:
//!
//! ```text
//! artifacts/
//! ├── features.bin    fitted feature state (bincode)
//! ├── target.bin      fitted target state (bincode)
//! └── manifest.json   columns, row counts, creation time
//! ```

use crate::config::{PipelineConfig, SplitConfig};
use crate::dataset::{RawTable, RawValue};
use crate::error::{FeatureError, Result};
use crate::features::EngineeredFrame;
use crate::preprocessing::{
    FittedPhoneTransformer, FittedTargetTransformer, PhoneTransformer, TargetTransformer,
};
use crate::schema::RawColumn;
use crate::serialization::{read_json, write_json};
use crate::traits::{FittedTransformer, Transformer};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const FEATURES_FILE: &str = "features.bin";
pub const TARGET_FILE: &str = "target.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Fitted transformers plus both transformed splits.
#[derive(Clone, Debug)]
pub struct PreparedData {
    pub features: FittedPhoneTransformer,
    pub target: FittedTargetTransformer,
    pub x_train: EngineeredFrame,
    pub x_test: EngineeredFrame,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Seeded shuffle split into `(train, test)` row indices.
///
/// The test share is rounded up, but at least one row always stays in train.
pub fn split_indices(n: usize, config: &SplitConfig) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64) * config.test_fraction).ceil() as usize;
    let n_test = n_test.min(n.saturating_sub(1));
    let train = indices.split_off(n_test);
    (train, indices)
}

fn pick(values: &[RawValue], indices: &[usize]) -> Vec<RawValue> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

/// Prepare model-ready data from a raw table.
///
/// The feature transformer is fit on the priced train split so the fitted
/// state carries the `phone_value` references serving needs. `x_*` are
/// transformed without the `DiscountedPrice` column, so the price-derived
/// group never reaches the target model's inputs.
pub fn prepare_training(table: &RawTable, config: &PipelineConfig) -> Result<PreparedData> {
    let mut table = table.clone();
    let loaded = table.len();
    table.drop_sparse_rows(config.max_missing_per_row);
    if table.is_empty() {
        return Err(FeatureError::EmptyData(format!(
            "all {loaded} rows have {} or more missing cells",
            config.max_missing_per_row
        )));
    }

    let target_column = RawColumn::DiscountedPrice.name();
    if !table.has_column(target_column) {
        return Err(FeatureError::FeatureMissing(format!(
            "target column '{target_column}' is absent"
        )));
    }

    let (train_idx, test_idx) = split_indices(table.len(), &config.split);
    let priced_train = table.select_rows(&train_idx);
    let features = PhoneTransformer::with_config(config.transformer.clone()).fit(&priced_train)?;

    let targets = table.remove_column(target_column).unwrap_or_default();
    let train = table.select_rows(&train_idx);
    let test = table.select_rows(&test_idx);
    let y_train_raw = pick(&targets, &train_idx);
    let y_test_raw = pick(&targets, &test_idx);
    let target = TargetTransformer::with_config(config.target.clone()).fit(&y_train_raw)?;

    let prepared = PreparedData {
        x_train: features.transform(&train)?,
        x_test: features.transform(&test)?,
        y_train: target.transform(&y_train_raw)?,
        y_test: target.transform(&y_test_raw)?,
        features,
        target,
    };
    info!(
        loaded,
        train = prepared.x_train.len(),
        test = prepared.x_test.len(),
        features = prepared.x_train.features().len(),
        "prepared training data"
    );
    Ok(prepared)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub feature_columns: Vec<String>,
    pub numeric_feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub target_log_transform: bool,
    pub created_at: DateTime<Utc>,
}

/// Everything serving needs from a training run.
#[derive(Clone, Debug)]
pub struct TrainingArtifact {
    pub features: FittedPhoneTransformer,
    pub target: FittedTargetTransformer,
    pub manifest: ArtifactManifest,
}

impl TrainingArtifact {
    pub fn from_prepared(prepared: &PreparedData) -> Self {
        Self {
            features: prepared.features.clone(),
            target: prepared.target.clone(),
            manifest: ArtifactManifest {
                feature_columns: prepared
                    .x_train
                    .feature_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
                numeric_feature_names: prepared.features.state().numeric_feature_names.clone(),
                train_rows: prepared.x_train.len(),
                test_rows: prepared.x_test.len(),
                target_log_transform: prepared.target.config().log_transform,
                created_at: Utc::now(),
            },
        }
    }

    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        self.features.save_to_file(dir.join(FEATURES_FILE))?;
        self.target.save_to_file(dir.join(TARGET_FILE))?;
        write_json(&self.manifest, dir.join(MANIFEST_FILE))?;
        info!(dir = %dir.display(), "saved training artifact");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            features: FittedPhoneTransformer::load_from_file(dir.join(FEATURES_FILE))?,
            target: FittedTargetTransformer::load_from_file(dir.join(TARGET_FILE))?,
            manifest: read_json(dir.join(MANIFEST_FILE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawRecord;
    use crate::features::Feature;
    use crate::store::{FeatureService, InMemoryFeatureStore};

    fn raw_catalogue(n: usize) -> RawTable {
        let records = (0..n)
            .map(|i| {
                let f = i as f64;
                RawRecord::new()
                    .with("Name", format!("Phone {i}"))
                    .with("ScreenSize", 6.0 + (f % 8.0) / 10.0)
                    .with("Resolution", "1440x3200")
                    .with("main_camera_mp", 12.0 + f)
                    .with("num_cameras", 1.0 + (f % 4.0))
                    .with("has_ois", if i % 2 == 0 { "Có chống rung OIS" } else { "Không có chống rung OIS" })
                    .with("NumberOfReview", 10.0 * f)
                    .with("DiscountedPrice", 5e6 + 1e6 * f)
            })
            .collect();
        RawTable::from_records(records)
    }

    #[test]
    fn test_split_is_seeded_and_disjoint() {
        let config = SplitConfig::default();
        let (train, test) = split_indices(10, &config);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(split_indices(10, &config), (train, test));
    }

    #[test]
    fn test_split_keeps_a_training_row() {
        let config = SplitConfig {
            test_fraction: 0.9,
            seed: 1,
        };
        let (train, test) = split_indices(1, &config);
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn test_prepare_training() {
        let prepared = prepare_training(&raw_catalogue(20), &PipelineConfig::default()).unwrap();
        assert_eq!(prepared.x_train.len(), 16);
        assert_eq!(prepared.x_test.len(), 4);
        assert_eq!(prepared.y_train.len(), 16);
        assert!(!prepared.x_train.has_feature(Feature::ValueScore));
        assert!(!prepared.x_test.has_feature(Feature::IsPremium));
        assert!(prepared.features.has_value_group());
        assert!(prepared.y_train.iter().all(|y| *y > 15.0 && *y < 18.0));
    }

    #[test]
    fn test_prepare_training_requires_target() {
        let mut table = raw_catalogue(5);
        table.remove_column("DiscountedPrice");
        assert!(matches!(
            prepare_training(&table, &PipelineConfig::default()),
            Err(FeatureError::FeatureMissing(_))
        ));
    }

    #[test]
    fn test_sparse_rows_dropped_before_split() {
        let mut records: Vec<RawRecord> = raw_catalogue(10).rows().to_vec();
        records.push(RawRecord::new().with("ScreenSize", 6.1));
        let table = RawTable::from_records(records);
        let prepared = prepare_training(&table, &PipelineConfig::default()).unwrap();
        assert_eq!(prepared.x_train.len() + prepared.x_test.len(), 10);
    }

    #[test]
    fn test_artifact_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let prepared = prepare_training(&raw_catalogue(12), &PipelineConfig::default()).unwrap();
        let artifact = TrainingArtifact::from_prepared(&prepared);
        artifact.save(dir.path()).unwrap();

        assert!(dir.path().join(MANIFEST_FILE).exists());
        let loaded = TrainingArtifact::load(dir.path()).unwrap();
        assert_eq!(loaded.manifest, artifact.manifest);
        assert_eq!(loaded.features, artifact.features);
        assert_eq!(loaded.target, artifact.target);
        assert_eq!(loaded.manifest.feature_columns.len(), Feature::COUNT - 3);
    }

    #[test]
    fn test_saved_artifact_serves_every_service() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = raw_catalogue(10);
        let prepared = prepare_training(&catalogue, &PipelineConfig::default()).unwrap();
        TrainingArtifact::from_prepared(&prepared).save(dir.path()).unwrap();

        let artifact = TrainingArtifact::load(dir.path()).unwrap();
        assert!(artifact.features.has_value_group());
        let frame = artifact.features.transform(&catalogue).unwrap();
        assert!(frame.has_feature(Feature::ValueScore));

        let store = InMemoryFeatureStore::from_frame(&frame);
        for service in [
            FeatureService::smart_phone_recommender().unwrap(),
            FeatureService::value_for_money_detector().unwrap(),
            FeatureService::camera_enthusiast_predictor().unwrap(),
        ] {
            let values = service.fetch(&store, "001").unwrap();
            assert_eq!(values.len(), service.len(), "{}", service.name());
        }
    }
}
