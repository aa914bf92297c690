//! End-to-end behaviour of the feature pipeline on raw listings.

use phone_features::config::{PipelineConfig, TransformerConfig};
use phone_features::dataset::{RawRecord, RawTable, RawValue};
use phone_features::features::{Feature, FeatureRef};
use phone_features::model::{LinearParams, LinearRegressor};
use phone_features::preprocessing::{FittedPhoneTransformer, PhoneTransformer};
use phone_features::serving::PricePredictor;
use phone_features::store::{FeatureService, FeatureStore, InMemoryFeatureStore};
use phone_features::training::{prepare_training, TrainingArtifact};
use phone_features::{FeatureError, FittedTransformer, Transformer};

fn listing(screen: f64, resolution: &str, mp: f64, cameras: f64, reviews: f64, price: f64) -> RawRecord {
    RawRecord::new()
        .with("Link", "https://example.invalid/p")
        .with("Brand", "Acme")
        .with("ScreenSize", screen)
        .with("Resolution", resolution)
        .with("main_camera_mp", mp)
        .with("num_cameras", cameras)
        .with("has_telephoto", "Không có camera tele")
        .with("has_ultrawide", "Có camera siêu rộng")
        .with("has_ois", "Có chống rung OIS")
        .with("has_warranty", "Có bảo hành")
        .with("NumberOfReview", reviews)
        .with("DiscountedPrice", price)
}

fn catalogue() -> RawTable {
    RawTable::from_records(vec![
        listing(6.1, "1170x2532", 12.0, 3.0, 200.0, 15_000_000.0),
        listing(6.7, "1080x2400", 50.0, 3.0, 35.0, 7_990_000.0),
        listing(6.5, "1440x3200", 108.0, 4.0, 880.0, 24_990_000.0),
        listing(6.4, "1080x2340", 64.0, 3.0, 12.0, 5_490_000.0),
        listing(6.8, "1440x3088", 200.0, 4.0, 410.0, 33_990_000.0),
    ])
}

#[test]
fn test_single_listing_scenario() {
    let record = RawRecord::new()
        .with("ScreenSize", 6.1)
        .with("Resolution", "1170x2532")
        .with("main_camera_mp", 12.0)
        .with("num_cameras", 3.0)
        .with("has_telephoto", "Có camera tele")
        .with("has_ultrawide", "Không có camera siêu rộng")
        .with("has_ois", "Có chống rung OIS")
        .with("NumberOfReview", 200.0)
        .with("DiscountedPrice", 15_000_000.0);
    let table = RawTable::from_records(vec![record]);

    let frame = PhoneTransformer::new().fit_transform(&table).unwrap();
    assert_eq!(frame.len(), 1);
    let row = frame.row(0).unwrap();

    assert_eq!(row.get(Feature::ResWidth), Some(2532.0));
    assert_eq!(row.get(Feature::ResHeight), Some(1170.0));
    assert_eq!(row.get(Feature::TotalResolution), Some(2_962_440.0));
    assert_eq!(row.get(Feature::CameraFeatureCount), Some(2.0));

    let camera_score = row.get(Feature::CameraScore).unwrap();
    assert!((camera_score - (0.4 * 12.0 + 0.3 * 3.0 + 0.3 * 2.0)).abs() < 1e-9);

    let ppi = row.get(Feature::Ppi).unwrap();
    let expected_ppi = (2532.0f64.powi(2) + 1170.0f64.powi(2)).sqrt() / 6.1;
    assert!((ppi - expected_ppi).abs() < 1e-9);

    assert_eq!(row.get(Feature::IsPremium), Some(1.0));
    assert_eq!(row.get(Feature::PriceSegment), Some(2.0));
    assert!(row.iter().all(|(_, v)| v.is_finite()));
}

#[test]
fn test_implausible_screen_becomes_fit_median() {
    let table = RawTable::from_records(vec![
        listing(6.1, "1080x2400", 12.0, 3.0, 10.0, 9e6),
        listing(15.0, "1080x2400", 12.0, 3.0, 10.0, 9e6),
        listing(6.7, "1080x2400", 12.0, 3.0, 10.0, 9e6),
    ]);
    let fitted = PhoneTransformer::new().fit(&table).unwrap();
    assert_eq!(fitted.state().median_by_feature.len(), 11);

    let frame = fitted.transform(&table).unwrap();
    assert_eq!(frame.len(), 3);
    let screen = frame.column(Feature::ScreenSize).unwrap();
    assert_eq!(screen.to_vec(), vec![6.1, 6.7, 6.7]);
}

#[test]
fn test_resolution_orientation() {
    let table = RawTable::from_records(vec![
        listing(6.5, "1080x2400", 12.0, 3.0, 10.0, 9e6),
        listing(6.5, "2400x1080", 12.0, 3.0, 10.0, 9e6),
    ]);
    let frame = PhoneTransformer::new().fit_transform(&table).unwrap();
    for i in 0..2 {
        assert_eq!(frame.get(i, Feature::ResWidth), Some(2400.0));
        assert_eq!(frame.get(i, Feature::ResHeight), Some(1080.0));
    }
}

#[test]
fn test_resolution_orientation_in_mixed_batch() {
    let records = (0..10)
        .map(|i| {
            let resolution = if i % 2 == 0 { "1440x3200" } else { "1080x2400" };
            listing(6.5, resolution, 50.0, 3.0, 100.0, 9e6)
        })
        .collect();
    let frame = PhoneTransformer::new()
        .fit_transform(&RawTable::from_records(records))
        .unwrap();
    for i in 0..10 {
        let (width, height) = if i % 2 == 0 { (3200.0, 1440.0) } else { (2400.0, 1080.0) };
        assert_eq!(frame.get(i, Feature::ResWidth), Some(width));
        assert_eq!(frame.get(i, Feature::ResHeight), Some(height));
        assert_eq!(frame.get(i, Feature::TotalResolution), Some(width * height));
    }
}

#[test]
fn test_unknown_and_missing_flags_are_zero() {
    let fitted = PhoneTransformer::new().fit(&catalogue()).unwrap();
    let unknown = listing(6.1, "1170x2532", 12.0, 3.0, 10.0, 9e6).with("has_telephoto", "maybe");
    let missing = listing(6.1, "1170x2532", 12.0, 3.0, 10.0, 9e6).with("has_telephoto", RawValue::Missing);
    for record in [unknown, missing] {
        let vector = fitted.transform_record(&record).unwrap();
        assert_eq!(vector.get(Feature::HasTelephoto), Some(0.0));
    }
}

#[test]
fn test_fit_without_valid_screen_sizes() {
    let table = RawTable::from_records(vec![
        listing(6.1, "1080x2400", 12.0, 3.0, 10.0, 9e6).with("ScreenSize", "unknown"),
        listing(6.1, "1080x2400", 12.0, 3.0, 10.0, 9e6).with("ScreenSize", RawValue::Missing),
    ]);
    match PhoneTransformer::new().fit(&table) {
        Err(FeatureError::DataQuality { feature }) => assert_eq!(feature, "ScreenSize"),
        other => panic!("expected DataQuality, got {other:?}"),
    }
}

#[test]
fn test_transform_rejects_unrelated_table() {
    let fitted = PhoneTransformer::new().fit(&catalogue()).unwrap();
    let unrelated = RawTable::from_records(vec![RawRecord::new()
        .with("Brand", "Acme")
        .with("BatteryCapacity", 5000.0)]);
    match fitted.transform(&unrelated) {
        Err(FeatureError::SchemaMismatch { expected, got }) => {
            assert!(expected.contains(&"ScreenSize".to_string()));
            assert!(got.contains(&"BatteryCapacity".to_string()));
        }
        other => panic!("expected SchemaMismatch, got {other:?}"),
    }
}

#[test]
fn test_single_record_matches_batch_row() {
    let fitted = PhoneTransformer::new().fit(&catalogue()).unwrap();
    let batch = fitted.transform(&catalogue()).unwrap();
    for (i, record) in catalogue().rows().iter().enumerate() {
        let single = fitted.transform_record(record).unwrap();
        assert_eq!(single, batch.row(i).unwrap(), "row {i}");
    }
}

#[test]
fn test_fit_transform_equals_fit_then_transform() {
    let transformer = PhoneTransformer::new();
    let direct = transformer.fit_transform(&catalogue()).unwrap();
    let fitted = transformer.fit(&catalogue()).unwrap();
    assert_eq!(fitted.transform(&catalogue()).unwrap(), direct);
}

#[test]
fn test_persisted_state_reproduces_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("features.bin");
    let config = TransformerConfig::default().with_normalize(true);
    let fitted = PhoneTransformer::with_config(config).fit(&catalogue()).unwrap();
    fitted.save_to_file(&path).unwrap();

    let loaded = FittedPhoneTransformer::load_from_file(&path).unwrap();
    assert_eq!(loaded, fitted);
    assert_eq!(
        loaded.transform(&catalogue()).unwrap(),
        fitted.transform(&catalogue()).unwrap()
    );

    let json = dir.path().join("features.json");
    fitted.export_json(&json).unwrap();
    let text = std::fs::read_to_string(json).unwrap();
    assert!(text.contains("\"median_by_feature\""));
    assert!(text.contains("\"Res_Width\""));
}

#[test]
fn test_csv_catalogue_to_feature_store() {
    let csv = "\
Name,Brand,ScreenSize,Resolution,main_camera_mp,num_cameras,has_telephoto,has_ultrawide,has_ois,has_warranty,NumberOfReview,DiscountedPrice
A,x,6.1,1170x2532,12,3,Có camera tele,Không có camera siêu rộng,Có chống rung OIS,Có bảo hành,200,15000000
B,y,6.7,1080 x 2400,50,3,Không có camera tele,Có camera siêu rộng,Không có chống rung OIS,Có bảo hành,35,Giá Liên Hệ
C,z,abc,1440×3200,108,4,Có camera tele,Có camera siêu rộng,Có chống rung OIS,Không có bảo hành,,24990000
";
    let table = RawTable::from_reader(csv.as_bytes()).unwrap();
    let frame = PhoneTransformer::new().fit_transform(&table).unwrap();
    assert!(frame.values().iter().all(|v| v.is_finite()));

    let store = InMemoryFeatureStore::from_frame(&frame);
    for service in [
        FeatureService::smart_phone_recommender().unwrap(),
        FeatureService::value_for_money_detector().unwrap(),
        FeatureService::camera_enthusiast_predictor().unwrap(),
    ] {
        let values = service.fetch(&store, "002").unwrap();
        assert_eq!(values.len(), service.len());
    }
    let refs = FeatureRef::parse_all(&["phone_camera:has_telephoto", "phone_product:has_warranty"]).unwrap();
    assert_eq!(store.online_features("001", &refs).unwrap(), vec![1.0, 1.0]);
}

#[test]
fn test_training_artifact_serves_prices() {
    let mut records = catalogue().rows().to_vec();
    for i in 0..10 {
        let f = i as f64;
        records.push(listing(6.0 + f / 20.0, "1080x2400", 12.0 + f, 3.0, 5.0 * f, 4e6 + 1e6 * f));
    }
    let table = RawTable::from_records(records);
    let prepared = prepare_training(&table, &PipelineConfig::default()).unwrap();
    assert_eq!(prepared.x_train.len() + prepared.x_test.len(), 15);

    let dir = tempfile::tempdir().unwrap();
    TrainingArtifact::from_prepared(&prepared).save(dir.path()).unwrap();
    let artifact = TrainingArtifact::load(dir.path()).unwrap();

    let refs = FeatureRef::parse_all(&["phone_display:PPI", "phone_camera:camera_score"]).unwrap();
    let model = LinearRegressor::new(LinearParams {
        weights: vec![0.0, 0.0],
        bias: 16.0,
    })
    .unwrap();
    let predictor = PricePredictor::new(artifact.features, artifact.target, Box::new(model), refs).unwrap();

    let record = listing(6.1, "1170x2532", 12.0, 3.0, 200.0, 0.0);
    let price = predictor.predict(&record).unwrap();
    assert!((price - 16f64.exp_m1()).abs() / price < 1e-9);
}
