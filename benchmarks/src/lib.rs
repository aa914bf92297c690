//! Benchmark fixtures for phone-features.
//!
//! Provides a seeded synthetic listing catalogue shaped like the scraped data,
//! including the usual share of junk cells, so fit and transform can be timed
//! without shipping a dataset.

use phone_features::config::PRICE_ON_REQUEST;
use phone_features::dataset::{RawRecord, RawTable, RawValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RESOLUTIONS: [(u32, u32); 6] = [
    (1080, 2400),
    (1170, 2532),
    (1440, 3200),
    (720, 1600),
    (1080, 2340),
    (1290, 2796),
];

const BRANDS: [&str; 5] = ["Samsung", "Apple", "Xiaomi", "OPPO", "vivo"];

fn flag(rng: &mut StdRng, positive: &str, negative: &str) -> RawValue {
    match rng.gen_range(0..10) {
        0 => RawValue::Missing,
        1..=4 => RawValue::Text(positive.to_string()),
        _ => RawValue::Text(negative.to_string()),
    }
}

/// One synthetic listing. Roughly one cell in twenty is junk or missing.
pub fn synthetic_listing(rng: &mut StdRng) -> RawRecord {
    let (w, h) = RESOLUTIONS[rng.gen_range(0..RESOLUTIONS.len())];
    let resolution = if rng.gen_bool(0.05) {
        RawValue::Text("Full HD+".to_string())
    } else {
        RawValue::Text(format!("{w}x{h}"))
    };
    let screen = if rng.gen_bool(0.03) {
        RawValue::Number(rng.gen_range(10.0..20.0))
    } else {
        RawValue::Number(rng.gen_range(5.0..7.2))
    };
    let price = if rng.gen_bool(0.05) {
        RawValue::Text(PRICE_ON_REQUEST.to_string())
    } else {
        RawValue::Number((rng.gen_range(1.5..45.0f64) * 1e6).round())
    };
    let reviews = if rng.gen_bool(0.1) {
        RawValue::Missing
    } else {
        RawValue::Number(rng.gen_range(0..1500) as f64)
    };

    RawRecord::new()
        .with("Brand", BRANDS[rng.gen_range(0..BRANDS.len())])
        .with("ScreenSize", screen)
        .with("Resolution", resolution)
        .with("main_camera_mp", [12.0, 48.0, 50.0, 64.0, 108.0, 200.0][rng.gen_range(0..6)])
        .with("num_cameras", rng.gen_range(1..=4) as f64)
        .with("has_telephoto", flag(rng, "Có camera tele", "Không có camera tele"))
        .with("has_ultrawide", flag(rng, "Có camera siêu rộng", "Không có camera siêu rộng"))
        .with("has_ois", flag(rng, "Có chống rung OIS", "Không có chống rung OIS"))
        .with("has_warranty", flag(rng, "Có bảo hành", "Không có bảo hành"))
        .with("NumberOfReview", reviews)
        .with("DiscountedPrice", price)
}

/// A catalogue of `n` synthetic listings, reproducible for a given seed.
pub fn synthetic_catalogue(n: usize, seed: u64) -> RawTable {
    let mut rng = StdRng::seed_from_u64(seed);
    RawTable::from_records((0..n).map(|_| synthetic_listing(&mut rng)).collect())
}
