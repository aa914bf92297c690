//! Cleaning stages shared by `fit` and `transform`.
//!
//! Stages run in a fixed order: pruning, resolution decomposition, binary
//! mapping and numeric coercion turn a [`RawTable`] into a typed
//! [`PhoneTable`]; outlier replacement and median imputation then work on the
//! typed table with medians learned at fit.

use crate::config::{BinaryPhrases, Bounds, TransformerConfig};
use crate::dataset::{RawRecord, RawTable, RawValue};
use crate::error::{FeatureError, Result};
use crate::numeric;
use crate::schema::{PhoneRow, PhoneTable, RawColumn, RESOLUTION_COLUMN};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Schema columns an input table provides after pruning.
pub fn present_columns(table: &RawTable, config: &TransformerConfig) -> BTreeSet<RawColumn> {
    let dropped = |name: &str| config.dropped_columns.iter().any(|d| d == name);
    let mut present: BTreeSet<RawColumn> = table
        .columns()
        .iter()
        .filter(|name| !dropped(name.as_str()))
        .filter_map(|name| RawColumn::from_name(name))
        .collect();
    if table.has_column(RESOLUTION_COLUMN) && !dropped(RESOLUTION_COLUMN) {
        present.insert(RawColumn::ResWidth);
        present.insert(RawColumn::ResHeight);
    }

    let ignored = table.columns().len().saturating_sub(present.len());
    debug!(kept = present.len(), ignored, "pruned raw columns");
    present
}

/// Split `"<w>x<h>"` into its two numbers. Accepts `x`, `X` or `×`.
pub fn parse_resolution(value: &RawValue) -> Option<(f64, f64)> {
    let RawValue::Text(text) = value else {
        return None;
    };
    let mut parts = text.split(&['x', 'X', '×'][..]);
    let width = parts.next()?.trim().parse::<f64>().ok()?;
    let height = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() || !width.is_finite() || !height.is_finite() {
        return None;
    }
    Some((width, height))
}

/// Width is the longer side, height the shorter.
pub fn orient(width: f64, height: f64) -> (f64, f64) {
    (width.max(height), width.min(height))
}

/// Map a capability cell to 0 or 1. Unknown text and missing cells are 0.
pub fn map_binary(value: &RawValue, phrases: Option<&BinaryPhrases>) -> f64 {
    match value {
        RawValue::Missing => 0.0,
        RawValue::Number(v) => {
            if *v == 1.0 {
                1.0
            } else {
                0.0
            }
        }
        RawValue::Text(text) => {
            let text = text.trim();
            if let Some(p) = phrases {
                if text == p.positive {
                    return 1.0;
                }
                if text == p.negative {
                    return 0.0;
                }
            }
            match text.to_ascii_lowercase().as_str() {
                "1" | "1.0" | "true" => 1.0,
                _ => 0.0,
            }
        }
    }
}

/// Coerce a cell to a finite number; the placeholder and junk become missing.
pub fn coerce_numeric(value: &RawValue, placeholder: &str) -> Option<f64> {
    match value {
        RawValue::Missing => None,
        RawValue::Number(v) => Some(*v).filter(|v| v.is_finite()),
        RawValue::Text(text) => {
            let text = text.trim();
            if text == placeholder {
                return None;
            }
            text.parse::<f64>().ok().filter(|v| v.is_finite())
        }
    }
}

fn typed_row(
    record: &RawRecord,
    product_id: String,
    present: &BTreeSet<RawColumn>,
    config: &TransformerConfig,
) -> PhoneRow {
    let mut row = PhoneRow::new(product_id);
    let placeholder = config.price_placeholder.as_str();

    for &column in present {
        let cell = record.get(column.name());
        let value = if column.is_flag() {
            Some(map_binary(cell, config.binary_phrases.get(column.name())))
        } else {
            coerce_numeric(cell, placeholder)
        };
        row.set(column, value);
    }

    if let Some((w, h)) = parse_resolution(record.get(RESOLUTION_COLUMN)) {
        row.set(RawColumn::ResWidth, Some(w));
        row.set(RawColumn::ResHeight, Some(h));
    }
    if let (Some(w), Some(h)) = (row.get(RawColumn::ResWidth), row.get(RawColumn::ResHeight)) {
        let (w, h) = orient(w, h);
        row.set(RawColumn::ResWidth, Some(w));
        row.set(RawColumn::ResHeight, Some(h));
    }
    row
}

/// Stages 1 to 4: validate a raw table into the typed schema.
pub fn to_typed(table: &RawTable, config: &TransformerConfig) -> PhoneTable {
    let present = present_columns(table, config);
    let rows = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, record)| typed_row(record, table.product_id(i), &present, config))
        .collect();
    PhoneTable::new(present, rows)
}

/// Median of every present column over its non-missing values.
///
/// # Errors
/// [`FeatureError::DataQuality`] if a present column has no valid value.
pub fn median_snapshot(table: &PhoneTable) -> Result<BTreeMap<RawColumn, f64>> {
    let mut medians = BTreeMap::new();
    for column in table.columns() {
        let median = numeric::median(&table.column_values(column)).ok_or_else(|| {
            FeatureError::DataQuality {
                feature: column.name().to_string(),
            }
        })?;
        medians.insert(column, median);
    }
    Ok(medians)
}

/// Replace values outside their bounds with the stored median.
pub fn replace_outliers(
    table: &mut PhoneTable,
    bounds: &BTreeMap<RawColumn, Bounds>,
    medians: &BTreeMap<RawColumn, f64>,
) -> usize {
    let mut replaced = 0;
    for (&column, b) in bounds {
        let Some(&median) = medians.get(&column) else {
            continue;
        };
        if !table.has(column) {
            continue;
        }
        for row in &mut table.rows {
            if let Some(v) = row.get(column) {
                if !b.contains(v) {
                    row.set(column, Some(median));
                    replaced += 1;
                }
            }
        }
    }
    debug!(replaced, "replaced outliers with medians");
    replaced
}

/// Fill remaining missing values with the stored median.
pub fn impute_missing(table: &mut PhoneTable, medians: &BTreeMap<RawColumn, f64>) -> usize {
    let mut imputed = 0;
    let columns: Vec<RawColumn> = table.columns().collect();
    for column in columns {
        let Some(&median) = medians.get(&column) else {
            continue;
        };
        for row in &mut table.rows {
            if row.get(column).is_none() {
                row.set(column, Some(median));
                imputed += 1;
            }
        }
    }
    debug!(imputed, "imputed missing values");
    imputed
}

/// Fill a whole absent column with one value.
pub fn fill_column(table: &mut PhoneTable, column: RawColumn, value: f64) {
    for row in &mut table.rows {
        row.set(column, Some(value));
    }
    table.insert_column(column);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRICE_ON_REQUEST;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_parse_resolution_separators() {
        assert_eq!(parse_resolution(&text("1170x2532")), Some((1170.0, 2532.0)));
        assert_eq!(parse_resolution(&text(" 1080 X 2400 ")), Some((1080.0, 2400.0)));
        assert_eq!(parse_resolution(&text("720×1600")), Some((720.0, 1600.0)));
    }

    #[test]
    fn test_parse_resolution_rejects_junk() {
        assert_eq!(parse_resolution(&text("Full HD+")), None);
        assert_eq!(parse_resolution(&text("1x2x3")), None);
        assert_eq!(parse_resolution(&RawValue::Missing), None);
        assert_eq!(parse_resolution(&RawValue::Number(1080.0)), None);
    }

    #[test]
    fn test_orient() {
        assert_eq!(orient(1080.0, 2400.0), (2400.0, 1080.0));
        assert_eq!(orient(2400.0, 1080.0), (2400.0, 1080.0));
    }

    #[test]
    fn test_map_binary() {
        let phrases = BinaryPhrases::new("Có camera tele", "Không có camera tele");
        assert_eq!(map_binary(&text("Có camera tele"), Some(&phrases)), 1.0);
        assert_eq!(map_binary(&text("Không có camera tele"), Some(&phrases)), 0.0);
        assert_eq!(map_binary(&text("maybe"), Some(&phrases)), 0.0);
        assert_eq!(map_binary(&text("1"), Some(&phrases)), 1.0);
        assert_eq!(map_binary(&text("True"), None), 1.0);
        assert_eq!(map_binary(&RawValue::Number(1.0), None), 1.0);
        assert_eq!(map_binary(&RawValue::Number(7.0), None), 0.0);
        assert_eq!(map_binary(&RawValue::Missing, Some(&phrases)), 0.0);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric(&text(" 6.1 "), PRICE_ON_REQUEST), Some(6.1));
        assert_eq!(coerce_numeric(&text(PRICE_ON_REQUEST), PRICE_ON_REQUEST), None);
        assert_eq!(coerce_numeric(&text("abc"), PRICE_ON_REQUEST), None);
        assert_eq!(coerce_numeric(&text("inf"), PRICE_ON_REQUEST), None);
        assert_eq!(coerce_numeric(&RawValue::Number(f64::NAN), PRICE_ON_REQUEST), None);
        assert_eq!(coerce_numeric(&RawValue::Number(3.0), PRICE_ON_REQUEST), Some(3.0));
    }

    #[test]
    fn test_to_typed_prunes_and_decomposes() {
        let table = RawTable::from_records(vec![RawRecord::new()
            .with("Name", "Phone A")
            .with("Brand", "A")
            .with("Color", "red")
            .with("ScreenSize", "6.5")
            .with("Resolution", "1080x2400")
            .with("has_ois", "Có chống rung OIS")]);
        let typed = to_typed(&table, &TransformerConfig::default());

        assert_eq!(
            typed.column_names(),
            vec!["ScreenSize", "Res_Width", "Res_Height", "has_ois"]
        );
        let row = &typed.rows[0];
        assert_eq!(row.get(RawColumn::ResWidth), Some(2400.0));
        assert_eq!(row.get(RawColumn::ResHeight), Some(1080.0));
        assert_eq!(row.get(RawColumn::HasOis), Some(1.0));
        assert_eq!(row.product_id, "001");
    }

    #[test]
    fn test_unparsable_resolution_falls_back_to_explicit_cells() {
        let table = RawTable::from_records(vec![RawRecord::new()
            .with("Resolution", "QHD")
            .with("Res_Width", 1440.0)
            .with("Res_Height", 3200.0)]);
        let typed = to_typed(&table, &TransformerConfig::default());
        assert_eq!(typed.rows[0].get(RawColumn::ResWidth), Some(3200.0));
        assert_eq!(typed.rows[0].get(RawColumn::ResHeight), Some(1440.0));
    }

    #[test]
    fn test_median_snapshot_requires_values() {
        let table = RawTable::from_records(vec![
            RawRecord::new().with("ScreenSize", "n/a").with("num_cameras", 3.0),
            RawRecord::new().with("ScreenSize", "?").with("num_cameras", 2.0),
        ]);
        let typed = to_typed(&table, &TransformerConfig::default());
        match median_snapshot(&typed) {
            Err(FeatureError::DataQuality { feature }) => assert_eq!(feature, "ScreenSize"),
            other => panic!("expected DataQuality, got {other:?}"),
        }
    }

    #[test]
    fn test_outliers_then_imputation() {
        let table = RawTable::from_records(vec![
            RawRecord::new().with("ScreenSize", 6.0),
            RawRecord::new().with("ScreenSize", 15.0),
            RawRecord::new().with("ScreenSize", 7.0),
            RawRecord::new().with("ScreenSize", RawValue::Missing),
        ]);
        let config = TransformerConfig::default();
        let mut typed = to_typed(&table, &config);
        let medians = median_snapshot(&typed).unwrap();
        assert_eq!(medians[&RawColumn::ScreenSize], 7.0);

        let bounds = config.resolved_bounds().unwrap();
        assert_eq!(replace_outliers(&mut typed, &bounds, &medians), 1);
        assert_eq!(impute_missing(&mut typed, &medians), 1);
        assert_eq!(typed.column_values(RawColumn::ScreenSize), vec![6.0, 7.0, 7.0, 7.0]);
        assert_eq!(typed.len(), 4);
    }
}
