//! Typed row schema for phone listings.
//!
//! Raw tables are loosely typed (any column, any cell). Before any derivation
//! runs they are validated once against [`SCHEMA`] into a [`PhoneTable`]: a
//! fixed set of known columns, each cell either a number or missing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Combined `"<width>x<height>"` resolution column.
pub const RESOLUTION_COLUMN: &str = "Resolution";

/// Stable per-row identifier column.
pub const PRODUCT_ID_COLUMN: &str = "product_id";

/// Raw attributes kept after pruning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RawColumn {
    ScreenSize,
    #[serde(rename = "Res_Width")]
    ResWidth,
    #[serde(rename = "Res_Height")]
    ResHeight,
    #[serde(rename = "main_camera_mp")]
    MainCameraMp,
    #[serde(rename = "num_cameras")]
    NumCameras,
    #[serde(rename = "has_telephoto")]
    HasTelephoto,
    #[serde(rename = "has_ultrawide")]
    HasUltrawide,
    #[serde(rename = "has_ois")]
    HasOis,
    #[serde(rename = "has_warranty")]
    HasWarranty,
    NumberOfReview,
    DiscountedPrice,
}

impl RawColumn {
    pub const COUNT: usize = 11;

    pub const ALL: [RawColumn; RawColumn::COUNT] = [
        RawColumn::ScreenSize,
        RawColumn::ResWidth,
        RawColumn::ResHeight,
        RawColumn::MainCameraMp,
        RawColumn::NumCameras,
        RawColumn::HasTelephoto,
        RawColumn::HasUltrawide,
        RawColumn::HasOis,
        RawColumn::HasWarranty,
        RawColumn::NumberOfReview,
        RawColumn::DiscountedPrice,
    ];

    /// Column name as it appears in scraped tables.
    pub fn name(self) -> &'static str {
        match self {
            RawColumn::ScreenSize => "ScreenSize",
            RawColumn::ResWidth => "Res_Width",
            RawColumn::ResHeight => "Res_Height",
            RawColumn::MainCameraMp => "main_camera_mp",
            RawColumn::NumCameras => "num_cameras",
            RawColumn::HasTelephoto => "has_telephoto",
            RawColumn::HasUltrawide => "has_ultrawide",
            RawColumn::HasOis => "has_ois",
            RawColumn::HasWarranty => "has_warranty",
            RawColumn::NumberOfReview => "NumberOfReview",
            RawColumn::DiscountedPrice => "DiscountedPrice",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RawColumn::ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Capability flags are mapped to {0, 1} instead of coerced.
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            RawColumn::HasTelephoto
                | RawColumn::HasUltrawide
                | RawColumn::HasOis
                | RawColumn::HasWarranty
        )
    }

    pub fn field(self) -> &'static FieldSpec {
        &SCHEMA[self.index()]
    }
}

/// Whether a derivation needs the column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Needed by a derived feature; an absent column is substituted from the
    /// fitted median or reported as missing.
    Required,
    /// Derivations that need it are skipped, or it takes its fallback.
    Optional,
}

/// Value used when the whole column is absent from an input table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// The fit-time median.
    Median,
    /// Absence means "does not have".
    Zero,
    /// No substitute; the column stays absent.
    Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: RawColumn,
    pub requirement: Requirement,
    pub fallback: Fallback,
}

const fn field(column: RawColumn, requirement: Requirement, fallback: Fallback) -> FieldSpec {
    FieldSpec {
        column,
        requirement,
        fallback,
    }
}

/// Field list in [`RawColumn`] index order.
pub static SCHEMA: [FieldSpec; RawColumn::COUNT] = [
    field(RawColumn::ScreenSize, Requirement::Required, Fallback::Median),
    field(RawColumn::ResWidth, Requirement::Required, Fallback::Median),
    field(RawColumn::ResHeight, Requirement::Required, Fallback::Median),
    field(RawColumn::MainCameraMp, Requirement::Required, Fallback::Median),
    field(RawColumn::NumCameras, Requirement::Required, Fallback::Median),
    field(RawColumn::HasTelephoto, Requirement::Optional, Fallback::Zero),
    field(RawColumn::HasUltrawide, Requirement::Optional, Fallback::Zero),
    field(RawColumn::HasOis, Requirement::Optional, Fallback::Zero),
    field(RawColumn::HasWarranty, Requirement::Optional, Fallback::Zero),
    field(RawColumn::NumberOfReview, Requirement::Required, Fallback::Median),
    field(RawColumn::DiscountedPrice, Requirement::Optional, Fallback::Absent),
];

/// One validated listing: every schema column as a number or missing.
#[derive(Clone, Debug, PartialEq)]
pub struct PhoneRow {
    pub product_id: String,
    values: [Option<f64>; RawColumn::COUNT],
}

impl PhoneRow {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            values: [None; RawColumn::COUNT],
        }
    }

    pub fn get(&self, column: RawColumn) -> Option<f64> {
        self.values[column.index()]
    }

    /// Stores `value`, turning non-finite numbers into missing.
    pub fn set(&mut self, column: RawColumn, value: Option<f64>) {
        self.values[column.index()] = value.filter(|v| v.is_finite());
    }

    /// Value of a column that imputation has already filled.
    pub fn value(&self, column: RawColumn) -> f64 {
        self.get(column).unwrap_or(f64::NAN)
    }
}

/// A validated table: the set of columns the input carried plus typed rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhoneTable {
    columns: BTreeSet<RawColumn>,
    pub rows: Vec<PhoneRow>,
}

impl PhoneTable {
    pub fn new(columns: BTreeSet<RawColumn>, rows: Vec<PhoneRow>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has(&self, column: RawColumn) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = RawColumn> + '_ {
        self.columns.iter().copied()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_string()).collect()
    }

    pub(crate) fn insert_column(&mut self, column: RawColumn) {
        self.columns.insert(column);
    }

    /// Column values with missing cells as NaN.
    pub fn column_values(&self, column: RawColumn) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(column)).collect()
    }
}
