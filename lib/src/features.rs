//! Engineered feature layout: groups, feature names, references and frames.
//!
//! Features are organised in five groups, one per feature-store view, and are
//! addressed as `"<group>:<feature>"`:
//!
//! | group           | features |
//! |-----------------|----------|
//! | `phone_display` | ScreenSize, Res_Width, Res_Height, PPI, total_resolution |
//! | `phone_camera`  | main_camera_mp, num_cameras, has_telephoto, has_ultrawide, has_ois, camera_feature_count, camera_score |
//! | `phone_product` | NumberOfReview, has_warranty |
//! | `phone_ratings` | camera_rating, display_score, popularity_score, overall_score |
//! | `phone_value`   | value_score, is_premium, price_segment |

use crate::error::{FeatureError, Result};
use crate::schema::RawColumn;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FeatureGroup {
    Display,
    Camera,
    Product,
    Ratings,
    Value,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 5] = [
        FeatureGroup::Display,
        FeatureGroup::Camera,
        FeatureGroup::Product,
        FeatureGroup::Ratings,
        FeatureGroup::Value,
    ];

    /// Feature-store view name.
    pub fn name(self) -> &'static str {
        match self {
            FeatureGroup::Display => "phone_display",
            FeatureGroup::Camera => "phone_camera",
            FeatureGroup::Product => "phone_product",
            FeatureGroup::Ratings => "phone_ratings",
            FeatureGroup::Value => "phone_value",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        FeatureGroup::ALL.iter().copied().find(|g| g.name() == name)
    }

    pub fn features(self) -> &'static [Feature] {
        use Feature::*;
        match self {
            FeatureGroup::Display => &[ScreenSize, ResWidth, ResHeight, Ppi, TotalResolution],
            FeatureGroup::Camera => &[
                MainCameraMp,
                NumCameras,
                HasTelephoto,
                HasUltrawide,
                HasOis,
                CameraFeatureCount,
                CameraScore,
            ],
            FeatureGroup::Product => &[NumberOfReview, HasWarranty],
            FeatureGroup::Ratings => &[CameraRating, DisplayScore, PopularityScore, OverallScore],
            FeatureGroup::Value => &[ValueScore, IsPremium, PriceSegment],
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One engineered output column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    ScreenSize,
    ResWidth,
    ResHeight,
    Ppi,
    TotalResolution,
    MainCameraMp,
    NumCameras,
    HasTelephoto,
    HasUltrawide,
    HasOis,
    CameraFeatureCount,
    CameraScore,
    NumberOfReview,
    HasWarranty,
    CameraRating,
    DisplayScore,
    PopularityScore,
    OverallScore,
    ValueScore,
    IsPremium,
    PriceSegment,
}

impl Feature {
    pub const COUNT: usize = 21;

    /// Output order: grouped, groups in [`FeatureGroup::ALL`] order.
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::ScreenSize,
        Feature::ResWidth,
        Feature::ResHeight,
        Feature::Ppi,
        Feature::TotalResolution,
        Feature::MainCameraMp,
        Feature::NumCameras,
        Feature::HasTelephoto,
        Feature::HasUltrawide,
        Feature::HasOis,
        Feature::CameraFeatureCount,
        Feature::CameraScore,
        Feature::NumberOfReview,
        Feature::HasWarranty,
        Feature::CameraRating,
        Feature::DisplayScore,
        Feature::PopularityScore,
        Feature::OverallScore,
        Feature::ValueScore,
        Feature::IsPremium,
        Feature::PriceSegment,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::ScreenSize => RawColumn::ScreenSize.name(),
            Feature::ResWidth => RawColumn::ResWidth.name(),
            Feature::ResHeight => RawColumn::ResHeight.name(),
            Feature::MainCameraMp => RawColumn::MainCameraMp.name(),
            Feature::NumCameras => RawColumn::NumCameras.name(),
            Feature::HasTelephoto => RawColumn::HasTelephoto.name(),
            Feature::HasUltrawide => RawColumn::HasUltrawide.name(),
            Feature::HasOis => RawColumn::HasOis.name(),
            Feature::HasWarranty => RawColumn::HasWarranty.name(),
            Feature::NumberOfReview => RawColumn::NumberOfReview.name(),
            Feature::Ppi => "PPI",
            Feature::TotalResolution => "total_resolution",
            Feature::CameraFeatureCount => "camera_feature_count",
            Feature::CameraScore => "camera_score",
            Feature::CameraRating => "camera_rating",
            Feature::DisplayScore => "display_score",
            Feature::PopularityScore => "popularity_score",
            Feature::OverallScore => "overall_score",
            Feature::ValueScore => "value_score",
            Feature::IsPremium => "is_premium",
            Feature::PriceSegment => "price_segment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn group(self) -> FeatureGroup {
        use Feature::*;
        match self {
            ScreenSize | ResWidth | ResHeight | Ppi | TotalResolution => FeatureGroup::Display,
            MainCameraMp | NumCameras | HasTelephoto | HasUltrawide | HasOis
            | CameraFeatureCount | CameraScore => FeatureGroup::Camera,
            NumberOfReview | HasWarranty => FeatureGroup::Product,
            CameraRating | DisplayScore | PopularityScore | OverallScore => FeatureGroup::Ratings,
            ValueScore | IsPremium | PriceSegment => FeatureGroup::Value,
        }
    }

    /// The cleaned raw attribute this feature passes through, if any.
    pub fn raw_column(self) -> Option<RawColumn> {
        match self {
            Feature::ScreenSize => Some(RawColumn::ScreenSize),
            Feature::ResWidth => Some(RawColumn::ResWidth),
            Feature::ResHeight => Some(RawColumn::ResHeight),
            Feature::MainCameraMp => Some(RawColumn::MainCameraMp),
            Feature::NumCameras => Some(RawColumn::NumCameras),
            Feature::HasTelephoto => Some(RawColumn::HasTelephoto),
            Feature::HasUltrawide => Some(RawColumn::HasUltrawide),
            Feature::HasOis => Some(RawColumn::HasOis),
            Feature::HasWarranty => Some(RawColumn::HasWarranty),
            Feature::NumberOfReview => Some(RawColumn::NumberOfReview),
            _ => None,
        }
    }

    pub fn feature_ref(self) -> FeatureRef {
        FeatureRef {
            group: self.group(),
            feature: self,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated `"<group>:<feature>"` reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureRef {
    group: FeatureGroup,
    feature: Feature,
}

impl FeatureRef {
    /// Parse a reference, checking that the feature belongs to the group.
    pub fn parse(text: &str) -> Result<Self> {
        let unknown = || FeatureError::UnknownFeature(text.to_string());
        let (group, feature) = text.split_once(':').ok_or_else(unknown)?;
        let group = FeatureGroup::from_name(group.trim()).ok_or_else(unknown)?;
        let feature = Feature::from_name(feature.trim()).ok_or_else(unknown)?;
        if feature.group() != group {
            return Err(unknown());
        }
        Ok(Self { group, feature })
    }

    /// Parse a list of references, stopping at the first invalid one.
    pub fn parse_all<S: AsRef<str>>(texts: &[S]) -> Result<Vec<Self>> {
        texts.iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    pub fn group(&self) -> FeatureGroup {
        self.group
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group.name(), self.feature.name())
    }
}

impl FromStr for FeatureRef {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FeatureRef {
    type Error = FeatureError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<FeatureRef> for String {
    fn from(value: FeatureRef) -> Self {
        value.to_string()
    }
}

/// Engineered features of one listing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatureVector {
    values: BTreeMap<Feature, f64>,
}

impl EngineeredFeatureVector {
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    pub fn insert(&mut self, feature: Feature, value: f64) {
        self.values.insert(feature, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    /// Values for `refs` in order.
    pub fn select(&self, refs: &[FeatureRef]) -> Result<Vec<f64>> {
        refs.iter()
            .map(|r| {
                self.get(r.feature())
                    .ok_or_else(|| FeatureError::UnknownFeature(r.to_string()))
            })
            .collect()
    }
}

/// Transformed batch: one row per input listing, one column per feature.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineeredFrame {
    product_ids: Vec<String>,
    features: Vec<Feature>,
    values: Array2<f64>,
}

impl EngineeredFrame {
    pub fn new(product_ids: Vec<String>, features: Vec<Feature>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != product_ids.len() || values.ncols() != features.len() {
            return Err(FeatureError::InvalidParameter(format!(
                "frame values are {}x{} but there are {} ids and {} features",
                values.nrows(),
                values.ncols(),
                product_ids.len(),
                features.len()
            )));
        }
        Ok(Self {
            product_ids,
            features,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    pub fn product_ids(&self) -> &[String] {
        &self.product_ids
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    fn position(&self, feature: Feature) -> Option<usize> {
        self.features.iter().position(|f| *f == feature)
    }

    pub fn get(&self, row: usize, feature: Feature) -> Option<f64> {
        let col = self.position(feature)?;
        self.values.get((row, col)).copied()
    }

    pub fn column(&self, feature: Feature) -> Option<ArrayView1<'_, f64>> {
        self.position(feature).map(|col| self.values.column(col))
    }

    pub fn row_index(&self, product_id: &str) -> Option<usize> {
        self.product_ids.iter().position(|id| id == product_id)
    }

    pub fn row(&self, row: usize) -> Option<EngineeredFeatureVector> {
        if row >= self.len() {
            return None;
        }
        let mut vector = EngineeredFeatureVector::default();
        for (col, feature) in self.features.iter().enumerate() {
            vector.insert(*feature, self.values[(row, col)]);
        }
        Some(vector)
    }

    /// Model input matrix with columns in `refs` order.
    pub fn select(&self, refs: &[FeatureRef]) -> Result<Array2<f64>> {
        let cols = refs
            .iter()
            .map(|r| {
                self.position(r.feature())
                    .ok_or_else(|| FeatureError::UnknownFeature(r.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(Array2::from_shape_fn((self.len(), cols.len()), |(i, j)| {
            self.values[(i, cols[j])]
        }))
    }

    /// Write `product_id` followed by every feature column.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }

    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![crate::schema::PRODUCT_ID_COLUMN];
        header.extend(self.feature_names());
        wtr.write_record(&header)?;

        for (i, id) in self.product_ids.iter().enumerate() {
            let mut record = Vec::with_capacity(self.features.len() + 1);
            record.push(id.clone());
            record.extend(self.values.row(i).iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_group_layout_covers_every_feature_once() {
        let mut seen: Vec<Feature> = FeatureGroup::ALL
            .iter()
            .flat_map(|g| g.features().iter().copied())
            .collect();
        assert_eq!(seen, Feature::ALL.to_vec());
        seen.dedup();
        assert_eq!(seen.len(), Feature::COUNT);
        for feature in Feature::ALL {
            assert!(feature.group().features().contains(&feature));
        }
    }

    #[test]
    fn test_feature_names() {
        assert_eq!(Feature::Ppi.name(), "PPI");
        assert_eq!(Feature::ResWidth.name(), "Res_Width");
        assert_eq!(Feature::from_name("camera_score"), Some(Feature::CameraScore));
        assert_eq!(Feature::from_name("DiscountedPrice"), None);
    }

    #[test]
    fn test_feature_ref_parse() {
        let r = FeatureRef::parse("phone_display:PPI").unwrap();
        assert_eq!(r.group(), FeatureGroup::Display);
        assert_eq!(r.feature(), Feature::Ppi);
        assert_eq!(r.to_string(), "phone_display:PPI");
        assert_eq!(Feature::Ppi.feature_ref(), r);
    }

    #[test]
    fn test_feature_ref_rejects_wrong_group() {
        assert!(matches!(
            FeatureRef::parse("phone_camera:PPI"),
            Err(FeatureError::UnknownFeature(_))
        ));
        assert!(FeatureRef::parse("PPI").is_err());
        assert!(FeatureRef::parse("phone_display:battery").is_err());
    }

    #[test]
    fn test_feature_ref_serde_as_string() {
        let r = FeatureRef::parse("phone_value:value_score").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"phone_value:value_score\"");
        let back: FeatureRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    fn sample_frame() -> EngineeredFrame {
        EngineeredFrame::new(
            vec!["001".to_string(), "002".to_string()],
            vec![Feature::ScreenSize, Feature::Ppi],
            array![[6.1, 460.0], [6.7, 390.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_frame_select_orders_columns() {
        let frame = sample_frame();
        let refs = FeatureRef::parse_all(&["phone_display:PPI", "phone_display:ScreenSize"]).unwrap();
        let x = frame.select(&refs).unwrap();
        assert_eq!(x, array![[460.0, 6.1], [390.0, 6.7]]);
    }

    #[test]
    fn test_frame_select_unknown_column() {
        let frame = sample_frame();
        let refs = FeatureRef::parse_all(&["phone_value:value_score"]).unwrap();
        assert!(matches!(
            frame.select(&refs),
            Err(FeatureError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_frame_row_and_lookup() {
        let frame = sample_frame();
        let idx = frame.row_index("002").unwrap();
        let row = frame.row(idx).unwrap();
        assert_eq!(row.get(Feature::ScreenSize), Some(6.7));
        assert_eq!(frame.get(0, Feature::Ppi), Some(460.0));
        assert!(frame.row(5).is_none());
    }

    #[test]
    fn test_frame_shape_checked() {
        let result = EngineeredFrame::new(vec!["001".to_string()], vec![Feature::Ppi], array![[1.0, 2.0]]);
        assert!(matches!(result, Err(FeatureError::InvalidParameter(_))));
    }

    #[test]
    fn test_frame_to_writer() {
        let frame = sample_frame();
        let mut out = Vec::new();
        frame.to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("product_id,ScreenSize,PPI"));
        assert_eq!(lines.next(), Some("001,6.1,460"));
    }
}
