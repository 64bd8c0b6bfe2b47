use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Value of a selector meaning "no constraint at this level".
pub const ALL: &str = "all";

/// One CSV row as it appears in the survey export, before any cleaning.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "KABUPATEN")]
    pub province_region: Option<String>,
    #[serde(rename = "KECAMATAN")]
    pub sub_region: Option<String>,
    #[serde(rename = "DESA")]
    pub village: Option<String>,
    #[serde(rename = "NAMA RUAS JALAN DESA")]
    pub segment_name: Option<String>,
    #[serde(rename = "JENIS PERKERASAN")]
    pub surface_type: Option<String>,
    #[serde(rename = "BAIK (meter)")]
    pub good: Option<String>,
    #[serde(rename = "RUSAK RINGAN (meter)")]
    pub light_damage: Option<String>,
    #[serde(rename = "RUSAK SEDANG (meter)")]
    pub moderate_damage: Option<String>,
    #[serde(rename = "RUSAK BERAT (meter)")]
    pub heavy_damage: Option<String>,
    #[serde(
        rename = "TOTAL PANJANG JALAN (meter)",
        alias = "TOTAL PANJANG JALAN DESA (meter)"
    )]
    pub total_length: Option<String>,
    #[serde(rename = "LAT AWAL")]
    pub lat_start: Option<String>,
    #[serde(rename = "LNG AWAL")]
    pub lon_start: Option<String>,
    #[serde(rename = "LAT AKHIR")]
    pub lat_end: Option<String>,
    #[serde(rename = "LNG AKHIR")]
    pub lon_end: Option<String>,
}

impl RawRow {
    /// Build a row from cells given in [`Column::ALL`] order.
    pub(crate) fn from_cells(cells: Vec<Option<String>>) -> Self {
        let mut it = cells.into_iter();
        let mut next = || it.next().flatten();
        RawRow {
            province_region: next(),
            sub_region: next(),
            village: next(),
            segment_name: next(),
            surface_type: next(),
            good: next(),
            light_damage: next(),
            moderate_damage: next(),
            heavy_damage: next(),
            total_length: next(),
            lat_start: next(),
            lon_start: next(),
            lat_end: next(),
            lon_end: next(),
        }
    }
}

/// One surveyed stretch of village road.
///
/// Identifiers are `None` when the source cell was empty; lengths are `None` when the
/// cell was empty or not numeric. Serializes back to the survey headers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RoadSegment {
    #[serde(rename = "KABUPATEN")]
    pub province_region: Option<String>,
    #[serde(rename = "KECAMATAN")]
    pub sub_region: Option<String>,
    #[serde(rename = "DESA")]
    pub village: Option<String>,
    #[serde(rename = "NAMA RUAS JALAN DESA")]
    pub segment_name: Option<String>,
    #[serde(rename = "JENIS PERKERASAN")]
    pub surface_type: Option<String>,
    #[serde(rename = "BAIK (meter)")]
    pub good: Option<f64>,
    #[serde(rename = "RUSAK RINGAN (meter)")]
    pub light_damage: Option<f64>,
    #[serde(rename = "RUSAK SEDANG (meter)")]
    pub moderate_damage: Option<f64>,
    #[serde(rename = "RUSAK BERAT (meter)")]
    pub heavy_damage: Option<f64>,
    #[serde(rename = "TOTAL PANJANG JALAN (meter)")]
    pub total_length: Option<f64>,
    #[serde(rename = "LAT AWAL")]
    pub lat_start: Option<f64>,
    #[serde(rename = "LNG AWAL")]
    pub lon_start: Option<f64>,
    #[serde(rename = "LAT AKHIR")]
    pub lat_end: Option<f64>,
    #[serde(rename = "LNG AKHIR")]
    pub lon_end: Option<f64>,
}

impl RoadSegment {
    /// Sum of the four condition lengths, missing values counted as zero.
    pub fn condition_sum(&self) -> f64 {
        [self.good, self.light_damage, self.moderate_damage, self.heavy_damage]
            .iter()
            .map(|v| v.unwrap_or(0.0))
            .sum()
    }

    pub fn has_missing_length(&self) -> bool {
        self.good.is_none()
            || self.light_damage.is_none()
            || self.moderate_damage.is_none()
            || self.heavy_damage.is_none()
    }

    /// Both endpoints, only when all four coordinates are present.
    pub fn endpoints(&self) -> Option<((f64, f64), (f64, f64))> {
        Some((
            (self.lat_start?, self.lon_start?),
            (self.lat_end?, self.lon_end?),
        ))
    }
}

/// Columns of the survey dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    ProvinceRegion,
    SubRegion,
    Village,
    SegmentName,
    SurfaceType,
    Good,
    LightDamage,
    ModerateDamage,
    HeavyDamage,
    TotalLength,
    LatStart,
    LonStart,
    LatEnd,
    LonEnd,
}

static COLUMN_BY_HEADER: Lazy<HashMap<&'static str, Column>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for col in Column::ALL {
        for header in col.headers() {
            map.insert(*header, col);
        }
    }
    map
});

impl Column {
    pub const ALL: [Column; 14] = [
        Column::ProvinceRegion,
        Column::SubRegion,
        Column::Village,
        Column::SegmentName,
        Column::SurfaceType,
        Column::Good,
        Column::LightDamage,
        Column::ModerateDamage,
        Column::HeavyDamage,
        Column::TotalLength,
        Column::LatStart,
        Column::LonStart,
        Column::LatEnd,
        Column::LonEnd,
    ];

    /// Canonical header name in the survey export.
    pub fn header(self) -> &'static str {
        self.headers()[0]
    }

    /// Accepted header spellings; the first is canonical.
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            Column::ProvinceRegion => &["KABUPATEN"],
            Column::SubRegion => &["KECAMATAN"],
            Column::Village => &["DESA"],
            Column::SegmentName => &["NAMA RUAS JALAN DESA"],
            Column::SurfaceType => &["JENIS PERKERASAN"],
            Column::Good => &["BAIK (meter)"],
            Column::LightDamage => &["RUSAK RINGAN (meter)"],
            Column::ModerateDamage => &["RUSAK SEDANG (meter)"],
            Column::HeavyDamage => &["RUSAK BERAT (meter)"],
            Column::TotalLength => &[
                "TOTAL PANJANG JALAN (meter)",
                "TOTAL PANJANG JALAN DESA (meter)",
            ],
            Column::LatStart => &["LAT AWAL"],
            Column::LonStart => &["LNG AWAL"],
            Column::LatEnd => &["LAT AKHIR"],
            Column::LonEnd => &["LNG AKHIR"],
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        COLUMN_BY_HEADER.get(header.trim()).copied()
    }

    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Column::ProvinceRegion
                | Column::SubRegion
                | Column::Village
                | Column::SegmentName
                | Column::SurfaceType
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Categorical columns that selectors and group-bys operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    ProvinceRegion,
    SubRegion,
    Village,
    SegmentName,
    SurfaceType,
}

impl Dimension {
    pub fn column(self) -> Column {
        match self {
            Dimension::ProvinceRegion => Column::ProvinceRegion,
            Dimension::SubRegion => Column::SubRegion,
            Dimension::Village => Column::Village,
            Dimension::SegmentName => Column::SegmentName,
            Dimension::SurfaceType => Column::SurfaceType,
        }
    }

    pub fn value<'a>(self, row: &'a RoadSegment) -> Option<&'a str> {
        match self {
            Dimension::ProvinceRegion => row.province_region.as_deref(),
            Dimension::SubRegion => row.sub_region.as_deref(),
            Dimension::Village => row.village.as_deref(),
            Dimension::SegmentName => row.segment_name.as_deref(),
            Dimension::SurfaceType => row.surface_type.as_deref(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().header())
    }
}

/// A single selector value: either the "all" sentinel or an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v.as_str()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Literal comparison; a missing cell never matches a concrete value.
    pub fn matches(&self, cell: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => cell == Some(v.as_str()),
        }
    }
}

impl FromStr for Selection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Selection::parse(s))
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(v) => f.write_str(v),
        }
    }
}

/// Hierarchical selection: province region, sub-region, village, plus surface type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectionCriteria {
    pub province_region: Selection,
    pub sub_region: Selection,
    pub village: Selection,
    pub surface_type: Selection,
}

impl SelectionCriteria {
    /// Criteria with every field set to "all".
    pub fn all() -> Self {
        Self::default()
    }

    /// Active constraints as `(dimension, value)` pairs, hierarchy first.
    pub fn constraints(&self) -> Vec<(Dimension, &str)> {
        [
            (Dimension::ProvinceRegion, &self.province_region),
            (Dimension::SubRegion, &self.sub_region),
            (Dimension::Village, &self.village),
            (Dimension::SurfaceType, &self.surface_type),
        ]
        .into_iter()
        .filter_map(|(dim, sel)| sel.value().map(|v| (dim, v)))
        .collect()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints().is_empty()
    }

    /// Dimension the chart grouping should break down by: one level below the deepest
    /// active region selection.
    pub fn grouping_dimension(&self) -> Dimension {
        if !self.village.is_all() {
            Dimension::SegmentName
        } else if !self.sub_region.is_all() {
            Dimension::Village
        } else if !self.province_region.is_all() {
            Dimension::SubRegion
        } else {
            Dimension::ProvinceRegion
        }
    }
}

impl fmt::Display for SelectionCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {} ({})",
            self.province_region, self.sub_region, self.village, self.surface_type
        )
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupSummaryRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Good")]
    #[tabled(rename = "Good")]
    pub good: String,
    #[serde(rename = "LightDamage")]
    #[tabled(rename = "LightDamage")]
    pub light: String,
    #[serde(rename = "ModerateDamage")]
    #[tabled(rename = "ModerateDamage")]
    pub moderate: String,
    #[serde(rename = "HeavyDamage")]
    #[tabled(rename = "HeavyDamage")]
    pub heavy: String,
    #[serde(rename = "DamagedPct")]
    #[tabled(rename = "DamagedPct")]
    pub damaged_pct: String,
    #[serde(rename = "ShareOfTotalPct")]
    #[tabled(rename = "ShareOfTotalPct")]
    pub share_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct VillageSummaryRow {
    #[serde(rename = "KABUPATEN")]
    #[tabled(rename = "KABUPATEN")]
    pub province_region: String,
    #[serde(rename = "KECAMATAN")]
    #[tabled(rename = "KECAMATAN")]
    pub sub_region: String,
    #[serde(rename = "DESA")]
    #[tabled(rename = "DESA")]
    pub village: String,
    #[serde(rename = "BAIK (meter)")]
    #[tabled(rename = "BAIK (meter)")]
    pub good: String,
    #[serde(rename = "RUSAK RINGAN (meter)")]
    #[tabled(rename = "RUSAK RINGAN (meter)")]
    pub light: String,
    #[serde(rename = "RUSAK SEDANG (meter)")]
    #[tabled(rename = "RUSAK SEDANG (meter)")]
    pub moderate: String,
    #[serde(rename = "RUSAK BERAT (meter)")]
    #[tabled(rename = "RUSAK BERAT (meter)")]
    pub heavy: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CostEstimateRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Length")]
    #[tabled(rename = "Length")]
    pub length: String,
    #[serde(rename = "Asphalt")]
    #[tabled(rename = "Asphalt")]
    pub asphalt: String,
    #[serde(rename = "Concrete")]
    #[tabled(rename = "Concrete")]
    pub concrete: String,
    #[serde(rename = "PavingBlock")]
    #[tabled(rename = "PavingBlock")]
    pub paving: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub generated_at: String,
    pub criteria: String,
    pub total_segments: usize,
    pub total_length: f64,
    pub good: f64,
    pub light_damage: f64,
    pub moderate_damage: f64,
    pub heavy_damage: f64,
    pub total_damaged: f64,
    pub good_pct: f64,
    pub damaged_pct: f64,
    pub longest_heavy_damage: Option<HeavyDamageHighlight>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HeavyDamageHighlight {
    pub location: String,
    pub segment_name: String,
    pub heavy_damage: f64,
}
