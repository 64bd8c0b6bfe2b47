use std::collections::BTreeMap;

use chrono::Local;

use crate::dataset::Dataset;
use crate::stats::{compute_stats, longest_heavy_damage, percent_of, ConditionStats};
use crate::types::{
    CostEstimateRow, Dimension, GroupSummaryRow, HeavyDamageHighlight, RoadSegment,
    SelectionCriteria, SummaryStats, VillageSummaryRow,
};
use crate::util::format_number;

/// Label used for the grand-total line of the village summary.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Condition totals for one value of a grouping dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotals {
    pub key: String,
    pub stats: ConditionStats,
}

/// Sum the four categories per distinct value of `dim`, ascending by key.
/// Rows with no value for `dim` are left out.
pub fn summarize_by(rows: &[RoadSegment], dim: Dimension) -> Vec<GroupTotals> {
    let mut map: BTreeMap<&str, ConditionStats> = BTreeMap::new();
    for r in rows {
        if let Some(key) = dim.value(r) {
            map.entry(key).or_default().add(r);
        }
    }
    map.into_iter()
        .map(|(key, stats)| GroupTotals {
            key: key.to_string(),
            stats,
        })
        .collect()
}

/// Chart breakdown following the deepest active region selection.
pub fn generate_group_report(filtered: &Dataset, criteria: &SelectionCriteria) -> Vec<GroupSummaryRow> {
    group_rows(&summarize_by(filtered.rows(), criteria.grouping_dimension()))
}

/// Breakdown by surface type.
pub fn generate_surface_report(filtered: &Dataset) -> Vec<GroupSummaryRow> {
    group_rows(&summarize_by(filtered.rows(), Dimension::SurfaceType))
}

fn group_rows(groups: &[GroupTotals]) -> Vec<GroupSummaryRow> {
    let grand_total: f64 = groups.iter().map(|g| g.stats.total_length()).sum();
    groups
        .iter()
        .map(|g| {
            let s = &g.stats;
            GroupSummaryRow {
                group: g.key.clone(),
                good: format_number(s.good, 0),
                light: format_number(s.light, 0),
                moderate: format_number(s.moderate, 0),
                heavy: format_number(s.heavy, 0),
                damaged_pct: format_number(s.pct(s.total_damaged()), 2),
                share_pct: format_number(percent_of(s.total_length(), grand_total), 2),
            }
        })
        .collect()
}

/// Per-village totals keyed by the full region path, followed by a `TOTAL` row.
pub fn generate_village_report(filtered: &Dataset) -> Vec<VillageSummaryRow> {
    let mut map: BTreeMap<(&str, &str, &str), ConditionStats> = BTreeMap::new();
    for r in filtered.rows() {
        let (Some(kab), Some(kec), Some(desa)) = (
            r.province_region.as_deref(),
            r.sub_region.as_deref(),
            r.village.as_deref(),
        ) else {
            continue;
        };
        map.entry((kab, kec, desa)).or_default().add(r);
    }

    let mut total = ConditionStats::default();
    let mut rows: Vec<VillageSummaryRow> = map
        .into_iter()
        .map(|((kab, kec, desa), s)| {
            total.good += s.good;
            total.light += s.light;
            total.moderate += s.moderate;
            total.heavy += s.heavy;
            village_row(kab, kec, desa, &s)
        })
        .collect();
    rows.push(village_row(TOTAL_LABEL, "", "", &total));
    rows
}

fn village_row(kab: &str, kec: &str, desa: &str, s: &ConditionStats) -> VillageSummaryRow {
    VillageSummaryRow {
        province_region: kab.to_string(),
        sub_region: kec.to_string(),
        village: desa.to_string(),
        good: format_number(s.good, 0),
        light: format_number(s.light, 0),
        moderate: format_number(s.moderate, 0),
        heavy: format_number(s.heavy, 0),
    }
}

/// Per-meter repair prices by surface material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPrices {
    pub asphalt: f64,
    pub concrete: f64,
    pub paving: f64,
}

impl Default for UnitPrices {
    fn default() -> Self {
        Self {
            asphalt: 350_000.0,
            concrete: 850_000.0,
            paving: 160_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub length: f64,
    pub asphalt: f64,
    pub concrete: f64,
    pub paving: f64,
}

impl UnitPrices {
    pub fn estimate(&self, length: f64) -> CostEstimate {
        CostEstimate {
            length,
            asphalt: length * self.asphalt,
            concrete: length * self.concrete,
            paving: length * self.paving,
        }
    }
}

/// Repair cost for each damage category and for all damage combined.
pub fn generate_cost_report(stats: &ConditionStats, prices: &UnitPrices) -> Vec<CostEstimateRow> {
    [
        ("Light damage", stats.light),
        ("Moderate damage", stats.moderate),
        ("Heavy damage", stats.heavy),
        ("Total damaged", stats.total_damaged()),
    ]
    .into_iter()
    .map(|(category, length)| {
        let e = prices.estimate(length);
        CostEstimateRow {
            category: category.to_string(),
            length: format_number(e.length, 0),
            asphalt: format_number(e.asphalt, 0),
            concrete: format_number(e.concrete, 0),
            paving: format_number(e.paving, 0),
        }
    })
    .collect()
}

pub fn highlight(row: &RoadSegment) -> HeavyDamageHighlight {
    let part = |v: &Option<String>| v.clone().unwrap_or_default();
    HeavyDamageHighlight {
        location: format!(
            "{} - {} - {}",
            part(&row.province_region),
            part(&row.sub_region),
            part(&row.village)
        ),
        segment_name: part(&row.segment_name),
        heavy_damage: row.heavy_damage.unwrap_or(0.0),
    }
}

pub fn generate_summary(filtered: &Dataset, criteria: &SelectionCriteria) -> SummaryStats {
    let s = compute_stats(filtered.rows());
    let good_pct = s.pct(s.good);
    SummaryStats {
        generated_at: Local::now().to_rfc3339(),
        criteria: criteria.to_string(),
        total_segments: s.total_segments,
        total_length: s.total_length(),
        good: s.good,
        light_damage: s.light,
        moderate_damage: s.moderate,
        heavy_damage: s.heavy,
        total_damaged: s.total_damaged(),
        good_pct,
        damaged_pct: if s.total_length() > 0.0 { 100.0 - good_pct } else { 0.0 },
        longest_heavy_damage: longest_heavy_damage(filtered).map(highlight),
    }
}
