//! Condition-category totals and percentages.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::types::{Column, RoadSegment};

/// Summed lengths (meters) per condition category over a set of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConditionStats {
    pub good: f64,
    pub light: f64,
    pub moderate: f64,
    pub heavy: f64,
    pub total_segments: usize,
}

impl ConditionStats {
    pub fn total_damaged(&self) -> f64 {
        self.light + self.moderate + self.heavy
    }

    /// Recomputed from the categories; the stored total column is not consulted.
    pub fn total_length(&self) -> f64 {
        self.good + self.total_damaged()
    }

    /// Share of `x` in the total length, or 0 when there is no length at all.
    pub fn pct(&self, x: f64) -> f64 {
        percent_of(x, self.total_length())
    }

    pub(crate) fn add(&mut self, row: &RoadSegment) {
        self.good += row.good.unwrap_or(0.0);
        self.light += row.light_damage.unwrap_or(0.0);
        self.moderate += row.moderate_damage.unwrap_or(0.0);
        self.heavy += row.heavy_damage.unwrap_or(0.0);
        self.total_segments += 1;
    }
}

pub(crate) fn percent_of(x: f64, total: f64) -> f64 {
    if total > 0.0 {
        100.0 * x / total
    } else {
        0.0
    }
}

pub fn compute_stats(rows: &[RoadSegment]) -> ConditionStats {
    let mut stats = ConditionStats::default();
    for row in rows {
        stats.add(row);
    }
    stats
}

/// Row with the longest heavy-damage stretch, first occurrence winning ties.
///
/// Only rows with positive heavy damage qualify; when the dataset carries the total
/// length column, the row's total must also be present and positive.
pub fn longest_heavy_damage(dataset: &Dataset) -> Option<&RoadSegment> {
    let check_total = dataset.has_column(Column::TotalLength);
    let mut best: Option<(&RoadSegment, f64)> = None;
    for row in dataset.rows() {
        let Some(heavy) = row.heavy_damage.filter(|h| *h > 0.0) else {
            continue;
        };
        if check_total && !row.total_length.is_some_and(|t| t > 0.0) {
            continue;
        }
        if best.map_or(true, |(_, current)| heavy > current) {
            best = Some((row, heavy));
        }
    }
    best.map(|(row, _)| row)
}
