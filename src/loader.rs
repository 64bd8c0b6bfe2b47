use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::types::{Column, RawRow, RoadSegment};
use crate::util::{clean_text, parse_f64_safe};

/// Stored totals within this many meters of the category sum are considered consistent.
pub const LENGTH_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    /// The source already evaluated a selection, so rows are a filtered subset.
    pub selection_applied: bool,
    pub quality: QualityReport,
}

impl LoadReport {
    /// Loaded successfully but nothing to show.
    pub fn is_empty(&self) -> bool {
        self.loaded_rows == 0
    }

    /// What an empty load means: an empty source, or a selection matching nothing.
    pub fn empty_notice(&self) -> Option<&'static str> {
        match (self.is_empty(), self.selection_applied) {
            (false, _) => None,
            (true, false) => Some("dataset is empty; all statistics will be zero"),
            (true, true) => Some("no rows match the selection"),
        }
    }
}

/// Data-quality observations. None of these stop a computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityReport {
    /// Rows whose stored total disagrees with the sum of the four categories.
    pub length_mismatches: usize,
    /// Rows with at least one missing condition length (aggregated as zero).
    pub missing_lengths: usize,
    /// Rows with a negative condition length.
    pub negative_lengths: usize,
    /// Rows lacking one or more endpoint coordinates (left off the map).
    pub missing_coordinates: usize,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        *self == QualityReport::default()
    }
}

pub fn audit(rows: &[RoadSegment]) -> QualityReport {
    let mut q = QualityReport::default();
    for r in rows {
        if let Some(total) = r.total_length {
            if (total - r.condition_sum()).abs() > LENGTH_TOLERANCE {
                q.length_mismatches += 1;
            }
        }
        if r.has_missing_length() {
            q.missing_lengths += 1;
        }
        let lengths = [r.good, r.light_damage, r.moderate_damage, r.heavy_damage];
        if lengths.iter().flatten().any(|v| *v < 0.0) {
            q.negative_lengths += 1;
        }
        if r.endpoints().is_none() {
            q.missing_coordinates += 1;
        }
    }
    q
}

/// Load the survey CSV at `path`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DashboardError::SourceNotFound(path.to_path_buf()));
    }
    info!(path = %path.display(), "loading survey csv");
    let file = std::fs::File::open(path)?;
    load_csv_reader(file)
}

/// Load survey rows from any CSV byte stream.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows: Vec<RoadSegment> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        let raw = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(row = total_rows, error = %e, "skipping unreadable row");
                parse_errors += 1;
                continue;
            }
        };
        rows.push(clean_row(raw));
    }

    let quality = audit(&rows);
    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
        selection_applied: false,
        quality,
    };
    log_report(&report);
    Ok((Dataset::new(rows), report))
}

pub(crate) fn clean_row(raw: RawRow) -> RoadSegment {
    RoadSegment {
        province_region: clean_text(raw.province_region),
        sub_region: clean_text(raw.sub_region),
        village: clean_text(raw.village),
        segment_name: clean_text(raw.segment_name),
        surface_type: clean_text(raw.surface_type),
        good: parse_f64_safe(raw.good.as_deref()),
        light_damage: parse_f64_safe(raw.light_damage.as_deref()),
        moderate_damage: parse_f64_safe(raw.moderate_damage.as_deref()),
        heavy_damage: parse_f64_safe(raw.heavy_damage.as_deref()),
        total_length: parse_f64_safe(raw.total_length.as_deref()),
        lat_start: parse_f64_safe(raw.lat_start.as_deref()),
        lon_start: parse_f64_safe(raw.lon_start.as_deref()),
        lat_end: parse_f64_safe(raw.lat_end.as_deref()),
        lon_end: parse_f64_safe(raw.lon_end.as_deref()),
    }
}

/// Every column must be present under one of its accepted headers.
pub(crate) fn missing_columns(headers: &[&str]) -> Vec<String> {
    Column::ALL
        .iter()
        .filter(|col| !headers.iter().any(|h| Column::from_header(h) == Some(**col)))
        .map(|col| col.header().to_string())
        .collect()
}

fn check_headers(headers: &StringRecord) -> Result<()> {
    let names: Vec<&str> = headers.iter().collect();
    let missing = missing_columns(&names);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DashboardError::MissingColumns(missing))
    }
}

pub(crate) fn log_report(report: &LoadReport) {
    info!(
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.parse_errors,
        "survey data loaded"
    );
    match report.empty_notice() {
        Some(notice) if report.selection_applied => info!("{notice}"),
        Some(notice) => warn!("{notice}"),
        None => {}
    }
    let q = &report.quality;
    if q.length_mismatches > 0 {
        warn!(rows = q.length_mismatches, "stored total length differs from category sum");
    }
    if q.missing_lengths > 0 {
        warn!(rows = q.missing_lengths, "missing condition lengths treated as zero");
    }
    if q.negative_lengths > 0 {
        warn!(rows = q.negative_lengths, "negative condition lengths");
    }
    if q.missing_coordinates > 0 {
        debug!(rows = q.missing_coordinates, "rows without complete coordinates");
    }
}
