//! Immutable in-memory survey dataset.
//!
//! A `Dataset` is built once by a loader and never mutated afterwards. Every derived
//! subset is a fresh `Dataset` with its own version marker, so a cache keyed on
//! `(version, criteria)` never needs invalidation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{DashboardError, Result};
use crate::types::{Column, RoadSegment};

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct Dataset {
    version: u64,
    schema: Arc<[Column]>,
    rows: Arc<[RoadSegment]>,
}

impl Dataset {
    /// Dataset carrying the full survey schema.
    pub fn new(rows: Vec<RoadSegment>) -> Self {
        Self::with_schema(Column::ALL.to_vec(), rows)
    }

    /// Dataset with an explicit column set, e.g. a projection of a wider source.
    pub fn with_schema(schema: Vec<Column>, rows: Vec<RoadSegment>) -> Self {
        Self {
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
            schema: schema.into(),
            rows: rows.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Subset sharing this dataset's schema.
    pub(crate) fn derive(&self, rows: Vec<RoadSegment>) -> Self {
        Self {
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
            schema: Arc::clone(&self.schema),
            rows: rows.into(),
        }
    }

    /// Keep only the given columns. Values of dropped columns are cleared so that the
    /// projection cannot leak them.
    pub fn project(&self, columns: &[Column]) -> Result<Self> {
        for col in columns {
            self.require(*col)?;
        }
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = RoadSegment::default();
                for col in columns {
                    copy_column(row, &mut out, *col);
                }
                out
            })
            .collect();
        Ok(Self::with_schema(columns.to_vec(), rows))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.schema.contains(&column)
    }

    /// Fails with a schema error when `column` is absent.
    pub fn require(&self, column: Column) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DashboardError::UnknownColumn(column))
        }
    }

    pub fn rows(&self) -> &[RoadSegment] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn copy_column(src: &RoadSegment, dst: &mut RoadSegment, col: Column) {
    match col {
        Column::ProvinceRegion => dst.province_region = src.province_region.clone(),
        Column::SubRegion => dst.sub_region = src.sub_region.clone(),
        Column::Village => dst.village = src.village.clone(),
        Column::SegmentName => dst.segment_name = src.segment_name.clone(),
        Column::SurfaceType => dst.surface_type = src.surface_type.clone(),
        Column::Good => dst.good = src.good,
        Column::LightDamage => dst.light_damage = src.light_damage,
        Column::ModerateDamage => dst.moderate_damage = src.moderate_damage,
        Column::HeavyDamage => dst.heavy_damage = src.heavy_damage,
        Column::TotalLength => dst.total_length = src.total_length,
        Column::LatStart => dst.lat_start = src.lat_start,
        Column::LonStart => dst.lon_start = src.lon_start,
        Column::LatEnd => dst.lat_end = src.lat_end,
        Column::LonEnd => dst.lon_end = src.lon_end,
    }
}
