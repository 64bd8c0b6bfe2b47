//! Memoized filter + statistics results.
//!
//! Datasets never change after construction, so entries keyed on
//! `(dataset version, criteria)` stay valid for the cache's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::filter::apply_filter;
use crate::stats::{compute_stats, ConditionStats};
use crate::types::SelectionCriteria;

/// Filtered rows together with their statistics.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub rows: Dataset,
    pub stats: ConditionStats,
}

#[derive(Debug, Default)]
pub struct FilterCache {
    entries: HashMap<(u64, SelectionCriteria), Arc<Snapshot>>,
    hits: u64,
    misses: u64,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        dataset: &Dataset,
        criteria: &SelectionCriteria,
    ) -> Result<Arc<Snapshot>> {
        let key = (dataset.version(), criteria.clone());
        if let Some(snap) = self.entries.get(&key) {
            self.hits += 1;
            trace!(criteria = %criteria, "filter cache hit");
            return Ok(Arc::clone(snap));
        }
        self.misses += 1;
        let rows = apply_filter(dataset, criteria)?;
        let stats = compute_stats(rows.rows());
        let snap = Arc::new(Snapshot { rows, stats });
        self.entries.insert(key, Arc::clone(&snap));
        Ok(snap)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)`
    pub fn counters(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
