//! Village road condition survey: cascading region filters and condition statistics.
//!
//! A dataset is loaded once ([`loader::load_csv`], or with the `parquet` and `sqlite`
//! features `parquet::load_parquet` and `sqlite::load_sqlite`) and then queried any
//! number of times:
//!
//! - [`options::resolve_options`] lists the values a selector may take,
//! - [`filter::apply_filter`] narrows the rows to a [`SelectionCriteria`],
//! - [`stats::compute_stats`] totals the condition categories of the result.
pub mod cache;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod geo;
pub mod loader;
pub mod options;
pub mod output;
#[cfg(feature = "parquet")]
pub mod parquet;
pub mod reports;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod stats;
pub mod types;
pub mod util;

pub use dataset::Dataset;
pub use error::{DashboardError, Result};
pub use filter::apply_filter;
pub use options::{cascade_options, resolve_options, CascadeOptions};
pub use stats::{compute_stats, longest_heavy_damage, ConditionStats};
pub use types::{Column, Dimension, RoadSegment, Selection, SelectionCriteria, ALL};
