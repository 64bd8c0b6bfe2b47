//! Error types for loading and querying road survey data.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Column;

/// Errors raised by loaders, the filter engine and exporters.
///
/// Data sparsity (missing lengths, missing coordinates, empty datasets) is never
/// reported through this type; those conditions degrade to zero/empty results.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The configured data source does not exist.
    #[error("data source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source was readable but lacks one or more required columns.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A filter or option lookup referenced a column the dataset does not carry.
    #[error("column `{0}` is not part of the dataset schema")]
    UnknownColumn(Column),

    /// A required column is stored with a type that cannot be read as text or number.
    #[error("column `{column}` has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    /// The table name is not a plain identifier or names no table in the source.
    #[error("table `{0}` is not a readable survey table")]
    InvalidTable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "parquet")]
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "parquet")]
    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),
}

impl DashboardError {
    /// True for structural schema mismatches.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DashboardError::MissingColumns(_)
                | DashboardError::UnknownColumn(_)
                | DashboardError::UnsupportedType { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
