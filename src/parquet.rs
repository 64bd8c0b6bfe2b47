//! Parquet survey source.
//!
//! Only the survey columns are read; any other columns in the file are skipped by the
//! projection. Cells go through the same cleaning as CSV cells.

use std::fs::File;
use std::path::Path;

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type,
    UInt64Type, UInt8Type,
};
use arrow_array::{Array, ArrayRef};
use arrow_schema::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::loader::{audit, clean_row, log_report, missing_columns, LoadReport};
use crate::types::{Column, RawRow};

const BATCH_SIZE: usize = 8 * 1024;

/// Load the survey Parquet file at `path`, keeping only the survey columns.
pub fn load_parquet(path: impl AsRef<Path>) -> Result<(Dataset, LoadReport)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DashboardError::SourceNotFound(path.to_path_buf()));
    }
    info!(path = %path.display(), "loading survey parquet");
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;

    let fields: Vec<(String, DataType)> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| (f.name().clone(), f.data_type().clone()))
        .collect();
    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    let missing = missing_columns(&names);
    if !missing.is_empty() {
        return Err(DashboardError::MissingColumns(missing));
    }

    // Field index of each column, in `Column::ALL` order.
    let mut indices = Vec::with_capacity(Column::ALL.len());
    for col in Column::ALL {
        let idx = names
            .iter()
            .position(|n| Column::from_header(n) == Some(col))
            .ok_or(DashboardError::UnknownColumn(col))?;
        let (name, data_type) = &fields[idx];
        if !is_readable(data_type) {
            return Err(DashboardError::UnsupportedType {
                column: name.clone(),
                data_type: data_type.to_string(),
            });
        }
        indices.push(idx);
    }
    debug!(?indices, "projected survey columns");

    let mask = ProjectionMask::roots(builder.parquet_schema(), indices.iter().copied());
    let reader = builder
        .with_projection(mask)
        .with_batch_size(BATCH_SIZE)
        .build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let columns = indices
            .iter()
            .map(|&i| {
                let name = &fields[i].0;
                batch
                    .column_by_name(name)
                    .cloned()
                    .ok_or_else(|| DashboardError::MissingColumns(vec![name.clone()]))
            })
            .collect::<Result<Vec<ArrayRef>>>()?;
        for r in 0..batch.num_rows() {
            let cells = columns.iter().map(|c| cell_text(c.as_ref(), r)).collect();
            rows.push(clean_row(RawRow::from_cells(cells)));
        }
    }

    let report = LoadReport {
        total_rows: rows.len(),
        loaded_rows: rows.len(),
        parse_errors: 0,
        selection_applied: false,
        quality: audit(&rows),
    };
    log_report(&report);
    Ok((Dataset::new(rows), report))
}

fn is_readable(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Null
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Text of one cell, `None` for nulls. Numbers are rendered so that the usual
/// numeric cleaning parses them back unchanged.
fn cell_text(array: &dyn Array, row: usize) -> Option<String> {
    if array.is_null(row) {
        return None;
    }
    let text = match array.data_type() {
        DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => array.as_string::<i64>().value(row).to_string(),
        DataType::Utf8View => array.as_string_view().value(row).to_string(),
        DataType::Int8 => array.as_primitive::<Int8Type>().value(row).to_string(),
        DataType::Int16 => array.as_primitive::<Int16Type>().value(row).to_string(),
        DataType::Int32 => array.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => array.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::UInt8 => array.as_primitive::<UInt8Type>().value(row).to_string(),
        DataType::UInt16 => array.as_primitive::<UInt16Type>().value(row).to_string(),
        DataType::UInt32 => array.as_primitive::<UInt32Type>().value(row).to_string(),
        DataType::UInt64 => array.as_primitive::<UInt64Type>().value(row).to_string(),
        DataType::Float32 => array.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => array.as_primitive::<Float64Type>().value(row).to_string(),
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::{Float64Array, Int64Array, RecordBatch, StringArray};
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn text(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn num(values: &[Option<f64>]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    fn write(path: &Path, batch: &RecordBatch) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
    }

    fn survey_batch() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            ("NO", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("KABUPATEN", text(&[Some("Bogor "), Some("Garut")])),
            ("KECAMATAN", text(&[Some("Ciawi"), Some("Cibatu")])),
            ("DESA", text(&[Some("Bendungan"), Some("  ")])),
            ("NAMA RUAS JALAN DESA", text(&[Some("Jl. Mawar"), Some("Jl. Melati")])),
            ("JENIS PERKERASAN", text(&[Some("Aspal"), None])),
            ("BAIK (meter)", num(&[Some(100.0), Some(200.0)])),
            ("RUSAK RINGAN (meter)", num(&[Some(0.0), None])),
            ("RUSAK SEDANG (meter)", num(&[Some(0.0), Some(0.0)])),
            (
                "RUSAK BERAT (meter)",
                Arc::new(Int64Array::from(vec![Some(20), Some(0)])) as ArrayRef,
            ),
            ("TOTAL PANJANG JALAN DESA (meter)", num(&[Some(120.0), Some(200.0)])),
            ("LAT AWAL", num(&[Some(-6.6), None])),
            ("LNG AWAL", num(&[Some(106.8), None])),
            ("LAT AKHIR", num(&[Some(-6.61), None])),
            ("LNG AKHIR", num(&[Some(106.81), None])),
        ])
        .unwrap()
    }

    #[test]
    fn loads_and_cleans_survey_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DATA_JALAN_DESA.parquet");
        write(&path, &survey_batch());

        let (ds, report) = load_parquet(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(report.quality.missing_lengths, 1);
        assert_eq!(report.quality.missing_coordinates, 1);

        let first = &ds.rows()[0];
        assert_eq!(first.province_region.as_deref(), Some("Bogor"));
        assert_eq!(first.heavy_damage, Some(20.0));
        assert_eq!(first.total_length, Some(120.0));
        assert_eq!(first.endpoints(), Some(((-6.6, 106.8), (-6.61, 106.81))));

        let second = &ds.rows()[1];
        assert_eq!(second.village, None);
        assert_eq!(second.surface_type, None);
        assert_eq!(second.light_damage, None);
    }

    #[test]
    fn missing_columns_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.parquet");
        let batch = RecordBatch::try_from_iter(vec![
            ("KABUPATEN", text(&[Some("Bogor")])),
            ("DESA", text(&[Some("Tugu")])),
        ])
        .unwrap();
        write(&path, &batch);

        let err = load_parquet(&path).unwrap_err();
        assert!(err.is_schema_error());
        match err {
            DashboardError::MissingColumns(cols) => {
                assert!(cols.contains(&"KECAMATAN".to_string()));
                assert!(!cols.contains(&"DESA".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_parquet("/definitely/not/here.parquet").unwrap_err();
        assert!(matches!(err, DashboardError::SourceNotFound(_)));
    }
}
