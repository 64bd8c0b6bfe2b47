use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use crate::error::Result;
use crate::types::{Column, RoadSegment};

/// Write `rows` under the given header line. The header is written even when there
/// are no rows, so an empty selection still yields a readable table.
pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, headers: &[&str], rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(headers)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

/// Survey rows under their source headers.
pub fn write_segments(path: impl AsRef<Path>, rows: &[RoadSegment]) -> Result<()> {
    let headers = Column::ALL.map(Column::header);
    write_csv(path, &headers, rows)
}

/// Report rows under the same headers their previews show.
pub fn write_table<T: Serialize + Tabled>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let headers = T::headers();
    let names: Vec<&str> = headers.iter().map(|h| h.as_ref()).collect();
    write_csv(path, &names, rows)
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    info!(path = %path.display(), "wrote json");
    Ok(())
}

pub fn preview_table<T>(title: &str, note: Option<&str>, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}", title);
    if let Some(n) = note {
        println!("({})", n);
    }
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CostEstimateRow;

    #[test]
    fn filtered_rows_keep_survey_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![RoadSegment {
            province_region: Some("Bogor".into()),
            good: Some(12.5),
            ..Default::default()
        }];
        write_segments(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("KABUPATEN,KECAMATAN,DESA"));
        assert!(lines.next().unwrap().starts_with("Bogor,,,,,12.5,"));
    }

    #[test]
    fn empty_exports_still_carry_headers() {
        let dir = tempfile::tempdir().unwrap();
        let rows_path = dir.path().join("rows.csv");
        write_segments(&rows_path, &[]).unwrap();
        let text = std::fs::read_to_string(&rows_path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("KABUPATEN,KECAMATAN,DESA,NAMA RUAS JALAN DESA"));
        assert!(text.trim_end().ends_with("LAT AKHIR,LNG AKHIR"));

        let report_path = dir.path().join("cost.csv");
        write_table::<CostEstimateRow>(&report_path, &[]).unwrap();
        let text = std::fs::read_to_string(&report_path).unwrap();
        assert_eq!(text.trim_end(), "Category,Length,Asphalt,Concrete,PavingBlock");
    }

    #[test]
    fn json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({ "total_segments": 3 })).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"total_segments\": 3"));
    }
}
