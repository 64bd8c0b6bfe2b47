//! SQLite survey source.
//!
//! Selection values are only ever passed as bound parameters. Column identifiers come
//! from [`Column`] and the table name must be a plain identifier.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::loader::{audit, clean_row, log_report, missing_columns, LoadReport};
use crate::types::{Column, RawRow, SelectionCriteria};

/// Default table name of the survey database.
pub const DEFAULT_TABLE: &str = "data_jalan";

/// Load every row of `table`.
pub fn load_sqlite(path: impl AsRef<Path>, table: &str) -> Result<(Dataset, LoadReport)> {
    load_sqlite_filtered(path, table, &SelectionCriteria::all())
}

/// Load the rows of `table` matching `criteria`, with the predicates evaluated by
/// SQLite.
pub fn load_sqlite_filtered(
    path: impl AsRef<Path>,
    table: &str,
    criteria: &SelectionCriteria,
) -> Result<(Dataset, LoadReport)> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DashboardError::SourceNotFound(path.to_path_buf()));
    }
    validate_table(table)?;
    info!(path = %path.display(), table, "loading survey table");
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let headers = resolve_headers(&conn, table)?;
    let select_list = headers
        .iter()
        .map(|h| quote_ident(h))
        .collect::<Vec<_>>()
        .join(", ");

    let constraints = criteria.constraints();
    let mut sql = format!("SELECT {select_list} FROM {}", quote_ident(table));
    if !constraints.is_empty() {
        let predicates = constraints
            .iter()
            .enumerate()
            .map(|(i, (dim, _))| {
                let header = header_for(&headers, dim.column());
                format!("{} = ?{}", trimmed(header), i + 1)
            })
            .collect::<Vec<_>>()
            .join(" AND ");
        sql.push_str(" WHERE ");
        sql.push_str(&predicates);
    }
    sql.push_str(" ORDER BY rowid");
    debug!(%sql, params = constraints.len(), "prepared survey query");

    let mut stmt = conn.prepare(&sql)?;
    let params = constraints.iter().map(|(_, value)| *value);
    let mut rows = Vec::new();
    let mut query = stmt.query(params_from_iter(params))?;
    while let Some(row) = query.next()? {
        let mut cells: Vec<Option<String>> = Vec::with_capacity(Column::ALL.len());
        for i in 0..Column::ALL.len() {
            cells.push(value_to_text(row.get::<_, Value>(i)?));
        }
        rows.push(clean_row(RawRow::from_cells(cells)));
    }

    let report = LoadReport {
        total_rows: rows.len(),
        loaded_rows: rows.len(),
        parse_errors: 0,
        selection_applied: !constraints.is_empty(),
        quality: audit(&rows),
    };
    log_report(&report);
    Ok((Dataset::new(rows), report))
}

fn validate_table(table: &str) -> Result<()> {
    let ok = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(DashboardError::InvalidTable(table.to_string()))
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Cell expression compared the way loaded text cells are cleaned, so a pushed-down
/// predicate keeps the same rows as the in-memory filter.
fn trimmed(header: &str) -> String {
    format!("TRIM({}, char(32, 9, 10, 11, 12, 13))", quote_ident(header))
}

/// Actual header used by the table for each column, in [`Column::ALL`] order.
fn resolve_headers(conn: &Connection, table: &str) -> Result<Vec<&'static str>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    if names.is_empty() {
        return Err(DashboardError::InvalidTable(table.to_string()));
    }

    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let missing = missing_columns(&refs);
    if !missing.is_empty() {
        return Err(DashboardError::MissingColumns(missing));
    }

    Ok(Column::ALL
        .iter()
        .map(|col| {
            col.headers()
                .iter()
                .copied()
                .find(|h| names.iter().any(|n| n.trim() == *h))
                .unwrap_or(col.header())
        })
        .collect())
}

fn header_for(headers: &[&'static str], column: Column) -> &'static str {
    Column::ALL
        .iter()
        .position(|c| *c == column)
        .map(|i| headers[i])
        .unwrap_or(column.header())
}

fn value_to_text(v: Value) -> Option<String> {
    match v {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(s) => Some(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selection;

    fn create_db(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("jalan_desa.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE data_jalan (
                "NO" INTEGER,
                "KABUPATEN" TEXT, "KECAMATAN" TEXT, "DESA" TEXT,
                "NAMA RUAS JALAN DESA" TEXT, "JENIS PERKERASAN" TEXT,
                "BAIK (meter)" REAL, "RUSAK RINGAN (meter)" REAL,
                "RUSAK SEDANG (meter)" REAL, "RUSAK BERAT (meter)" INTEGER,
                "TOTAL PANJANG JALAN DESA (meter)" REAL,
                "LAT AWAL" REAL, "LNG AWAL" REAL, "LAT AKHIR" REAL, "LNG AKHIR" REAL
            );
            INSERT INTO data_jalan VALUES
                (1, 'Bogor', 'Ciawi', 'Bendungan', 'Jl. Mawar', 'Aspal', 100, 0, 0, 20, 120, -6.6, 106.8, -6.61, 106.81),
                (2, 'Bogor', 'Cisarua', 'Tugu', 'Jl. Puncak', 'Beton', 50, 10, NULL, 0, 60, NULL, NULL, NULL, NULL),
                (3, 'Garut', 'Cibatu', 'Wanakerta', 'Jl. Melati', 'Aspal', 200, 0, 0, 0, 200, NULL, NULL, NULL, NULL);
            "#,
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_whole_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir);
        let (ds, report) = load_sqlite(&path, DEFAULT_TABLE).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(report.quality.missing_lengths, 1);
        assert_eq!(ds.rows()[0].heavy_damage, Some(20.0));
        assert_eq!(ds.rows()[0].total_length, Some(120.0));
    }

    #[test]
    fn pushes_criteria_down_as_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir);
        let criteria = SelectionCriteria {
            province_region: Selection::parse("Bogor"),
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        };
        let (ds, _) = load_sqlite_filtered(&path, DEFAULT_TABLE, &criteria).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows()[0].village.as_deref(), Some("Bendungan"));
    }

    #[test]
    fn padded_cells_match_like_the_in_memory_filter() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir);
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "INSERT INTO data_jalan VALUES \
             (4, 'Bogor ', '  Ciawi', 'Banjarwaru', 'Jl. Anggrek', 'Aspal\t', 30, 0, 0, 5, 35, NULL, NULL, NULL, NULL);",
        )
        .unwrap();
        drop(conn);

        let (all, _) = load_sqlite(&path, DEFAULT_TABLE).unwrap();
        let subs = crate::options::resolve_options(
            &all,
            crate::types::Dimension::SubRegion,
            Some((crate::types::Dimension::ProvinceRegion, &Selection::parse("Bogor"))),
        )
        .unwrap();
        assert_eq!(subs, vec!["all", "Ciawi", "Cisarua"]);

        let criteria = SelectionCriteria {
            province_region: Selection::parse("Bogor"),
            sub_region: Selection::parse("Ciawi"),
            surface_type: Selection::parse("Aspal"),
            ..Default::default()
        };
        let in_memory = crate::filter::apply_filter(&all, &criteria).unwrap();
        let (pushed, report) = load_sqlite_filtered(&path, DEFAULT_TABLE, &criteria).unwrap();
        assert_eq!(in_memory.len(), 2);
        assert_eq!(pushed.rows(), in_memory.rows());
        assert!(report.selection_applied);
    }

    #[test]
    fn hostile_values_are_just_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir);
        let criteria = SelectionCriteria {
            province_region: Selection::parse("Bogor' OR '1'='1"),
            ..Default::default()
        };
        let (ds, report) = load_sqlite_filtered(&path, DEFAULT_TABLE, &criteria).unwrap();
        assert!(ds.is_empty());
        assert_eq!(report.empty_notice(), Some("no rows match the selection"));
    }

    #[test]
    fn rejects_bad_table_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir);
        let err = load_sqlite(&path, "data_jalan; DROP TABLE data_jalan").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidTable(_)));
        let err = load_sqlite(&path, "no_such_table").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidTable(_)));
    }

    #[test]
    fn missing_columns_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrow.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(r#"CREATE TABLE data_jalan ("KABUPATEN" TEXT, "DESA" TEXT);"#)
            .unwrap();
        drop(conn);
        let err = load_sqlite(&path, DEFAULT_TABLE).unwrap_err();
        assert!(err.is_schema_error());
    }
}
