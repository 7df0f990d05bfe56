//! Row-by-row upsert of an output table into SQLite.
//!
//! The table is created on first use with the key column as `PRIMARY KEY`
//! and column affinities derived from the frame schema. All rows of a call
//! share one transaction; each row runs under its own savepoint so a
//! rejected row is rolled back alone and the rest are still committed.

use crate::load::error::LoadError;
use crate::load::report::{ConflictResolution, LoadReport, RowFailure};
use crate::types::config::TableTarget;
use crate::utils::ensure_parent_dir_exists;
use log::{debug, info, warn};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use tokio::task;

const ROW_SAVEPOINT: &str = "load_row";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let conn =
            Connection::open(path).map_err(|e| LoadError::DatabaseOpen(path.to_path_buf(), e))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, LoadError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LoadError::DatabaseOpen(PathBuf::from(":memory:"), e))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Inserts every row of `df` into `target.table`, resolving key
    /// collisions with `mode`.
    ///
    /// Row-level failures are collected in the report; only failures that
    /// affect the whole table (opening the transaction, creating the table,
    /// preparing the statement, committing) are returned as errors.
    pub fn write_table(
        &mut self,
        df: &DataFrame,
        target: &TableTarget,
        mode: ConflictResolution,
    ) -> Result<LoadReport, LoadError> {
        let table = target.table.as_str();
        let db_err = |source| LoadError::Database {
            table: table.to_string(),
            source,
        };
        let key_column = df
            .column(&target.key)
            .map_err(|_| LoadError::MissingKey {
                table: table.to_string(),
                key: target.key.clone(),
            })?;

        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute_batch(&create_table_sql(df, target))
            .map_err(db_err)?;

        let mut report = LoadReport::new(table);
        {
            let mut insert = tx.prepare(&insert_sql(df, target, mode)).map_err(db_err)?;
            for row in 0..df.height() {
                let values = row_values(df, row).map_err(|source| LoadError::Frame {
                    table: table.to_string(),
                    source,
                })?;

                tx.execute_batch(&format!("SAVEPOINT {ROW_SAVEPOINT}"))
                    .map_err(db_err)?;
                match insert.execute(params_from_iter(values.iter())) {
                    Ok(0) => report.ignored += 1,
                    Ok(_) => report.written += 1,
                    Err(e) => {
                        let key = key_column
                            .get(row)
                            .map(|v| describe(&to_sql_value(v)))
                            .unwrap_or_else(|_| format!("row {row}"));
                        warn!("Skipping row {} of table {}: {}", key, table, e);
                        tx.execute_batch(&format!("ROLLBACK TO {ROW_SAVEPOINT}"))
                            .map_err(db_err)?;
                        report.failures.push(RowFailure {
                            key,
                            message: e.to_string(),
                        });
                    }
                }
                tx.execute_batch(&format!("RELEASE {ROW_SAVEPOINT}"))
                    .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;

        info!("Loaded table {} ({})", table, report);
        Ok(report)
    }
}

/// Opens (or creates) the database at `path` and writes one table on the
/// blocking pool.
pub async fn load_table(
    path: &Path,
    df: DataFrame,
    target: TableTarget,
    mode: ConflictResolution,
) -> Result<LoadReport, LoadError> {
    ensure_parent_dir_exists(path).await?;
    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut store = SqliteStore::open(&path_buf)?;
        store.write_table(&df, &target, mode)
    })
    .await?
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn affinity(dtype: &DataType) -> &'static str {
    if dtype.is_integer() || dtype.is_bool() {
        "INTEGER"
    } else if dtype.is_float() {
        "REAL"
    } else {
        "TEXT"
    }
}

fn create_table_sql(df: &DataFrame, target: &TableTarget) -> String {
    let columns: Vec<String> = df
        .get_columns()
        .iter()
        .map(|c| {
            let name = c.name().as_str();
            let mut definition = format!("{} {}", quote(name), affinity(c.dtype()));
            if name == target.key {
                definition.push_str(" PRIMARY KEY");
            }
            definition
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(&target.table),
        columns.join(", ")
    )
}

fn insert_sql(df: &DataFrame, target: &TableTarget, mode: ConflictResolution) -> String {
    let names = df.get_column_names_str();
    let columns: Vec<String> = names.iter().map(|n| quote(n)).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let on_conflict = match mode {
        ConflictResolution::Ignore => "DO NOTHING".to_string(),
        ConflictResolution::Overwrite => {
            let updates: Vec<String> = names
                .iter()
                .filter(|n| **n != target.key)
                .map(|n| format!("{0} = excluded.{0}", quote(n)))
                .collect();
            if updates.is_empty() {
                "DO NOTHING".to_string()
            } else {
                format!("DO UPDATE SET {}", updates.join(", "))
            }
        }
    };
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        quote(&target.table),
        columns.join(", "),
        placeholders.join(", "),
        quote(&target.key),
        on_conflict
    );
    debug!("Insert statement: {}", sql);
    sql
}

fn row_values(df: &DataFrame, row: usize) -> PolarsResult<Vec<Value>> {
    df.get_columns()
        .iter()
        .map(|c| c.get(row).map(to_sql_value))
        .collect()
}

fn to_sql_value(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Integer(i64::from(b)),
        AnyValue::Int32(v) => Value::Integer(i64::from(v)),
        AnyValue::Int64(v) => Value::Integer(v),
        AnyValue::UInt32(v) => Value::Integer(i64::from(v)),
        AnyValue::Float32(v) => Value::Real(f64::from(v)),
        AnyValue::Float64(v) => Value::Real(v),
        AnyValue::String(s) => Value::Text(s.to_string()),
        AnyValue::StringOwned(s) => Value::Text(s.to_string()),
        other => Value::Text(other.to_string()),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TableTarget {
        TableTarget::builder().table("daily").key("date_unix").build()
    }

    fn frame(values: Vec<Option<f64>>) -> DataFrame {
        let rows = values.len();
        let dates: Vec<i64> = (0..rows as i64).map(|i| 1748390400 + i * 86400).collect();
        DataFrame::new(vec![
            Column::new("date_unix".into(), dates),
            Column::new("avg_temperature_2m_24h".into(), values),
            Column::new("sunrise_iso".into(), vec!["2025-05-28T05:00:39Z"; rows]),
        ])
        .unwrap()
    }

    fn stored(store: &SqliteStore) -> Vec<(i64, Option<f64>)> {
        let mut stmt = store
            .connection()
            .prepare("SELECT date_unix, avg_temperature_2m_24h FROM daily ORDER BY date_unix")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_creates_table_and_inserts() -> Result<(), LoadError> {
        let mut store = SqliteStore::open_in_memory()?;
        let report = store.write_table(
            &frame(vec![Some(5.025), None, Some(13.508)]),
            &target(),
            ConflictResolution::Ignore,
        )?;
        assert_eq!(report.written, 3);
        assert!(report.is_clean());
        assert_eq!(
            stored(&store),
            [
                (1748390400, Some(5.025)),
                (1748476800, None),
                (1748563200, Some(13.508))
            ]
        );
        let iso: String = store
            .connection()
            .query_row("SELECT sunrise_iso FROM daily LIMIT 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(iso, "2025-05-28T05:00:39Z");
        Ok(())
    }

    #[test]
    fn test_ignore_keeps_existing_rows() -> Result<(), LoadError> {
        let mut store = SqliteStore::open_in_memory()?;
        store.write_table(
            &frame(vec![Some(1.0), Some(2.0), Some(3.0)]),
            &target(),
            ConflictResolution::Ignore,
        )?;
        let report = store.write_table(
            &frame(vec![Some(9.0), Some(9.0), Some(9.0)]),
            &target(),
            ConflictResolution::Ignore,
        )?;
        assert_eq!((report.written, report.ignored), (0, 3));
        assert_eq!(stored(&store)[0], (1748390400, Some(1.0)));
        Ok(())
    }

    #[test]
    fn test_overwrite_updates_non_key_columns() -> Result<(), LoadError> {
        let mut store = SqliteStore::open_in_memory()?;
        store.write_table(
            &frame(vec![Some(1.0), Some(2.0), Some(3.0)]),
            &target(),
            ConflictResolution::Ignore,
        )?;
        let report = store.write_table(
            &frame(vec![Some(9.0), None, Some(7.0)]),
            &target(),
            ConflictResolution::Overwrite,
        )?;
        assert_eq!((report.written, report.ignored), (3, 0));
        assert_eq!(
            stored(&store),
            [
                (1748390400, Some(9.0)),
                (1748476800, None),
                (1748563200, Some(7.0))
            ]
        );
        Ok(())
    }

    #[test]
    fn test_failing_row_is_skipped_and_reported() -> Result<(), LoadError> {
        let mut store = SqliteStore::open_in_memory()?;
        store
            .connection()
            .execute_batch(
                "CREATE TABLE daily (date_unix INTEGER PRIMARY KEY, \
                 avg_temperature_2m_24h REAL CHECK (avg_temperature_2m_24h < 100), \
                 sunrise_iso TEXT)",
            )
            .unwrap();
        let report = store.write_table(
            &frame(vec![Some(1.0), Some(200.0), Some(3.0)]),
            &target(),
            ConflictResolution::Ignore,
        )?;
        assert_eq!(report.written, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].key, "1748476800");
        assert_eq!(
            stored(&store),
            [(1748390400, Some(1.0)), (1748563200, Some(3.0))]
        );
        Ok(())
    }

    #[test]
    fn test_missing_key_column() -> Result<(), LoadError> {
        let mut store = SqliteStore::open_in_memory()?;
        let other = TableTarget::builder().table("daily").key("time_unix").build();
        let result = store.write_table(
            &frame(vec![None, None, None]),
            &other,
            ConflictResolution::Ignore,
        );
        assert!(matches!(
            result,
            Err(LoadError::MissingKey { ref key, .. }) if key == "time_unix"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_table_creates_database_file() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let path = root.path().join("res").join("stats.sqlite");
        let report = load_table(
            &path,
            frame(vec![Some(1.0), Some(2.0), Some(3.0)]),
            target(),
            ConflictResolution::Ignore,
        )
        .await?;
        assert_eq!(report.written, 3);
        assert!(path.is_file());
        Ok(())
    }
}
