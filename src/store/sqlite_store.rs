//! SQLite store
//!
//! A single `rusqlite` connection owned by whichever thread runs the
//! worker. Placeholders use the `?N` form.

use std::path::Path;
use std::time::Duration;

use rusqlite::types::{FromSql, ToSql, ToSqlOutput};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use tracing::info;

use super::{ColumnValue, ExecOutcome, RowScan, Store};
use crate::error::Result;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// SQLite-backed store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!(path = %path.display(), "opened sqlite store");
        Ok(Self { conn })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

impl ToSql for ColumnValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            ColumnValue::Int32(v) => v.to_sql(),
            ColumnValue::Int64(v) => v.to_sql(),
            ColumnValue::Text(v) => v.to_sql(),
            ColumnValue::Bool(v) => v.to_sql(),
            ColumnValue::Float(v) => v.to_sql(),
            ColumnValue::Double(v) => v.to_sql(),
            ColumnValue::Blob(v) => v.to_sql(),
        }
    }
}

impl RowScan for Row<'_> {
    fn scan(&self, targets: &mut [ColumnValue]) -> Result<()> {
        for (index, target) in targets.iter_mut().enumerate() {
            match target {
                ColumnValue::Int32(v) => *v = get_or_default(self, index)?,
                ColumnValue::Int64(v) => *v = get_or_default(self, index)?,
                ColumnValue::Text(v) => *v = get_or_default(self, index)?,
                ColumnValue::Bool(v) => *v = get_or_default(self, index)?,
                ColumnValue::Float(v) => *v = get_or_default::<f64>(self, index)? as f32,
                ColumnValue::Double(v) => *v = get_or_default(self, index)?,
                ColumnValue::Blob(v) => *v = get_or_default(self, index)?,
            }
        }
        Ok(())
    }
}

/// NULL reads as the zero value
fn get_or_default<T: FromSql + Default>(row: &Row<'_>, index: usize) -> Result<T> {
    Ok(row.get::<_, Option<T>>(index)?.unwrap_or_default())
}

impl Store for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn exec(&mut self, sql: &str, args: &[ColumnValue]) -> Result<ExecOutcome> {
        let rows = self.conn.execute(sql, params_from_iter(args.iter()))?;
        Ok(ExecOutcome {
            rows_affected: u64::try_from(rows).unwrap_or(u64::MAX),
            last_insert_id: Some(self.conn.last_insert_rowid()),
        })
    }

    fn query(
        &mut self,
        sql: &str,
        on_row: &mut dyn FnMut(&dyn RowScan) -> Result<()>,
    ) -> Result<()> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            on_row(row)?;
        }
        Ok(())
    }
}
