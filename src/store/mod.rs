//! Store module
//!
//! The relational store the mapper talks to. A store executes parameterized
//! statements and streams query rows to a callback that scans each row into
//! caller-allocated targets.

pub mod postgres_store;
pub mod sqlite_store;

pub use postgres_store::{PostgresStore, PostgresStoreConfig};
pub use sqlite_store::SqliteStore;

use std::fmt;

use tracing::info;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;

/// A value bound to a statement parameter or scanned out of a column
///
/// When used as a scan target the variant selects the type the driver
/// decodes into; the store overwrites the payload in place.
#[derive(Debug, Clone)]
pub enum ColumnValue {
    /// 32-bit integer column
    Int32(i32),
    /// 64-bit integer column
    Int64(i64),
    /// Text column
    Text(String),
    /// Boolean column
    Bool(bool),
    /// Single-precision float column
    Float(f32),
    /// Double-precision float column
    Double(f64),
    /// Binary column holding a serialized nested record
    Blob(Vec<u8>),
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnValue::Int32(a), ColumnValue::Int32(b)) => a == b,
            (ColumnValue::Int64(a), ColumnValue::Int64(b)) => a == b,
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a == b,
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a == b,
            (ColumnValue::Float(a), ColumnValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ColumnValue::Double(a), ColumnValue::Double(b)) => a.to_bits() == b.to_bits(),
            (ColumnValue::Blob(a), ColumnValue::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl ColumnValue {
    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValue::Int32(_) => "INT32",
            ColumnValue::Int64(_) => "INT64",
            ColumnValue::Text(_) => "TEXT",
            ColumnValue::Bool(_) => "BOOL",
            ColumnValue::Float(_) => "FLOAT",
            ColumnValue::Double(_) => "DOUBLE",
            ColumnValue::Blob(_) => "BLOB",
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int32(v) => write!(f, "{}", v),
            ColumnValue::Int64(v) => write!(f, "{}", v),
            ColumnValue::Text(v) => write!(f, "'{}'", v),
            ColumnValue::Bool(v) => write!(f, "{}", v),
            ColumnValue::Float(v) => write!(f, "{}", v),
            ColumnValue::Double(v) => write!(f, "{}", v),
            ColumnValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// Outcome of a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    /// Rows touched by the statement
    pub rows_affected: u64,
    /// Rowid of the last insert, when the backend reports one
    pub last_insert_id: Option<i64>,
}

/// One result row
pub trait RowScan {
    /// Decode the row's columns, in order, into `targets`
    ///
    /// NULL columns leave the target at its zero value.
    fn scan(&self, targets: &mut [ColumnValue]) -> Result<()>;
}

/// Relational store collaborator
pub trait Store: Send {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Execute a statement with positional arguments
    fn exec(&mut self, sql: &str, args: &[ColumnValue]) -> Result<ExecOutcome>;

    /// Run a query, calling `on_row` once per row in result order
    ///
    /// An error from `on_row` stops iteration and is returned as is.
    fn query(
        &mut self,
        sql: &str,
        on_row: &mut dyn FnMut(&dyn RowScan) -> Result<()>,
    ) -> Result<()>;
}

/// Open the configured backend
pub fn open(config: &StoreConfig) -> Result<Box<dyn Store>> {
    let store: Box<dyn Store> = match config.backend {
        StoreBackend::Postgres => Box::new(PostgresStore::connect(&config.postgres())?),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(&config.sqlite_path)?),
    };
    info!(backend = store.backend(), "store ready");
    Ok(store)
}
