//! Postgres store
//!
//! Blocking `postgres` client behind an `r2d2` pool. The client drives its
//! own runtime internally, so a `PostgresStore` must be built and used from
//! plain threads, never from inside an async task.

use std::time::Duration;

use postgres::types::{FromSql, ToSql};
use postgres::{NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ColumnValue, ExecOutcome, RowScan, Store};
use crate::error::Result;

type Manager = PostgresConnectionManager<NoTls>;

const DEFAULT_CONNECTION: &str =
    "host=127.0.0.1 port=5432 user=postgres password=root dbname=koyebdb sslmode=disable";

/// Postgres store configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresStoreConfig {
    /// libpq-style connection string or postgres:// URL
    pub connection: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Idle connections kept open
    pub min_idle: u32,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for PostgresStoreConfig {
    fn default() -> Self {
        Self {
            connection: DEFAULT_CONNECTION.to_string(),
            max_connections: 10,
            min_idle: 5,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Postgres-backed store
pub struct PostgresStore {
    pool: Pool<Manager>,
}

impl PostgresStore {
    /// Build the pool and open its idle connections
    pub fn connect(config: &PostgresStoreConfig) -> Result<Self> {
        let mut pg_config = config.connection.parse::<postgres::Config>()?;
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        pg_config.connect_timeout(timeout);

        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_idle.min(config.max_connections)))
            .connection_timeout(timeout)
            .build(manager)?;

        info!(
            max_connections = config.max_connections,
            "connected postgres store"
        );
        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<Manager>> {
        Ok(self.pool.get()?)
    }
}

fn bind_params(args: &[ColumnValue]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter()
        .map(|arg| match arg {
            ColumnValue::Int32(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Int64(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Text(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Bool(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Float(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Double(v) => v as &(dyn ToSql + Sync),
            ColumnValue::Blob(v) => v as &(dyn ToSql + Sync),
        })
        .collect()
}

impl RowScan for Row {
    fn scan(&self, targets: &mut [ColumnValue]) -> Result<()> {
        for (index, target) in targets.iter_mut().enumerate() {
            match target {
                ColumnValue::Int32(v) => *v = get_or_default(self, index)?,
                ColumnValue::Int64(v) => *v = get_or_default(self, index)?,
                ColumnValue::Text(v) => *v = get_or_default(self, index)?,
                ColumnValue::Bool(v) => *v = get_or_default(self, index)?,
                ColumnValue::Float(v) => *v = get_or_default(self, index)?,
                ColumnValue::Double(v) => *v = get_or_default(self, index)?,
                ColumnValue::Blob(v) => *v = get_or_default(self, index)?,
            }
        }
        Ok(())
    }
}

/// NULL reads as the zero value
fn get_or_default<'a, T>(row: &'a Row, index: usize) -> Result<T>
where
    T: FromSql<'a> + Default,
{
    Ok(row.try_get::<_, Option<T>>(index)?.unwrap_or_default())
}

impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn exec(&mut self, sql: &str, args: &[ColumnValue]) -> Result<ExecOutcome> {
        let mut conn = self.connection()?;
        let params = bind_params(args);
        let rows = conn.execute(sql, &params)?;
        // Postgres has no rowid; callers that need generated keys use RETURNING
        Ok(ExecOutcome {
            rows_affected: rows,
            last_insert_id: None,
        })
    }

    fn query(
        &mut self,
        sql: &str,
        on_row: &mut dyn FnMut(&dyn RowScan) -> Result<()>,
    ) -> Result<()> {
        let mut conn = self.connection()?;
        let rows = conn.query(sql, &[])?;
        for row in &rows {
            on_row(row)?;
        }
        Ok(())
    }
}
