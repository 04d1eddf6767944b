//! Relational mapper
//!
//! Value codec, statement builder and row materializer, tied together by
//! the `Mapper` facade that owns a shared registry and a dialect.

pub mod builder;
pub mod codec;
pub mod dialect;
pub mod materializer;

pub use builder::{Statement, StatementBuilder};
pub use dialect::Dialect;

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{SchemaRegistry, TableMetadata};
use crate::error::Result;
use crate::record::Record;
use crate::store::{ExecOutcome, Store};

/// Mapper bound to one registry and one dialect
#[derive(Debug, Clone)]
pub struct Mapper {
    registry: Arc<SchemaRegistry>,
    dialect: Dialect,
}

impl Mapper {
    pub fn new(registry: Arc<SchemaRegistry>, dialect: Dialect) -> Self {
        Self { registry, dialect }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Borrow a statement builder over this mapper's registry
    pub fn builder(&self) -> StatementBuilder<'_> {
        StatementBuilder::new(&self.registry, self.dialect)
    }

    /// Build the write statement for a record's `op`
    pub fn build_write<R: Record>(&self, record: &R) -> Result<Statement> {
        self.builder().build_write(record)
    }

    /// Build the SELECT statement for a record type
    pub fn build_select<R: Record>(&self, filter: &str) -> Result<(String, Arc<TableMetadata>)> {
        self.builder().build_select::<R>(filter)
    }

    /// Run a SELECT and materialize every row
    pub fn select_records<R: Record>(
        &self,
        store: &mut dyn Store,
        template: &R,
        filter: &str,
    ) -> Result<Vec<R>> {
        materializer::select_records(&self.builder(), store, template, filter)
    }

    /// Build and execute a record's write statement
    pub fn execute_write<R: Record>(
        &self,
        store: &mut dyn Store,
        record: &R,
    ) -> Result<ExecOutcome> {
        let stmt = self.build_write(record)?;
        debug!(sql = %stmt.sql, args = stmt.args.len(), "executing write");
        store.exec(&stmt.sql, &stmt.args)
    }

    /// DDL that creates a record's table if it is missing
    pub fn create_table_sql<R: Record>(&self) -> Result<String> {
        self.builder().build_create_table::<R>()
    }

    /// Create a record's table if it is missing
    ///
    /// Existing tables are never altered.
    pub fn ensure_table<R: Record>(&self, store: &mut dyn Store) -> Result<()> {
        let sql = self.create_table_sql::<R>()?;
        store.exec(&sql, &[])?;
        info!(record = R::FULL_NAME, backend = store.backend(), "ensured table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{DbOpType, DbUserRecord};
    use crate::store::SqliteStore;

    #[test]
    fn test_ensure_table_then_write() {
        let mapper = Mapper::new(Arc::new(SchemaRegistry::default()), Dialect::Sqlite);
        let mut store = SqliteStore::open_in_memory().unwrap();
        mapper.ensure_table::<DbUserRecord>(&mut store).unwrap();
        // Idempotent
        mapper.ensure_table::<DbUserRecord>(&mut store).unwrap();

        let record = DbUserRecord {
            op: DbOpType::OpReplace as i32,
            id: 5,
            user_id: "u".into(),
            password: "p".into(),
            base_info: None,
        };
        let outcome = mapper.execute_write(&mut store, &record).unwrap();
        assert_eq!(outcome.rows_affected, 1);

        let second = DbUserRecord {
            password: "q".into(),
            ..record
        };
        mapper.execute_write(&mut store, &second).unwrap();

        let rows = mapper
            .select_records(&mut store, &DbUserRecord::default(), "id=5")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].password, "q");
    }

    #[test]
    fn test_mapper_shares_registry() {
        let registry = Arc::new(SchemaRegistry::default());
        let mapper = Mapper::new(registry.clone(), Dialect::Postgres);
        mapper.build_select::<DbUserRecord>("").unwrap();
        assert!(registry.contains("dbsvr.DbUserRecord"));
        assert_eq!(mapper.dialect(), Dialect::Postgres);
    }
}
