//! Statement builder
//!
//! Emits INSERT, REPLACE (upsert), UPDATE and DELETE statements from any
//! record instance, keyed off its `op` field, and SELECT statements from a
//! record type plus a raw filter.
//!
//! Arguments are always ordered non-id columns first (declaration order)
//! followed by the id value, except DELETE which binds only the id.

use std::sync::Arc;

use super::codec;
use super::dialect::Dialect;
use crate::catalog::{SchemaRegistry, TableMetadata};
use crate::error::{Error, Result};
use crate::proto::DbOpType;
use crate::record::{FieldRef, Record, ScalarValue, ID_FIELD};
use crate::store::ColumnValue;

/// A parameterized statement and its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<ColumnValue>,
}

/// Builds SQL against the registry's cached metadata
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    registry: &'a SchemaRegistry,
    dialect: Dialect,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(registry: &'a SchemaRegistry, dialect: Dialect) -> Self {
        Self { registry, dialect }
    }

    /// Build the write statement selected by the record's `op` field
    pub fn build_write<R: Record>(&self, record: &R) -> Result<Statement> {
        let meta = self.registry.metadata_for::<R>()?;
        let (_, id_field) = meta
            .id_field()
            .ok_or_else(|| Error::MissingPrimaryKey(meta.table().to_string()))?;
        let op = read_op(record, &meta)?;

        let id_value = codec::encode_field(record, id_field)?;
        let mut cols = Vec::with_capacity(meta.field_count());
        let mut args = Vec::with_capacity(meta.field_count());
        for field in meta.fields().filter(|f| f.name != ID_FIELD) {
            cols.push(field.name);
            args.push(codec::encode_field(record, field)?);
        }

        let table = meta.table();
        let sql = match op {
            DbOpType::OpInsert | DbOpType::OpReplace => {
                let placeholders = self.dialect.placeholders(cols.len() + 1);
                let mut sql = format!(
                    "INSERT INTO {}({}) VALUES({})",
                    table,
                    with_id(&cols).join(","),
                    placeholders.join(",")
                );
                if op == DbOpType::OpReplace {
                    sql.push(' ');
                    sql.push_str(&self.dialect.upsert_clause(&cols, &placeholders[..cols.len()]));
                }
                sql
            }
            DbOpType::OpUpdate => {
                if cols.is_empty() {
                    return Err(Error::NoUpdatableColumns(table.to_string()));
                }
                let sets: Vec<String> = cols
                    .iter()
                    .enumerate()
                    .map(|(i, col)| format!("{}={}", col, self.dialect.placeholder(i + 1)))
                    .collect();
                format!(
                    "UPDATE {} SET {} WHERE id={}",
                    table,
                    sets.join(","),
                    self.dialect.placeholder(cols.len() + 1)
                )
            }
            DbOpType::OpDelete => {
                return Ok(Statement {
                    sql: format!("DELETE FROM {} WHERE id={}", table, self.dialect.placeholder(1)),
                    args: vec![id_value],
                });
            }
            DbOpType::OpNone => return Err(Error::UnknownOperation(op as i32)),
        };

        args.push(id_value);
        Ok(Statement { sql, args })
    }

    /// Build `SELECT <columns> FROM <table>[ WHERE <filter>]`
    ///
    /// The filter is trimmed and appended verbatim. It is not escaped or
    /// validated, so it must come from a trusted caller.
    pub fn build_select<R: Record>(&self, filter: &str) -> Result<(String, Arc<TableMetadata>)> {
        let meta = self.registry.metadata_for::<R>()?;
        let mut sql = format!(
            "SELECT {} FROM {}",
            meta.column_names().join(","),
            meta.table()
        );

        let filter = filter.trim();
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        Ok((sql, meta))
    }

    /// Build `CREATE TABLE IF NOT EXISTS` for a record type
    pub fn build_create_table<R: Record>(&self) -> Result<String> {
        let meta = self.registry.metadata_for::<R>()?;
        if meta.id_field().is_none() {
            return Err(Error::MissingPrimaryKey(meta.table().to_string()));
        }

        let mut columns = Vec::with_capacity(meta.field_count());
        for field in meta.fields() {
            let ty = self
                .dialect
                .column_type(field.kind)
                .ok_or_else(|| Error::UnsupportedFieldKind {
                    record: R::FULL_NAME.to_string(),
                    field: field.name.to_string(),
                    kind: field.kind.to_string(),
                })?;
            if field.name == ID_FIELD {
                columns.push(format!("{} {} PRIMARY KEY", field.name, ty));
            } else {
                columns.push(format!("{} {}", field.name, ty));
            }
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            meta.table(),
            columns.join(", ")
        ))
    }
}

/// Read and validate the record's operation
pub fn read_op<R: Record>(record: &R, meta: &TableMetadata) -> Result<DbOpType> {
    let op_field = meta.op_field().ok_or(Error::UnknownOperation(0))?;
    let raw = match record.field(op_field.number) {
        Some(FieldRef::Scalar(ScalarValue::Int32(raw))) => raw,
        _ => return Err(Error::UnknownOperation(0)),
    };
    match DbOpType::try_from(raw) {
        Ok(DbOpType::OpNone) | Err(_) => Err(Error::UnknownOperation(raw)),
        Ok(op) => Ok(op),
    }
}

fn with_id<'c>(cols: &[&'c str]) -> Vec<&'c str> {
    let mut all = cols.to_vec();
    all.push(ID_FIELD);
    all
}
