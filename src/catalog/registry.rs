//! Schema registry
//!
//! Derives table metadata from a record type's descriptors on first use and
//! caches it for the life of the registry. Derivation is pure, so two
//! callers racing on the first lookup may both derive; the first insert wins
//! and both observe equal metadata.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::schema::TableMetadata;
use super::types::TableNaming;
use crate::error::{Error, Result};
use crate::record::{FieldKind, Record, OP_FIELD};

/// Read-mostly cache of table metadata keyed by record type name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Naming rule applied to every derived table
    naming: TableNaming,
    /// Metadata by fully-qualified record type name
    tables: RwLock<HashMap<&'static str, Arc<TableMetadata>>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new(naming: TableNaming) -> Self {
        Self {
            naming,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Naming rule of this registry
    pub fn naming(&self) -> TableNaming {
        self.naming
    }

    /// Get the metadata for a record type, deriving it on first use
    pub fn metadata_for<R: Record>(&self) -> Result<Arc<TableMetadata>> {
        {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(meta) = tables.get(R::FULL_NAME) {
                return Ok(meta.clone());
            }
        }

        let derived = Arc::new(derive_metadata::<R>(self.naming)?);
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let meta = tables.entry(R::FULL_NAME).or_insert(derived);
        Ok(meta.clone())
    }

    /// Check if a record type has been derived already
    pub fn contains(&self, record: &str) -> bool {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.contains_key(record)
    }

    /// List all cached table names
    pub fn list_tables(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.values().map(|m| m.table().to_string()).collect()
    }
}

/// Introspect a record type into table metadata
fn derive_metadata<R: Record>(naming: TableNaming) -> Result<TableMetadata> {
    let mut meta = TableMetadata::new(R::FULL_NAME, naming.table_name(R::short_name()));

    for field in R::descriptors() {
        if field.name == OP_FIELD {
            if !matches!(field.kind, FieldKind::Enum | FieldKind::Int32) {
                return Err(unsupported::<R>(field.name, field.kind));
            }
            meta.set_op_field(*field);
            continue;
        }

        match field.kind {
            FieldKind::Message => {}
            kind if kind.is_scalar() => {}
            kind => return Err(unsupported::<R>(field.name, kind)),
        }
        meta.add_field(*field)?;
    }

    debug!(
        record = R::FULL_NAME,
        table = meta.table(),
        columns = ?meta.column_names(),
        "derived table metadata"
    );
    Ok(meta)
}

fn unsupported<R: Record>(field: &str, kind: FieldKind) -> Error {
    Error::UnsupportedFieldKind {
        record: R::FULL_NAME.to_string(),
        field: field.to_string(),
        kind: kind.to_string(),
    }
}
