//! Table metadata
//!
//! This module defines the column layout derived from a record type.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::record::{FieldDescriptor, ID_FIELD};

/// Table layout derived from one record type
///
/// Fields keep their declaration order. The reserved `op` field is never
/// part of `fields`; it is remembered separately so the builder can read it.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    /// Fully-qualified record type name
    record: &'static str,
    /// Table name
    table: String,
    /// Column name to field descriptor, in declaration order
    fields: IndexMap<&'static str, FieldDescriptor>,
    /// Descriptor of the `op` field, if the record has one
    op_field: Option<FieldDescriptor>,
}

impl TableMetadata {
    /// Create an empty layout for a record type
    pub fn new(record: &'static str, table: impl Into<String>) -> Self {
        Self {
            record,
            table: table.into(),
            fields: IndexMap::new(),
            op_field: None,
        }
    }

    /// Append a column
    pub fn add_field(&mut self, field: FieldDescriptor) -> Result<()> {
        if self.fields.contains_key(field.name) {
            return Err(Error::DuplicateField {
                record: self.record.to_string(),
                field: field.name.to_string(),
            });
        }
        self.fields.insert(field.name, field);
        Ok(())
    }

    /// Remember the `op` field
    pub fn set_op_field(&mut self, field: FieldDescriptor) {
        self.op_field = Some(field);
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns in declaration order
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> + '_ {
        self.fields.values()
    }

    /// Number of columns
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Get a column by name
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields.keys().copied().collect()
    }

    /// The primary key column and its position
    pub fn id_field(&self) -> Option<(usize, &FieldDescriptor)> {
        self.fields
            .get_full(ID_FIELD)
            .map(|(index, _, field)| (index, field))
    }

    /// The reserved `op` field
    pub fn op_field(&self) -> Option<&FieldDescriptor> {
        self.op_field.as_ref()
    }
}

impl PartialEq for TableMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
            && self.table == other.table
            && self.op_field == other.op_field
            && self.fields.iter().eq(other.fields.iter())
    }
}

impl Eq for TableMetadata {}
