//! Catalog module
//!
//! This module contains the schema registry, derived table metadata and
//! table naming rules.

pub mod registry;
pub mod schema;
pub mod types;

pub use registry::SchemaRegistry;
pub use schema::TableMetadata;
pub use types::TableNaming;
