//! dbsvr - a database access service for an RPC mesh
//!
//! This library provides the pieces of a single-writer DB service:
//! - Record introspection and the wire protocol messages
//! - Schema registry and table metadata
//! - Relational mapper (value codec, statement builder, row materializer)
//! - Store backends (Postgres, SQLite)
//! - Command worker and transport adapter

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod proto;
pub mod record;
pub mod store;
pub mod transport;
pub mod worker;

pub use error::{Error, Result};
