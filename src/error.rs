//! Error types for dbsvr
//!
//! This module defines all error types used by the mapper, the store
//! backends, the command worker and the transport adapter.

use thiserror::Error;

/// The main error type for dbsvr
#[derive(Error, Debug)]
pub enum Error {
    // ========== Schema Errors ==========
    #[error("Schema error: field '{field}' of '{record}' has unsupported kind {kind}")]
    UnsupportedFieldKind {
        record: String,
        field: String,
        kind: String,
    },

    #[error("Schema error: field '{field}' declared twice in '{record}'")]
    DuplicateField { record: String, field: String },

    #[error("Schema error: not found field id in table {0}")]
    MissingPrimaryKey(String),

    #[error("Schema error: table {0} has no columns besides id to update")]
    NoUpdatableColumns(String),

    #[error("Schema error: record '{record}' has no field number {number}")]
    UnknownField { record: String, number: u32 },

    #[error("Type error: cannot convert {from} to {to}")]
    TypeMismatch { from: String, to: String },

    // ========== Serialization Errors ==========
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ========== Mapper Errors ==========
    #[error("Mapper error: unknown op {0}")]
    UnknownOperation(i32),

    // ========== Store Errors ==========
    #[error("Store error: {0}")]
    Store(String),

    // ========== Dispatch Errors ==========
    #[error("Dispatch error: no handler for cmd {0}")]
    Dispatch(i32),

    #[error("Dispatch error: handler for cmd {0} registered twice")]
    DuplicateHandler(i32),

    #[error("Decode error: malformed {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    // ========== Worker Errors ==========
    #[error("Worker error: command queue is closed")]
    WorkerClosed,

    #[error("Worker error: worker already started")]
    WorkerAlreadyStarted,

    #[error("Worker error: consumer thread panicked")]
    WorkerPanicked,

    // ========== Transport Errors ==========
    #[error("Transport error: frame of {size} bytes exceeds limit of {limit}")]
    FrameTooLarge { size: u64, limit: u64 },

    #[error("Transport error: session is not connected")]
    NotConnected,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Configuration Errors ==========
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a decode error for a named payload
    pub fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Error::Decode {
            what,
            reason: err.to_string(),
        }
    }

    /// Coarse error category used in log lines
    pub fn category(&self) -> &'static str {
        match self {
            Error::UnsupportedFieldKind { .. }
            | Error::DuplicateField { .. }
            | Error::MissingPrimaryKey(_)
            | Error::NoUpdatableColumns(_)
            | Error::UnknownField { .. }
            | Error::TypeMismatch { .. } => "schema",
            Error::Serialization(_) => "serialization",
            Error::UnknownOperation(_) => "unknown_operation",
            Error::Store(_) => "store",
            Error::Dispatch(_) | Error::DuplicateHandler(_) => "dispatch",
            Error::Decode { .. } => "decode",
            Error::WorkerClosed | Error::WorkerAlreadyStarted | Error::WorkerPanicked => "worker",
            Error::FrameTooLarge { .. } | Error::NotConnected | Error::IoError(_) => "transport",
            Error::Config(_) => "config",
        }
    }
}

impl From<prost::EncodeError> for Error {
    fn from(err: prost::EncodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<postgres::Error> for Error {
    fn from(err: postgres::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Store(err.to_string())
    }
}

/// Result type alias for dbsvr operations
pub type Result<T> = std::result::Result<T, Error>;
