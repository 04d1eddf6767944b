//! Service configuration
//!
//! Loaded from a TOML file. Every section and every key is optional; absent
//! values fall back to the defaults of a local development setup.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::TableNaming;
use crate::error::{Error, Result};
use crate::mapper::Dialect;
use crate::store::PostgresStoreConfig;
use crate::transport::frame::DEFAULT_MAX_FRAME_BYTES;

/// Default upstream RPC address
pub const DEFAULT_RPC_ADDR: &str = "127.0.0.1:20026";

/// Default application identity sent in the handshake
pub const DEFAULT_APP_ID: &str = "1.1.2.1";

/// Default worker queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub rpc: RpcConfig,
    pub store: StoreConfig,
    pub worker: WorkerConfig,
    pub mapper: MapperConfig,
    pub logging: LoggingConfig,
}

/// Upstream RPC connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// `host:port` of the RPC peer
    pub addr: String,
    /// Identity presented in the handshake
    pub app_id: String,
    /// Delay between reconnect attempts
    pub reconnect_delay_ms: u64,
    /// Largest accepted frame body
    pub max_frame_bytes: u64,
    /// Context string of the example request sent after the handshake
    pub example_context: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_RPC_ADDR.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            reconnect_delay_ms: 3_000,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            example_context: "hello from dbsvr".to_string(),
        }
    }
}

/// Database backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl StoreBackend {
    /// Dialect used when none is configured explicitly
    pub fn default_dialect(&self) -> Dialect {
        match self {
            StoreBackend::Postgres => Dialect::Postgres,
            StoreBackend::Sqlite => Dialect::Sqlite,
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Postgres connection string
    pub connection: String,
    pub max_connections: u32,
    pub min_idle: u32,
    pub connect_timeout_ms: u64,
    /// SQLite database file
    pub sqlite_path: PathBuf,
    /// Create missing tables for the built-in record types on startup
    pub auto_create_tables: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let postgres = PostgresStoreConfig::default();
        Self {
            backend: StoreBackend::default(),
            connection: postgres.connection,
            max_connections: postgres.max_connections,
            min_idle: postgres.min_idle,
            connect_timeout_ms: postgres.connect_timeout_ms,
            sqlite_path: PathBuf::from("dbsvr.sqlite"),
            auto_create_tables: false,
        }
    }
}

impl StoreConfig {
    /// Postgres pool settings from this section
    pub fn postgres(&self) -> PostgresStoreConfig {
        PostgresStoreConfig {
            connection: self.connection.clone(),
            max_connections: self.max_connections,
            min_idle: self.min_idle,
            connect_timeout_ms: self.connect_timeout_ms,
        }
    }
}

/// Command worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Mapper settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub table_naming: TableNaming,
    /// Overrides the backend's dialect
    pub dialect: Option<Dialect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ServiceConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker.queue_capacity == 0 {
            return Err(Error::Config("worker.queue_capacity must be > 0".into()));
        }
        if self.rpc.addr.trim().is_empty() {
            return Err(Error::Config("rpc.addr must not be empty".into()));
        }
        if self.rpc.max_frame_bytes == 0 {
            return Err(Error::Config("rpc.max_frame_bytes must be > 0".into()));
        }
        if self.store.backend == StoreBackend::Postgres && self.store.max_connections == 0 {
            return Err(Error::Config("store.max_connections must be > 0".into()));
        }
        if self.dialect() != self.store.backend.default_dialect() {
            return Err(Error::Config(format!(
                "mapper.dialect {} cannot drive a {} store",
                self.dialect(),
                self.store.backend
            )));
        }
        Ok(())
    }

    /// Effective SQL dialect
    pub fn dialect(&self) -> Dialect {
        self.mapper
            .dialect
            .unwrap_or_else(|| self.store.backend.default_dialect())
    }

    /// Set the RPC address
    pub fn rpc_addr(mut self, addr: impl Into<String>) -> Self {
        self.rpc.addr = addr.into();
        self
    }

    /// Set the handshake identity
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.rpc.app_id = app_id.into();
        self
    }

    /// Use a SQLite file as the store
    pub fn sqlite(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.backend = StoreBackend::Sqlite;
        self.store.sqlite_path = path.into();
        self
    }

    /// Set the worker queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.worker.queue_capacity = capacity;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }
}
