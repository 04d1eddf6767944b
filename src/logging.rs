//! Logging setup
//!
//! `RUST_LOG`, when set, replaces the configured level entirely.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Driver crates that are chatty below `warn`
const NOISY_TARGETS: &[&str] = &["tokio_postgres", "postgres", "r2d2", "rusqlite"];

/// Build the filter for a base level such as `info` or `dbsvr=debug`
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = vec![level.to_string()];
    for target in NOISY_TARGETS {
        directives.push(format!("{}=warn", target));
    }

    let filter = directives.join(",");
    EnvFilter::try_new(&filter)
        .map_err(|e| Error::Config(format!("invalid log filter '{}': {}", filter, e)))
}

/// Install the global subscriber
///
/// Calling this twice is an error from `tracing_subscriber`, reported as a
/// config error.
pub fn init(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging already initialized: {}", e)))
}
