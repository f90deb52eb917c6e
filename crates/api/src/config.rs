//! Application configuration loaded from environment variables.

use engine::{DualWritePolicy, StockPolicy};
use thiserror::Error;

/// A variable was set to a value that cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {var}: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset selects the
///   in-memory store
/// - `STOCK_POLICY`: `optimistic` (default) or `guarded`
/// - `DUAL_WRITE_POLICY`: `accept_partial` (default) or `compensate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub stock_policy: StockPolicy,
    pub dual_write_policy: DualWritePolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError {
                var: "PORT",
                message: format!("{raw}: {e}"),
            })?,
            None => defaults.port,
        };
        let stock_policy = match lookup("STOCK_POLICY") {
            Some(raw) => raw.parse().map_err(|message| ConfigError {
                var: "STOCK_POLICY",
                message,
            })?,
            None => defaults.stock_policy,
        };
        let dual_write_policy = match lookup("DUAL_WRITE_POLICY") {
            Some(raw) => raw.parse().map_err(|message| ConfigError {
                var: "DUAL_WRITE_POLICY",
                message,
            })?,
            None => defaults.dual_write_policy,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            stock_policy,
            dual_write_policy,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            stock_policy: StockPolicy::default(),
            dual_write_policy: DualWritePolicy::default(),
        }
    }
}
