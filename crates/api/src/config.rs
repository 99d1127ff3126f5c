use std::str::FromStr;

use ingest_core::sequence::DEFAULT_INITIAL_SEQUENCE;
use ingest_core::types::SequenceNumber;

/// Error raised while loading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Counter value before the first delivery (default: `1`).
    pub initial_sequence: SequenceNumber,
    /// Infrastructure request timeout in seconds (default: `600`).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body in bytes (default: 16 MiB).
    pub max_body_bytes: usize,
    /// Connection URL for the analytical warehouse.
    pub warehouse_database_url: String,
    /// Connection URL for the document store.
    pub document_database_url: String,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default     |
    /// |--------------------------|-------------|
    /// | `HOST`                   | `0.0.0.0`   |
    /// | `PORT`                   | `8080`      |
    /// | `INITIAL_SEQUENCE`       | `1`         |
    /// | `REQUEST_TIMEOUT_SECS`   | `600`       |
    /// | `MAX_BODY_BYTES`         | `16777216`  |
    /// | `WAREHOUSE_DATABASE_URL` | required    |
    /// | `DOCUMENT_DATABASE_URL`  | required    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let initial_sequence = parse_or(&lookup, "INITIAL_SEQUENCE", DEFAULT_INITIAL_SEQUENCE)?;
        let request_timeout_secs =
            parse_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: "0".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let warehouse_database_url = required(&lookup, "WAREHOUSE_DATABASE_URL")?;
        let document_database_url = required(&lookup, "DOCUMENT_DATABASE_URL")?;

        Ok(Self {
            host,
            port,
            initial_sequence,
            request_timeout_secs,
            max_body_bytes,
            warehouse_database_url,
            document_database_url,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing { key })
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
