//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::JoinStrategy;
use thiserror::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A configuration value that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `DATABASE_URL` — PostgreSQL URL; unset selects the in-memory store
/// - `STORE_TIMEOUT_MS` — deadline for each store call, `0` disables (default: `30000`)
/// - `ORDER_JOIN` — `pipeline` or `application` (default: `pipeline`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub store_timeout: Option<Duration>,
    pub join_strategy: JoinStrategy,
}

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| ConfigError {
                key: "PORT",
                message: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError {
                    key: "LOG_FORMAT",
                    message: format!("expected `text` or `json`, got `{other}`"),
                });
            }
        };

        let store_timeout = match lookup("STORE_TIMEOUT_MS") {
            Some(ms) => {
                let ms = ms.parse::<u64>().map_err(|e| ConfigError {
                    key: "STORE_TIMEOUT_MS",
                    message: format!("{e}"),
                })?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
            None => defaults.store_timeout,
        };

        let join_strategy = match lookup("ORDER_JOIN") {
            Some(s) => s.parse::<JoinStrategy>().map_err(|message| ConfigError {
                key: "ORDER_JOIN",
                message,
            })?,
            None => defaults.join_strategy,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            store_timeout,
            join_strategy,
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
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            store_timeout: Some(DEFAULT_STORE_TIMEOUT),
            join_strategy: JoinStrategy::Pipeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert_eq!(config.store_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.join_strategy, JoinStrategy::Pipeline);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("LOG_FORMAT", "json"),
            ("DATABASE_URL", "postgres://localhost/store"),
            ("STORE_TIMEOUT_MS", "250"),
            ("ORDER_JOIN", "application"),
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/store")
        );
        assert_eq!(config.store_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.join_strategy, JoinStrategy::Application);
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = load(&[("STORE_TIMEOUT_MS", "0")]).unwrap();
        assert!(config.store_timeout.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(load(&[("PORT", "http")]).unwrap_err().key, "PORT");
        assert_eq!(load(&[("LOG_FORMAT", "xml")]).unwrap_err().key, "LOG_FORMAT");
        assert_eq!(load(&[("ORDER_JOIN", "magic")]).unwrap_err().key, "ORDER_JOIN");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }
}
