//! Configuration handling for the ledger store.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:ledger.db";

// Pool configuration defaults. SQLite keeps a single writer, so the pool
// defaults to one connection.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool configuration options parsed from the database URL.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 1)
    pub max_connections: Option<u32>,
    /// Minimum connections in pool (default: 1)
    pub min_connections: Option<u32>,
    /// Idle timeout in seconds (default: 600)
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    pub acquire_timeout_secs: Option<u64>,
}

impl PoolOptions {
    /// Get max_connections with default value.
    pub fn max_connections_or_default(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Get min_connections with default value.
    pub fn min_connections_or_default(&self) -> u32 {
        self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS)
    }

    /// Get idle_timeout with default value.
    pub fn idle_timeout_or_default(&self) -> u64 {
        self.idle_timeout_secs.unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS)
    }

    /// Get acquire_timeout with default value.
    pub fn acquire_timeout_or_default(&self) -> u64 {
        self.acquire_timeout_secs
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS)
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_connections {
            if max == 0 {
                return Err("max_connections must be greater than 0".to_string());
            }
        }
        if let Some(min) = self.min_connections {
            if min == 0 {
                return Err("min_connections must be greater than 0".to_string());
            }
            if let Some(max) = self.max_connections {
                if min > max {
                    return Err(format!(
                        "min_connections ({}) cannot exceed max_connections ({})",
                        min, max
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Database connection configuration parsed from the CLI argument.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL with pool options stripped, as handed to the driver.
    pub connection_string: String,
    /// Connection pool configuration options parsed from URL query parameters.
    pub pool_options: PoolOptions,
}

impl DatabaseConfig {
    /// Pool option keys that we extract from URL query parameters.
    const POOL_OPTION_KEYS: &'static [&'static str] = &[
        "max_connections",
        "min_connections",
        "idle_timeout",
        "acquire_timeout",
    ];

    /// Parse a database config from a CLI argument.
    ///
    /// # Format
    ///
    /// - `sqlite:ledger.db` - file-backed database
    /// - `sqlite::memory:` - in-memory database
    /// - `sqlite:ledger.db?max_connections=4` - pool options in the URL
    pub fn parse(s: &str) -> Result<Self, String> {
        let scheme = s.split(':').next().unwrap_or("").to_lowercase();
        if scheme != "sqlite" {
            return Err(format!(
                "Unsupported database scheme '{}'. Only sqlite: URLs are supported.",
                scheme
            ));
        }

        // `sqlite::memory:` and bare `sqlite:path` forms are not parseable by
        // the url crate as-is; only URLs with a query string need rewriting.
        if !s.contains('?') {
            return Ok(Self {
                connection_string: s.to_string(),
                pool_options: PoolOptions::default(),
            });
        }

        let mut url = Url::parse(s).map_err(|e| format!("Invalid URL: {e}"))?;
        let mut opts = Self::extract_options(&mut url, Self::POOL_OPTION_KEYS);

        let pool_options = Self::parse_pool_options(&mut opts);
        pool_options.validate()?;

        Ok(Self {
            connection_string: url.to_string(),
            pool_options,
        })
    }

    /// Parse pool options from extracted URL query parameters.
    fn parse_pool_options(opts: &mut HashMap<String, String>) -> PoolOptions {
        PoolOptions {
            max_connections: opts.remove("max_connections").and_then(|v| v.parse().ok()),
            min_connections: opts.remove("min_connections").and_then(|v| v.parse().ok()),
            idle_timeout_secs: opts.remove("idle_timeout").and_then(|v| v.parse().ok()),
            acquire_timeout_secs: opts.remove("acquire_timeout").and_then(|v| v.parse().ok()),
        }
    }

    /// Extract pool options from URL query params, keeping others for the driver.
    fn extract_options(url: &mut Url, keys: &[&str]) -> HashMap<String, String> {
        let mut opts = HashMap::new();
        let remaining: Vec<(String, String)> = url
            .query_pairs()
            .filter_map(|(k, v)| {
                let key_lower = k.to_ascii_lowercase();
                if keys.contains(&key_lower.as_str()) {
                    opts.insert(key_lower, v.into_owned());
                    None
                } else {
                    Some((k.into_owned(), v.into_owned()))
                }
            })
            .collect();

        if remaining.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(remaining);
        }
        opts
    }

    /// Get the acquire timeout as a Duration.
    pub fn acquire_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.pool_options.acquire_timeout_or_default())
    }

    /// Get the idle timeout as a Duration.
    pub fn idle_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.pool_options.idle_timeout_or_default())
    }
}

/// CLI subcommands operating on the ledger.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the records table if it does not exist.
    Init,
    /// Insert a new account record.
    Create {
        /// Account identifier
        id: String,
        /// Opening balance in minor units
        balance: i64,
    },
    /// Look up an account record by id.
    Get {
        /// Account identifier
        id: String,
    },
    /// Overwrite an account's balance.
    SetBalance {
        /// Account identifier
        id: String,
        /// New balance in minor units
        balance: i64,
    },
    /// Delete an account record (no error if absent).
    Delete {
        /// Account identifier
        id: String,
    },
    /// Atomically move an amount between two accounts.
    Transfer {
        /// Source account id
        from: String,
        /// Destination account id
        to: String,
        /// Amount in minor units
        amount: i64,
    },
}

/// Configuration for the ledger store CLI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ledger-store",
    about = "Transactional account ledger backed by SQLite",
    version,
    author
)]
pub struct Config {
    /// Database connection URL.
    /// Pool options can be appended as query parameters, e.g.
    /// sqlite:ledger.db?max_connections=4
    #[arg(
        short = 'd',
        long = "database",
        value_name = "URL",
        env = "LEDGER_DATABASE",
        default_value = DEFAULT_DATABASE_URL
    )]
    pub database: String,

    /// Account ids rejected as transfer destinations.
    /// Can be specified multiple times or as comma-separated values.
    #[arg(
        long = "blocked-account",
        value_name = "ID",
        env = "LEDGER_BLOCKED_ACCOUNTS",
        value_delimiter = ','
    )]
    pub blocked_accounts: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LEDGER_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "LEDGER_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse the database configuration.
    pub fn parse_database(&self) -> Result<DatabaseConfig, String> {
        DatabaseConfig::parse(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_sqlite_url() {
        let config = DatabaseConfig::parse("sqlite:ledger.db").unwrap();
        assert_eq!(config.connection_string, "sqlite:ledger.db");
        assert!(config.pool_options.max_connections.is_none());
    }

    #[test]
    fn test_parse_memory_url() {
        let config = DatabaseConfig::parse("sqlite::memory:").unwrap();
        assert_eq!(config.connection_string, "sqlite::memory:");
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let result = DatabaseConfig::parse("postgres://host/db");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("sqlite"));
    }

    #[test]
    fn test_parse_pool_options_from_url() {
        let config =
            DatabaseConfig::parse("sqlite://ledger.db?max_connections=4&min_connections=2")
                .unwrap();
        assert_eq!(config.pool_options.max_connections, Some(4));
        assert_eq!(config.pool_options.min_connections, Some(2));
        assert!(config.pool_options.idle_timeout_secs.is_none());
    }

    #[test]
    fn test_pool_options_stripped_from_connection_string() {
        let config =
            DatabaseConfig::parse("sqlite://ledger.db?max_connections=4&mode=rwc").unwrap();
        assert!(!config.connection_string.contains("max_connections"));
        assert!(config.connection_string.contains("mode=rwc"));
    }

    #[test]
    fn test_pool_options_invalid_value_ignored() {
        let config = DatabaseConfig::parse("sqlite://ledger.db?max_connections=invalid").unwrap();
        assert!(config.pool_options.max_connections.is_none());
    }

    #[test]
    fn test_pool_options_validation_max_zero() {
        let result = DatabaseConfig::parse("sqlite://ledger.db?max_connections=0");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("max_connections"));
    }

    #[test]
    fn test_pool_options_validation_min_exceeds_max() {
        let result =
            DatabaseConfig::parse("sqlite://ledger.db?min_connections=4&max_connections=2");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("cannot exceed"));
    }

    #[test]
    fn test_pool_options_defaults() {
        let opts = PoolOptions::default();
        assert_eq!(opts.max_connections_or_default(), 1);
        assert_eq!(opts.min_connections_or_default(), 1);
        assert_eq!(opts.idle_timeout_or_default(), 600);
        assert_eq!(opts.acquire_timeout_or_default(), 30);
    }

    #[test]
    fn test_timeout_durations() {
        let config = DatabaseConfig::parse("sqlite://ledger.db?acquire_timeout=60").unwrap();
        assert_eq!(config.acquire_timeout_duration(), Duration::from_secs(60));
        assert_eq!(config.idle_timeout_duration(), Duration::from_secs(600));
    }
}
