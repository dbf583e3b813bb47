//! Connection pool construction.
//!
//! The pool is the crate's only connection-acquisition capability: every
//! store operation either checks a connection out of it for one statement,
//! or borrows the connection bound to an active transaction boundary.

use crate::config::DatabaseConfig;
use crate::error::{LedgerError, LedgerResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Create a SQLite connection pool for the given configuration.
pub async fn create_pool(config: &DatabaseConfig) -> LedgerResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.connection_string)
        .map_err(|e| {
            LedgerError::connectivity(format!(
                "invalid SQLite connection string ({}): check the URL format sqlite:path/to/db",
                e
            ))
        })?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .min_connections(config.pool_options.min_connections_or_default())
        .max_connections(config.pool_options.max_connections_or_default())
        .acquire_timeout(config.acquire_timeout_duration())
        .idle_timeout(Some(config.idle_timeout_duration()))
        .connect_with(options)
        .await
        .map_err(LedgerError::from)?;

    if let Some(version) = server_version(&pool).await {
        info!(version = %version, "Connected to SQLite");
    }

    Ok(pool)
}

/// Get the SQLite library version from the connected database.
async fn server_version(pool: &SqlitePool) -> Option<String> {
    match sqlx::query_scalar::<_, String>("SELECT sqlite_version()")
        .fetch_one(pool)
        .await
    {
        Ok(version) => {
            debug!(version = %version, "Got server version");
            Some(version)
        }
        Err(e) => {
            warn!(error = %e, "Failed to get server version");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_in_memory() {
        let config = DatabaseConfig::parse("sqlite::memory:").unwrap();
        let pool = create_pool(&config).await.unwrap();
        assert!(!pool.is_closed());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_create_pool_fails_on_unreachable_path() {
        // create_if_missing creates the file, not intermediate directories.
        let config = DatabaseConfig {
            connection_string: "sqlite:/nonexistent-dir-for-test/ledger.db".to_string(),
            pool_options: Default::default(),
        };
        let result = create_pool(&config).await;
        assert!(matches!(result, Err(LedgerError::Connectivity { .. })));
    }
}
