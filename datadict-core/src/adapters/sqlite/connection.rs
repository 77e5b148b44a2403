//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db`, `sqlite://./relative.db` or a bare path
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! File databases are opened read-only unless the configuration says
//! otherwise, and are never created when missing.

use super::{ConnectionConfig, SqliteAdapter};
use crate::Result;
use sqlx::SqlitePool;
use url::Url;

impl SqliteAdapter {
    /// Creates a new SQLite adapter from a connection string.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Database file does not exist (for file-based DBs)
    /// - Database cannot be opened
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = crate::adapters::parse_connection_config(connection_string)?;
        Self::with_config(connection_string, config).await
    }

    /// Creates a new SQLite adapter with custom configuration.
    ///
    /// # Errors
    /// Same conditions as [`SqliteAdapter::new`], plus an invalid `config`
    pub async fn with_config(connection_string: &str, mut config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        validate_sqlite_connection_string(connection_string)?;

        if is_in_memory(connection_string) {
            config.max_connections = 1;
            config.idle_timeout = None;
        }

        let pool = create_sqlite_connection(connection_string, &config).await?;

        Ok(Self {
            pool,
            config,
            connection_string: connection_string.to_string(),
        })
    }

    /// Wraps an existing pool, e.g. one prepared by a caller or a test.
    pub fn from_pool(pool: SqlitePool, config: ConnectionConfig) -> Self {
        Self {
            pool,
            config,
            connection_string: "sqlite::memory:".to_string(),
        }
    }

    /// Checks if the connection is to an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        is_in_memory(&self.connection_string)
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string == ":memory:" {
        return Ok(());
    }

    if connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
    {
        return Ok(());
    }

    if connection_string.starts_with("sqlite:") {
        if is_in_memory(connection_string) {
            return Ok(());
        }

        if let Ok(url) = Url::parse(connection_string) {
            if url.scheme() != "sqlite" {
                return Err(crate::error::DataDictError::configuration(
                    "Connection string must use sqlite:// scheme",
                ));
            }
            return Ok(());
        }

        if connection_string.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(crate::error::DataDictError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

/// Creates a SQLite connection pool with proper configuration.
async fn create_sqlite_connection(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    let normalized = normalize_connection_string(connection_string);

    let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        crate::error::DataDictError::configuration(format!(
            "Invalid SQLite connection string: {e}"
        ))
    })?;

    if config.read_only && !is_in_memory(connection_string) {
        options = options.read_only(true).create_if_missing(false);
    }

    let mut pool_options = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout);

    // Recycling the only connection would drop an in-memory database
    if is_in_memory(connection_string) {
        pool_options = pool_options.max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(crate::error::DataDictError::connection_failed)?;

    Ok(pool)
}

/// Normalizes connection string to SQLite URL format.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{connection_string}")
}
