//! PostgreSQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format and parameters
//! - Enforces connection limits to prevent resource exhaustion
//! - Applies read-only session settings to every pooled connection

use super::{ConnectionConfig, PostgresAdapter};
use crate::Result;
use sqlx::PgPool;
use url::Url;

impl PostgresAdapter {
    /// Creates a new PostgreSQL adapter with connection pooling.
    ///
    /// The pool connects lazily: an unreachable server surfaces as a fatal
    /// connection error on first use, not here.
    ///
    /// # Errors
    /// Returns error if the connection string or derived configuration is invalid
    pub fn new(connection_string: &str) -> Result<Self> {
        let config = crate::adapters::parse_connection_config(connection_string)?;
        Self::with_config(connection_string, config)
    }

    /// Creates a new PostgreSQL adapter with custom configuration.
    ///
    /// # Errors
    /// Same conditions as [`PostgresAdapter::new`], plus an invalid `config`
    pub fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Self::validate_connection_string(connection_string)?;

        let pool = Self::create_connection_pool(connection_string, &config)?;

        Ok(Self { pool, config })
    }

    /// Creates a connection pool with read-only session settings.
    ///
    /// # Connection Pool Configuration
    /// - Max connections: from config (capped at 100)
    /// - Acquire timeout: `connect_timeout`; exceeding it is fatal for the run
    /// - Idle timeout: from config
    /// - Session settings: applied to every new connection
    pub(crate) fn create_connection_pool(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<PgPool> {
        use sqlx::Executor;

        let read_only = config.read_only;

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections.min(100))
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    let app_name = format!("datadict-collect-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{app_name}'").as_str())
                        .await?;

                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }

                    // Freshness bounds are rendered as text; keep timestamps stable
                    conn.execute("SET timezone = 'UTC'").await?;

                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| crate::error::DataDictError::Connection {
                context: format!(
                    "Failed to create PostgreSQL connection pool to {}",
                    crate::adapters::redact_database_url(connection_string)
                ),
                source: Box::new(e),
            })?;

        Ok(pool)
    }

    /// Validates connection string format.
    ///
    /// # Errors
    /// Returns error if the string is not a `postgres://` or `postgresql://`
    /// URL with a host
    pub fn validate_connection_string(connection_string: &str) -> Result<()> {
        let url = Url::parse(connection_string).map_err(|e| {
            crate::error::DataDictError::configuration(format!(
                "Invalid PostgreSQL connection string format: {e}"
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(crate::error::DataDictError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        if url.host_str().is_none() {
            return Err(crate::error::DataDictError::configuration(
                "Connection string must specify a host",
            ));
        }

        Ok(())
    }
}
