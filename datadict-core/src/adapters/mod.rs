//! Database adapter traits and factory for unified database access.
//!
//! An adapter is both the Connection Provider and the backend half of the
//! Schema Reader. Backends expose a capability set: every adapter can list
//! tables and columns and run single-row aggregate queries; declared
//! foreign-key introspection is an optional capability reached through
//! [`DatabaseAdapter::foreign_keys`]. An adapter without it is read through
//! the degraded path (no primary-key or relationship detection).
//!
//! # Module Structure
//! - `config`: Connection configuration
//! - `dialect`: Identifier quoting and casts per SQL dialect
//! - `type_mapping`: Declared type name classification
//! - Backend modules (`sqlite`, `postgres`, `generic`)

use crate::{
    Result,
    models::{Column, DatabaseType, Relationship},
};
use async_trait::async_trait;

pub mod config;
pub mod dialect;
pub mod type_mapping;

pub use config::ConnectionConfig;
pub use dialect::SqlDialect;
pub use type_mapping::TypeFamily;

/// Features that database adapters may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterFeature {
    /// Table and column listing
    SchemaCollection,
    /// Declared primary-key flags on columns
    DeclaredPrimaryKeys,
    /// Declared foreign-key listing
    DeclaredForeignKeys,
    /// Connection pooling
    ConnectionPooling,
    /// Read-only connection enforcement
    ReadOnlyMode,
}

/// Optional capability: reading backend-declared foreign keys.
#[async_trait]
pub trait ForeignKeyIntrospection: Send + Sync {
    /// Lists the declared foreign keys of `table` as `declared_fk` relationships,
    /// one per referencing column.
    ///
    /// # Errors
    /// Returns error if the catalog query fails
    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<Relationship>>;
}

/// Main trait for database adapters with object-safe design.
///
/// # Security Guarantees
/// - All operations are read-only
/// - Credentials are never stored or logged
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Box<dyn DatabaseAdapter>` or `Arc<dyn DatabaseAdapter>`.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Tests the database connection without reading the schema.
    ///
    /// # Errors
    /// Returns error if connection fails or times out
    async fn test_connection(&self) -> Result<()>;

    /// Returns the database type this adapter handles.
    fn database_type(&self) -> DatabaseType;

    /// SQL dialect used when generating aggregate queries.
    fn dialect(&self) -> SqlDialect;

    /// Checks if the adapter supports a specific feature.
    fn supports_feature(&self, feature: AdapterFeature) -> bool;

    /// Gets the connection configuration (credentials sanitized).
    fn connection_config(&self) -> ConnectionConfig;

    /// Lists user tables, system/internal tables excluded, in a stable order.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be read
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Lists the columns of `table` in declaration order.
    ///
    /// # Errors
    /// Returns error if the catalog cannot be read
    async fn list_columns(&self, table: &str) -> Result<Vec<Column>>;

    /// Declared foreign-key capability, `None` when the backend has none.
    fn foreign_keys(&self) -> Option<&dyn ForeignKeyIntrospection> {
        None
    }

    /// Runs a query returning exactly one row of integer aggregates.
    ///
    /// # Errors
    /// Returns a fatal connection error when the handle is unusable and a
    /// recoverable query error otherwise
    async fn fetch_integers(&self, sql: &str) -> Result<Vec<Option<i64>>>;

    /// Runs a query returning exactly one row of text values.
    ///
    /// # Errors
    /// Same classification as [`DatabaseAdapter::fetch_integers`]
    async fn fetch_texts(&self, sql: &str) -> Result<Vec<Option<String>>>;

    /// Closes the underlying pool.
    async fn close(&self) {}
}

/// Factory function to create database adapters based on connection string.
///
/// The configuration is derived from the connection string.
///
/// # Errors
/// Returns error if:
/// - Connection string format is invalid
/// - Database type is not supported
/// - Required features are not compiled in
pub async fn create_adapter(connection_string: &str) -> Result<Box<dyn DatabaseAdapter>> {
    let config = parse_connection_config(connection_string)?;
    create_adapter_with_config(connection_string, config).await
}

/// Factory function using an explicit connection configuration.
///
/// # Errors
/// Same conditions as [`create_adapter`], plus an invalid `config`
pub async fn create_adapter_with_config(
    connection_string: &str,
    config: ConnectionConfig,
) -> Result<Box<dyn DatabaseAdapter>> {
    config.validate()?;
    let database_type = detect_database_type(connection_string)?;

    match database_type {
        #[cfg(feature = "postgresql")]
        DatabaseType::PostgreSQL => {
            let adapter = postgres::PostgresAdapter::with_config(connection_string, config)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "postgresql"))]
        DatabaseType::PostgreSQL => Err(crate::error::DataDictError::unsupported_feature(
            "PostgreSQL adapter",
            "Compile with --features postgresql to enable PostgreSQL support",
        )),
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            let adapter = sqlite::SqliteAdapter::with_config(connection_string, config).await?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "sqlite"))]
        DatabaseType::SQLite => Err(crate::error::DataDictError::unsupported_feature(
            "SQLite adapter",
            "Compile with --features sqlite to enable SQLite support",
        )),
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => {
            tracing::warn!(
                "No native reader for {}; using generic information_schema introspection",
                database_type
            );
            let adapter =
                generic::GenericAdapter::with_config(connection_string, database_type, config)?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "mysql"))]
        DatabaseType::MySQL => Err(crate::error::DataDictError::unsupported_feature(
            "MySQL adapter",
            "Compile with --features mysql to enable MySQL support",
        )),
    }
}

/// Safely redacts credentials from database connection URLs.
///
/// Delegates to `crate::error::redact_database_url`.
#[inline]
pub fn redact_database_url(url: &str) -> String {
    crate::error::redact_database_url(url)
}

/// Detects database type from connection string.
///
/// # Errors
/// Returns error if connection string format is unrecognized
pub fn detect_database_type(connection_string: &str) -> Result<DatabaseType> {
    if connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://")
    {
        Ok(DatabaseType::PostgreSQL)
    } else if connection_string.starts_with("mysql://") {
        Ok(DatabaseType::MySQL)
    } else if is_sqlite_connection_string(connection_string) {
        Ok(DatabaseType::SQLite)
    } else {
        Err(crate::error::DataDictError::configuration(
            "Unrecognized database connection string format",
        ))
    }
}

fn is_sqlite_connection_string(connection_string: &str) -> bool {
    connection_string.starts_with("sqlite:")
        || connection_string == ":memory:"
        || connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
}

/// Derives a connection configuration from a connection string.
///
/// Host, port, database and username come from the URL; file paths and
/// in-memory SQLite strings produce a single-connection local config.
///
/// # Errors
/// Returns error if the string is neither a recognised URL nor a SQLite path
pub fn parse_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    if is_sqlite_connection_string(connection_string) {
        let mut config = ConnectionConfig::new("localhost".to_string())
            .with_database(sqlite_database_name(connection_string))
            .with_max_connections(1);
        config.idle_timeout = None;
        return Ok(config);
    }

    let url = url::Url::parse(connection_string).map_err(|e| {
        crate::error::DataDictError::configuration(format!(
            "Invalid connection string format: {e}"
        ))
    })?;

    let mut config = ConnectionConfig::new(url.host_str().unwrap_or("localhost").to_string());
    if let Some(port) = url.port() {
        config = config.with_port(port);
    }
    let database = url.path().trim_start_matches('/');
    if !database.is_empty() {
        config = config.with_database(database.to_string());
    }
    if !url.username().is_empty() {
        config = config.with_username(url.username().to_string());
    }
    for (key, value) in url.query_pairs() {
        if key == "schema" && !value.is_empty() {
            config = config.with_schema(value.into_owned());
        }
    }

    config.validate()?;
    Ok(config)
}

/// Extracts the database (file) name from a SQLite connection string.
fn sqlite_database_name(connection_string: &str) -> String {
    if connection_string.contains(":memory:") {
        return ":memory:".to_string();
    }
    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);
    match path.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => filename.to_string(),
        _ => "main".to_string(),
    }
}

// Database-specific adapter modules
#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "sqlite", feature = "postgresql", feature = "mysql"))]
pub mod generic;
