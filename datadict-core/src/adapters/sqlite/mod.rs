//! SQLite database adapter.
//!
//! # Module Structure
//! - `connection`: Connection handling (single connection for in-memory databases)
//! - `schema_collection`: Table, column and foreign key listing via sqlite_master and PRAGMAs
//!
//! # SQLite-Specific Features
//! - Uses `sqlite_master` for table discovery (`sqlite_%` internal tables excluded)
//! - Uses `PRAGMA table_info` and `PRAGMA foreign_key_list` for column and FK metadata
//! - Supports both file-based and in-memory databases
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT/PRAGMA only)
//! - No network access required

pub mod connection;
mod schema_collection;


use super::{AdapterFeature, ConnectionConfig, DatabaseAdapter, ForeignKeyIntrospection, SqlDialect};
use crate::Result;
use crate::error::classify_sqlx_error;
use crate::models::{Column, DatabaseType, Relationship};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

/// SQLite database adapter.
///
/// SQLite uses file-based databases, so a small pool is sufficient. In-memory
/// databases are limited to one connection because every new connection to
/// `:memory:` would open a different, empty database.
pub struct SqliteAdapter {
    /// Connection pool
    pub pool: SqlitePool,
    /// Connection configuration
    pub config: ConnectionConfig,
    /// Original connection string (kept for reference, public for test access)
    pub connection_string: String,
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("config", &self.config)
            .field("is_in_memory", &self.is_in_memory())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(crate::error::DataDictError::connection_failed)?;

        if connectivity_result != 1 {
            return Err(crate::error::DataDictError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        // sqlite_master must be readable for schema collection
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("Cannot access sqlite_master", e))?;

        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(
            feature,
            AdapterFeature::SchemaCollection
                | AdapterFeature::DeclaredPrimaryKeys
                | AdapterFeature::DeclaredForeignKeys
                | AdapterFeature::ReadOnlyMode
        )
    }

    fn connection_config(&self) -> ConnectionConfig {
        self.config.clone()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        schema_collection::list_tables(&self.pool).await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>> {
        schema_collection::list_columns(&self.pool, table).await
    }

    fn foreign_keys(&self) -> Option<&dyn ForeignKeyIntrospection> {
        Some(self)
    }

    async fn fetch_integers(&self, sql: &str) -> Result<Vec<Option<i64>>> {
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("Aggregate query failed", e))?;

        (0..row.len())
            .map(|i| {
                row.try_get::<Option<i64>, _>(i)
                    .map_err(|e| classify_sqlx_error("Failed to decode integer aggregate", e))
            })
            .collect()
    }

    async fn fetch_texts(&self, sql: &str) -> Result<Vec<Option<String>>> {
        let row = sqlx::query(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("Aggregate query failed", e))?;

        (0..row.len())
            .map(|i| {
                row.try_get::<Option<String>, _>(i)
                    .map_err(|e| classify_sqlx_error("Failed to decode text aggregate", e))
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ForeignKeyIntrospection for SqliteAdapter {
    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<Relationship>> {
        schema_collection::list_foreign_keys(&self.pool, table).await
    }
}
