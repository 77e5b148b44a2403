//! PostgreSQL database adapter with connection pooling and schema collection.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `schema_collection`: Table, column and foreign key listing
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT only)
//! - Connection strings are sanitized in error messages
//! - Every pooled session runs with `default_transaction_read_only`

mod connection;
mod schema_collection;


use super::{
    AdapterFeature, ConnectionConfig, DatabaseAdapter, ForeignKeyIntrospection, SqlDialect,
};
use crate::Result;
use crate::error::classify_sqlx_error;
use crate::models::{Column, DatabaseType, Relationship};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// Schema introspected when the configuration does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL database adapter
pub struct PostgresAdapter {
    pub pool: PgPool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresAdapter {
    /// Schema whose tables are introspected.
    pub fn schema(&self) -> &str {
        self.config.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
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

        // Verify we can access information_schema (required for schema collection)
        let schema_access_test: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'information_schema'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Cannot access information_schema", e))?;

        if schema_access_test == 0 {
            return Err(crate::error::DataDictError::configuration(
                "No access to information_schema tables",
            ));
        }

        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Postgres
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(
            feature,
            AdapterFeature::SchemaCollection
                | AdapterFeature::DeclaredPrimaryKeys
                | AdapterFeature::DeclaredForeignKeys
                | AdapterFeature::ConnectionPooling
                | AdapterFeature::ReadOnlyMode
        )
    }

    fn connection_config(&self) -> ConnectionConfig {
        self.config.clone()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        schema_collection::list_tables(&self.pool, self.schema()).await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>> {
        schema_collection::list_columns(&self.pool, self.schema(), table).await
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
impl ForeignKeyIntrospection for PostgresAdapter {
    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<Relationship>> {
        schema_collection::list_foreign_keys(&self.pool, self.schema(), table).await
    }
}
