//! Generic `information_schema` adapter for backends without a native reader.
//!
//! Built on the sqlx `Any` driver. Only table and column names, declared
//! types and nullability are read; declared primary keys are reported as
//! absent and there is no foreign-key capability, so documents read through
//! this adapter are marked degraded and skip key inference.
//!
//! Catalog filters are interpolated as quoted literals because bind
//! placeholder syntax differs between the drivers behind `Any`. Catalog
//! columns are cast to text since `Any` cannot decode catalog domain types
//! such as PostgreSQL's `sql_identifier`.

use super::{AdapterFeature, ConnectionConfig, DatabaseAdapter, SqlDialect};
use crate::Result;
use crate::error::classify_sqlx_error;
use crate::models::{Column, DatabaseType};
use async_trait::async_trait;
use sqlx::{AnyPool, Row};

/// Schemas never introspected when no schema filter applies.
const SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "pg_catalog",
    "pg_toast",
    "mysql",
    "performance_schema",
    "sys",
];

/// Best-effort adapter over `information_schema`.
pub struct GenericAdapter {
    pub pool: AnyPool,
    pub config: ConnectionConfig,
    database_type: DatabaseType,
}

impl std::fmt::Debug for GenericAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericAdapter")
            .field("database_type", &self.database_type)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GenericAdapter {
    /// Creates a lazily connecting adapter for `database_type`.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or no compiled-in
    /// driver accepts the connection string
    pub fn with_config(
        connection_string: &str,
        database_type: DatabaseType,
        config: ConnectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        sqlx::any::install_default_drivers();

        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(config.max_connections.min(100))
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_lazy(connection_string)
            .map_err(|e| crate::error::DataDictError::Connection {
                context: format!(
                    "Failed to create {database_type} connection pool to {}",
                    crate::adapters::redact_database_url(connection_string)
                ),
                source: Box::new(e),
            })?;

        Ok(Self {
            pool,
            config,
            database_type,
        })
    }

    fn schema_predicate(&self) -> String {
        schema_predicate(
            self.database_type,
            self.dialect(),
            self.config.schema.as_deref(),
        )
    }
}

/// `WHERE` fragment selecting the introspected schema.
fn schema_predicate(
    database_type: DatabaseType,
    dialect: SqlDialect,
    schema: Option<&str>,
) -> String {
    match (schema, database_type) {
        (Some(schema), _) => format!("table_schema = {}", dialect.quote_literal(schema)),
        (None, DatabaseType::MySQL) => "table_schema = DATABASE()".to_string(),
        (None, DatabaseType::PostgreSQL) => "table_schema = current_schema()".to_string(),
        (None, DatabaseType::SQLite) => {
            let excluded: Vec<String> = SYSTEM_SCHEMAS
                .iter()
                .map(|s| dialect.quote_literal(s))
                .collect();
            format!("table_schema NOT IN ({})", excluded.join(", "))
        }
    }
}

#[async_trait]
impl DatabaseAdapter for GenericAdapter {
    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(crate::error::DataDictError::connection_failed)?;
        Ok(())
    }

    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    fn dialect(&self) -> SqlDialect {
        match self.database_type {
            DatabaseType::MySQL => SqlDialect::MySql,
            DatabaseType::PostgreSQL => SqlDialect::Postgres,
            DatabaseType::SQLite => SqlDialect::Sqlite,
        }
    }

    fn supports_feature(&self, feature: AdapterFeature) -> bool {
        matches!(
            feature,
            AdapterFeature::SchemaCollection | AdapterFeature::ConnectionPooling
        )
    }

    fn connection_config(&self) -> ConnectionConfig {
        self.config.clone()
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let tables_query = format!(
            "SELECT {} AS table_name \
             FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' AND {} \
             ORDER BY table_name",
            self.dialect().cast_to_text("table_name"),
            self.schema_predicate()
        );

        let rows = sqlx::query(&tables_query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| crate::error::introspection_sqlx_error("Failed to enumerate tables", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("table_name").map_err(|e| {
                    crate::error::DataDictError::introspection_failed(
                        "Failed to parse table name",
                        e,
                    )
                })
            })
            .collect()
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>> {
        let dialect = self.dialect();
        let columns_query = format!(
            "SELECT {} AS column_name, {} AS data_type, {} AS is_nullable \
             FROM information_schema.columns \
             WHERE table_name = {} AND {} \
             ORDER BY ordinal_position",
            dialect.cast_to_text("column_name"),
            dialect.cast_to_text("data_type"),
            dialect.cast_to_text("is_nullable"),
            dialect.quote_literal(table),
            self.schema_predicate()
        );

        let rows = sqlx::query(&columns_query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                crate::error::introspection_sqlx_error(
                    &format!("Failed to collect columns for table '{table}'"),
                    e,
                )
            })?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let parse_error = |e: sqlx::Error| {
                crate::error::DataDictError::introspection_failed(
                    format!("Failed to parse column metadata for '{table}'"),
                    e,
                )
            };
            let name: String = row.try_get("column_name").map_err(parse_error)?;
            let data_type: String = row.try_get("data_type").map_err(parse_error)?;
            let is_nullable: String = row.try_get("is_nullable").map_err(parse_error)?;

            // No key information on this path
            columns.push(Column::new(name, data_type, is_nullable == "YES", false));
        }

        Ok(columns)
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
