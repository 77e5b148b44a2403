//! Quality profiler: per-table aggregates with local degradation.
//!
//! Only connection-level failures leave this module as errors. Any other
//! failed or timed-out aggregate is logged and replaced by its degraded
//! value: zero counts for column statistics and key health, an omitted
//! entry for freshness, the empty profile for a failed row count.

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::Result;
use crate::adapters::{DatabaseAdapter, TypeFamily};
use crate::error::DataDictError;
use crate::models::{
    Column, ColumnProfile, FreshnessWindow, KeyHealth, MetadataDocument, ProfileDocument,
    TableProfile,
};

use super::config::ProfilerConfig;
use super::sql;

/// Computes table profiles through a [`DatabaseAdapter`].
///
/// # Example
///
/// ```rust,ignore
/// use datadict_core::profiling::{ProfilerConfig, QualityProfiler};
///
/// let profiler = QualityProfiler::new(ProfilerConfig::default());
/// let profiles = profiler.profile_all(adapter.as_ref(), &metadata).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct QualityProfiler {
    config: ProfilerConfig,
}

impl QualityProfiler {
    /// Creates a new profiler with the given configuration.
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    /// Creates a new profiler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ProfilerConfig::default())
    }

    /// Returns a reference to the profiler configuration.
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profiles every table of `metadata`.
    ///
    /// Tables are profiled concurrently, at most `max_concurrent_tables` at a
    /// time and never more than the adapter's pool size. The result has
    /// exactly the key set of `metadata.tables`.
    ///
    /// # Errors
    /// Returns a configuration error if the timeout does not outlast the
    /// pool acquire timeout, or the first connection-level failure; other
    /// failures degrade
    pub async fn profile_all(
        &self,
        adapter: &dyn DatabaseAdapter,
        metadata: &MetadataDocument,
    ) -> Result<ProfileDocument> {
        let connection = adapter.connection_config();
        self.config.validate_for(&connection)?;

        let pool_size = usize::try_from(connection.max_connections)
            .unwrap_or(usize::MAX)
            .max(1);
        let concurrency = self.config.max_concurrent_tables.min(pool_size);

        tracing::info!(
            "Profiling {} tables ({} concurrent)",
            metadata.tables.len(),
            concurrency
        );

        let profiles: ProfileDocument = stream::iter(&metadata.tables)
            .map(|(table, columns)| async move {
                let profile = self.profile_table(adapter, table, columns).await?;
                Ok::<_, DataDictError>((table.clone(), profile))
            })
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        Ok(profiles)
    }

    /// Profiles one table.
    ///
    /// A table without columns, or with zero rows, gets the empty profile
    /// and no further queries.
    ///
    /// # Errors
    /// Returns an error only for connection-level failures
    pub async fn profile_table(
        &self,
        adapter: &dyn DatabaseAdapter,
        table: &str,
        columns: &[Column],
    ) -> Result<TableProfile> {
        if columns.is_empty() {
            tracing::debug!("Table '{}' has no columns; empty profile", table);
            return Ok(TableProfile::empty());
        }

        let dialect = adapter.dialect();

        let row_count = self
            .fetch_integers(adapter, &sql::row_count(dialect, table))
            .await
            .map(|values| first_count(&values));
        let total_rows = degrade(row_count, 0, table, "row count")?;

        if total_rows == 0 {
            tracing::debug!("Table '{}' is empty or uncountable; empty profile", table);
            return Ok(TableProfile::empty());
        }

        let mut profile = TableProfile {
            total_rows,
            ..TableProfile::empty()
        };

        for column in columns {
            let stats = self
                .fetch_integers(adapter, &sql::column_stats(dialect, table, &column.name))
                .await
                .map(|values| (count_at(&values, 0), count_at(&values, 1)));
            let (non_null, distinct) = degrade(
                stats,
                (0, 0),
                table,
                &format!("statistics for column '{}'", column.name),
            )?;
            profile.columns.insert(
                column.name.clone(),
                ColumnProfile::from_counts(total_rows, non_null, distinct),
            );

            if is_freshness_column(column) {
                let bounds = self
                    .fetch_texts(adapter, &sql::freshness(dialect, table, &column.name))
                    .await
                    .map(|values| freshness_window(&values));
                let window = degrade(
                    bounds,
                    None,
                    table,
                    &format!("freshness for column '{}'", column.name),
                )?;
                if let Some(window) = window {
                    profile.freshness.insert(column.name.clone(), window);
                }
            }
        }

        profile.key_health = self.key_health(adapter, table, columns).await?;

        tracing::debug!(
            "Profiled '{}': {} rows, {} columns, {} freshness windows",
            table,
            profile.total_rows,
            profile.columns.len(),
            profile.freshness.len()
        );

        Ok(profile)
    }

    /// Null and duplicate key-tuple counts; all zero for keyless tables.
    async fn key_health(
        &self,
        adapter: &dyn DatabaseAdapter,
        table: &str,
        columns: &[Column],
    ) -> Result<KeyHealth> {
        let keys: Vec<&str> = columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(|c| c.name.as_str())
            .collect();
        if keys.is_empty() {
            return Ok(KeyHealth::default());
        }

        let dialect = adapter.dialect();

        let null_pks = self
            .fetch_integers(adapter, &sql::null_keys(dialect, table, &keys))
            .await
            .map(|values| first_count(&values));
        let null_pks = degrade(null_pks, 0, table, "null key count")?;

        let duplicate_pks = self
            .fetch_integers(adapter, &sql::duplicate_keys(dialect, table, &keys))
            .await
            .map(|values| first_count(&values));
        let duplicate_pks = degrade(duplicate_pks, 0, table, "duplicate key count")?;

        Ok(KeyHealth {
            null_pks,
            duplicate_pks,
        })
    }

    async fn fetch_integers(
        &self,
        adapter: &dyn DatabaseAdapter,
        statement: &str,
    ) -> Result<Vec<Option<i64>>> {
        self.with_timeout(statement, adapter.fetch_integers(statement))
            .await
    }

    async fn fetch_texts(
        &self,
        adapter: &dyn DatabaseAdapter,
        statement: &str,
    ) -> Result<Vec<Option<String>>> {
        self.with_timeout(statement, adapter.fetch_texts(statement))
            .await
    }

    async fn with_timeout<T>(
        &self,
        statement: &str,
        query: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.config.query_timeout, query)
            .await
            .unwrap_or_else(|_| {
                Err(DataDictError::query_timeout(
                    statement,
                    self.config.query_timeout,
                ))
            })
    }
}

/// True for text or temporal columns whose name mentions a date or time.
pub fn is_freshness_column(column: &Column) -> bool {
    let name = column.name.to_lowercase();
    (name.contains("date") || name.contains("time"))
        && TypeFamily::classify(&column.declared_type).is_freshness_candidate()
}

/// Passes values and fatal errors through; replaces anything else with
/// `fallback`.
fn degrade<T>(result: Result<T>, fallback: T, table: &str, metric: &str) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => {
            tracing::warn!("Degrading {} of '{}': {}", metric, table, error);
            Ok(fallback)
        }
    }
}

fn count_at(values: &[Option<i64>], index: usize) -> u64 {
    values
        .get(index)
        .copied()
        .flatten()
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(0)
}

fn first_count(values: &[Option<i64>]) -> u64 {
    count_at(values, 0)
}

fn freshness_window(values: &[Option<String>]) -> Option<FreshnessWindow> {
    match values {
        [Some(min), Some(max), ..] => Some(FreshnessWindow {
            min: min.clone(),
            max: max.clone(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{AdapterFeature, ConnectionConfig, SqlDialect};
    use crate::models::DatabaseType;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Scripted responses keyed by a substring of the statement.
    #[derive(Default)]
    struct ScriptedAdapter {
        integers: HashMap<&'static str, Vec<Option<i64>>>,
        texts: HashMap<&'static str, Vec<Option<String>>>,
        failing: Vec<&'static str>,
        hanging: Vec<&'static str>,
        disconnected: bool,
    }

    impl ScriptedAdapter {
        async fn respond<T: Clone>(
            &self,
            sql: &str,
            responses: &HashMap<&'static str, T>,
        ) -> Result<T> {
            if self.disconnected {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
                return Err(DataDictError::connection_failed(io));
            }
            if self.hanging.iter().any(|key| sql.contains(key)) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.failing.iter().any(|key| sql.contains(key)) {
                return Err(DataDictError::query_failed("no such function"));
            }
            responses
                .iter()
                .find(|(key, _)| sql.contains(*key))
                .map(|(_, value)| value.clone())
                .ok_or_else(|| DataDictError::query_failed(format!("unscripted: {sql}")))
        }
    }

    #[async_trait]
    impl DatabaseAdapter for ScriptedAdapter {
        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }

        fn database_type(&self) -> DatabaseType {
            DatabaseType::SQLite
        }

        fn dialect(&self) -> SqlDialect {
            SqlDialect::Sqlite
        }

        fn supports_feature(&self, _feature: AdapterFeature) -> bool {
            false
        }

        fn connection_config(&self) -> ConnectionConfig {
            ConnectionConfig::default()
        }

        async fn list_tables(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn list_columns(&self, _table: &str) -> Result<Vec<Column>> {
            Ok(Vec::new())
        }

        async fn fetch_integers(&self, sql: &str) -> Result<Vec<Option<i64>>> {
            self.respond(sql, &self.integers).await
        }

        async fn fetch_texts(&self, sql: &str) -> Result<Vec<Option<String>>> {
            self.respond(sql, &self.texts).await
        }
    }

    fn orders_columns() -> Vec<Column> {
        vec![
            Column::new("order_id", "INTEGER", false, true),
            Column::new("amount", "REAL", true, false),
            Column::new("order_date", "TEXT", true, false),
        ]
    }

    fn scripted_orders() -> ScriptedAdapter {
        let mut adapter = ScriptedAdapter::default();
        adapter
            .integers
            .insert("SELECT COUNT(*) FROM \"orders\"", vec![Some(4)]);
        adapter
            .integers
            .insert("COUNT(\"order_id\"), COUNT(DISTINCT", vec![Some(4), Some(3)]);
        adapter
            .integers
            .insert("COUNT(\"amount\"), COUNT(DISTINCT", vec![Some(3), Some(3)]);
        adapter
            .integers
            .insert("COUNT(\"order_date\"), COUNT(DISTINCT", vec![Some(2), Some(2)]);
        adapter.integers.insert("COUNT(CASE WHEN", vec![Some(0)]);
        adapter.integers.insert("AS dup", vec![Some(1)]);
        adapter.texts.insert(
            "MIN(\"order_date\")",
            vec![Some("2025-01-01".to_string()), Some("2025-01-20".to_string())],
        );
        adapter
    }

    #[tokio::test]
    async fn test_profile_table() {
        let adapter = scripted_orders();
        let profile = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &orders_columns())
            .await
            .unwrap();

        assert_eq!(profile.total_rows, 4);
        assert_eq!(profile.columns["amount"].completeness_pct, 75.0);
        assert_eq!(profile.columns["amount"].null_count, 1);
        assert_eq!(profile.columns["order_id"].unique_count, 3);
        assert_eq!(
            profile.freshness["order_date"],
            FreshnessWindow {
                min: "2025-01-01".to_string(),
                max: "2025-01-20".to_string(),
            }
        );
        assert_eq!(
            profile.key_health,
            KeyHealth {
                null_pks: 0,
                duplicate_pks: 1
            }
        );
    }

    #[tokio::test]
    async fn test_zero_rows_short_circuits() {
        let mut adapter = ScriptedAdapter::default();
        adapter
            .integers
            .insert("SELECT COUNT(*) FROM \"orders\"", vec![Some(0)]);
        // Anything queried after the row count is unscripted
        let profile = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &orders_columns())
            .await
            .unwrap();
        assert!(profile.is_empty());
    }

    #[tokio::test]
    async fn test_failing_column_degrades_to_zero() {
        let mut adapter = scripted_orders();
        adapter.failing.push("COUNT(\"amount\")");

        let profile = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &orders_columns())
            .await
            .unwrap();

        let amount = &profile.columns["amount"];
        assert_eq!(amount.completeness_pct, 0.0);
        assert_eq!(amount.unique_count, 0);
        assert_eq!(amount.null_count, 4);
        // Siblings are unaffected
        assert_eq!(profile.columns["order_id"].unique_count, 3);
    }

    #[tokio::test]
    async fn test_failing_row_count_gives_empty_profile() {
        let mut adapter = scripted_orders();
        adapter.failing.push("SELECT COUNT(*) FROM \"orders\"");

        let profile = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &orders_columns())
            .await
            .unwrap();
        assert!(profile.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_freshness_is_omitted() {
        let mut adapter = scripted_orders();
        adapter.hanging.push("MIN(\"order_date\")");

        let profiler = QualityProfiler::new(
            ProfilerConfig::new().with_query_timeout(Duration::from_secs(1)),
        );
        let profile = profiler
            .profile_table(&adapter, "orders", &orders_columns())
            .await
            .unwrap();

        assert!(profile.freshness.is_empty());
        assert_eq!(profile.total_rows, 4);
        assert_eq!(profile.columns.len(), 3);
    }

    #[tokio::test]
    async fn test_connection_failure_is_fatal() {
        let adapter = ScriptedAdapter {
            disconnected: true,
            ..scripted_orders()
        };

        let result = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &orders_columns())
            .await;
        assert!(result.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_keyless_table_reports_healthy_keys() {
        let mut adapter = scripted_orders();
        // Key-health queries would report problems if they ran
        adapter.integers.insert("COUNT(CASE WHEN", vec![Some(7)]);
        let columns = vec![Column::new("amount", "REAL", true, false)];

        let profile = QualityProfiler::with_defaults()
            .profile_table(&adapter, "orders", &columns)
            .await
            .unwrap();
        assert_eq!(profile.key_health, KeyHealth::default());
    }

    #[tokio::test]
    async fn test_profile_all_covers_every_table() {
        let adapter = scripted_orders();
        let mut metadata = MetadataDocument::default();
        metadata
            .tables
            .insert("orders".to_string(), orders_columns());
        metadata.tables.insert("audit".to_string(), Vec::new());
        // Row count for this table is unscripted and degrades
        metadata.tables.insert(
            "broken".to_string(),
            vec![Column::new("id", "INTEGER", false, true)],
        );

        let profiles = QualityProfiler::with_defaults()
            .profile_all(&adapter, &metadata)
            .await
            .unwrap();

        let keys: Vec<&str> = profiles.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["audit", "broken", "orders"]);
        assert!(profiles["audit"].is_empty());
        assert!(profiles["broken"].is_empty());
        assert_eq!(profiles["orders"].total_rows, 4);
    }

    #[test]
    fn test_is_freshness_column() {
        assert!(is_freshness_column(&Column::new("order_date", "TEXT", true, false)));
        assert!(is_freshness_column(&Column::new("CreatedTime", "TIMESTAMP", true, false)));
        assert!(is_freshness_column(&Column::new("updated_at_date", "varchar(32)", true, false)));
        // Name filter
        assert!(!is_freshness_column(&Column::new("created", "TIMESTAMP", true, false)));
        // Type filter
        assert!(!is_freshness_column(&Column::new("date_key", "INTEGER", true, false)));
        assert!(!is_freshness_column(&Column::new("runtime", "REAL", true, false)));
    }

    #[test]
    fn test_count_helpers() {
        assert_eq!(count_at(&[Some(3), Some(2)], 1), 2);
        assert_eq!(count_at(&[Some(3)], 1), 0);
        assert_eq!(count_at(&[None], 0), 0);
        assert_eq!(count_at(&[Some(-1)], 0), 0);
        assert!(freshness_window(&[None, None]).is_none());
        assert!(freshness_window(&[Some("a".to_string())]).is_none());
    }

    #[tokio::test]
    async fn test_profile_all_rejects_timeout_within_acquire_timeout() {
        let adapter = scripted_orders();
        let mut metadata = MetadataDocument::default();
        metadata
            .tables
            .insert("orders".to_string(), orders_columns());

        let err = QualityProfiler::new(
            ProfilerConfig::new().with_query_timeout(ConnectionConfig::default().connect_timeout),
        )
        .profile_all(&adapter, &metadata)
        .await
        .unwrap_err();
        assert!(matches!(err, DataDictError::Configuration { .. }));
    }
}
