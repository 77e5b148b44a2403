//! SQLite schema collection implementation.
//!
//! # SQLite System Tables
//! - `sqlite_master`: Contains schema definitions for all database objects
//! - `PRAGMA table_info()`: Returns column information for a table
//! - `PRAGMA foreign_key_list()`: Returns foreign key information

use crate::Result;
use crate::error::DataDictError;
use crate::models::{Column, Relationship};
use sqlx::{Row, SqlitePool};

/// Lists user tables, excluding SQLite's internal `sqlite_*` tables.
pub(crate) async fn list_tables(pool: &SqlitePool) -> Result<Vec<String>> {
    let tables_query = r"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table'
        AND name NOT LIKE 'sqlite_%'
        ORDER BY name
    ";

    let rows = sqlx::query(tables_query)
        .fetch_all(pool)
        .await
        .map_err(|e| crate::error::introspection_sqlx_error("Failed to enumerate tables", e))?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("name")
                .map_err(|e| DataDictError::introspection_failed("Failed to parse table name", e))
        })
        .collect()
}

/// Collects column metadata for a table in declaration order.
pub(crate) async fn list_columns(pool: &SqlitePool, table_name: &str) -> Result<Vec<Column>> {
    let columns_query = format!("PRAGMA table_info('{}')", table_name.replace('\'', "''"));

    let rows = sqlx::query(&columns_query)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(
                &format!("Failed to collect columns for table '{table_name}'"),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.try_get("name").map_err(|e| {
            DataDictError::introspection_failed(
                format!("Failed to parse column name for table '{table_name}'"),
                e,
            )
        })?;
        let declared_type: String = row.try_get("type").unwrap_or_default();
        let notnull: i64 = row.try_get("notnull").unwrap_or(0);
        let pk: i64 = row.try_get("pk").unwrap_or(0);

        columns.push(Column::new(name, declared_type, notnull == 0, pk > 0));
    }

    tracing::debug!(
        "Collected {} columns for table '{}'",
        columns.len(),
        table_name
    );

    Ok(columns)
}

/// Collects declared foreign keys, one relationship per referencing column.
///
/// A foreign key declared without a column list (`REFERENCES customers`)
/// targets the parent's primary key; the parent column is resolved by
/// position in that key.
pub(crate) async fn list_foreign_keys(
    pool: &SqlitePool,
    table_name: &str,
) -> Result<Vec<Relationship>> {
    let fk_query = format!(
        "PRAGMA foreign_key_list('{}')",
        table_name.replace('\'', "''")
    );

    let rows = sqlx::query(&fk_query)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(
                &format!("Failed to collect foreign keys for table '{table_name}'"),
                e,
            )
        })?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.try_get("id").unwrap_or(0);
        let seq: i64 = row.try_get("seq").unwrap_or(0);
        let ref_table: String = row.try_get("table").unwrap_or_default();
        let from_col: String = row.try_get("from").unwrap_or_default();
        let to_col: Option<String> = row.try_get("to").unwrap_or(None);
        entries.push((id, seq, ref_table, from_col, to_col));
    }
    entries.sort_by_key(|(id, seq, ..)| (*id, *seq));

    let mut relationships = Vec::with_capacity(entries.len());
    for (_, seq, ref_table, from_col, to_col) in entries {
        let to_col = match to_col {
            Some(col) if !col.is_empty() => col,
            _ => match implicit_parent_column(pool, &ref_table, seq).await? {
                Some(col) => col,
                None => {
                    tracing::warn!(
                        "Skipping foreign key {}.{} -> {}: parent key could not be resolved",
                        table_name,
                        from_col,
                        ref_table
                    );
                    continue;
                }
            },
        };
        relationships.push(Relationship::declared(
            table_name, from_col, ref_table, to_col,
        ));
    }

    Ok(relationships)
}

/// Resolves the `seq`-th primary-key column of `parent`.
async fn implicit_parent_column(
    pool: &SqlitePool,
    parent: &str,
    seq: i64,
) -> Result<Option<String>> {
    let columns_query = format!("PRAGMA table_info('{}')", parent.replace('\'', "''"));
    let rows = sqlx::query(&columns_query)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(
                &format!("Failed to resolve primary key of '{parent}'"),
                e,
            )
        })?;

    let mut key_columns: Vec<(i64, String)> = rows
        .iter()
        .filter_map(|row| {
            let pk: i64 = row.try_get("pk").unwrap_or(0);
            let name: String = row.try_get("name").ok()?;
            (pk > 0).then_some((pk, name))
        })
        .collect();
    key_columns.sort();

    Ok(usize::try_from(seq)
        .ok()
        .and_then(|i| key_columns.into_iter().nth(i))
        .map(|(_, name)| name))
}
