//! PostgreSQL schema collection via `information_schema` and `pg_catalog`.

use crate::Result;
use crate::error::DataDictError;
use crate::models::{Column, Relationship};
use sqlx::{PgPool, Row};

/// Lists base tables of `schema` the current role can read.
pub(crate) async fn list_tables(pool: &PgPool, schema: &str) -> Result<Vec<String>> {
    let tables_query = r"
        SELECT t.table_name::text AS table_name
        FROM information_schema.tables t
        WHERE t.table_type = 'BASE TABLE'
        AND t.table_schema = $1
        AND t.table_name NOT LIKE 'pg\_%'
        ORDER BY t.table_name
    ";

    let rows = sqlx::query(tables_query)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(&format!("Failed to enumerate tables in schema '{schema}'"), e)
        })?;

    rows.iter()
        .map(|row| {
            row.try_get::<String, _>("table_name").map_err(|e| {
                DataDictError::introspection_failed("Failed to parse table name", e)
            })
        })
        .collect()
}

/// Collects columns in ordinal order with their declared primary-key flag.
pub(crate) async fn list_columns(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<Column>> {
    let columns_query = r"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type,
            c.is_nullable::text AS is_nullable,
            CASE
                WHEN pk.column_name IS NOT NULL THEN true
                ELSE false
            END AS is_primary_key
        FROM information_schema.columns c
        LEFT JOIN (
            SELECT
                kcu.column_name,
                kcu.table_name,
                kcu.table_schema
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            WHERE tc.constraint_type = 'PRIMARY KEY'
        ) pk ON pk.column_name = c.column_name
            AND pk.table_name = c.table_name
            AND pk.table_schema = c.table_schema
        WHERE c.table_name = $1
        AND c.table_schema = $2
        ORDER BY c.ordinal_position
    ";

    let rows = sqlx::query(columns_query)
        .bind(table_name)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(
                &format!("Failed to collect columns for table '{schema}.{table_name}'"),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let parse_error = |e: sqlx::Error| {
            DataDictError::introspection_failed(
                format!("Failed to parse column metadata for '{schema}.{table_name}'"),
                e,
            )
        };
        let name: String = row.try_get("column_name").map_err(parse_error)?;
        let data_type: String = row.try_get("data_type").map_err(parse_error)?;
        let is_nullable: String = row.try_get("is_nullable").map_err(parse_error)?;
        let is_primary_key: bool = row.try_get("is_primary_key").map_err(parse_error)?;

        columns.push(Column::new(
            name,
            data_type,
            is_nullable == "YES",
            is_primary_key,
        ));
    }

    tracing::debug!(
        "Collected {} columns for table '{}.{}'",
        columns.len(),
        schema,
        table_name
    );

    Ok(columns)
}

/// Collects declared foreign keys, one relationship per referencing column,
/// ordered by constraint name then key position.
pub(crate) async fn list_foreign_keys(
    pool: &PgPool,
    schema: &str,
    table_name: &str,
) -> Result<Vec<Relationship>> {
    let fk_query = r"
        SELECT
            a.attname::text AS column_name,
            fcl.relname::text AS referenced_table_name,
            fa.attname::text AS referenced_column_name
        FROM pg_constraint con
        JOIN pg_class cl ON con.conrelid = cl.oid
        JOIN pg_namespace ns ON cl.relnamespace = ns.oid
        JOIN pg_class fcl ON con.confrelid = fcl.oid
        JOIN pg_attribute a ON a.attrelid = con.conrelid
        JOIN pg_attribute fa ON fa.attrelid = con.confrelid
        WHERE con.contype = 'f'
        AND cl.relname = $1
        AND ns.nspname = $2
        AND a.attnum = ANY(con.conkey)
        AND fa.attnum = ANY(con.confkey)
        AND array_position(con.conkey, a.attnum) = array_position(con.confkey, fa.attnum)
        ORDER BY con.conname, array_position(con.conkey, a.attnum)
    ";

    let rows = sqlx::query(fk_query)
        .bind(table_name)
        .bind(schema)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            crate::error::introspection_sqlx_error(
                &format!("Failed to collect foreign keys for table '{schema}.{table_name}'"),
                e,
            )
        })?;

    let mut relationships = Vec::with_capacity(rows.len());
    for row in &rows {
        let parse_error = |e: sqlx::Error| {
            DataDictError::introspection_failed(
                format!("Failed to parse foreign key for '{schema}.{table_name}'"),
                e,
            )
        };
        let column: String = row.try_get("column_name").map_err(parse_error)?;
        let ref_table: String = row.try_get("referenced_table_name").map_err(parse_error)?;
        let ref_column: String = row.try_get("referenced_column_name").map_err(parse_error)?;

        relationships.push(Relationship::declared(
            table_name, column, ref_table, ref_column,
        ));
    }

    Ok(relationships)
}
