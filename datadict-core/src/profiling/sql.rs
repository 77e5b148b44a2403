//! Aggregate SQL generation.
//!
//! Every statement returns exactly one row. Identifiers are quoted for the
//! target dialect; nothing else is interpolated.

use crate::adapters::SqlDialect;

/// `SELECT COUNT(*) FROM t`
pub fn row_count(dialect: SqlDialect, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", dialect.quote_identifier(table))
}

/// Non-null and distinct non-null counts of one column.
pub fn column_stats(dialect: SqlDialect, table: &str, column: &str) -> String {
    let column = dialect.quote_identifier(column);
    format!(
        "SELECT COUNT({column}), COUNT(DISTINCT {column}) FROM {}",
        dialect.quote_identifier(table)
    )
}

/// Minimum and maximum of one column, cast to text.
pub fn freshness(dialect: SqlDialect, table: &str, column: &str) -> String {
    let column = dialect.quote_identifier(column);
    format!(
        "SELECT {}, {} FROM {}",
        dialect.cast_to_text(&format!("MIN({column})")),
        dialect.cast_to_text(&format!("MAX({column})")),
        dialect.quote_identifier(table)
    )
}

/// Rows whose key tuple has at least one NULL component.
///
/// Computed as total rows minus rows with a fully non-null key.
pub fn null_keys(dialect: SqlDialect, table: &str, keys: &[&str]) -> String {
    format!(
        "SELECT COUNT(*) - COUNT(CASE WHEN {} THEN 1 END) FROM {}",
        all_not_null(dialect, keys),
        dialect.quote_identifier(table)
    )
}

/// Distinct non-null key tuples occurring more than once.
pub fn duplicate_keys(dialect: SqlDialect, table: &str, keys: &[&str]) -> String {
    let key_list = keys
        .iter()
        .map(|key| dialect.quote_identifier(key))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT COUNT(*) FROM (SELECT {key_list} FROM {} WHERE {} GROUP BY {key_list} HAVING COUNT(*) > 1) AS dup",
        dialect.quote_identifier(table),
        all_not_null(dialect, keys)
    )
}

fn all_not_null(dialect: SqlDialect, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| format!("{} IS NOT NULL", dialect.quote_identifier(key)))
        .collect::<Vec<_>>()
        .join(" AND ")
}
