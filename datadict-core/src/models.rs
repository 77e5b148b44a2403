//! Core data models for the metadata and profile documents.
//!
//! These structures are the engine's entire external contract. They are
//! produced fresh on every pipeline run and handed to collaborators as
//! immutable snapshots; their JSON shape is part of that contract.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// PostgreSQL, read through the system catalogs
    PostgreSQL,
    /// MySQL, read through the generic fallback
    MySQL,
    /// SQLite, read through pragmas
    SQLite,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
        }
    }
}

/// Database column information.
///
/// Identity is `(table, name)`; the owning table is the key the column list
/// is stored under in [`MetadataDocument::tables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    #[serde(rename = "column_name")]
    pub name: String,
    /// Type name exactly as the backend reports it
    #[serde(rename = "data_type")]
    pub declared_type: String,
    /// Whether NULL values are allowed
    pub nullable: bool,
    /// Part of the backend-declared primary key
    #[serde(rename = "primary_key")]
    pub declared_primary_key: bool,
    /// Primary key guessed from the column name
    #[serde(default)]
    pub inferred_primary_key: bool,
}

impl Column {
    /// Creates a column as read from the catalog, before inference.
    pub fn new(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        nullable: bool,
        declared_primary_key: bool,
    ) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            nullable,
            declared_primary_key,
            inferred_primary_key: false,
        }
    }

    /// True when the column is a primary key, declared or inferred.
    pub fn is_primary_key(&self) -> bool {
        self.declared_primary_key || self.inferred_primary_key
    }
}

/// Where a relationship came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Provenance {
    /// Read literally from a backend-declared foreign key
    #[serde(rename = "declared_fk")]
    Declared,
    /// Derived by matching a `*_id` column to a primary key of the same name
    #[serde(rename = "inferred_pk_match")]
    Inferred,
}

/// A directed edge from one column to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Referencing table
    #[serde(rename = "table")]
    pub from_table: String,
    /// Referencing column
    #[serde(rename = "column")]
    pub from_column: String,
    /// Referenced table
    #[serde(rename = "ref_table")]
    pub to_table: String,
    /// Referenced key column
    #[serde(rename = "ref_column")]
    pub to_column: String,
    /// Declared or inferred
    #[serde(rename = "type")]
    pub provenance: Provenance,
}

impl Relationship {
    /// Creates a declared foreign-key relationship.
    pub fn declared(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
            provenance: Provenance::Declared,
        }
    }

    /// The `(table, column, ref_table, ref_column)` identity, ignoring provenance.
    pub fn edge(&self) -> (&str, &str, &str, &str) {
        (
            &self.from_table,
            &self.from_column,
            &self.to_table,
            &self.to_column,
        )
    }
}

/// Structural schema snapshot: tables, columns and relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Table name to columns in declaration order
    pub tables: BTreeMap<String, Vec<Column>>,
    /// Declared relationships followed by inferred ones
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Set when the backend was read through the generic fallback
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl MetadataDocument {
    /// Columns of `table`, if present.
    pub fn columns(&self, table: &str) -> Option<&[Column]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Checks the document invariants.
    ///
    /// Every relationship endpoint must name a table of the document and a
    /// column of that table.
    pub fn validate(&self) -> crate::Result<()> {
        for rel in &self.relationships {
            for (table, column) in [
                (&rel.from_table, &rel.from_column),
                (&rel.to_table, &rel.to_column),
            ] {
                let columns = self.tables.get(table).ok_or_else(|| {
                    crate::DataDictError::catalog_mismatch(format!(
                        "relationship references unknown table '{table}'"
                    ))
                })?;
                if !columns.iter().any(|c| &c.name == column) {
                    return Err(crate::DataDictError::catalog_mismatch(format!(
                        "relationship references unknown column '{table}.{column}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Relationships with duplicate edges removed, first occurrence wins.
    ///
    /// The document itself keeps declared and inferred copies of the same
    /// edge; this is for consumers that want the plain edge set.
    pub fn deduplicated_relationships(&self) -> Vec<&Relationship> {
        let mut seen = BTreeSet::new();
        self.relationships
            .iter()
            .filter(|rel| seen.insert(rel.edge()))
            .collect()
    }
}

/// Per-column quality figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// `round(100 * non_null / total_rows, 2)`
    pub completeness_pct: f64,
    /// Distinct non-null values
    pub unique_count: u64,
    /// Rows where the column is NULL
    pub null_count: u64,
}

impl ColumnProfile {
    /// Builds a column profile from raw aggregate counts.
    ///
    /// `non_null` is clamped to `total_rows` so that
    /// `null_count + non_null == total_rows` always holds.
    pub fn from_counts(total_rows: u64, non_null: u64, distinct: u64) -> Self {
        let non_null = non_null.min(total_rows);
        Self {
            completeness_pct: completeness_pct(non_null, total_rows),
            unique_count: distinct,
            null_count: total_rows.saturating_sub(non_null),
        }
    }

    /// Non-null values implied by the profile for a table of `total_rows`.
    pub fn non_null_count(&self, total_rows: u64) -> u64 {
        total_rows.saturating_sub(self.null_count)
    }
}

/// Percentage of non-null values rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
pub fn completeness_pct(non_null: u64, total_rows: u64) -> f64 {
    if total_rows == 0 {
        return 0.0;
    }
    let pct = 100.0 * non_null as f64 / total_rows as f64;
    (pct * 100.0).round() / 100.0
}

/// Observed value range of a date-like column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindow {
    /// Smallest non-null value, as text
    pub min: String,
    /// Largest non-null value, as text
    pub max: String,
}

/// Primary-key integrity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyHealth {
    /// Rows with a NULL in any key column
    pub null_pks: u64,
    /// Distinct non-null key values occurring more than once
    pub duplicate_pks: u64,
}

/// Data-quality snapshot for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    /// Row count at profiling time
    pub total_rows: u64,
    /// Column name to quality figures
    pub columns: BTreeMap<String, ColumnProfile>,
    /// Value ranges of date-like columns that hold data
    pub freshness: BTreeMap<String, FreshnessWindow>,
    /// Integrity of the declared or inferred primary key
    pub key_health: KeyHealth,
}

impl TableProfile {
    /// The all-zero profile used for empty tables and failed row counts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when this is the all-zero profile.
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// Table name to profile, keyed identically to [`MetadataDocument::tables`].
pub type ProfileDocument = BTreeMap<String, TableProfile>;
