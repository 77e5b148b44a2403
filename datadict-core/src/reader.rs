//! Schema reader: turns an adapter's catalog into a raw metadata document.
//!
//! The document produced here carries only what the backend declares.
//! Inference runs afterwards, see [`crate::inference`].

use crate::Result;
use crate::adapters::DatabaseAdapter;
use crate::models::{Column, MetadataDocument};

/// Reads tables, columns and declared foreign keys.
///
/// Tables are visited in name order; declared relationships are appended in
/// that order. Adapters without the foreign-key capability produce a
/// degraded document with every primary-key flag cleared.
///
/// # Errors
/// Any adapter error aborts the read; no partial document is returned.
pub async fn read_schema(adapter: &dyn DatabaseAdapter) -> Result<MetadataDocument> {
    let mut tables = adapter.list_tables().await?;
    tables.sort();
    tables.dedup();

    let foreign_keys = adapter.foreign_keys();
    let degraded = foreign_keys.is_none();
    if degraded {
        tracing::warn!(
            "{} backend has no foreign-key capability; key and relationship detection disabled",
            adapter.database_type()
        );
    }

    let mut document = MetadataDocument {
        degraded,
        ..MetadataDocument::default()
    };

    for table in &tables {
        let mut columns = adapter.list_columns(table).await?;
        if degraded {
            columns = columns
                .into_iter()
                .map(|column| Column {
                    declared_primary_key: false,
                    inferred_primary_key: false,
                    ..column
                })
                .collect();
        }
        tracing::debug!("Read {} columns from '{}'", columns.len(), table);
        document.tables.insert(table.clone(), columns);
    }

    if let Some(foreign_keys) = foreign_keys {
        for table in &tables {
            let declared = foreign_keys.list_foreign_keys(table).await?;
            for relationship in declared {
                if endpoint_exists(&document, &relationship.to_table, &relationship.to_column) {
                    document.relationships.push(relationship);
                } else {
                    // e.g. a reference into a schema that was not introspected
                    tracing::warn!(
                        "Dropping declared foreign key {}.{} -> {}.{}: target not in catalog",
                        relationship.from_table,
                        relationship.from_column,
                        relationship.to_table,
                        relationship.to_column
                    );
                }
            }
        }
    }

    tracing::info!(
        "Read {} tables and {} declared relationships",
        document.tables.len(),
        document.relationships.len()
    );

    Ok(document)
}

fn endpoint_exists(document: &MetadataDocument, table: &str, column: &str) -> bool {
    document
        .columns(table)
        .is_some_and(|columns| columns.iter().any(|c| c.name == column))
}
