//! Primary-key and relationship inference from column names.
//!
//! Both rules are pure functions of the metadata document:
//! - a table with no declared primary key gets `inferred_primary_key` on
//!   every column named `id` or ending in `_id` (case-insensitive);
//! - a column ending in `_id` in table `T` links to every other table `U`
//!   holding a primary-key column of exactly the same name.
//!
//! Matching is on the literal column name. `orders.customer_id` links to
//! `customers.customer_id` but never to `customers.id`.

use crate::models::{Column, MetadataDocument, Provenance, Relationship};
use std::collections::BTreeMap;

/// True for `id` or any name ending in `_id`, ignoring ASCII case.
pub fn is_id_like(name: &str) -> bool {
    name.eq_ignore_ascii_case("id") || has_id_suffix(name)
}

/// True for names ending in `_id`, ignoring ASCII case.
pub fn has_id_suffix(name: &str) -> bool {
    name.len()
        .checked_sub(3)
        .and_then(|start| name.get(start..))
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case("_id"))
}

/// Sets `inferred_primary_key` on id-like columns of tables without a
/// declared primary key.
///
/// Flags are recomputed from scratch, so applying this twice is the same as
/// applying it once. Declared flags are never touched.
pub fn infer_primary_keys(
    tables: BTreeMap<String, Vec<Column>>,
) -> BTreeMap<String, Vec<Column>> {
    tables
        .into_iter()
        .map(|(table, columns)| {
            let has_declared = columns.iter().any(|c| c.declared_primary_key);
            let columns = columns
                .into_iter()
                .map(|column| {
                    let inferred = !has_declared && is_id_like(&column.name);
                    Column {
                        inferred_primary_key: inferred,
                        ..column
                    }
                })
                .collect();
            (table, columns)
        })
        .collect()
}

/// Derives `inferred_pk_match` relationships.
///
/// Output order follows table order, then column order, then target table
/// order. One relationship is produced per matching target table.
pub fn infer_relationships(tables: &BTreeMap<String, Vec<Column>>) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for (table, columns) in tables {
        for column in columns.iter().filter(|c| has_id_suffix(&c.name)) {
            for (target, target_columns) in tables {
                if target == table {
                    continue;
                }
                let matches = target_columns
                    .iter()
                    .any(|c| c.name == column.name && c.is_primary_key());
                if matches {
                    relationships.push(Relationship {
                        from_table: table.clone(),
                        from_column: column.name.clone(),
                        to_table: target.clone(),
                        to_column: column.name.clone(),
                        provenance: Provenance::Inferred,
                    });
                }
            }
        }
    }

    relationships
}

/// Runs both inference passes on a freshly read document.
///
/// Inferred relationships are appended after the declared ones without
/// deduplication. Degraded documents are returned unchanged.
pub fn infer(document: MetadataDocument) -> MetadataDocument {
    if document.degraded {
        tracing::debug!("Skipping inference for degraded metadata");
        return document;
    }

    let tables = infer_primary_keys(document.tables);
    let inferred = infer_relationships(&tables);

    tracing::debug!(
        "Inferred {} primary-key columns and {} relationships",
        tables
            .values()
            .flatten()
            .filter(|c| c.inferred_primary_key)
            .count(),
        inferred.len()
    );

    let mut relationships: Vec<Relationship> = document
        .relationships
        .into_iter()
        .filter(|r| r.provenance == Provenance::Declared)
        .collect();
    relationships.extend(inferred);

    MetadataDocument {
        tables,
        relationships,
        degraded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(columns: &[(&str, bool)]) -> Vec<Column> {
        columns
            .iter()
            .map(|(name, pk)| Column::new(*name, "INTEGER", !pk, *pk))
            .collect()
    }

    #[test]
    fn test_is_id_like() {
        assert!(is_id_like("id"));
        assert!(is_id_like("ID"));
        assert!(is_id_like("customer_id"));
        assert!(is_id_like("Customer_ID"));
        assert!(!is_id_like("identifier"));
        assert!(!is_id_like("paid"));
        assert!(!is_id_like("_i"));
        assert!(!is_id_like(""));
        assert!(has_id_suffix("_id"));
        assert!(!has_id_suffix("id"));
        // Multi-byte names must not panic on the suffix slice
        assert!(!has_id_suffix("prénom"));
        assert!(has_id_suffix("clé_id"));
    }

    #[test]
    fn test_pk_inference_only_without_declared_key() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "orders".to_string(),
            table(&[("order_id", true), ("customer_id", false)]),
        );
        tables.insert(
            "events".to_string(),
            table(&[("id", false), ("user_id", false), ("payload", false)]),
        );

        let tables = infer_primary_keys(tables);

        // Declared key suppresses the heuristic for the whole table
        assert!(tables["orders"].iter().all(|c| !c.inferred_primary_key));
        assert!(tables["orders"][0].declared_primary_key);

        let events: Vec<bool> = tables["events"]
            .iter()
            .map(|c| c.inferred_primary_key)
            .collect();
        assert_eq!(events, vec![true, true, false]);
    }

    #[test]
    fn test_pk_inference_clears_stale_flags() {
        let mut column = Column::new("name", "TEXT", true, false);
        column.inferred_primary_key = true;
        let mut tables = BTreeMap::new();
        tables.insert("people".to_string(), vec![column]);

        let tables = infer_primary_keys(tables);
        assert!(!tables["people"][0].inferred_primary_key);
    }

    #[test]
    fn test_literal_name_match() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "customers".to_string(),
            table(&[("customer_id", true), ("name", false)]),
        );
        tables.insert(
            "orders".to_string(),
            table(&[("order_id", true), ("customer_id", false)]),
        );

        let relationships = infer_relationships(&infer_primary_keys(tables));
        assert_eq!(
            relationships,
            vec![Relationship {
                from_table: "orders".to_string(),
                from_column: "customer_id".to_string(),
                to_table: "customers".to_string(),
                to_column: "customer_id".to_string(),
                provenance: Provenance::Inferred,
            }]
        );
    }

    #[test]
    fn test_conventional_fk_name_is_not_matched() {
        let mut tables = BTreeMap::new();
        tables.insert("customers".to_string(), table(&[("id", true), ("name", false)]));
        tables.insert(
            "orders".to_string(),
            table(&[("order_id", true), ("customer_id", false)]),
        );

        assert!(infer_relationships(&infer_primary_keys(tables)).is_empty());
    }

    #[test]
    fn test_multiple_targets_each_produce_a_relationship() {
        let mut tables = BTreeMap::new();
        tables.insert("accounts".to_string(), table(&[("tenant_id", true)]));
        tables.insert("tenants".to_string(), table(&[("tenant_id", true)]));
        tables.insert(
            "users".to_string(),
            table(&[("user_id", true), ("tenant_id", false)]),
        );

        let relationships = infer_relationships(&tables);
        let edges: Vec<_> = relationships.iter().map(Relationship::edge).collect();
        assert_eq!(
            edges,
            vec![
                ("accounts", "tenant_id", "tenants", "tenant_id"),
                ("tenants", "tenant_id", "accounts", "tenant_id"),
                ("users", "tenant_id", "accounts", "tenant_id"),
                ("users", "tenant_id", "tenants", "tenant_id"),
            ]
        );
    }

    #[test]
    fn test_name_match_is_case_sensitive() {
        let mut tables = BTreeMap::new();
        tables.insert("customers".to_string(), table(&[("Customer_ID", true)]));
        tables.insert("orders".to_string(), table(&[("customer_id", false)]));

        assert!(infer_relationships(&tables).is_empty());
    }

    #[test]
    fn test_infer_keeps_declared_and_appends_inferred() {
        let mut document = MetadataDocument::default();
        document.tables.insert(
            "customers".to_string(),
            table(&[("customer_id", true)]),
        );
        document.tables.insert(
            "orders".to_string(),
            table(&[("order_id", true), ("customer_id", false)]),
        );
        document.relationships.push(Relationship::declared(
            "orders",
            "customer_id",
            "customers",
            "customer_id",
        ));

        let document = infer(document);
        assert_eq!(document.relationships.len(), 2);
        assert_eq!(document.relationships[0].provenance, Provenance::Declared);
        assert_eq!(document.relationships[1].provenance, Provenance::Inferred);
        assert_eq!(
            document.relationships[0].edge(),
            document.relationships[1].edge()
        );
        assert_eq!(document.deduplicated_relationships().len(), 1);
    }

    #[test]
    fn test_degraded_document_is_untouched() {
        let mut document = MetadataDocument {
            degraded: true,
            ..MetadataDocument::default()
        };
        document
            .tables
            .insert("events".to_string(), table(&[("id", false)]));

        let result = infer(document.clone());
        assert_eq!(result, document);
    }

    fn arb_tables() -> impl Strategy<Value = BTreeMap<String, Vec<Column>>> {
        let name = prop::sample::select(vec![
            "id",
            "ID",
            "customer_id",
            "order_id",
            "name",
            "created_at",
            "tenant_id",
            "amount",
        ]);
        let column = (name, any::<bool>(), any::<bool>()).prop_map(|(name, declared, stale)| {
            let mut column = Column::new(name, "INTEGER", true, declared);
            column.inferred_primary_key = stale;
            column
        });
        prop::collection::btree_map(
            prop::sample::select(vec!["customers", "orders", "tenants", "events"])
                .prop_map(str::to_string),
            prop::collection::vec(column, 0..5),
            0..4,
        )
    }

    proptest! {
        #[test]
        fn prop_pk_inference_is_idempotent(tables in arb_tables()) {
            let once = infer_primary_keys(tables);
            let twice = infer_primary_keys(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_declared_key_suppresses_inference(tables in arb_tables()) {
            for columns in infer_primary_keys(tables).values() {
                if columns.iter().any(|c| c.declared_primary_key) {
                    prop_assert!(columns.iter().all(|c| !c.inferred_primary_key));
                }
            }
        }

        #[test]
        fn prop_relationships_are_deterministic(tables in arb_tables()) {
            let tables = infer_primary_keys(tables);
            prop_assert_eq!(infer_relationships(&tables), infer_relationships(&tables.clone()));
        }

        #[test]
        fn prop_inferred_endpoints_exist(tables in arb_tables()) {
            let document = infer(MetadataDocument {
                tables,
                relationships: Vec::new(),
                degraded: false,
            });
            prop_assert!(document.validate().is_ok());
            for rel in &document.relationships {
                prop_assert_ne!(&rel.from_table, &rel.to_table);
                prop_assert!(has_id_suffix(&rel.from_column));
            }
        }
    }
}
