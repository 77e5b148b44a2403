//! Artifact persistence for pipeline results.
//!
//! Both documents are written as pretty JSON into one artifacts directory,
//! which is created when missing.

use datadict_core::{
    Catalog, Column, DataDictError, MetadataDocument, ProfileDocument, Result,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the metadata document inside the artifacts directory.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the profile document inside the artifacts directory.
pub const PROFILES_FILE: &str = "profiles.json";

/// Serializes `value` as pretty JSON to `path`, creating parent directories.
///
/// # Errors
/// Returns error if serialization fails or the file cannot be written
pub async fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json_data =
        serde_json::to_string_pretty(value).map_err(|e| DataDictError::Serialization {
            context: format!("Failed to serialize {}", path.display()),
            source: e,
        })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DataDictError::Io {
                context: format!("Failed to create directory {}", parent.display()),
                source: e,
            })?;
    }

    tokio::fs::write(path, json_data)
        .await
        .map_err(|e| DataDictError::Io {
            context: format!("Failed to write to {}", path.display()),
            source: e,
        })?;
    Ok(())
}

/// Reads and deserializes a JSON document.
///
/// # Errors
/// Returns error if the file cannot be read or is not a valid document
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json_data = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DataDictError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        })?;

    serde_json::from_str(&json_data).map_err(|e| DataDictError::Serialization {
        context: format!("Failed to parse {}", path.display()),
        source: e,
    })
}

/// Writes `metadata.json` into `artifacts_dir`.
///
/// # Errors
/// Same conditions as [`save_json`]
pub async fn save_metadata(metadata: &MetadataDocument, artifacts_dir: &Path) -> Result<PathBuf> {
    let path = artifacts_dir.join(METADATA_FILE);
    save_json(metadata, &path).await?;
    Ok(path)
}

/// Writes `profiles.json` into `artifacts_dir`.
///
/// # Errors
/// Same conditions as [`save_json`]
pub async fn save_profiles(profiles: &ProfileDocument, artifacts_dir: &Path) -> Result<PathBuf> {
    let path = artifacts_dir.join(PROFILES_FILE);
    save_json(profiles, &path).await?;
    Ok(path)
}

/// Writes both documents of a catalog.
///
/// # Errors
/// Same conditions as [`save_json`]
pub async fn save_catalog(catalog: &Catalog, artifacts_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let metadata_path = save_metadata(&catalog.metadata, artifacts_dir).await?;
    let profiles_path = save_profiles(&catalog.profiles, artifacts_dir).await?;
    Ok((metadata_path, profiles_path))
}

/// Accepted on-disk shapes of a metadata document.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMetadata {
    Document(MetadataDocument),
    /// Bare `{table: [columns]}` map without relationships
    TablesOnly(BTreeMap<String, Vec<Column>>),
}

impl From<StoredMetadata> for MetadataDocument {
    fn from(stored: StoredMetadata) -> Self {
        match stored {
            StoredMetadata::Document(metadata) => metadata,
            StoredMetadata::TablesOnly(tables) => MetadataDocument {
                tables,
                ..MetadataDocument::default()
            },
        }
    }
}

/// Loads a metadata document written by a previous run.
///
/// Besides the full document this accepts a document without
/// `relationships` and a bare map of table name to columns.
///
/// # Errors
/// Returns error if the file is unreadable, malformed, or internally
/// inconsistent
pub async fn load_metadata(path: &Path) -> Result<MetadataDocument> {
    let stored: StoredMetadata = load_json(path).await?;
    let metadata = MetadataDocument::from(stored);
    metadata.validate()?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datadict_core::{Relationship, TableProfile};

    fn sample_metadata() -> MetadataDocument {
        let mut metadata = MetadataDocument::default();
        metadata.tables.insert(
            "customers".to_string(),
            vec![Column::new("customer_id", "INTEGER", false, true)],
        );
        metadata.tables.insert(
            "orders".to_string(),
            vec![
                Column::new("order_id", "INTEGER", false, true),
                Column::new("customer_id", "INTEGER", true, false),
            ],
        );
        metadata.relationships.push(Relationship::declared(
            "orders",
            "customer_id",
            "customers",
            "customer_id",
        ));
        metadata
    }

    #[tokio::test]
    async fn test_save_creates_artifacts_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let artifacts_dir = temp_dir.path().join("nested").join("artifacts");

        let path = save_metadata(&sample_metadata(), &artifacts_dir)
            .await
            .unwrap();

        assert_eq!(path, artifacts_dir.join(METADATA_FILE));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_metadata_survives_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let metadata = sample_metadata();

        let path = save_metadata(&metadata, temp_dir.path()).await.unwrap();
        let loaded = load_metadata(&path).await.unwrap();

        assert_eq!(loaded, metadata);
    }

    #[tokio::test]
    async fn test_output_is_pretty_json_with_stable_field_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = save_metadata(&sample_metadata(), temp_dir.path())
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("\"column_name\": \"customer_id\""));
        assert!(text.contains("\"type\": \"declared_fk\""));
    }

    #[tokio::test]
    async fn test_save_catalog_writes_both_documents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let metadata = sample_metadata();
        let profiles: ProfileDocument = metadata
            .tables
            .keys()
            .map(|table| (table.clone(), TableProfile::empty()))
            .collect();
        let catalog = Catalog::assemble(metadata, profiles).unwrap();

        let (metadata_path, profiles_path) =
            save_catalog(&catalog, temp_dir.path()).await.unwrap();

        assert!(metadata_path.ends_with(METADATA_FILE));
        let profiles: ProfileDocument = load_json(&profiles_path).await.unwrap();
        assert_eq!(profiles.len(), 2);
        assert!(profiles["orders"].is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = load_metadata(&temp_dir.path().join(METADATA_FILE))
            .await
            .unwrap_err();
        assert!(matches!(err, DataDictError::Io { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_document() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(METADATA_FILE);
        std::fs::write(&path, "{\"tables\": 42}").unwrap();

        let err = load_metadata(&path).await.unwrap_err();
        assert!(matches!(err, DataDictError::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_dangling_relationship() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut metadata = sample_metadata();
        metadata.tables.remove("customers");

        let path = save_metadata(&metadata, temp_dir.path()).await.unwrap();
        assert!(load_metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_document_without_relationships() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(METADATA_FILE);
        std::fs::write(
            &path,
            r#"{"tables": {"customers": [
                {"column_name": "customer_id", "data_type": "INTEGER", "nullable": false, "primary_key": true}
            ]}}"#,
        )
        .unwrap();

        let metadata = load_metadata(&path).await.unwrap();
        assert!(metadata.tables["customers"][0].declared_primary_key);
        assert!(metadata.relationships.is_empty());
        assert!(!metadata.degraded);
    }

    #[tokio::test]
    async fn test_load_bare_table_map() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(METADATA_FILE);
        std::fs::write(
            &path,
            r#"{
                "orders": [
                    {"column_name": "order_id", "data_type": "INTEGER", "nullable": false, "primary_key": true},
                    {"column_name": "customer_id", "data_type": "INTEGER", "nullable": true, "primary_key": false}
                ],
                "customers": []
            }"#,
        )
        .unwrap();

        let metadata = load_metadata(&path).await.unwrap();
        assert_eq!(
            metadata.tables.keys().collect::<Vec<_>>(),
            vec!["customers", "orders"]
        );
        assert_eq!(metadata.tables["orders"][1].name, "customer_id");
        assert!(metadata.relationships.is_empty());
    }
}
