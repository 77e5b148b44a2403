//! Catalog assembly: the pipeline entry points.
//!
//! Stages run strictly in sequence. Profiling needs the finished, inferred
//! metadata document.

use crate::Result;
use crate::adapters::DatabaseAdapter;
use crate::error::DataDictError;
use crate::models::{MetadataDocument, ProfileDocument};
use crate::profiling::{ProfilerConfig, QualityProfiler};
use serde::{Deserialize, Serialize};

/// The two documents of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub metadata: MetadataDocument,
    pub profiles: ProfileDocument,
}

impl Catalog {
    /// Combines a metadata document with its profiles.
    ///
    /// # Errors
    /// Returns [`DataDictError::CatalogMismatch`] if the profile keys differ
    /// from the metadata tables in either direction, or if the metadata
    /// document is internally inconsistent
    pub fn assemble(metadata: MetadataDocument, profiles: ProfileDocument) -> Result<Self> {
        metadata.validate()?;

        let missing: Vec<&str> = metadata
            .tables
            .keys()
            .filter(|table| !profiles.contains_key(*table))
            .map(String::as_str)
            .collect();
        let stale: Vec<&str> = profiles
            .keys()
            .filter(|table| !metadata.tables.contains_key(*table))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() || !stale.is_empty() {
            return Err(DataDictError::catalog_mismatch(format!(
                "profiles missing for [{}], profiles without metadata for [{}]",
                missing.join(", "),
                stale.join(", ")
            )));
        }

        Ok(Self { metadata, profiles })
    }
}

/// Reads the schema and runs inference.
///
/// # Errors
/// Returns error if the schema cannot be read
pub async fn extract_metadata(adapter: &dyn DatabaseAdapter) -> Result<MetadataDocument> {
    let raw = crate::reader::read_schema(adapter).await?;
    let metadata = crate::inference::infer(raw);
    metadata.validate()?;

    tracing::info!(
        "Extracted metadata: {} tables, {} relationships{}",
        metadata.tables.len(),
        metadata.relationships.len(),
        if metadata.degraded { " (degraded)" } else { "" }
    );

    Ok(metadata)
}

/// Profiles the tables of an existing metadata document, e.g. one loaded
/// from a previous run.
///
/// # Errors
/// Returns error on connection-level failure
pub async fn profile_metadata(
    adapter: &dyn DatabaseAdapter,
    metadata: &MetadataDocument,
    config: ProfilerConfig,
) -> Result<ProfileDocument> {
    QualityProfiler::new(config)
        .profile_all(adapter, metadata)
        .await
}

/// Runs the whole pipeline: read, infer, profile, assemble.
///
/// # Errors
/// Returns error on connection-level failure or an assembly mismatch; no
/// partial catalog is returned
pub async fn run_pipeline(
    adapter: &dyn DatabaseAdapter,
    config: ProfilerConfig,
) -> Result<Catalog> {
    let metadata = extract_metadata(adapter).await?;
    let profiles = profile_metadata(adapter, &metadata, config).await?;
    Catalog::assemble(metadata, profiles)
}
