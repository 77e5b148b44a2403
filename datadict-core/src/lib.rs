//! Core engine for datadict: schema introspection, relationship inference
//! and data-quality profiling.
//!
//! The engine produces two documents per run, a [`MetadataDocument`] and a
//! [`ProfileDocument`]. Both are plain serde structures handed unmodified to
//! downstream consumers.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - All database operations are read-only
//!
//! # Architecture
//! - Adapters implement a capability set; foreign-key introspection is optional
//! - Factory pattern for database adapter instantiation
//! - Pipeline: read schema, infer keys and relationships, profile, assemble

pub mod adapters;
pub mod catalog;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;
pub mod profiling;
pub mod reader;

// Re-export commonly used types
pub use adapters::{
    AdapterFeature, ConnectionConfig, DatabaseAdapter, ForeignKeyIntrospection, SqlDialect,
    TypeFamily,
};
pub use catalog::{Catalog, extract_metadata, profile_metadata, run_pipeline};
pub use error::{DataDictError, Result};
pub use models::{
    Column, ColumnProfile, DatabaseType, FreshnessWindow, KeyHealth, MetadataDocument,
    ProfileDocument, Provenance, Relationship, TableProfile,
};
pub use profiling::{ProfilerConfig, QualityProfiler};
