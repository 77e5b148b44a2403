//! Data-quality profiling.
//!
//! This module computes, per table:
//! - **Row count**: zero rows short-circuits to the empty profile
//! - **Completeness / uniqueness**: non-null and distinct non-null counts per column
//! - **Freshness**: min/max of text or temporal columns named like a date or time
//! - **Key health**: null and duplicate primary-key tuples
//!
//! # Security Guarantees
//! - Only aggregate queries are issued; row values never leave the database
//!   except for freshness bounds
//! - All statements are read-only
//!
//! # Example
//! ```rust,ignore
//! use datadict_core::profiling::{ProfilerConfig, QualityProfiler};
//!
//! let profiler = QualityProfiler::new(ProfilerConfig::default());
//! let profiles = profiler.profile_all(adapter.as_ref(), &metadata).await?;
//! ```

mod config;
mod profiler;
pub mod sql;

pub use config::{DEFAULT_MAX_CONCURRENT_TABLES, DEFAULT_QUERY_TIMEOUT, ProfilerConfig};
pub use profiler::{QualityProfiler, is_freshness_column};
