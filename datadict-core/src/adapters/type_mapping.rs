//! Declared type name classification.
//!
//! Backends report declared types as free-form strings (`VARCHAR(255)`,
//! `timestamp without time zone`, `INTEGER`, ...). This module folds them
//! into coarse families, following SQLite's affinity rules for names it does
//! not recognise.
//!
//! # Rules (checked in order)
//! 1. Contains `DATE` or `TIME` -> Temporal
//! 2. `INTERVAL` -> Other
//! 3. Contains `CHAR`, `CLOB`, `TEXT` or `STRING` -> Text
//! 4. Contains `INT` -> Integer
//! 5. Contains `BLOB`, `BINARY` or `BYTEA`, or empty -> Binary
//! 6. Contains `REAL`, `FLOA`, `DOUB`, `NUMERIC`, `DECIMAL` or `NUMBER` -> Float
//! 7. Starts with `BOOL` -> Boolean
//! 8. Otherwise -> Other

/// Coarse family of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// Character data
    Text,
    /// Dates, times, datetimes and timestamps
    Temporal,
    /// Integer numbers
    Integer,
    /// Floating point and fixed precision numbers
    Float,
    /// Booleans
    Boolean,
    /// Binary data
    Binary,
    /// Anything else (JSON, UUID, arrays, custom types)
    Other,
}

impl TypeFamily {
    /// Classifies a declared type name (case-insensitive).
    ///
    /// # Example
    /// ```rust
    /// use datadict_core::adapters::TypeFamily;
    ///
    /// assert_eq!(TypeFamily::classify("VARCHAR(255)"), TypeFamily::Text);
    /// assert_eq!(TypeFamily::classify("timestamp with time zone"), TypeFamily::Temporal);
    /// ```
    pub fn classify(declared_type: &str) -> Self {
        let upper = declared_type.trim().to_uppercase();
        let base = upper.split('(').next().unwrap_or(&upper).trim();

        if base.is_empty() {
            return Self::Binary;
        }
        if base.contains("DATE") || base.contains("TIME") {
            return Self::Temporal;
        }
        if base == "INTERVAL" {
            return Self::Other;
        }
        if ["CHAR", "CLOB", "TEXT", "STRING"]
            .iter()
            .any(|k| base.contains(k))
        {
            return Self::Text;
        }
        if base.contains("INT") {
            return Self::Integer;
        }
        if ["BLOB", "BINARY", "BYTEA"].iter().any(|k| base.contains(k)) {
            return Self::Binary;
        }
        if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL", "NUMBER"]
            .iter()
            .any(|k| base.contains(k))
        {
            return Self::Float;
        }
        if base.starts_with("BOOL") {
            return Self::Boolean;
        }
        Self::Other
    }

    /// True for families whose min/max is meaningful as a recency window.
    pub fn is_freshness_candidate(self) -> bool {
        matches!(self, Self::Text | Self::Temporal)
    }
}
