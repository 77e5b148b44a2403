//! SQL dialect details needed to generate aggregate queries.

/// SQL dialect of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    /// SQLite: double-quoted identifiers, `CAST(x AS TEXT)`
    Sqlite,
    /// PostgreSQL: double-quoted identifiers, `CAST(x AS TEXT)`
    Postgres,
    /// MySQL/MariaDB: backtick identifiers, `CAST(x AS CHAR)`
    MySql,
}

impl SqlDialect {
    /// Quotes an identifier, doubling any embedded quote character.
    ///
    /// # Example
    /// ```rust
    /// use datadict_core::adapters::SqlDialect;
    ///
    /// assert_eq!(SqlDialect::Sqlite.quote_identifier("order date"), "\"order date\"");
    /// assert_eq!(SqlDialect::MySql.quote_identifier("order`s"), "`order``s`");
    /// ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Self::Sqlite | Self::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Wraps an expression in a cast to the dialect's text type.
    pub fn cast_to_text(self, expr: &str) -> String {
        match self {
            Self::Sqlite | Self::Postgres => format!("CAST({expr} AS TEXT)"),
            Self::MySql => format!("CAST({expr} AS CHAR)"),
        }
    }

    /// Quotes a string literal, doubling embedded single quotes.
    pub fn quote_literal(self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(SqlDialect::Postgres.quote_identifier("orders"), "\"orders\"");
        assert_eq!(
            SqlDialect::Sqlite.quote_identifier("weird\"name"),
            "\"weird\"\"name\""
        );
        assert_eq!(SqlDialect::MySql.quote_identifier("orders"), "`orders`");
    }

    #[test]
    fn test_cast_to_text() {
        assert_eq!(
            SqlDialect::Sqlite.cast_to_text("MIN(\"d\")"),
            "CAST(MIN(\"d\") AS TEXT)"
        );
        assert_eq!(SqlDialect::MySql.cast_to_text("MAX(`d`)"), "CAST(MAX(`d`) AS CHAR)");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(SqlDialect::Postgres.quote_literal("public"), "'public'");
        assert_eq!(SqlDialect::MySql.quote_literal("o'brien"), "'o''brien'");
    }
}
