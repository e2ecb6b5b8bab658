//! Test utilities for SQL emission validation.
//!
//! Provides helpers for validating that generated SQL is syntactically correct
//! using sqlparser-rs for roundtrip validation.

use sqlparser::dialect::{BigQueryDialect, DuckDbDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// Uses sqlparser-rs to parse the SQL and returns an error if parsing fails.
///
/// ```ignore
/// validate_sql("WITH \"a\" AS (select 1) select * from \"a\"", Dialect::Postgres).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::BigQuery => Box::new(BigQueryDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT * FROM users", Dialect::Postgres).unwrap();
        validate_sql("SELECT * FROM `users`", Dialect::BigQuery).unwrap();
        validate_sql("SELECT * FROM users", Dialect::DuckDb).unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM users", Dialect::Postgres);
        assert!(result.is_err());
    }
}
