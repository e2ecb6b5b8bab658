//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to describe its capabilities:
//!
//! - Identifier quoting: `"` (Postgres/DuckDB), `` ` `` (BigQuery)
//! - String literals: `''` doubling vs backslash escapes
//! - Literal syntax: dates, timestamps, arrays, JSON, non-finite floats
//! - Casts: `expr::type` vs `CAST(expr AS type)`
//! - Identifier limits: maximum length and reserved prefixes
//! - Whether `%` is a driver parameter marker
//!
//! Generation code only ever talks to the trait; it never branches on a
//! dialect's name.
//!
//! # Usage
//!
//! ```ignore
//! use modelgraph::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! ```

mod bigquery;
mod duckdb;
pub mod helpers;
mod postgres;

pub use bigquery::BigQuery;
pub use duckdb::DuckDb;
pub use postgres::Postgres;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - Postgres/DuckDB: `"identifier"`
    /// - BigQuery: `` `identifier` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// Standard SQL doubles embedded quotes. BigQuery overrides with
    /// backslash escapes.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    /// Format an integer literal.
    fn format_int(&self, n: i64) -> String {
        n.to_string()
    }

    /// Format a float literal. Finite values use the shortest round-tripping
    /// representation; NaN and infinities go through
    /// [`SqlDialect::format_non_finite_float`].
    fn format_float(&self, f: f64) -> ModelResult<String> {
        if f.is_finite() {
            Ok(helpers::format_float_finite(f))
        } else {
            self.format_non_finite_float(f)
        }
    }

    /// Format NaN or an infinity.
    fn format_non_finite_float(&self, f: f64) -> ModelResult<String> {
        Err(ModelError::unsupported(
            self.name(),
            format!("Float literal {}", f),
            None,
        ))
    }

    /// Format a date literal.
    ///
    /// - DuckDB/BigQuery: `DATE 'YYYY-MM-DD'`
    /// - Postgres: `'YYYY-MM-DD'::date`
    fn format_date_literal(&self, date: &str) -> String {
        format!("DATE {}", self.quote_string(date))
    }

    /// Format a timestamp literal.
    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        format!("TIMESTAMP {}", self.quote_string(timestamp))
    }

    /// Format a JSON literal from its serialized text.
    fn format_json_literal(&self, json: &str) -> String {
        self.format_cast(&self.quote_string(json), "JSON")
    }

    /// Format an array literal from already formatted elements.
    ///
    /// `nested` is true when at least one element is itself an array.
    fn format_array_literal(&self, elements: &[String], nested: bool) -> ModelResult<String> {
        let _ = nested;
        Ok(helpers::format_bracket_array(elements))
    }

    /// Cast an expression to a type.
    fn format_cast(&self, expr: &str, type_name: &str) -> String {
        helpers::format_cast_function(expr, type_name)
    }

    // =========================================================================
    // Identifier Rules
    // =========================================================================

    /// Maximum identifier length in bytes, if the dialect has one.
    ///
    /// Longer identifiers are rejected rather than silently truncated by the
    /// database, which could make two distinct names collide.
    fn max_identifier_length(&self) -> Option<usize> {
        None
    }

    /// Identifier prefixes reserved by the dialect (matched case-insensitively).
    fn reserved_prefixes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Validate an identifier before it is emitted.
    fn validate_identifier(&self, ident: &str) -> ModelResult<()> {
        helpers::check_identifier(
            self.name(),
            ident,
            self.max_identifier_length(),
            self.reserved_prefixes(),
        )
    }

    // =========================================================================
    // Statement Capabilities
    // =========================================================================

    /// Whether this dialect supports common table expressions (WITH).
    fn supports_cte(&self) -> bool {
        true
    }

    /// Whether the usual drivers for this dialect read `%` as a parameter
    /// marker (`%s`, `%(name)s`), so literal percent signs must be doubled.
    fn percent_is_parameter_marker(&self) -> bool {
        false
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    BigQuery,
    DuckDb,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::BigQuery => &BigQuery,
            Dialect::DuckDb => &DuckDb,
        }
    }

    /// All supported dialects.
    pub fn all() -> [Dialect; 3] {
        [Dialect::Postgres, Dialect::BigQuery, Dialect::DuckDb]
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn format_int(&self, n: i64) -> String {
        self.dialect().format_int(n)
    }

    fn format_float(&self, f: f64) -> ModelResult<String> {
        self.dialect().format_float(f)
    }

    fn format_non_finite_float(&self, f: f64) -> ModelResult<String> {
        self.dialect().format_non_finite_float(f)
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.dialect().format_date_literal(date)
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        self.dialect().format_timestamp_literal(timestamp)
    }

    fn format_json_literal(&self, json: &str) -> String {
        self.dialect().format_json_literal(json)
    }

    fn format_array_literal(&self, elements: &[String], nested: bool) -> ModelResult<String> {
        self.dialect().format_array_literal(elements, nested)
    }

    fn format_cast(&self, expr: &str, type_name: &str) -> String {
        self.dialect().format_cast(expr, type_name)
    }

    fn max_identifier_length(&self) -> Option<usize> {
        self.dialect().max_identifier_length()
    }

    fn reserved_prefixes(&self) -> &'static [&'static str] {
        self.dialect().reserved_prefixes()
    }

    fn validate_identifier(&self, ident: &str) -> ModelResult<()> {
        self.dialect().validate_identifier(ident)
    }

    fn supports_cte(&self) -> bool {
        self.dialect().supports_cte()
    }

    fn percent_is_parameter_marker(&self) -> bool {
        self.dialect().percent_is_parameter_marker()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "bigquery" => Ok(Dialect::BigQuery),
            "duckdb" => Ok(Dialect::DuckDb),
            other => Err(format!("unsupported dialect: {}", other)),
        }
    }
}
