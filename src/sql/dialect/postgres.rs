//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - Identifiers limited to 63 bytes (NAMEDATALEN - 1); longer names are
//!   silently truncated by the server, so we reject them up front
//! - `::` cast operator
//! - `ARRAY[...]` constructor, multi-dimensional arrays allowed
//! - Drivers such as psycopg use `%s` parameter markers

use super::helpers;
use super::SqlDialect;
use crate::error::{ModelError, ModelResult};

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_non_finite_float(&self, f: f64) -> ModelResult<String> {
        let spelled =
            helpers::non_finite_spelling(f, ("'NaN'", "'Infinity'", "'-Infinity'"));
        Ok(self.format_cast(spelled, "double precision"))
    }

    fn format_date_literal(&self, date: &str) -> String {
        self.format_cast(&self.quote_string(date), "date")
    }

    fn format_timestamp_literal(&self, timestamp: &str) -> String {
        self.format_cast(&self.quote_string(timestamp), "timestamp")
    }

    fn format_json_literal(&self, json: &str) -> String {
        self.format_cast(&self.quote_string(json), "jsonb")
    }

    fn format_array_literal(&self, elements: &[String], _nested: bool) -> ModelResult<String> {
        if elements.is_empty() {
            return Err(ModelError::unsupported(
                self.name(),
                "Untyped empty array literal",
                Some("cast an explicitly typed empty array instead, e.g. ARRAY[]::text[]"),
            ));
        }
        Ok(helpers::format_array_constructor(elements))
    }

    fn format_cast(&self, expr: &str, type_name: &str) -> String {
        helpers::format_cast_operator(expr, type_name)
    }

    fn max_identifier_length(&self) -> Option<usize> {
        Some(63)
    }

    fn percent_is_parameter_marker(&self) -> bool {
        true
    }
}
