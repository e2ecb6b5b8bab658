//! BigQuery SQL dialect.
//!
//! BigQuery features:
//! - Backtick identifier quoting with backslash escapes
//! - Backslash escapes in string literals
//! - Typed literals (`DATE '...'`, `TIMESTAMP '...'`, `JSON '...'`)
//! - `[...]` array literals; arrays of arrays are not allowed
//! - Column names limited to 300 characters, several reserved prefixes

use super::helpers;
use super::SqlDialect;
use crate::error::{ModelError, ModelResult};

/// BigQuery SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

const RESERVED_PREFIXES: &[&str] = &[
    "_TABLE_",
    "_FILE_",
    "_PARTITION",
    "_ROW_TIMESTAMP",
    "__ROOT__",
    "_COLIDENTIFIER",
];

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick_escaped(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_non_finite_float(&self, f: f64) -> ModelResult<String> {
        let spelled = helpers::non_finite_spelling(f, ("'NaN'", "'inf'", "'-inf'"));
        Ok(self.format_cast(spelled, "FLOAT64"))
    }

    fn format_json_literal(&self, json: &str) -> String {
        format!("JSON {}", self.quote_string(json))
    }

    fn format_array_literal(&self, elements: &[String], nested: bool) -> ModelResult<String> {
        if nested {
            return Err(ModelError::unsupported(
                self.name(),
                "Array of arrays",
                Some("wrap each inner array in a STRUCT, e.g. [STRUCT([1, 2] AS items)]"),
            ));
        }
        Ok(helpers::format_bracket_array(elements))
    }

    fn max_identifier_length(&self) -> Option<usize> {
        Some(300)
    }

    fn reserved_prefixes(&self) -> &'static [&'static str] {
        RESERVED_PREFIXES
    }
}
