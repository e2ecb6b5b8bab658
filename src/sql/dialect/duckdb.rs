//! DuckDB SQL dialect.
//!
//! DuckDB features:
//! - ANSI identifier quoting (`"`)
//! - `[...]` list literals, nesting allowed
//! - No practical identifier length limit

use super::helpers;
use super::SqlDialect;
use crate::error::ModelResult;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_non_finite_float(&self, f: f64) -> ModelResult<String> {
        let spelled = helpers::non_finite_spelling(f, ("'nan'", "'inf'", "'-inf'"));
        Ok(self.format_cast(spelled, "DOUBLE"))
    }

    // Uses default bracket arrays, CAST(... AS ...) and DATE/TIMESTAMP literals
}
