//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use crate::error::{ModelError, ModelResult};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks, escaping with backslashes.
/// Used by: BigQuery
pub fn quote_backtick_escaped(ident: &str) -> String {
    format!("`{}`", backslash_escape(ident, '`'))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes, doubling embedded quotes (standard SQL).
/// Used by: Postgres, DuckDB
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes and C-style backslash escapes.
/// Used by: BigQuery
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", backslash_escape(s, '\''))
}

fn backslash_escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// Literal Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres, DuckDB, BigQuery
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format a finite float with the shortest round-tripping representation.
pub fn format_float_finite(f: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format_finite(f).to_string()
}

/// Spelling of a non-finite float as understood by string-to-float casts.
///
/// Returns `(nan, infinity, negative infinity)` spelling for the given style.
pub fn non_finite_spelling(f: f64, spellings: (&'static str, &'static str, &'static str)) -> &'static str {
    if f.is_nan() {
        spellings.0
    } else if f.is_sign_positive() {
        spellings.1
    } else {
        spellings.2
    }
}

/// Emit `[a, b, c]` list syntax.
/// Used by: BigQuery, DuckDB
pub fn format_bracket_array(elements: &[String]) -> String {
    format!("[{}]", elements.join(", "))
}

/// Emit `ARRAY[a, b, c]` constructor syntax.
/// Used by: Postgres
pub fn format_array_constructor(elements: &[String]) -> String {
    format!("ARRAY[{}]", elements.join(", "))
}

/// Emit `CAST(expr AS type)`.
/// Used by: BigQuery, DuckDB
pub fn format_cast_function(expr: &str, type_name: &str) -> String {
    format!("CAST({} AS {})", expr, type_name)
}

/// Emit `expr::type`, parenthesizing anything that is not a single atom.
/// Used by: Postgres
pub fn format_cast_operator(expr: &str, type_name: &str) -> String {
    if is_atom(expr) {
        format!("{}::{}", expr, type_name)
    } else {
        format!("({})::{}", expr, type_name)
    }
}

fn is_atom(expr: &str) -> bool {
    let quoted = expr.len() >= 2
        && expr.starts_with('\'')
        && expr.ends_with('\'')
        && !expr[1..expr.len() - 1].replace("''", "").contains('\'');
    quoted
        || expr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '"')
}

// =============================================================================
// Identifier Validation
// =============================================================================

/// Check an identifier against a dialect's length limit and reserved prefixes.
///
/// Lengths are measured in bytes; prefixes are matched case-insensitively.
pub fn check_identifier(
    dialect: &'static str,
    ident: &str,
    max_length: Option<usize>,
    reserved_prefixes: &[&str],
) -> ModelResult<()> {
    let unsupported = |rule: String| ModelError::UnsupportedIdentifier {
        identifier: ident.to_string(),
        dialect,
        rule,
    };

    if ident.is_empty() {
        return Err(unsupported("identifiers must not be empty".into()));
    }

    if let Some(max) = max_length {
        if ident.len() > max {
            return Err(unsupported(format!(
                "identifier is {} bytes long, the maximum is {}",
                ident.len(),
                max
            )));
        }
    }

    let upper = ident.to_uppercase();
    if let Some(prefix) = reserved_prefixes.iter().find(|p| upper.starts_with(*p)) {
        return Err(unsupported(format!("prefix '{}' is reserved", prefix)));
    }

    Ok(())
}
