//! SQL building blocks.
//!
//! This module provides the dialect-agnostic pieces model templates are filled
//! with. It includes:
//!
//! - [`token`] - Token types, rendered per dialect
//! - [`expr`] - Expressions and the builder DSL
//! - [`convert`] - Conversion of typed runtime values into expressions
//! - [`dialect`] - SQL dialect implementations
//! - [`types`] - Database column types and their semantic kinds

pub mod convert;
pub mod dialect;
pub mod expr;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use convert::{ConversionRegistry, TypedValue};
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, ident, lit_array, lit_bool, lit_date, lit_float, lit_int, lit_null, lit_str,
    lit_timestamp, model_column, raw_sql, table_col, ExprArg, Expression, Literal,
};
pub use token::{RenderContext, Token, TokenStream};
pub use types::{reinterpret_columns, DtypeMapper, ResultColumn, SemanticType, StandardDtypeMapper};
