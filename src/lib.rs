//! # modelgraph
//!
//! Lazy composition of parameterised SQL models, compiled to one statement
//! per dialect.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           ModelSpec (template with placeholders)         │
//! │     select ... from {{reference}} where x > {property}   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ModelBuilder::build]
//! ┌─────────────────────────────────────────────────────────┐
//! │         ModelNode (immutable, content-addressed)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [graph::assemble]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Graph (deduplicated DAG, cycle-checked, topo order)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [generate::SqlGenerator]
//! ┌─────────────────────────────────────────────────────────┐
//! │       SQL (CTE chain or nested subqueries, per dialect)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and pure; nodes are `Send + Sync` and can be
//! compiled from many threads at once.

pub mod cache;
pub mod compile;
pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod model;
pub mod sql;
pub mod template;

// Re-export commonly used modules at crate root
pub use sql::dialect;
pub use sql::expr;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{CompileOutput, Compiler};
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::expr::{
        // Constructors
        col,
        ident,
        lit_array,
        lit_bool,
        lit_date,
        lit_float,
        lit_int,
        lit_null,
        lit_str,
        lit_timestamp,
        model_column,
        raw_sql,
        table_col,
        // Types
        ExprArg,
        Expression,
        Literal,
    };
    pub use crate::generate::{to_sql, GenerateOptions, GenerationMode, SqlGenerator};
    pub use crate::graph::{assemble, assemble_with, Graph, ModelCatalog};
    pub use crate::model::{Binding, Bindings, ModelBuilder, ModelNode, ModelSpec, NodeId};
    pub use crate::sql::convert::{ConversionRegistry, TypedValue};
    pub use crate::template::{escape_template_metacharacters, extract_placeholder_names};
}

// Also export at crate root for convenience
pub use compile::{CompileOutput, Compiler};
pub use dialect::Dialect;
pub use error::{ModelError, ModelResult};
pub use generate::{to_sql, GenerationMode};
pub use model::{Bindings, ModelBuilder, ModelNode};
