//! End-to-end compilation from a root model to SQL.
//!
//! This module provides the high-level API:
//!
//! ```text
//! Root node → Assemble Graph → Generate (per dialect) → SQL
//!                     │                 ▲
//!                     └── fingerprint ──┘ cache
//! ```
//!
//! # Example
//!
//! ```ignore
//! use modelgraph::compile::Compiler;
//! use modelgraph::generate::{GenerateOptions, GenerationMode};
//! use modelgraph::model::{Bindings, ModelBuilder};
//! use modelgraph::sql::Dialect;
//!
//! let orders = ModelBuilder::new("orders", "select * from raw.orders")?.build(Bindings::new())?;
//! let big = ModelBuilder::new("big_orders", "select * from {{orders}} where amount > {min}")?
//!     .build(Bindings::new().model("orders", orders).value("min", 100))?;
//!
//! let compiler = Compiler::new(GenerateOptions::new(GenerationMode::Cte), Dialect::Postgres);
//! let output = compiler.compile(&big)?;
//! println!("{}", output.sql);
//! ```

use std::sync::Arc;

use crate::cache::{CacheKey, SqlCache};
use crate::config::Settings;
use crate::error::ModelResult;
use crate::generate::{GenerateOptions, GenerationMode, SqlGenerator};
use crate::graph::{assemble_with, Graph, ModelCatalog};
use crate::model::ModelNode;
use crate::sql::dialect::Dialect;

// ============================================================================
// Result Types
// ============================================================================

/// Result of compiling a model graph to SQL.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SQL string.
    pub sql: Arc<str>,

    /// The dialect used for generation.
    pub dialect: Dialect,

    /// The concrete generation mode (never `Auto`).
    pub mode: GenerationMode,

    /// Number of distinct models in the graph.
    pub node_count: usize,

    /// Fingerprint of the assembled graph.
    pub fingerprint: String,
}

// ============================================================================
// Compiler
// ============================================================================

/// Compiles root models for one dialect. Shareable across threads.
#[derive(Debug)]
pub struct Compiler {
    generator: SqlGenerator,
    cache: Option<SqlCache>,
}

impl Compiler {
    /// A compiler with an enabled cache.
    pub fn new(options: GenerateOptions, dialect: Dialect) -> Self {
        Self {
            generator: SqlGenerator::new(dialect).with_options(options),
            cache: Some(SqlCache::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let compiler = Self::new(settings.generation.options(), settings.generation.dialect);
        compiler.with_cache(settings.cache.enabled)
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(SqlCache::new);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.generator.dialect()
    }

    pub fn options(&self) -> &GenerateOptions {
        self.generator.options()
    }

    pub fn cache(&self) -> Option<&SqlCache> {
        self.cache.as_ref()
    }

    /// Compile a root whose references are all bound directly.
    pub fn compile(&self, root: &Arc<ModelNode>) -> ModelResult<CompileOutput> {
        self.compile_with_catalog(root, &ModelCatalog::new())
    }

    /// Compile a root, resolving deferred references through `catalog`.
    pub fn compile_with_catalog(
        &self,
        root: &Arc<ModelNode>,
        catalog: &ModelCatalog,
    ) -> ModelResult<CompileOutput> {
        let graph = assemble_with(root, catalog)?;
        let sql = self.generate(&graph)?;
        Ok(CompileOutput {
            sql,
            dialect: self.dialect(),
            mode: self.options().mode.resolve(self.dialect())?,
            node_count: graph.len(),
            fingerprint: graph.fingerprint().to_string(),
        })
    }

    fn generate(&self, graph: &Graph) -> ModelResult<Arc<str>> {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::new(graph.fingerprint(), self.dialect(), *self.options());
                cache.get_or_try_insert(key, || self.generator.generate(graph))
            }
            None => Ok(Arc::from(self.generator.generate(graph)?)),
        }
    }
}
