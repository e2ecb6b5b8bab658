//! Dialect-aware SQL generation from an assembled graph.
//!
//! Two strategies:
//!
//! - **CTE** (preferred): every dependency becomes one `WITH` entry, in
//!   topological order, and references become its alias. Shared nodes are
//!   emitted once.
//! - **Nested**: every reference is replaced by the parenthesised SQL of its
//!   target. Shared nodes are repeated.
//!
//! ```text
//! CTE:    WITH "a" AS (select 1 as x), "b" AS (select 2 as y) select ... from "a" join "b" ...
//! Nested: select ... from (select 1 as x) join (select 2 as y) ...
//! ```
//!
//! The generator trusts the validation done by [`assemble`]. If a reference
//! cannot be resolved anyway it returns `UnresolvedReference`.

mod alias;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ModelError, ModelResult};
use crate::graph::{assemble, Graph};
use crate::model::{ModelNode, Reference};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::token::{RenderContext, Token, TokenStream};
use crate::template::{escape_parameter_markers, scan, Fragment};

/// How references are materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// CTEs when the dialect supports them, nested subqueries otherwise
    #[default]
    Auto,
    Cte,
    Nested,
}

impl GenerationMode {
    /// The concrete mode used for a dialect.
    pub fn resolve(self, dialect: Dialect) -> ModelResult<GenerationMode> {
        match self {
            GenerationMode::Auto if dialect.supports_cte() => Ok(GenerationMode::Cte),
            GenerationMode::Auto => Ok(GenerationMode::Nested),
            GenerationMode::Cte if !dialect.supports_cte() => Err(ModelError::unsupported(
                dialect.name(),
                "Common table expressions",
                Some("use nested generation mode"),
            )),
            mode => Ok(mode),
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Auto => write!(f, "auto"),
            GenerationMode::Cte => write!(f, "cte"),
            GenerationMode::Nested => write!(f, "nested"),
        }
    }
}

/// Generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub mode: GenerationMode,
    /// Emit only the CTE list, root included and last, without `WITH`, for
    /// embedding into a larger hand-written query.
    pub root_as_cte: bool,
    /// Double `%` in the output when the dialect's drivers read it as a
    /// parameter marker.
    pub escape_parameter_markers: bool,
}

impl GenerateOptions {
    pub fn new(mode: GenerationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_root_as_cte(mut self, root_as_cte: bool) -> Self {
        self.root_as_cte = root_as_cte;
        self
    }

    pub fn with_escape_parameter_markers(mut self, escape: bool) -> Self {
        self.escape_parameter_markers = escape;
        self
    }
}

/// Generates SQL for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlGenerator {
    dialect: Dialect,
    options: GenerateOptions,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate one statement for the graph's root.
    pub fn generate(&self, graph: &Graph) -> ModelResult<String> {
        let mode = self.options.mode.resolve(self.dialect)?;
        let sql = match mode {
            GenerationMode::Nested => self.generate_nested(graph)?,
            _ => self.generate_cte(graph)?,
        };

        let sql = if self.options.escape_parameter_markers
            && self.dialect.percent_is_parameter_marker()
        {
            escape_parameter_markers(&sql)
        } else {
            sql
        };

        debug!(
            root = graph.root().name(),
            dialect = %self.dialect,
            mode = %mode,
            len = sql.len(),
            "generated SQL"
        );
        Ok(sql)
    }

    fn generate_cte(&self, graph: &Graph) -> ModelResult<String> {
        let aliases = alias::assign_aliases(graph, self.dialect)?;
        let alias_of = |idx: NodeIndex| -> ModelResult<String> {
            aliases
                .get(&idx)
                .cloned()
                .ok_or_else(|| unresolved(graph.node(idx), graph.node(idx).name()))
        };

        let root = graph.root_index();
        let mut ctes = TokenStream::new();
        let mut count = 0;
        for &idx in graph.order() {
            if idx == root && !self.options.root_as_cte {
                continue;
            }
            let alias = alias_of(idx)?;
            let body = self.render_node(graph, idx, &alias_of)?;
            if count > 0 {
                ctes.comma().space();
            }
            trace!(alias = %alias, len = body.len(), "emitting CTE");
            ctes.raw(alias)
                .space()
                .push(Token::As)
                .space()
                .lparen()
                .raw(body)
                .rparen();
            count += 1;
        }

        if self.options.root_as_cte {
            return ctes.serialize(self.dialect);
        }

        let mut out = TokenStream::new();
        if count > 0 {
            out.push(Token::With).space().append(&ctes).space();
        }
        out.raw(self.render_node(graph, root, &alias_of)?);
        out.serialize(self.dialect)
    }

    fn generate_nested(&self, graph: &Graph) -> ModelResult<String> {
        let mut rendered: HashMap<NodeIndex, String> = HashMap::with_capacity(graph.len());
        for &idx in graph.order() {
            let body = {
                let subquery = |dep: NodeIndex| -> ModelResult<String> {
                    rendered
                        .get(&dep)
                        .map(|sql| format!("({})", sql))
                        .ok_or_else(|| unresolved(graph.node(idx), graph.node(dep).name()))
                };
                self.render_node(graph, idx, &subquery)?
            };
            rendered.insert(idx, body);
        }

        let root = graph.root_index();
        let sql = rendered
            .remove(&root)
            .ok_or_else(|| unresolved(graph.root(), graph.root().name()))?;

        if !self.options.root_as_cte {
            return Ok(sql);
        }
        let alias = self.root_alias(graph)?;
        let mut out = TokenStream::new();
        out.raw(alias)
            .space()
            .push(Token::As)
            .space()
            .lparen()
            .raw(sql)
            .rparen();
        out.serialize(self.dialect)
    }

    fn root_alias(&self, graph: &Graph) -> ModelResult<String> {
        let alias = alias::sanitize(graph.root().name());
        self.dialect.validate_identifier(&alias)?;
        Ok(self.dialect.quote_identifier(&alias))
    }

    /// The generation round for one node: every `{reference}` field in its
    /// bound SQL is replaced, literal braces are unescaped.
    fn render_node(
        &self,
        graph: &Graph,
        idx: NodeIndex,
        resolve: &dyn Fn(NodeIndex) -> ModelResult<String>,
    ) -> ModelResult<String> {
        let node = graph.node(idx);
        let mut out = String::with_capacity(node.sql().len());

        for fragment in scan(node.sql())? {
            let field = match fragment {
                Fragment::Literal(text) => {
                    out.push_str(&text);
                    continue;
                }
                Fragment::Field(field) => field,
            };
            let name = field.trim();

            match node.reference(name) {
                Some(Reference::Model(_) | Reference::Deferred(_)) => {
                    let target = graph
                        .target_of(idx, name)
                        .ok_or_else(|| unresolved(node, name))?;
                    out.push_str(&resolve(target)?);
                }
                Some(Reference::Expressions(exprs)) => {
                    let resolver = |model: &ModelNode| -> ModelResult<String> {
                        let target = graph
                            .index_of(model.id())
                            .ok_or_else(|| unresolved(node, name))?;
                        resolve(target)
                    };
                    let ctx = RenderContext::new(self.dialect).with_resolver(&resolver);
                    for (i, expr) in exprs.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        expr.render_into(&ctx, &mut out)?;
                    }
                }
                None => return Err(unresolved(node, name)),
            }
        }
        Ok(out)
    }
}

fn unresolved(node: &ModelNode, placeholder: &str) -> ModelError {
    ModelError::UnresolvedReference {
        model: node.name().to_string(),
        placeholder: placeholder.to_string(),
    }
}

/// Assemble `root` and generate SQL in one step.
pub fn to_sql(root: &Arc<ModelNode>, dialect: Dialect, mode: GenerationMode) -> ModelResult<String> {
    let graph = assemble(root)?;
    SqlGenerator::new(dialect)
        .with_options(GenerateOptions::new(mode))
        .generate(&graph)
}
