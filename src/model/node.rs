//! Bound, immutable model nodes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::cache::compute_hash;
use crate::error::ModelResult;
use crate::sql::expr::Expression;

/// Content hash identifying a node. Two nodes with the same id are
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a `{placeholder}` left in a bound node's SQL stands for.
#[derive(Debug, Clone, Serialize)]
pub enum Reference {
    /// Another model
    Model(#[serde(serialize_with = "serialize_node_id")] Arc<ModelNode>),
    /// Expressions, rendered per dialect and joined with `", "`
    Expressions(Vec<Expression>),
    /// A model name resolved from a catalog at assembly time
    Deferred(String),
}

fn serialize_node_id<S: Serializer>(node: &Arc<ModelNode>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(node.id().as_str())
}

/// A model bound to concrete values. Immutable and shared through `Arc`.
///
/// `sql` is the template after the bind round: properties are substituted and
/// every remaining `{name}` field is a key of `references`.
pub struct ModelNode {
    id: NodeId,
    name: String,
    template: String,
    sql: String,
    references: Vec<(String, Reference)>,
}

#[derive(Serialize)]
struct NodeIdentity<'a> {
    name: &'a str,
    sql: &'a str,
    references: &'a [(String, Reference)],
}

impl ModelNode {
    pub(crate) fn new(
        name: String,
        template: String,
        sql: String,
        references: Vec<(String, Reference)>,
    ) -> ModelResult<Self> {
        let id = NodeId(compute_hash(&NodeIdentity {
            name: &name,
            sql: &sql,
            references: &references,
        })?);
        Ok(Self {
            id,
            name,
            template,
            sql,
            references,
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The template this node was built from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The bound SQL, with `{reference}` fields still in place.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn references(&self) -> &[(String, Reference)] {
        &self.references
    }

    pub fn reference(&self, placeholder: &str) -> Option<&Reference> {
        self.references
            .iter()
            .find(|(name, _)| name == placeholder)
            .map(|(_, reference)| reference)
    }

    /// Models this node refers to directly, including models nested inside
    /// bound expressions. Deferred references are not included.
    pub fn dependencies(&self) -> Vec<Arc<ModelNode>> {
        let mut deps: Vec<Arc<ModelNode>> = Vec::new();
        for (_, reference) in &self.references {
            let found = match reference {
                Reference::Model(node) => vec![node.clone()],
                Reference::Expressions(exprs) => {
                    exprs.iter().flat_map(|e| e.model_references()).collect()
                }
                Reference::Deferred(_) => continue,
            };
            for node in found {
                if !deps.iter().any(|d| d.id == node.id) {
                    deps.push(node);
                }
            }
        }
        deps
    }
}

impl PartialEq for ModelNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModelNode {}

impl Hash for ModelNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ModelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelNode")
            .field("name", &self.name)
            .field("id", &self.id.short())
            .field(
                "references",
                &self.references.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish()
    }
}
