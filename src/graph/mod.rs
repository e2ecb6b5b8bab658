//! Model graph assembly and validation.
//!
//! [`assemble`] walks a root node's references and builds a [`Graph`]:
//!
//! ```text
//!          root
//!         /    \
//!       m1      m2        edges point dependent → dependency,
//!         \    /          labelled with the placeholder name
//!          shared
//! ```
//!
//! Nodes are stored once per [`NodeId`], so a diamond like the one above has
//! four entries and `shared` is compiled once. The walk uses an explicit
//! stack, so deep graphs cannot overflow the call stack, and detects cycles
//! (only possible through deferred references) with a per-node
//! `Pending → Visiting → Emitted` state.
//!
//! Validation happens here, once. The generator trusts an assembled graph
//! but still reports `UnresolvedReference` instead of panicking if a lookup
//! fails.

mod catalog;

pub use catalog::ModelCatalog;

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use tracing::debug;

use crate::cache::compute_hash;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelNode, NodeId, Reference};
use crate::template::field_names;

/// Traversal state of a node during assembly. Nodes absent from the state
/// map are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Emitted,
}

/// The assembled, validated dependency graph of a root model.
#[derive(Debug, Clone)]
pub struct Graph {
    graph: DiGraph<Arc<ModelNode>, String>,
    root: NodeIndex,
    /// Post-order: every node after all of its dependencies
    order: Vec<NodeIndex>,
    index: HashMap<NodeId, NodeIndex>,
    fingerprint: String,
}

/// Assemble a graph whose references are all bound directly.
///
/// Deferred references fail with `UnresolvedReference`; use
/// [`assemble_with`] to resolve them from a catalog.
pub fn assemble(root: &Arc<ModelNode>) -> ModelResult<Graph> {
    assemble_with(root, &ModelCatalog::new())
}

/// Assemble a graph, resolving deferred references through `catalog`.
pub fn assemble_with(root: &Arc<ModelNode>, catalog: &ModelCatalog) -> ModelResult<Graph> {
    struct Frame {
        index: NodeIndex,
        deps: Vec<(String, Arc<ModelNode>)>,
        next: usize,
    }

    let mut graph: DiGraph<Arc<ModelNode>, String> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut state: HashMap<NodeId, VisitState> = HashMap::new();
    let mut order: Vec<NodeIndex> = Vec::new();

    let root_index = graph.add_node(root.clone());
    index.insert(root.id().clone(), root_index);
    state.insert(root.id().clone(), VisitState::Visiting);
    let mut stack = vec![Frame {
        index: root_index,
        deps: resolve_dependencies(root, catalog)?,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some((label, dep)) = frame.deps.get(frame.next).cloned() else {
            let done = frame.index;
            state.insert(graph[done].id().clone(), VisitState::Emitted);
            order.push(done);
            stack.pop();
            continue;
        };
        frame.next += 1;
        let from = frame.index;

        match state.get(dep.id()) {
            Some(VisitState::Visiting) => {
                let mut cycle: Vec<String> = stack
                    .iter()
                    .map(|f| &graph[f.index])
                    .skip_while(|node| node.id() != dep.id())
                    .map(|node| node.name().to_string())
                    .collect();
                cycle.push(dep.name().to_string());
                return Err(ModelError::CyclicReference { cycle });
            }
            Some(VisitState::Emitted) => {
                if let Some(&to) = index.get(dep.id()) {
                    graph.add_edge(from, to, label);
                }
            }
            None => {
                let to = graph.add_node(dep.clone());
                index.insert(dep.id().clone(), to);
                state.insert(dep.id().clone(), VisitState::Visiting);
                graph.add_edge(from, to, label);
                let deps = resolve_dependencies(&dep, catalog)?;
                stack.push(Frame {
                    index: to,
                    deps,
                    next: 0,
                });
            }
        }
    }

    let fingerprint = fingerprint(&graph, &order)?;
    debug!(
        root = root.name(),
        nodes = order.len(),
        edges = graph.edge_count(),
        "assembled model graph"
    );

    Ok(Graph {
        graph,
        root: root_index,
        order,
        index,
        fingerprint,
    })
}

/// Validate a node and list the models it depends on, per placeholder.
fn resolve_dependencies(
    node: &Arc<ModelNode>,
    catalog: &ModelCatalog,
) -> ModelResult<Vec<(String, Arc<ModelNode>)>> {
    let unresolved = |placeholder: &str| ModelError::UnresolvedReference {
        model: node.name().to_string(),
        placeholder: placeholder.to_string(),
    };

    for field in field_names(node.sql())? {
        if node.reference(&field).is_none() {
            return Err(unresolved(&field));
        }
    }

    let mut deps: Vec<(String, Arc<ModelNode>)> = Vec::new();
    for (placeholder, reference) in node.references() {
        let found = match reference {
            Reference::Model(dep) => vec![dep.clone()],
            Reference::Deferred(target) => {
                vec![catalog.get(target).cloned().ok_or_else(|| unresolved(placeholder))?]
            }
            Reference::Expressions(exprs) => {
                exprs.iter().flat_map(|e| e.model_references()).collect()
            }
        };
        for dep in found {
            if !deps
                .iter()
                .any(|(p, d)| p == placeholder && d.id() == dep.id())
            {
                deps.push((placeholder.clone(), dep));
            }
        }
    }
    Ok(deps)
}

#[derive(Serialize)]
struct GraphIdentity<'a> {
    nodes: Vec<&'a str>,
    edges: Vec<(usize, usize, &'a str)>,
}

/// Hash of the ordered node ids and the resolved edges. Unlike the root's
/// id this covers deferred resolution.
fn fingerprint(graph: &DiGraph<Arc<ModelNode>, String>, order: &[NodeIndex]) -> ModelResult<String> {
    let position: HashMap<NodeIndex, usize> =
        order.iter().enumerate().map(|(i, &idx)| (idx, i)).collect();
    let mut edges: Vec<(usize, usize, &str)> = graph
        .edge_references()
        .map(|e| (position[&e.source()], position[&e.target()], e.weight().as_str()))
        .collect();
    edges.sort();
    compute_hash(&GraphIdentity {
        nodes: order.iter().map(|&idx| graph[idx].id().as_str()).collect(),
        edges,
    })
}

impl Graph {
    pub fn root(&self) -> &Arc<ModelNode> {
        &self.graph[self.root]
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false: a graph contains at least its root.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes in topological order, dependencies first and the root last.
    pub fn nodes_in_order(&self) -> impl Iterator<Item = &Arc<ModelNode>> + '_ {
        self.order.iter().map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Direct dependencies of a node, in the order they were discovered.
    pub fn dependencies_of(&self, id: &NodeId) -> Vec<&Arc<ModelNode>> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort();
        let mut deps: Vec<&Arc<ModelNode>> = Vec::new();
        for (_, target) in edges {
            let node = &self.graph[target];
            if !deps.iter().any(|d| d.id() == node.id()) {
                deps.push(node);
            }
        }
        deps
    }

    /// Hash over the ordered node ids and resolved edges.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub(crate) fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &Arc<ModelNode> {
        &self.graph[idx]
    }

    pub(crate) fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// The node a model or deferred placeholder of `idx` resolved to.
    pub(crate) fn target_of(&self, idx: NodeIndex, placeholder: &str) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .find(|e| e.weight() == placeholder)
            .map(|e| e.target())
    }
}
