//! CTE alias assignment.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use petgraph::graph::NodeIndex;
use regex::Regex;

use crate::error::ModelResult;
use crate::graph::Graph;
use crate::sql::dialect::{Dialect, SqlDialect};

static NON_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Turn a model name into a plain lower-case identifier.
pub(crate) fn sanitize(name: &str) -> String {
    let cleaned = NON_IDENTIFIER.replace_all(name.trim(), "_").to_lowercase();
    match cleaned.chars().next() {
        None => "model".to_string(),
        Some(c) if c.is_ascii_digit() => format!("m_{}", cleaned),
        Some(_) => cleaned,
    }
}

/// Assign every node of the graph a distinct, validated and quoted alias.
///
/// Aliases follow the model name. Distinct nodes sharing a name get the
/// first 8 characters of their id appended; any clash that remains gets a
/// numeric suffix.
pub(crate) fn assign_aliases(
    graph: &Graph,
    dialect: Dialect,
) -> ModelResult<HashMap<NodeIndex, String>> {
    let bases: Vec<(NodeIndex, String)> = graph
        .order()
        .iter()
        .map(|&idx| (idx, sanitize(graph.node(idx).name())))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, base) in &bases {
        *counts.entry(base.as_str()).or_default() += 1;
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut aliases = HashMap::with_capacity(bases.len());
    for (idx, base) in &bases {
        let stem = if counts[base.as_str()] > 1 {
            format!("{}_{}", base, graph.node(*idx).id().short())
        } else {
            base.clone()
        };

        let mut alias = stem.clone();
        let mut n = 2;
        while used.contains(&alias) {
            alias = format!("{}_{}", stem, n);
            n += 1;
        }

        dialect.validate_identifier(&alias)?;
        aliases.insert(*idx, dialect.quote_identifier(&alias));
        used.insert(alias);
    }
    Ok(aliases)
}
