//! Integration tests for graph assembly: dedup, cycles, ordering.

use std::sync::Arc;

use modelgraph::prelude::*;

fn leaf(name: &str, sql: &str) -> Arc<ModelNode> {
    ModelBuilder::new(name, sql).unwrap().build(Bindings::new()).unwrap()
}

fn select_from(name: &str, dep: Arc<ModelNode>) -> Arc<ModelNode> {
    ModelBuilder::new(name, "select * from {{dep}}")
        .unwrap()
        .build(Bindings::new().model("dep", dep))
        .unwrap()
}

fn diamond() -> Arc<ModelNode> {
    let shared = leaf("shared", "select 1 as x");
    let m1 = select_from("m1", shared.clone());
    let m2 = select_from("m2", shared);
    ModelBuilder::new("root", "select * from {{left}} join {{right}} using (x)")
        .unwrap()
        .build(Bindings::new().model("left", m1).model("right", m2))
        .unwrap()
}

#[test]
fn test_diamond_has_one_shared_entry() {
    let graph = assemble(&diamond()).unwrap();
    assert_eq!(graph.len(), 4);
    let names: Vec<&str> = graph.nodes_in_order().map(|n| n.name()).collect();
    assert_eq!(names, vec!["shared", "m1", "m2", "root"]);
}

#[test]
fn test_structurally_identical_nodes_collapse() {
    // Two separately built but identical upstream nodes.
    let m1 = select_from("m1", leaf("shared", "select 1 as x"));
    let m2 = select_from("m2", leaf("shared", "select 1 as x"));
    let root = ModelBuilder::new("root", "select * from {{a}}, {{b}}")
        .unwrap()
        .build(Bindings::new().model("a", m1).model("b", m2))
        .unwrap();
    let graph = assemble(&root).unwrap();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.nodes_in_order().filter(|n| n.name() == "shared").count(), 1);
}

#[test]
fn test_same_node_under_two_placeholders() {
    let src = leaf("src", "select 1 as x");
    let root = ModelBuilder::new("self_join", "select * from {{a}} a1 join {{b}} a2 using (x)")
        .unwrap()
        .build(Bindings::new().model("a", src.clone()).model("b", src.clone()))
        .unwrap();
    let graph = assemble(&root).unwrap();
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.dependencies_of(root.id()), vec![&src]);
}

#[test]
fn test_topological_order_respects_every_edge() {
    let graph = assemble(&diamond()).unwrap();
    let order: Vec<&Arc<ModelNode>> = graph.nodes_in_order().collect();
    for (i, node) in order.iter().enumerate() {
        for dep in graph.dependencies_of(node.id()) {
            let j = order.iter().position(|n| n.id() == dep.id()).unwrap();
            assert!(j < i, "{} must come before {}", dep.name(), node.name());
        }
    }
    assert_eq!(order.last().unwrap().name(), "root");
}

#[test]
fn test_ring_of_three_is_a_cycle() {
    let deferred = |name: &str, next: &str| {
        ModelBuilder::new(name, "select * from {{next}}")
            .unwrap()
            .build(Bindings::new().deferred("next", next))
            .unwrap()
    };
    let a = deferred("A", "B");
    let catalog = ModelCatalog::new()
        .with(a.clone())
        .unwrap()
        .with(deferred("B", "C"))
        .unwrap()
        .with(deferred("C", "A"))
        .unwrap();

    let err = assemble_with(&a, &catalog).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains('A') && msg.contains('B') && msg.contains('C'), "{}", msg);
    assert_eq!(msg, "Cyclic reference detected: A -> B -> C -> A");
}

#[test]
fn test_cycle_below_the_root() {
    let deferred = |name: &str, next: &str| {
        ModelBuilder::new(name, "select * from {{next}}")
            .unwrap()
            .build(Bindings::new().deferred("next", next))
            .unwrap()
    };
    let catalog = ModelCatalog::new()
        .with(deferred("x", "y"))
        .unwrap()
        .with(deferred("y", "x"))
        .unwrap();
    let root = ModelBuilder::new("root", "select * from {{start}}")
        .unwrap()
        .build(Bindings::new().deferred("start", "x"))
        .unwrap();
    assert!(matches!(
        assemble_with(&root, &catalog),
        Err(ModelError::CyclicReference { cycle }) if cycle == vec!["x", "y", "x"]
    ));
}

#[test]
fn test_long_chain() {
    let mut node = leaf("n0", "select 0 as x");
    for i in 1..1_000 {
        node = select_from(&format!("n{}", i), node);
    }
    let graph = assemble(&node).unwrap();
    assert_eq!(graph.len(), 1_000);
    assert_eq!(graph.nodes_in_order().next().unwrap().name(), "n0");
}

#[test]
fn test_deferred_resolution() {
    let root = ModelBuilder::new("root", "select * from {{src}}")
        .unwrap()
        .build(Bindings::new().deferred("src", "orders"))
        .unwrap();
    let orders = leaf("orders", "select * from raw_orders");
    let catalog = ModelCatalog::new().with(orders.clone()).unwrap();

    let graph = assemble_with(&root, &catalog).unwrap();
    assert!(graph.contains(orders.id()));
    assert_eq!(graph.dependencies_of(root.id()), vec![&orders]);
}
