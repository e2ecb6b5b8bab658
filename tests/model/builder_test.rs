//! Integration tests for binding model templates.

use std::sync::Arc;

use modelgraph::model::{Binding, Bindings, ModelBuilder, ModelNode, ModelSpec, Reference};
use modelgraph::prelude::*;

fn leaf(name: &str, sql: &str) -> Arc<ModelNode> {
    ModelBuilder::new(name, sql).unwrap().build(Bindings::new()).unwrap()
}

#[test]
fn test_builder_is_reusable() {
    let builder = ModelBuilder::new("filtered", "select * from {{src}} where amount > {min}").unwrap();
    let small = builder
        .build(Bindings::new().model("src", leaf("orders", "select * from orders")).value("min", 10))
        .unwrap();
    let large = builder
        .build(Bindings::new().model("src", leaf("orders", "select * from orders")).value("min", 1000))
        .unwrap();
    assert_ne!(small.id(), large.id());
    assert_eq!(small.sql(), "select * from {src} where amount > 10");
    assert_eq!(large.sql(), "select * from {src} where amount > 1000");
    assert_eq!(small.template(), builder.spec().template());
}

#[test]
fn test_identical_bindings_give_equal_nodes() {
    let build = || {
        ModelBuilder::new("m", "select {cols} from {{src}} limit {n}")
            .unwrap()
            .build(
                Bindings::new()
                    .exprs("cols", vec![col("a"), col("b")])
                    .model("src", leaf("src", "select 1 as a, 2 as b"))
                    .value("n", 5),
            )
            .unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a, b);
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn test_name_is_part_of_identity() {
    assert_ne!(leaf("a", "select 1").id(), leaf("b", "select 1").id());
}

#[test]
fn test_scalar_values_cannot_inject_references() {
    let node = ModelBuilder::new("m", "select '{v}' as v")
        .unwrap()
        .build(Bindings::new().value("v", "{{other}}"))
        .unwrap();
    assert!(node.references().is_empty());
    assert_eq!(
        to_sql(&node, Dialect::Postgres, GenerationMode::Cte).unwrap(),
        "select '{{other}}' as v"
    );
}

#[test]
fn test_scalar_kinds() {
    let node = ModelBuilder::new("m", "select {i}, {f}, {b}, {s}")
        .unwrap()
        .build(
            Bindings::new()
                .value("i", -3_i64)
                .value("f", 0.5)
                .value("b", true)
                .value("s", "x + 1"),
        )
        .unwrap();
    assert_eq!(node.sql(), "select -3, 0.5, true, x + 1");
}

#[test]
fn test_expression_bound_reference() {
    let node = ModelBuilder::new("m", "select * from {{src}}")
        .unwrap()
        .build(Bindings::new().expr("src", raw_sql("unnest(array[1, 2])")))
        .unwrap();
    assert!(matches!(node.reference("src"), Some(Reference::Expressions(_))));
    assert_eq!(
        to_sql(&node, Dialect::Postgres, GenerationMode::Cte).unwrap(),
        "select * from unnest(array[1, 2])"
    );
}

#[test]
fn test_deferred_reference_is_recorded() {
    let node = ModelBuilder::new("m", "select * from {{src}}")
        .unwrap()
        .build(Bindings::new().bind("src", Binding::Deferred("orders".into())))
        .unwrap();
    assert!(matches!(node.reference("src"), Some(Reference::Deferred(name)) if name == "orders"));
    assert!(node.dependencies().is_empty());
}

#[test]
fn test_missing_binding_names_model_and_placeholders() {
    let err = ModelBuilder::new("report", "select * from {{orders}} join {{customers}} using (id)")
        .unwrap()
        .build(Bindings::new().model("orders", leaf("orders", "select 1 as id")))
        .unwrap_err();
    assert_eq!(
        err,
        ModelError::MissingBinding {
            model: "report".into(),
            placeholders: vec!["customers".into()],
        }
    );
    assert_eq!(
        err.to_string(),
        "Model 'report' is missing bindings for: customers"
    );
}

#[test]
fn test_unused_binding_is_tolerated() {
    let node = ModelBuilder::new("m", "select 1")
        .unwrap()
        .build(Bindings::new().value("unused", 1).model("also_unused", leaf("x", "select 2")))
        .unwrap();
    assert_eq!(node.sql(), "select 1");
    assert!(node.references().is_empty());
}

#[test]
fn test_spec_placeholders() {
    let spec = ModelSpec::new("m", "select {a} from {{b}} where {c} and {{d}}").unwrap();
    let names: Vec<String> = spec.placeholders().into_iter().collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(
        extract_placeholder_names(spec.template()).unwrap(),
        spec.placeholders()
    );
}

#[test]
fn test_non_finite_expression_values_are_distinct_nodes() {
    let builder = ModelBuilder::new("bound", "select {v} as v").unwrap();
    let build = |f: f64| builder.build(Bindings::new().expr("v", lit_float(f))).unwrap();
    let pos = build(f64::INFINITY);
    let neg = build(f64::NEG_INFINITY);
    let nan = build(f64::NAN);
    assert_ne!(pos.id(), neg.id());
    assert_ne!(pos.id(), nan.id());
    assert_ne!(neg.id(), nan.id());
    assert_eq!(nan.id(), build(f64::NAN).id());

    let root = ModelBuilder::new(
        "all",
        "select * from {{a}} union all select * from {{b}} union all select * from {{c}}",
    )
    .unwrap()
    .build(Bindings::new().model("a", pos).model("b", neg).model("c", nan))
    .unwrap();
    assert_eq!(assemble(&root).unwrap().len(), 4);

    let sql = to_sql(&root, Dialect::Postgres, GenerationMode::Cte).unwrap();
    assert!(sql.contains("select 'Infinity'::double precision as v"));
    assert!(sql.contains("select '-Infinity'::double precision as v"));
    assert!(sql.contains("select 'NaN'::double precision as v"));
}

#[test]
fn test_non_finite_scalar_is_rejected() {
    let builder = ModelBuilder::new("m", "select {v} as v").unwrap();
    for v in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        assert!(matches!(
            builder.build(Bindings::new().value("v", v)),
            Err(ModelError::InvalidBinding { placeholder, .. }) if placeholder == "v"
        ));
    }
}

fn nested_sum(depth: usize) -> Expression {
    let mut expr = col("x");
    for _ in 0..depth {
        expr = Expression::construct("({} + 1)", vec![expr.into()]).unwrap();
    }
    expr
}

#[test]
fn test_deeply_nested_expression() {
    const DEPTH: usize = 10_000;
    let builder = ModelBuilder::new("deep", "select {v} as v from t").unwrap();
    let a = builder.build(Bindings::new().expr("v", nested_sum(DEPTH))).unwrap();
    let b = builder.build(Bindings::new().expr("v", nested_sum(DEPTH))).unwrap();
    let shallower = builder
        .build(Bindings::new().expr("v", nested_sum(DEPTH - 1)))
        .unwrap();
    assert_eq!(a.id(), b.id());
    assert_ne!(a.id(), shallower.id());

    let sql = to_sql(&a, Dialect::Postgres, GenerationMode::Cte).unwrap();
    let expected = format!(
        "select {}\"x\"{} as v from t",
        "(".repeat(DEPTH),
        " + 1)".repeat(DEPTH)
    );
    assert_eq!(sql, expected);
}
