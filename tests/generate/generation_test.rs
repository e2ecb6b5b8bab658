//! End-to-end generation tests: graph shape in, one statement out.

use std::sync::Arc;

use insta::assert_snapshot;
use modelgraph::prelude::*;
use sqlparser::dialect::{BigQueryDialect, DuckDbDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

fn parses(sql: &str, dialect: Dialect) {
    let result = match dialect {
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, sql),
        Dialect::BigQuery => Parser::parse_sql(&BigQueryDialect {}, sql),
        Dialect::DuckDb => Parser::parse_sql(&DuckDbDialect {}, sql),
    };
    if let Err(e) = result {
        panic!("{} failed to parse: {}\n{}", dialect, e, sql);
    }
}

fn leaf(name: &str, sql: &str) -> Arc<ModelNode> {
    ModelBuilder::new(name, sql).unwrap().build(Bindings::new()).unwrap()
}

fn join_ab() -> Arc<ModelNode> {
    ModelBuilder::new(
        "z",
        "select {{a}}.x + {{b}}.y as z from {{a}} join {{b}} on true",
    )
    .unwrap()
    .build(
        Bindings::new()
            .model("a", leaf("node_a", "select 1 as x"))
            .model("b", leaf("node_b", "select 2 as y")),
    )
    .unwrap()
}

fn diamond() -> Arc<ModelNode> {
    let s = leaf("s", "select 1 as x");
    let m1 = ModelBuilder::new("m1", "select * from {{s}}")
        .unwrap()
        .build(Bindings::new().model("s", s.clone()))
        .unwrap();
    let m2 = ModelBuilder::new("m2", "select x from {{s}} where x > 0")
        .unwrap()
        .build(Bindings::new().model("s", s))
        .unwrap();
    ModelBuilder::new("r", "select * from {{m1}} join {{m2}} using (x)")
        .unwrap()
        .build(Bindings::new().model("m1", m1).model("m2", m2))
        .unwrap()
}

#[test]
fn test_join_of_two_models_postgres() {
    let sql = to_sql(&join_ab(), Dialect::Postgres, GenerationMode::Cte).unwrap();
    assert_snapshot!(sql, @r#"WITH "node_a" AS (select 1 as x), "node_b" AS (select 2 as y) select "node_a".x + "node_b".y as z from "node_a" join "node_b" on true"#);
    parses(&sql, Dialect::Postgres);
}

#[test]
fn test_join_of_two_models_bigquery() {
    let sql = to_sql(&join_ab(), Dialect::BigQuery, GenerationMode::Auto).unwrap();
    assert_snapshot!(sql, @"WITH `node_a` AS (select 1 as x), `node_b` AS (select 2 as y) select `node_a`.x + `node_b`.y as z from `node_a` join `node_b` on true");
    parses(&sql, Dialect::BigQuery);
}

#[test]
fn test_join_of_two_models_duckdb() {
    let sql = to_sql(&join_ab(), Dialect::DuckDb, GenerationMode::Cte).unwrap();
    parses(&sql, Dialect::DuckDb);
    assert_eq!(sql, to_sql(&join_ab(), Dialect::Postgres, GenerationMode::Cte).unwrap());
}

#[test]
fn test_diamond_emits_shared_node_once() {
    let sql = to_sql(&diamond(), Dialect::Postgres, GenerationMode::Cte).unwrap();
    assert_snapshot!(sql, @r#"WITH "s" AS (select 1 as x), "m1" AS (select * from "s"), "m2" AS (select x from "s" where x > 0) select * from "m1" join "m2" using (x)"#);
    assert_eq!(sql.matches("\"s\" AS").count(), 1);
    parses(&sql, Dialect::Postgres);
}

#[test]
fn test_diamond_nested_repeats_shared_node() {
    let sql = to_sql(&diamond(), Dialect::DuckDb, GenerationMode::Nested).unwrap();
    assert_snapshot!(sql, @"select * from (select * from (select 1 as x)) join (select x from (select 1 as x) where x > 0) using (x)");
    assert_eq!(sql.matches("select 1 as x").count(), 2);
}

#[test]
fn test_generation_is_deterministic() {
    let first = to_sql(&diamond(), Dialect::BigQuery, GenerationMode::Cte).unwrap();
    for _ in 0..5 {
        assert_eq!(to_sql(&diamond(), Dialect::BigQuery, GenerationMode::Cte).unwrap(), first);
    }
}

#[test]
fn test_same_name_models_get_distinct_aliases() {
    let a = leaf("src", "select 1 as x");
    let b = leaf("src", "select 2 as x");
    let root = ModelBuilder::new("root", "select * from {{a}} union all select * from {{b}}")
        .unwrap()
        .build(Bindings::new().model("a", a.clone()).model("b", b.clone()))
        .unwrap();
    let sql = to_sql(&root, Dialect::Postgres, GenerationMode::Cte).unwrap();

    let alias_a = format!("\"src_{}\"", a.id().short());
    let alias_b = format!("\"src_{}\"", b.id().short());
    assert_ne!(alias_a, alias_b);
    assert_eq!(
        sql,
        format!(
            "WITH {a} AS (select 1 as x), {b} AS (select 2 as x) \
             select * from {a} union all select * from {b}",
            a = alias_a,
            b = alias_b
        )
    );
    parses(&sql, Dialect::Postgres);
}

#[test]
fn test_weird_model_names_are_sanitized() {
    let src = leaf("Daily Revenue (EUR)", "select 1 as amount");
    let root = ModelBuilder::new("root", "select amount from {{src}}")
        .unwrap()
        .build(Bindings::new().model("src", src))
        .unwrap();
    let sql = to_sql(&root, Dialect::BigQuery, GenerationMode::Cte).unwrap();
    assert_snapshot!(sql, @"WITH `daily_revenue__eur_` AS (select 1 as amount) select amount from `daily_revenue__eur_`");
}

#[test]
fn test_expression_properties_per_dialect() {
    let node = ModelBuilder::new(
        "filtered",
        "select {cols} from {{src}} where {cond}",
    )
    .unwrap()
    .build(
        Bindings::new()
            .exprs("cols", vec![col("order id"), col("amount")])
            .expr(
                "cond",
                Expression::construct("{} >= {}", vec![col("created").into(), lit_date("2024-01-01").into()])
                    .unwrap(),
            )
            .model("src", leaf("orders", "select 1 as \"order id\", 2 as amount, current_date as created")),
    )
    .unwrap();

    let pg = to_sql(&node, Dialect::Postgres, GenerationMode::Cte).unwrap();
    assert!(pg.ends_with(
        "select \"order id\", \"amount\" from \"orders\" where \"created\" >= '2024-01-01'::date"
    ));
    parses(&pg, Dialect::Postgres);

    let bq = to_sql(&node, Dialect::BigQuery, GenerationMode::Cte).unwrap();
    assert!(bq.ends_with(
        "select `order id`, `amount` from `orders` where `created` >= DATE '2024-01-01'"
    ));
}

#[test]
fn test_typed_values_through_registry() {
    let registry = ConversionRegistry::standard();
    let cond = Expression::construct_with(
        "{} > {}",
        vec![
            col("amount").into(),
            TypedValue::new("float64", serde_json::json!(9.5)).into(),
        ],
        &registry,
    )
    .unwrap();
    let node = ModelBuilder::new("m", "select * from t where {cond}")
        .unwrap()
        .build(Bindings::new().expr("cond", cond))
        .unwrap();
    assert_snapshot!(
        to_sql(&node, Dialect::Postgres, GenerationMode::Cte).unwrap(),
        @r#"select * from t where "amount" > 9.5"#
    );
}

#[test]
fn test_deferred_reference_generation() {
    let root = ModelBuilder::new("report", "select count(*) from {{orders}}")
        .unwrap()
        .build(Bindings::new().deferred("orders", "orders"))
        .unwrap();
    let catalog = ModelCatalog::new()
        .with(leaf("orders", "select * from raw_orders"))
        .unwrap();
    let graph = assemble_with(&root, &catalog).unwrap();
    let sql = SqlGenerator::new(Dialect::Postgres).generate(&graph).unwrap();
    assert_snapshot!(sql, @r#"WITH "orders" AS (select * from raw_orders) select count(*) from "orders""#);
    parses(&sql, Dialect::Postgres);
}

#[test]
fn test_deferred_reference_without_catalog() {
    let root = ModelBuilder::new("report", "select count(*) from {{orders}}")
        .unwrap()
        .build(Bindings::new().deferred("orders", "orders"))
        .unwrap();
    assert!(matches!(
        to_sql(&root, Dialect::Postgres, GenerationMode::Cte),
        Err(ModelError::UnresolvedReference { placeholder, .. }) if placeholder == "orders"
    ));
}

#[test]
fn test_root_as_cte_embeds_in_larger_query() {
    let graph = assemble(&diamond()).unwrap();
    let ctes = SqlGenerator::new(Dialect::Postgres)
        .with_options(GenerateOptions::new(GenerationMode::Cte).with_root_as_cte(true))
        .generate(&graph)
        .unwrap();
    let sql = format!("WITH {} select count(*) from \"r\"", ctes);
    parses(&sql, Dialect::Postgres);
    assert!(ctes.ends_with("\"r\" AS (select * from \"m1\" join \"m2\" using (x))"));
}

#[test]
fn test_root_as_cte_nested_wraps_root() {
    let graph = assemble(&join_ab()).unwrap();
    let sql = SqlGenerator::new(Dialect::DuckDb)
        .with_options(GenerateOptions::new(GenerationMode::Nested).with_root_as_cte(true))
        .generate(&graph)
        .unwrap();
    assert!(sql.starts_with("\"z\" AS (select (select 1 as x).x"));
}
