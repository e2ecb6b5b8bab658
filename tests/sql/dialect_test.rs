//! Dialect capability tests across all supported dialects.

use modelgraph::dialect::{Dialect, SqlDialect};
use modelgraph::expr::{lit_bool, lit_date, lit_float, lit_null, lit_timestamp};
use modelgraph::sql::types::{reinterpret_columns, SemanticType, StandardDtypeMapper};
use modelgraph::ModelError;

fn render(expr: modelgraph::expr::Expression, dialect: Dialect) -> String {
    expr.to_sql(dialect, None).unwrap()
}

#[test]
fn test_boolean_and_null_spelling() {
    for dialect in Dialect::all() {
        assert_eq!(render(lit_bool(true), dialect), "true");
        assert_eq!(render(lit_null(), dialect), "NULL");
    }
}

#[test]
fn test_date_and_timestamp_literals() {
    assert_eq!(render(lit_date("2024-02-29"), Dialect::Postgres), "'2024-02-29'::date");
    assert_eq!(render(lit_date("2024-02-29"), Dialect::BigQuery), "DATE '2024-02-29'");
    assert_eq!(render(lit_date("2024-02-29"), Dialect::DuckDb), "DATE '2024-02-29'");
    assert_eq!(
        render(lit_timestamp("2024-02-29 08:00:00"), Dialect::DuckDb),
        "TIMESTAMP '2024-02-29 08:00:00'"
    );
}

#[test]
fn test_floats() {
    assert_eq!(render(lit_float(0.1), Dialect::Postgres), "0.1");
    assert_eq!(render(lit_float(1e21), Dialect::DuckDb), "1e21");
    assert_eq!(
        render(lit_float(f64::INFINITY), Dialect::Postgres),
        "'Infinity'::double precision"
    );
    assert_eq!(
        render(lit_float(f64::NAN), Dialect::BigQuery),
        "CAST('NaN' AS FLOAT64)"
    );
}

#[test]
fn test_reserved_prefix_reported_with_rule() {
    let err = Dialect::BigQuery
        .validate_identifier("_TABLE_SUFFIX")
        .unwrap_err();
    match err {
        ModelError::UnsupportedIdentifier {
            identifier,
            dialect,
            rule,
        } => {
            assert_eq!(identifier, "_TABLE_SUFFIX");
            assert_eq!(dialect, "bigquery");
            assert!(rule.contains("_TABLE_"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_empty_identifier_rejected_everywhere() {
    for dialect in Dialect::all() {
        assert!(dialect.validate_identifier("").is_err(), "{}", dialect);
    }
}

#[test]
fn test_identifier_length_counts_bytes() {
    // 32 two-byte characters = 64 bytes
    let name = "é".repeat(32);
    assert!(Dialect::Postgres.validate_identifier(&name).is_err());
    assert!(Dialect::Postgres.validate_identifier(&"é".repeat(31)).is_ok());
}

#[test]
fn test_reinterpret_result_columns() {
    let columns = [("id", "bigint"), ("tags", "text[]"), ("paid_at", "timestamptz")];
    let result = reinterpret_columns(&StandardDtypeMapper, Dialect::Postgres, &columns).unwrap();
    let types: Vec<&SemanticType> = result.iter().map(|c| &c.semantic_type).collect();
    assert_eq!(
        types,
        vec![
            &SemanticType::Int64,
            &SemanticType::Array(Box::new(SemanticType::String)),
            &SemanticType::TimestampTz,
        ]
    );
}
