use crate::helpers::logs::{capture_logs, count_level};
use crate::helpers::rows::*;
use anyhow::Result;
use rsmeta::catalog::dependency::{Dependency, extract_dependencies};
use rsmeta::catalog::table::TableRows;
use rsmeta::catalog::align_tables;
use rstest::rstest;

#[rstest]
#[case::unqualified("SELECT * FROM foo", &[("public", "foo")])]
#[case::qualified("SELECT * FROM s1.foo", &[("s1", "foo")])]
#[case::join(
    "SELECT * FROM sales.orders o JOIN sales.items i ON i.order_id = o.id",
    &[("sales", "orders"), ("sales", "items")]
)]
#[case::union(
    "SELECT id FROM a UNION ALL SELECT id FROM b.c",
    &[("public", "a"), ("b", "c")]
)]
#[case::subquery_in_where(
    "SELECT * FROM orders WHERE customer_id IN (SELECT id FROM crm.customers)",
    &[("public", "orders"), ("crm", "customers")]
)]
#[case::cte(
    "WITH totals AS (SELECT order_id, sum(amount) FROM sales.items GROUP BY 1) SELECT * FROM totals",
    &[("sales", "items")]
)]
#[case::cte_with_column_list(
    "WITH c(a, b) AS (SELECT 1, 2 FROM base_t) SELECT * FROM c",
    &[("public", "base_t")]
)]
#[case::keyword_aliases(
    "SELECT * FROM t1 source, t2 target",
    &[("public", "t1"), ("public", "t2")]
)]
#[case::keyword_alias_after_as(
    "SELECT * FROM sales.orders AS source, sales.items target WHERE 1 = 1",
    &[("sales", "orders"), ("sales", "items")]
)]
#[case::is_distinct_from(
    "SELECT * FROM a JOIN b ON a.id = b.id WHERE a.x IS DISTINCT FROM b.y",
    &[("public", "a"), ("public", "b")]
)]
#[case::is_not_distinct_from(
    "SELECT * FROM a WHERE a.x IS NOT DISTINCT FROM sales.y",
    &[("public", "a")]
)]
#[case::substring_from(
    "SELECT substring(a.s FROM b.pos) FROM a, b",
    &[("public", "a"), ("public", "b")]
)]
#[case::overlay_from(
    "SELECT overlay(name PLACING 'x' FROM 2 FOR 1) FROM crm.customers",
    &[("crm", "customers")]
)]
#[case::trim_from(
    "SELECT trim(BOTH 'x' FROM code) FROM sales.orders",
    &[("sales", "orders")]
)]
#[case::column_named_position(
    "SELECT t.position FROM sales.t",
    &[("sales", "t")]
)]
#[case::no_tables("SELECT 1", &[])]
fn test_extract_dependencies(#[case] sql: &str, #[case] expected: &[(&str, &str)]) {
    let (deps, logs) = capture_logs(|| extract_dependencies(Some(sql)));

    let expected: Vec<Dependency> = expected
        .iter()
        .map(|(schema, name)| Dependency::new(name, schema))
        .collect();
    assert_eq!(deps, expected);
    assert_eq!(count_level(&logs, "WARN"), 0);
    assert_eq!(count_level(&logs, "ERROR"), 0);
}

#[test]
fn test_three_part_identifier_warns_once() {
    let (deps, logs) = capture_logs(|| extract_dependencies(Some("SELECT * FROM a.b.c")));

    assert!(deps.is_empty());
    assert_eq!(count_level(&logs, "WARN"), 1);
    assert!(logs.contains("a.b.c"));
}

#[test]
fn test_bad_identifier_does_not_stop_extraction() {
    let (deps, logs) = capture_logs(|| {
        extract_dependencies(Some("SELECT * FROM x.y.z JOIN sales.orders o ON 1 = 1"))
    });

    assert_eq!(deps, vec![Dependency::new("orders", "sales")]);
    assert_eq!(count_level(&logs, "WARN"), 1);
}

#[rstest]
#[case::absent(None)]
#[case::empty(Some(""))]
fn test_empty_definition_is_silent(#[case] definition: Option<&str>) {
    let (deps, logs) = capture_logs(|| extract_dependencies(definition));

    assert!(deps.is_empty());
    assert!(logs.is_empty());
}

#[rstest]
#[case::unterminated_identifier("SELECT * FROM \"unterminated")]
#[case::unterminated_string("SELECT 'open FROM foo")]
fn test_malformed_sql_logs_error_and_returns_nothing(#[case] sql: &str) {
    let (deps, logs) = capture_logs(|| extract_dependencies(Some(sql)));

    assert!(deps.is_empty());
    assert_eq!(count_level(&logs, "ERROR"), 1);
    assert!(logs.contains("open") || logs.contains("unterminated"));
}

#[test]
fn test_failure_is_isolated_per_table() -> Result<()> {
    let tables = align_tables(&TableRows {
        base: vec![view_base("public", "broken"), view_base("public", "ok")],
        all: vec![
            table_all("public", "broken", Some("SELECT 'oops FROM t")),
            table_all("public", "ok", Some("SELECT * FROM sales.orders")),
        ],
        ..Default::default()
    })?;

    let (deps, logs) = capture_logs(|| {
        tables
            .iter()
            .map(|t| t.dependencies())
            .collect::<Vec<_>>()
    });

    assert!(deps[0].is_empty());
    assert_eq!(deps[1], vec![Dependency::new("orders", "sales")]);
    assert_eq!(count_level(&logs, "ERROR"), 1);

    Ok(())
}

#[test]
fn test_dependencies_recomputed_from_definition() -> Result<()> {
    let tables = align_tables(&TableRows {
        base: vec![view_base("mart", "v")],
        all: vec![table_all("mart", "v", Some("SELECT * FROM mart.base_table"))],
        ..Default::default()
    })?;

    let view = &tables[0];
    assert_eq!(view.dependencies(), view.dependencies());
    assert_eq!(view.dependencies()[0].uid(), "mart.base_table");

    Ok(())
}
