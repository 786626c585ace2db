//! Integration coverage of the relational translator against spec §8's
//! concrete end-to-end scenarios and cross-module invariants (inline unit
//! tests in `src/translate/relational.rs` cover the translator in
//! isolation; this file exercises it the way a host would, starting from
//! UQL text).

use mantis::translate::to_sql;
use mantis::uql::parser::parse;

#[test]
fn not_in_precedence_scenario_renders_both_operators_in_order() {
    let q = parse(r#"FIND users WHERE role NOT IN ("admin","super_admin") AND status IN ("active","pending")"#)
        .unwrap();
    let sql = to_sql(&q);
    assert!(sql.contains("role NOT IN ('admin','super_admin')"));
    assert!(sql.contains("status IN ('active','pending')"));
    assert!(sql.find("NOT IN").unwrap() < sql.find(" IN ('active'").unwrap());
}

#[test]
fn projection_fidelity_preserves_field_order() {
    let q = parse("FIND users (name, id, email) WHERE id = 1").unwrap();
    let sql = to_sql(&q);
    let select_clause = sql.split("FROM").next().unwrap();
    assert!(select_clause.contains("name, id, email"));
}

#[test]
fn order_preservation_across_joins_where_and_order_by() {
    let q = parse(
        r#"FIND users JOIN orders o ON users.id = o.user_id WHERE users.status = "active" AND o.total > 10 ORDER BY o.total DESC, users.id ASC"#,
    )
    .unwrap();
    let sql = to_sql(&q);
    assert!(sql.find("JOIN").unwrap() < sql.find("WHERE").unwrap());
    assert!(sql.find("WHERE").unwrap() < sql.find("ORDER BY").unwrap());
    assert!(sql.find("o.total DESC").unwrap() < sql.find("users.id ASC").unwrap());
}

#[test]
fn aggregate_compatibility_rule_drops_order_by_items_outside_group_by_or_aggregate() {
    let q = parse("FIND orders GROUP BY status AGGREGATE total: SUM(amount) ORDER BY notes ASC, total DESC").unwrap();
    let sql = to_sql(&q);
    assert!(!sql.contains("notes"));
    assert!(sql.contains("ORDER BY SUM(amount) DESC"));
}

#[test]
fn between_renders_as_inclusive_range() {
    let q = parse("FIND orders WHERE amount BETWEEN 10 AND 100").unwrap();
    assert_eq!(to_sql(&q), "SELECT * FROM orders WHERE amount BETWEEN 10 AND 100");
}

#[test]
fn no_trailing_semicolon() {
    let q = parse("FIND users").unwrap();
    assert!(!to_sql(&q).ends_with(';'));
}

#[test]
fn translator_determinism_same_aqr_same_sql() {
    let q = parse(r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#).unwrap();
    assert_eq!(to_sql(&q), to_sql(&q));
}
