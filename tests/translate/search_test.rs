//! Integration coverage of the search translator starting from UQL text.

use mantis::translate::{to_search, SearchQuery};
use mantis::uql::parser::parse;

#[test]
fn basic_select_scenario_stays_on_sql_endpoint() {
    let q = parse(r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#).unwrap();
    let payload = to_search(&q).unwrap();
    assert_eq!(payload.index, "users");
    match &payload.query {
        SearchQuery::Sql { sql } => assert!(sql.contains("WHERE status = 'active'")),
        SearchQuery::Dsl(_) => panic!("expected sql endpoint"),
    }
    assert_eq!(payload.sort.len(), 1);
    assert!(payload.sort[0].field == "created_at" && !payload.sort[0].ascending);
    assert_eq!(payload.size, Some(5));
}

#[test]
fn not_in_precedence_scenario_preserves_operator_order_in_sql() {
    let q = parse(r#"FIND users WHERE role NOT IN ("admin","super_admin") AND status IN ("active","pending")"#)
        .unwrap();
    let payload = to_search(&q).unwrap();
    match &payload.query {
        SearchQuery::Sql { sql } => {
            assert!(sql.find("NOT IN").unwrap() < sql.find(" IN ('active'").unwrap());
        }
        SearchQuery::Dsl(_) => panic!("expected sql endpoint"),
    }
}

#[test]
fn ilike_predicate_forces_dsl_with_wildcard_clause() {
    let q = parse(r#"FIND products WHERE name ILIKE "%phone%""#).unwrap();
    let payload = to_search(&q).unwrap();
    match &payload.query {
        SearchQuery::Dsl(dsl) => assert_eq!(dsl["wildcard"]["name"]["value"], serde_json::json!("*phone*")),
        SearchQuery::Sql { .. } => panic!("expected dsl fallback"),
    }
}

#[test]
fn translator_determinism_same_aqr_same_payload() {
    let q = parse(r#"FIND orders WHERE status = "active""#).unwrap();
    assert_eq!(to_search(&q).unwrap(), to_search(&q).unwrap());
}
