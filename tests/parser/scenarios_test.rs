//! The UQL parsing side of spec §8's concrete end-to-end scenarios, plus a
//! handful of additional surface-syntax coverage not already exercised by
//! each translator's own inline tests.

use mantis::aqr::{Direction, JoinKind, Logical, Operation, Operator, Value};
use mantis::uql::parser::parse;

#[test]
fn basic_select_scenario_parses_fields_and_order() {
    let q = parse(r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#).unwrap();
    assert_eq!(q.operation, Operation::Find);
    assert_eq!(q.table, "users");
    assert_eq!(q.where_clause.len(), 1);
    assert_eq!(q.where_clause[0].op, Operator::Eq);
    assert_eq!(q.order_by[0].direction, Direction::Desc);
    assert_eq!(q.limit, Some(5));
}

#[test]
fn projection_and_schema_qualifier_scenario() {
    let q = parse("FIND public.users (id, name) WHERE id = 1").unwrap();
    assert_eq!(q.table, "public.users");
    assert_eq!(q.fields, vec!["id".to_string(), "name".to_string()]);
}

#[test]
fn inner_join_with_alias_scenario() {
    let q = parse(r#"FIND users JOIN orders o ON users.id = o.user_id WHERE users.status = "active""#).unwrap();
    assert_eq!(q.joins.len(), 1);
    assert_eq!(q.joins[0].kind, JoinKind::Inner);
    assert_eq!(q.joins[0].alias.as_deref(), Some("o"));
    assert_eq!(q.joins[0].on.left, "users.id");
    assert_eq!(q.joins[0].on.right, "o.user_id");
}

#[test]
fn aggregation_scenario_parses_group_by_and_aggregate() {
    let q = parse("FIND orders GROUP BY status AGGREGATE count: COUNT(*), total: SUM(amount) ORDER BY total DESC")
        .unwrap();
    assert_eq!(q.group_by, vec!["status".to_string()]);
    assert_eq!(q.aggregate.len(), 2);
    assert_eq!(q.aggregate[0].alias.as_deref(), Some("count"));
    assert_eq!(q.aggregate[1].alias.as_deref(), Some("total"));
}

#[test]
fn not_in_precedence_scenario() {
    let q = parse(r#"FIND users WHERE role NOT IN ("admin","super_admin") AND status IN ("active","pending")"#)
        .unwrap();
    assert_eq!(q.where_clause[0].op, Operator::NotIn);
    assert_eq!(q.where_clause[1].op, Operator::In);
    assert_eq!(q.where_clause[0].logical, Logical::And);

    let Value::List(roles) = &q.where_clause[0].value else { panic!("expected list") };
    assert_eq!(roles.len(), 2);
}

#[test]
fn between_parses_a_two_element_bound() {
    let q = parse("FIND orders WHERE amount BETWEEN 10 AND 100").unwrap();
    assert_eq!(q.where_clause[0].op, Operator::Between);
    let Value::List(bounds) = &q.where_clause[0].value else { panic!("expected list") };
    assert_eq!(bounds, &vec![Value::Int(10), Value::Int(100)]);
}

#[test]
fn empty_query_is_rejected() {
    assert!(parse("").is_err());
    assert!(parse("   ").is_err());
}

#[test]
fn unterminated_string_literal_is_a_lexical_error() {
    assert!(parse(r#"FIND users WHERE name = "jo"#).is_err());
}
