//! Integration coverage of the wide-column translator, including spec §8's
//! "wide-column unsupported construct" scenario and the key-discipline
//! invariant, starting from UQL text.

use mantis::registry::{SecondaryIndex, WideColumnSchema};
use mantis::translate::error::TranslateError;
use mantis::translate::to_wide_column;
use mantis::uql::parser::parse;

fn schema() -> WideColumnSchema {
    WideColumnSchema::new("user_id").with_sort_key("created_at")
}

#[test]
fn wide_column_unsupported_construct_scenario() {
    let q = parse("FIND products GROUP BY category AGGREGATE COUNT(*)").unwrap();
    let err = to_wide_column(&q, &schema()).unwrap_err();
    assert!(matches!(
        err,
        TranslateError::UnsupportedForBackend { construct, backend }
            if construct == "aggregate" && backend == "wide_column"
    ));
}

#[test]
fn wide_column_key_discipline_partition_key_referenced_exactly_once() {
    let q = parse(r#"FIND users WHERE user_id = "u1" AND status = "active" AND status = "pending""#).unwrap();
    let plan = to_wide_column(&q, &schema()).unwrap();
    assert_eq!(plan.statement.matches("user_id").count(), 1);
}

#[test]
fn secondary_index_target_renders_qualified_from_clause() {
    let schema = WideColumnSchema::new("user_id")
        .with_sort_key("created_at")
        .with_index(SecondaryIndex { name: "by_status".into(), partition_key: "status".into(), sort_key: None });
    let mut q = parse(r#"FIND users WHERE status = "active""#).unwrap();
    q.sub_table = Some("by_status".into());
    let plan = to_wide_column(&q, &schema).unwrap();
    assert!(plan.statement.contains(r#"FROM "users"."by_status""#));
}

#[test]
fn translator_determinism_same_aqr_same_plan() {
    let q = parse(r#"FIND users WHERE user_id = "u1""#).unwrap();
    assert_eq!(to_wide_column(&q, &schema()).unwrap(), to_wide_column(&q, &schema()).unwrap());
}
