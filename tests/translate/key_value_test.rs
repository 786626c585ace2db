//! Integration coverage of the key-value planner starting from UQL text
//! (inline tests in `src/translate/key_value.rs` exercise the AQR → plan
//! mapping directly, including the singularization heuristic).

use mantis::translate::key_value::{AddressingHint, KeyValuePlan, PlanFilter};
use mantis::translate::to_plan;
use mantis::uql::parser::parse;

#[test]
fn basic_select_scenario_matches_spec_example() {
    let q = parse(r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#).unwrap();
    let plan = to_plan(&q, AddressingHint::Unknown, false);
    assert_eq!(
        plan,
        KeyValuePlan::ScanFilter {
            pattern: "user:*".into(),
            count: 5,
            filters: vec![PlanFilter {
                field: "status".into(),
                op: mantis::aqr::Operator::Eq,
                value: mantis::aqr::Value::Str("active".into()),
            }],
        }
    );
}

#[test]
fn namespace_scan_falls_back_to_direct_get_count_when_no_limit() {
    let q = parse("FIND orders").unwrap();
    match to_plan(&q, AddressingHint::Unknown, false) {
        KeyValuePlan::NamespaceScan { pattern, count } => {
            assert_eq!(pattern, "order:*");
            assert!(count > 0);
        }
        other => panic!("expected NamespaceScan, got {other:?}"),
    }
}

#[test]
fn range_predicate_prefers_secondary_index_when_module_available() {
    let q = parse("FIND orders WHERE amount > 100 ORDER BY amount DESC LIMIT 10").unwrap();
    let plan = to_plan(&q, AddressingHint::Unknown, true);
    match plan {
        KeyValuePlan::SecondaryIndexSearch { index, expr, sort, limit } => {
            assert_eq!(index, "orders");
            assert!(expr.contains("@amount"));
            assert_eq!(sort.as_deref(), Some("amount DESC"));
            assert_eq!(limit, Some(10));
        }
        other => panic!("expected SecondaryIndexSearch, got {other:?}"),
    }
}

#[test]
fn range_predicate_without_search_module_falls_back_to_scan_filter() {
    let q = parse("FIND orders WHERE amount > 100").unwrap();
    let plan = to_plan(&q, AddressingHint::Unknown, false);
    assert!(matches!(plan, KeyValuePlan::ScanFilter { .. }));
}

#[test]
fn translator_determinism_same_aqr_same_plan() {
    let q = parse(r#"FIND users WHERE status = "active""#).unwrap();
    assert_eq!(
        to_plan(&q, AddressingHint::Unknown, false),
        to_plan(&q, AddressingHint::Unknown, false)
    );
}
