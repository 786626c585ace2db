//! Integration coverage of the document translator starting from UQL text
//! (inline tests in `src/translate/document.rs` exercise the AQR → pipeline
//! mapping directly).

use mantis::translate::to_document;
use mantis::uql::parser::parse;

#[test]
fn basic_select_scenario_becomes_a_match_stage() {
    let q = parse(r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#).unwrap();
    let pipeline = to_document(&q).unwrap();
    assert_eq!(pipeline.collection, "users");
    let stage_names: Vec<&str> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
    assert!(stage_names.contains(&"$match"));
    assert!(stage_names.contains(&"$sort"));
    assert!(stage_names.contains(&"$limit"));
}

#[test]
fn not_in_precedence_scenario_produces_nin_and_in_clauses() {
    let q = parse(r#"FIND users WHERE role NOT IN ("admin","super_admin") AND status IN ("active","pending")"#)
        .unwrap();
    let pipeline = to_document(&q).unwrap();
    let match_stage = pipeline.stages.iter().find(|s| s.name == "$match").unwrap();
    let filter = &match_stage.params;
    let and_clauses = filter["$and"].as_array().expect("single AND-connected group");
    assert!(and_clauses[0]["role"]["$nin"].is_array());
    assert!(and_clauses[1]["status"]["$in"].is_array());
}

#[test]
fn aggregation_scenario_becomes_group_then_project() {
    let q = parse("FIND orders GROUP BY status AGGREGATE count: COUNT(*), total: SUM(amount) ORDER BY total DESC")
        .unwrap();
    let pipeline = to_document(&q).unwrap();
    let stage_names: Vec<&str> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
    assert!(stage_names.contains(&"$group"));
    let group_pos = stage_names.iter().position(|s| *s == "$group").unwrap();
    if let Some(project_pos) = stage_names.iter().position(|s| *s == "$project") {
        assert!(group_pos < project_pos);
    }
}

#[test]
fn translator_determinism_same_aqr_same_pipeline() {
    let q = parse(r#"FIND users WHERE status = "active""#).unwrap();
    assert_eq!(to_document(&q).unwrap(), to_document(&q).unwrap());
}
