//! Parser determinism (spec §8): whitespace and line breaks between tokens
//! must never change the parsed result.

use mantis::uql::parser::parse;

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn extra_whitespace_does_not_change_the_parsed_tree() {
    let tight = r#"FIND users WHERE status = "active" ORDER BY created_at DESC LIMIT 5"#;
    let loose = "FIND   users\nWHERE   status = \"active\"\n  ORDER BY created_at   DESC\nLIMIT 5";

    assert_eq!(normalize_whitespace(loose), tight);
    assert_eq!(parse(tight).unwrap(), parse(loose).unwrap());
}

#[test]
fn line_breaks_between_sections_are_insignificant() {
    let one_line = r#"FIND orders GROUP BY status AGGREGATE count: COUNT(*), total: SUM(amount) ORDER BY total DESC"#;
    let multi_line = "FIND orders\nGROUP BY status\nAGGREGATE count: COUNT(*), total: SUM(amount)\nORDER BY total DESC";

    assert_eq!(parse(one_line).unwrap(), parse(multi_line).unwrap());
}

#[test]
fn repeated_parse_of_the_same_string_is_idempotent() {
    let query = r#"FIND users JOIN orders o ON users.id = o.user_id WHERE users.status = "active""#;
    let first = parse(query).unwrap();
    let second = parse(query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn join_phrase_variants_agree_up_to_whitespace() {
    let tight = r#"FIND users LEFT JOIN orders o ON users.id = o.user_id"#;
    let loose = "FIND users\n  LEFT JOIN orders o\n  ON users.id = o.user_id";
    assert_eq!(parse(tight).unwrap(), parse(loose).unwrap());
}
