//! Turns a flat token stream into sections, then sections into an [`Aqr`].
//!
//! The surface syntax has no grammar in the parser-combinator sense: each
//! section is introduced by a fixed keyword (or keyword phrase, for joins)
//! and runs until the next one. This module first carves the token stream
//! into sections, then interprets each section body independently.

use super::error::{ParseError, ParseResult};
use super::lexer::{tokenize, LexToken};
use crate::aqr::{
    Aggregate, AggregateFn, Aqr, Condition, Direction, Join, JoinKind, JoinOn, Logical, Operation,
    Operator, Order, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Find,
    Fields,
    Where,
    Join(JoinKind),
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Aggregate,
}

impl SectionKind {
    fn label(&self) -> &'static str {
        match self {
            SectionKind::Find => "FIND",
            SectionKind::Fields => "FIELDS",
            SectionKind::Where => "WHERE",
            SectionKind::Join(_) => "JOIN",
            SectionKind::GroupBy => "GROUP BY",
            SectionKind::Having => "HAVING",
            SectionKind::OrderBy => "ORDER BY",
            SectionKind::Limit => "LIMIT",
            SectionKind::Offset => "OFFSET",
            SectionKind::Aggregate => "AGGREGATE",
        }
    }
}

struct Section {
    kind: SectionKind,
    tokens: Vec<LexToken>,
}

enum ProjectionItem {
    Field(String),
    Agg(Aggregate),
}

/// Try to match a section-starting keyword (or phrase) at `tokens[i]`.
/// Returns the section kind and how many tokens the keyword consumed.
fn match_section_start(tokens: &[LexToken], i: usize) -> Option<(SectionKind, usize)> {
    let at = |k: usize| tokens.get(i + k);
    let word = |k: usize, s: &str| at(k).map(|t| t.eq_ignore_case(s)).unwrap_or(false);

    if word(0, "FIND") {
        return Some((SectionKind::Find, 1));
    }
    if word(0, "FIELDS") {
        return Some((SectionKind::Fields, 1));
    }
    if word(0, "WHERE") {
        return Some((SectionKind::Where, 1));
    }
    if word(0, "HAVING") {
        return Some((SectionKind::Having, 1));
    }
    if word(0, "GROUP") && word(1, "BY") {
        return Some((SectionKind::GroupBy, 2));
    }
    if word(0, "ORDER") && word(1, "BY") {
        return Some((SectionKind::OrderBy, 2));
    }
    if word(0, "LIMIT") {
        return Some((SectionKind::Limit, 1));
    }
    if word(0, "OFFSET") {
        return Some((SectionKind::Offset, 1));
    }
    if word(0, "AGGREGATE") {
        return Some((SectionKind::Aggregate, 1));
    }
    if word(0, "FULL") && word(1, "OUTER") && word(2, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Full), 3));
    }
    if word(0, "FULL") && word(1, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Full), 2));
    }
    if word(0, "INNER") && word(1, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Inner), 2));
    }
    if word(0, "LEFT") && word(1, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Left), 2));
    }
    if word(0, "RIGHT") && word(1, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Right), 2));
    }
    if word(0, "JOIN") {
        return Some((SectionKind::Join(JoinKind::Inner), 1));
    }
    None
}

fn split_sections(tokens: &[LexToken]) -> ParseResult<Vec<Section>> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyQuery);
    }
    let (first_kind, consumed) = match match_section_start(tokens, 0) {
        Some((SectionKind::Find, n)) => (SectionKind::Find, n),
        _ => return Err(ParseError::MissingEntryOperation),
    };

    let mut sections = Vec::new();
    let mut current_kind = first_kind;
    let mut current_start = consumed;
    let mut i = consumed;

    while i < tokens.len() {
        if let Some((kind, n)) = match_section_start(tokens, i) {
            sections.push(Section {
                kind: current_kind,
                tokens: tokens[current_start..i].to_vec(),
            });
            current_kind = kind;
            i += n;
            current_start = i;
        } else {
            i += 1;
        }
    }
    sections.push(Section {
        kind: current_kind,
        tokens: tokens[current_start..i].to_vec(),
    });

    Ok(sections)
}

fn check_multiplicities(sections: &[Section]) -> ParseResult<()> {
    use std::collections::HashMap;
    let mut seen: HashMap<&'static str, u32> = HashMap::new();
    for section in sections {
        if matches!(section.kind, SectionKind::Join(_)) {
            continue;
        }
        let label = section.kind.label();
        let count = seen.entry(label).or_insert(0);
        *count += 1;
        if *count > 1 {
            return Err(ParseError::DuplicateSection {
                section: label.to_string(),
            });
        }
    }
    Ok(())
}

/// Split a token slice on top-level commas, respecting paren nesting.
fn split_by_commas(tokens: &[LexToken]) -> Vec<Vec<LexToken>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0i32;
    for tok in tokens {
        match tok.text.as_str() {
            "(" if !tok.quoted => {
                depth += 1;
                current.push(tok.clone());
            }
            ")" if !tok.quoted => {
                depth -= 1;
                current.push(tok.clone());
            }
            "," if !tok.quoted && depth == 0 => {
                groups.push(std::mem::take(&mut current));
            }
            _ => current.push(tok.clone()),
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

fn parse_scalar(tok: &LexToken) -> Value {
    if tok.quoted {
        return Value::Str(tok.text.clone());
    }
    if let Ok(n) = tok.text.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(f) = tok.text.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    if tok.text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if tok.text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Str(tok.text.clone())
}

/// `IN`/`NOT IN` accept either a parenthesized or bracketed list (spec
/// §4.1/§4.4: "a bracketed or parenthesized list of scalars"). The opening
/// delimiter picks which closing delimiter is required; the two styles are
/// never mixed within one list.
fn parse_list_value(tokens: &[LexToken], i: usize) -> ParseResult<(Value, usize)> {
    let open = tokens.get(i);
    let close = match open.map(|t| t.text.as_str()) {
        Some("(") => ")",
        Some("[") => "]",
        _ => {
            return Err(ParseError::UnexpectedToken {
                position: open.map(|t| t.pos).unwrap_or(0),
                expected: "( or [".into(),
                found: open.map(|t| t.text.clone()).unwrap_or_else(|| "end of input".into()),
            });
        }
    };
    let open_text = &open.unwrap().text;
    let mut depth = 1;
    let mut j = i + 1;
    let start = j;
    while j < tokens.len() && depth > 0 {
        let text = tokens[j].text.as_str();
        if !tokens[j].quoted && text == open_text.as_str() {
            depth += 1;
        } else if !tokens[j].quoted && text == close {
            depth -= 1;
            if depth == 0 {
                break;
            }
        }
        j += 1;
    }
    if depth != 0 {
        return Err(ParseError::UnexpectedToken {
            position: tokens[i].pos,
            expected: close.into(),
            found: "end of input".into(),
        });
    }
    let inner = &tokens[start..j];
    let values = split_by_commas(inner)
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| parse_scalar(&g[0]))
        .collect();
    Ok((Value::List(values), j + 1))
}

fn need(tokens: &[LexToken], i: usize, expected: &str) -> ParseResult<&LexToken> {
    tokens.get(i).ok_or_else(|| ParseError::UnexpectedToken {
        position: tokens.last().map(|t| t.pos).unwrap_or(0),
        expected: expected.into(),
        found: "end of input".into(),
    })
}

fn parse_atom(tokens: &[LexToken], mut i: usize) -> ParseResult<(String, Operator, Value, usize)> {
    let field = need(tokens, i, "field name")?.text.clone();
    i += 1;

    if tokens.get(i).map(|t| t.eq_ignore_case("NOT")).unwrap_or(false)
        && tokens.get(i + 1).map(|t| t.eq_ignore_case("IN")).unwrap_or(false)
    {
        i += 2;
        let (val, ni) = parse_list_value(tokens, i)?;
        return Ok((field, Operator::NotIn, val, ni));
    }
    if tokens.get(i).map(|t| t.eq_ignore_case("IN")).unwrap_or(false) {
        i += 1;
        let (val, ni) = parse_list_value(tokens, i)?;
        return Ok((field, Operator::In, val, ni));
    }
    if tokens.get(i).map(|t| t.eq_ignore_case("BETWEEN")).unwrap_or(false) {
        i += 1;
        let low = parse_scalar(need(tokens, i, "lower bound")?);
        i += 1;
        if !tokens.get(i).map(|t| t.eq_ignore_case("AND")).unwrap_or(false) {
            return Err(ParseError::LiteralError {
                text: format!("{field} BETWEEN ... (missing AND)"),
            });
        }
        i += 1;
        let high = parse_scalar(need(tokens, i, "upper bound")?);
        i += 1;
        return Ok((field, Operator::Between, Value::List(vec![low, high]), i));
    }
    if tokens.get(i).map(|t| t.eq_ignore_case("ILIKE")).unwrap_or(false) {
        i += 1;
        let v = parse_scalar(need(tokens, i, "pattern")?);
        i += 1;
        return Ok((field, Operator::Ilike, v, i));
    }
    if tokens.get(i).map(|t| t.eq_ignore_case("LIKE")).unwrap_or(false) {
        i += 1;
        let v = parse_scalar(need(tokens, i, "pattern")?);
        i += 1;
        return Ok((field, Operator::Like, v, i));
    }

    let op_tok = need(tokens, i, "comparison operator")?;
    let op = match op_tok.text.as_str() {
        ">=" => Operator::Gte,
        "<=" => Operator::Lte,
        "!=" => Operator::Ne,
        "=" => Operator::Eq,
        "<" => Operator::Lt,
        ">" => Operator::Gt,
        other => return Err(ParseError::UnknownOperator { text: other.to_string() }),
    };
    i += 1;
    let value = parse_scalar(need(tokens, i, "value")?);
    i += 1;
    Ok((field, op, value, i))
}

fn parse_conditions(tokens: &[LexToken]) -> ParseResult<Vec<Condition>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut conditions = Vec::new();
    let mut i = 0;
    loop {
        let (field, op, value, ni) = parse_atom(tokens, i)?;
        i = ni;
        if i < tokens.len() {
            let logical = if tokens[i].eq_ignore_case("AND") {
                Logical::And
            } else if tokens[i].eq_ignore_case("OR") {
                Logical::Or
            } else {
                return Err(ParseError::UnexpectedToken {
                    position: tokens[i].pos,
                    expected: "AND or OR".into(),
                    found: tokens[i].text.clone(),
                });
            };
            i += 1;
            conditions.push(Condition { field, op, value, logical });
        } else {
            conditions.push(Condition {
                field,
                op,
                value,
                logical: Logical::And,
            });
            break;
        }
    }
    Ok(conditions)
}

fn parse_projection_item(tokens: &[LexToken]) -> ParseResult<ProjectionItem> {
    if tokens.is_empty() {
        return Err(ParseError::LiteralError { text: String::new() });
    }

    // alias : FUNC ( field )
    if tokens.len() >= 6 && tokens[1].text == ":" {
        if let Some(func) = AggregateFn::from_name(&tokens[2].text) {
            if tokens[3].text == "(" && tokens[5].text == ")" {
                return Ok(ProjectionItem::Agg(Aggregate {
                    function: func,
                    field: tokens[4].text.clone(),
                    alias: Some(tokens[0].text.clone()),
                }));
            }
        }
    }

    // FUNC ( field ) [AS alias]
    if tokens.len() >= 4 {
        if let Some(func) = AggregateFn::from_name(&tokens[0].text) {
            if tokens[1].text == "(" && tokens[3].text == ")" {
                let alias = if tokens.len() >= 6 && tokens[4].eq_ignore_case("AS") {
                    Some(tokens[5].text.clone())
                } else {
                    None
                };
                return Ok(ProjectionItem::Agg(Aggregate {
                    function: func,
                    field: tokens[2].text.clone(),
                    alias,
                }));
            }
        }
    }

    if tokens.len() == 1 && !tokens[0].quoted {
        return Ok(ProjectionItem::Field(tokens[0].text.clone()));
    }

    Err(ParseError::LiteralError {
        text: tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" "),
    })
}

fn apply_projection_items(tokens: &[LexToken], q: &mut Aqr) -> ParseResult<()> {
    for group in split_by_commas(tokens) {
        match parse_projection_item(&group)? {
            ProjectionItem::Field(name) => q.fields.push(name),
            ProjectionItem::Agg(agg) => q.aggregate.push(agg),
        }
    }
    Ok(())
}

fn apply_aggregate_section(tokens: &[LexToken], q: &mut Aqr) -> ParseResult<()> {
    for group in split_by_commas(tokens) {
        match parse_projection_item(&group)? {
            ProjectionItem::Agg(agg) => q.aggregate.push(agg),
            ProjectionItem::Field(name) => {
                return Err(ParseError::LiteralError {
                    text: format!("'{name}' in AGGREGATE section is not an aggregate expression"),
                })
            }
        }
    }
    Ok(())
}

fn parse_join(kind: JoinKind, tokens: &[LexToken]) -> ParseResult<Join> {
    if tokens.is_empty() {
        return Err(ParseError::MalformedJoin {
            reason: "missing join table".into(),
        });
    }
    let table = tokens[0].text.clone();
    let mut i = 1;
    let mut alias = None;
    if i < tokens.len() && !tokens[i].eq_ignore_case("ON") {
        alias = Some(tokens[i].text.clone());
        i += 1;
    }
    if i >= tokens.len() || !tokens[i].eq_ignore_case("ON") {
        return Err(ParseError::MalformedJoin {
            reason: "missing ON clause".into(),
        });
    }
    i += 1;
    let left = tokens
        .get(i)
        .ok_or_else(|| ParseError::MalformedJoin {
            reason: "missing left side of join condition".into(),
        })?
        .text
        .clone();
    i += 1;
    let op_tok = tokens.get(i).ok_or_else(|| ParseError::MalformedJoin {
        reason: "missing join operator".into(),
    })?;
    if op_tok.text != "=" {
        return Err(ParseError::MalformedJoin {
            reason: format!("unsupported join operator '{}'", op_tok.text),
        });
    }
    i += 1;
    let right = tokens
        .get(i)
        .ok_or_else(|| ParseError::MalformedJoin {
            reason: "missing right side of join condition".into(),
        })?
        .text
        .clone();
    Ok(Join {
        kind,
        table,
        alias,
        on: JoinOn { left, right },
    })
}

/// Parse a UQL query string into an abstract query representation.
///
/// The resulting tree is validated before it is returned: a structurally
/// unsound query (an empty table, a list value on a scalar operator, `*`
/// outside of `COUNT`) surfaces as [`ParseError::SchemaError`] rather than
/// silently reaching a translator.
pub fn parse(src: &str) -> ParseResult<Aqr> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyQuery);
    }
    let sections = split_sections(&tokens)?;
    check_multiplicities(&sections)?;

    let mut aqr: Option<Aqr> = None;

    for section in &sections {
        match section.kind {
            SectionKind::Find => {
                let body = &section.tokens;
                if body.is_empty() {
                    return Err(ParseError::MissingEntryOperation);
                }
                let ident = body[0].text.clone();
                let mut q = if let Some((sub, table)) = ident.split_once('.') {
                    let mut q = Aqr::new(Operation::Find, table);
                    q.sub_table = Some(sub.to_string());
                    q
                } else {
                    Aqr::new(Operation::Find, ident)
                };
                if body.len() > 1 {
                    if body[1].text == "(" && body.last().map(|t| t.text.as_str()) == Some(")") {
                        let inner = &body[2..body.len() - 1];
                        apply_projection_items(inner, &mut q)?;
                    } else {
                        return Err(ParseError::LiteralError {
                            text: body[1].text.clone(),
                        });
                    }
                }
                aqr = Some(q);
            }
            SectionKind::Fields => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                apply_projection_items(&section.tokens, q)?;
            }
            SectionKind::Where => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                q.where_clause = parse_conditions(&section.tokens)?;
            }
            SectionKind::Having => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                q.having = parse_conditions(&section.tokens)?;
            }
            SectionKind::Join(kind) => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                q.joins.push(parse_join(kind, &section.tokens)?);
            }
            SectionKind::GroupBy => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                for group in split_by_commas(&section.tokens) {
                    if let Some(tok) = group.first() {
                        q.group_by.push(tok.text.clone());
                    }
                }
            }
            SectionKind::OrderBy => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                for group in split_by_commas(&section.tokens) {
                    if group.is_empty() {
                        continue;
                    }
                    let field = group[0].text.clone();
                    let direction = if group.len() > 1 && group[1].eq_ignore_case("DESC") {
                        Direction::Desc
                    } else {
                        Direction::Asc
                    };
                    q.order_by.push(Order { field, direction });
                }
            }
            SectionKind::Limit => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                let tok = need(&section.tokens, 0, "integer")?;
                q.limit = Some(tok.text.parse::<u64>().map_err(|_| ParseError::LiteralError {
                    text: tok.text.clone(),
                })?);
            }
            SectionKind::Offset => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                let tok = need(&section.tokens, 0, "integer")?;
                q.offset = Some(tok.text.parse::<u64>().map_err(|_| ParseError::LiteralError {
                    text: tok.text.clone(),
                })?);
            }
            SectionKind::Aggregate => {
                let q = aqr.as_mut().ok_or(ParseError::MissingEntryOperation)?;
                apply_aggregate_section(&section.tokens, q)?;
            }
        }
    }

    let aqr = aqr.ok_or(ParseError::MissingEntryOperation)?;

    let result = crate::aqr::validate(&aqr);
    if !result.valid {
        let first = &result.errors[0];
        return Err(ParseError::SchemaError {
            path: first.path.clone(),
            message: first.message.clone(),
        });
    }

    Ok(aqr)
}
