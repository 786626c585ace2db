//! AQR → document-pipeline (spec §4.3).
//!
//! The document backend (MongoDB-family) has no SQL frontend, so this
//! translator does not reuse [`crate::translate::relational::to_sql`]'s
//! *string* output — it walks the same structured [`crate::sql::query::Query`]
//! that the relational translator builds, then folds that shape into an
//! ordered aggregation pipeline. Sharing the intermediate structure (rather
//! than re-deriving a second AQR → stages mapping from scratch) is what
//! keeps join order, filter semantics, and the aggregate-compatibility rule
//! identical across both backends.

use serde_json::{json, Map, Value};

use crate::aqr::{Aqr, Condition, JoinKind, Logical, Operator};
use crate::translate::error::TranslateResult;
use crate::translate::relational::build_query;

/// A single pipeline stage: a one-entry mapping from stage name (`$match`,
/// `$lookup`, ...) to its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStage {
    pub name: String,
    pub params: Value,
}

impl DocumentStage {
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self { name: name.into(), params }
    }

    /// Render as the single-entry JSON object a document driver expects.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(self.name.clone(), self.params.clone());
        Value::Object(obj)
    }
}

/// An ordered aggregation pipeline targeting one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPipeline {
    pub collection: String,
    pub stages: Vec<DocumentStage>,
}

impl DocumentPipeline {
    pub fn to_json(&self) -> Value {
        json!({
            "collection": self.collection,
            "pipeline": self.stages.iter().map(DocumentStage::to_json).collect::<Vec<_>>(),
        })
    }
}

fn escape_regex_char(c: char, out: &mut String) {
    if matches!(c, '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\') {
        out.push('\\');
    }
    out.push(c);
}

/// Map a SQL `LIKE`/`ILIKE` pattern to a regex, anchoring whichever side
/// has no `%` (spec §4.3, open question resolved in SPEC_FULL.md §12: a
/// pattern with neither `%` becomes an exact, fully-anchored match).
fn like_pattern_to_regex(pattern: &str) -> String {
    let starts_wild = pattern.starts_with('%');
    let ends_wild = pattern.len() > 1 && pattern.ends_with('%');
    let mut body = pattern;
    if starts_wild {
        body = &body[1..];
    }
    if ends_wild && !body.is_empty() {
        body = &body[..body.len() - 1];
    }

    let mut regex = String::new();
    if !starts_wild {
        regex.push('^');
    }
    for c in body.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => escape_regex_char(other, &mut regex),
        }
    }
    if !ends_wild {
        regex.push('$');
    }
    regex
}

fn condition_clause(cond: &Condition) -> Value {
    match cond.op {
        Operator::Eq => cond.value.to_json(),
        Operator::Ne => json!({"$ne": cond.value.to_json()}),
        Operator::Lt => json!({"$lt": cond.value.to_json()}),
        Operator::Gt => json!({"$gt": cond.value.to_json()}),
        Operator::Lte => json!({"$lte": cond.value.to_json()}),
        Operator::Gte => json!({"$gte": cond.value.to_json()}),
        Operator::In => json!({"$in": cond.value.to_json()}),
        Operator::NotIn => json!({"$nin": cond.value.to_json()}),
        Operator::Like | Operator::Ilike => {
            let pattern = match &cond.value {
                crate::aqr::Value::Str(s) => s.as_str(),
                _ => "",
            };
            let regex = like_pattern_to_regex(pattern);
            if cond.op == Operator::Ilike {
                json!({"$regex": regex, "$options": "i"})
            } else {
                json!({"$regex": regex})
            }
        }
        Operator::Between => {
            let (low, high) = cond
                .value
                .as_list()
                .and_then(|items| match items {
                    [a, b] => Some((a.to_json(), b.to_json())),
                    _ => None,
                })
                .unwrap_or((Value::Null, Value::Null));
            json!({"$gte": low, "$lte": high})
        }
    }
}

/// Fold a flat, left-to-right `AND`/`OR` condition chain into a `$match`
/// filter. `OR` is treated as the outermost split (each run of `AND`-joined
/// atoms becomes one `$and` group, and the groups are combined with `$or`
/// when more than one exists) — the most common reading of a chain with no
/// explicit grouping, and the one that round-trips the common subset
/// (single-connective chains) without alteration.
fn conditions_to_match(conditions: &[Condition]) -> Value {
    let mut groups: Vec<Vec<Value>> = vec![Vec::new()];
    for (i, cond) in conditions.iter().enumerate() {
        let mut field_obj = Map::new();
        field_obj.insert(cond.field.clone(), condition_clause(cond));
        groups.last_mut().unwrap().push(Value::Object(field_obj));

        if i + 1 < conditions.len() && cond.logical == Logical::Or {
            groups.push(Vec::new());
        }
    }

    let and_groups: Vec<Value> = groups
        .into_iter()
        .map(|atoms| {
            if atoms.len() == 1 {
                atoms.into_iter().next().unwrap()
            } else {
                json!({"$and": atoms})
            }
        })
        .collect();

    if and_groups.len() == 1 {
        and_groups.into_iter().next().unwrap()
    } else {
        json!({"$or": and_groups})
    }
}

fn lookup_and_unwind(join: &crate::aqr::Join, stages: &mut Vec<DocumentStage>) -> TranslateResult<()> {
    let as_name = join.alias.clone().unwrap_or_else(|| join.table.clone());

    let (local_field, foreign_field) = match join.kind {
        // RIGHT inverts the roles: the lookup walks from the joined
        // collection's key back to this query's primary collection.
        JoinKind::Right => (join.on.right.clone(), join.on.left.clone()),
        _ => (join.on.left.clone(), join.on.right.clone()),
    };

    stages.push(DocumentStage::new(
        "$lookup",
        json!({
            "from": join.table,
            "localField": local_field,
            "foreignField": foreign_field,
            "as": as_name,
        }),
    ));

    let preserve_empty = matches!(join.kind, JoinKind::Left | JoinKind::Full);
    stages.push(DocumentStage::new(
        "$unwind",
        json!({
            "path": format!("${}", as_name),
            "preserveNullAndEmptyArrays": preserve_empty,
        }),
    ));

    Ok(())
}

/// Translate an AQR into an ordered document pipeline.
pub fn to_document(aqr: &Aqr) -> TranslateResult<DocumentPipeline> {
    tracing::debug!(table = %aqr.table, "translating AQR to document pipeline");

    let query = build_query(aqr);
    let mut stages = Vec::new();

    for join in &aqr.joins {
        lookup_and_unwind(join, &mut stages)?;
    }

    if !aqr.where_clause.is_empty() {
        stages.push(DocumentStage::new("$match", conditions_to_match(&aqr.where_clause)));
    }

    if !aqr.aggregate.is_empty() {
        let mut id = Map::new();
        for g in &aqr.group_by {
            id.insert(g.clone(), json!(format!("${}", g)));
        }
        let group_id = if id.is_empty() { Value::Null } else { Value::Object(id) };

        let mut group_params = Map::new();
        group_params.insert("_id".into(), group_id);
        for agg in &aqr.aggregate {
            let accumulator = match agg.function {
                crate::aqr::AggregateFn::Count if agg.field == "*" => json!({"$sum": 1}),
                crate::aqr::AggregateFn::Count => json!({"$sum": {"$cond": [{"$ifNull": [format!("${}", agg.field), false]}, 1, 0]}}),
                crate::aqr::AggregateFn::Sum => json!({"$sum": format!("${}", agg.field)}),
                crate::aqr::AggregateFn::Avg => json!({"$avg": format!("${}", agg.field)}),
                crate::aqr::AggregateFn::Min => json!({"$min": format!("${}", agg.field)}),
                crate::aqr::AggregateFn::Max => json!({"$max": format!("${}", agg.field)}),
            };
            group_params.insert(agg.effective_alias().to_string(), accumulator);
        }
        stages.push(DocumentStage::new("$group", Value::Object(group_params)));

        let mut project = Map::new();
        project.insert("_id".into(), json!(0));
        for g in &aqr.group_by {
            project.insert(g.clone(), json!(format!("$_id.{}", g)));
        }
        for agg in &aqr.aggregate {
            project.insert(agg.effective_alias().to_string(), json!(1));
        }
        stages.push(DocumentStage::new("$project", Value::Object(project)));

        if !aqr.having.is_empty() {
            stages.push(DocumentStage::new("$match", conditions_to_match(&aqr.having)));
        }
    } else if !aqr.fields.is_empty() {
        let mut project = Map::new();
        project.insert("_id".into(), json!(0));
        for f in &aqr.fields {
            project.insert(f.clone(), json!(1));
        }
        stages.push(DocumentStage::new("$project", Value::Object(project)));
    }

    if !query.order_by.is_empty() {
        let mut sort = Map::new();
        for ob in &query.order_by {
            let field = match &ob.expr {
                crate::sql::expr::Expr::Column { column, .. } => column.clone(),
                _ => continue,
            };
            let dir = match ob.dir {
                crate::sql::query::SortDir::Asc => 1,
                crate::sql::query::SortDir::Desc => -1,
            };
            sort.insert(field, json!(dir));
        }
        if !sort.is_empty() {
            stages.push(DocumentStage::new("$sort", Value::Object(sort)));
        }
    }

    if let Some(offset) = aqr.offset {
        stages.push(DocumentStage::new("$skip", json!(offset)));
    }
    if let Some(limit) = aqr.limit {
        stages.push(DocumentStage::new("$limit", json!(limit)));
    }

    Ok(DocumentPipeline {
        collection: aqr.table.clone(),
        stages,
    })
}
