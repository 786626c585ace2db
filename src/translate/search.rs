//! AQR → search payload (spec §4.4).
//!
//! Most of what the AQR can express maps onto Elasticsearch/OpenSearch's SQL
//! endpoint unchanged, so the default path simply hands the relational
//! translator's [`crate::sql::query::Query`] to [`crate::sql::query::Query::to_sql`]
//! and wraps it. Two things that SQL endpoint can't or shouldn't carry are
//! pulled out explicitly: pagination (the endpoint has no `OFFSET`, so
//! `from`/`size` travel as payload fields instead of inline `LIMIT`/`OFFSET`)
//! and `ILIKE`, which has no SQL-endpoint equivalent and forces the whole
//! query onto the native query-DSL path instead.

use serde_json::{json, Value};

use crate::aqr::{Aqr, Condition, Logical, Operator};
use crate::translate::error::{TranslateError, TranslateResult};
use crate::translate::relational::build_query;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    /// Posted to the `_sql` endpoint verbatim.
    Sql { sql: String },
    /// A native query-DSL tree, used when a construct (currently: `ILIKE`)
    /// has no SQL-endpoint equivalent.
    Dsl(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSort {
    pub field: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPayload {
    pub index: String,
    pub query: SearchQuery,
    pub sort: Vec<SearchSort>,
    pub from: Option<u64>,
    pub size: Option<u64>,
}

impl SearchPayload {
    pub fn to_json(&self) -> Value {
        let query = match &self.query {
            SearchQuery::Sql { sql } => json!({"sql": sql}),
            SearchQuery::Dsl(dsl) => dsl.clone(),
        };
        json!({
            "index": self.index,
            "query": query,
            "sort": self.sort.iter().map(|s| json!({s.field.clone(): if s.ascending {"asc"} else {"desc"}})).collect::<Vec<_>>(),
            "from": self.from,
            "size": self.size,
        })
    }
}

fn needs_dsl(conditions: &[Condition]) -> bool {
    conditions.iter().any(|c| c.op == Operator::Ilike)
}

fn condition_clause(cond: &Condition) -> Value {
    match cond.op {
        Operator::Eq => json!({"term": {cond.field.clone(): cond.value.to_json()}}),
        Operator::Ne => json!({"bool": {"must_not": [{"term": {cond.field.clone(): cond.value.to_json()}}]}}),
        Operator::Lt => json!({"range": {cond.field.clone(): {"lt": cond.value.to_json()}}}),
        Operator::Gt => json!({"range": {cond.field.clone(): {"gt": cond.value.to_json()}}}),
        Operator::Lte => json!({"range": {cond.field.clone(): {"lte": cond.value.to_json()}}}),
        Operator::Gte => json!({"range": {cond.field.clone(): {"gte": cond.value.to_json()}}}),
        Operator::In => json!({"terms": {cond.field.clone(): cond.value.to_json()}}),
        Operator::NotIn => json!({"bool": {"must_not": [{"terms": {cond.field.clone(): cond.value.to_json()}}]}}),
        Operator::Like | Operator::Ilike => {
            let pattern = match &cond.value {
                crate::aqr::Value::Str(s) => s.replace('%', "*").replace('_', "?"),
                _ => String::new(),
            };
            json!({"wildcard": {cond.field.clone(): {"value": pattern, "case_insensitive": cond.op == Operator::Ilike}}})
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
            json!({"range": {cond.field.clone(): {"gte": low, "lte": high}}})
        }
    }
}

/// Fold a flat `AND`/`OR` chain into a `bool` query, same left-to-right
/// grouping rule (`OR` splits, `AND` groups within a split) used by the
/// document translator's `$match` construction.
fn conditions_to_dsl(conditions: &[Condition]) -> Value {
    let mut groups: Vec<Vec<Value>> = vec![Vec::new()];
    for (i, cond) in conditions.iter().enumerate() {
        groups.last_mut().unwrap().push(condition_clause(cond));
        if i + 1 < conditions.len() && cond.logical == Logical::Or {
            groups.push(Vec::new());
        }
    }

    let rendered: Vec<Value> = groups
        .into_iter()
        .map(|clauses| {
            if clauses.len() == 1 {
                clauses.into_iter().next().unwrap()
            } else {
                json!({"bool": {"must": clauses}})
            }
        })
        .collect();

    if rendered.len() == 1 {
        rendered.into_iter().next().unwrap()
    } else {
        json!({"bool": {"should": rendered, "minimum_should_match": 1}})
    }
}

/// Translate an AQR into a search payload.
///
/// Joins have no representation on either the SQL endpoint or the query DSL
/// for this backend family and are rejected outright rather than silently
/// dropped.
pub fn to_search(aqr: &Aqr) -> TranslateResult<SearchPayload> {
    tracing::debug!(table = %aqr.table, "translating AQR to search payload");

    if let Some(join) = aqr.joins.first() {
        return Err(TranslateError::UnsupportedForBackend {
            construct: format!("JOIN {}", join.table),
            backend: "search".to_string(),
        });
    }

    let sort = aqr
        .order_by
        .iter()
        .map(|o| SearchSort {
            field: o.field.clone(),
            ascending: o.direction == crate::aqr::Direction::Asc,
        })
        .collect();

    let use_dsl = aqr.aggregate.is_empty() && (needs_dsl(&aqr.where_clause) || needs_dsl(&aqr.having));

    let query = if use_dsl {
        SearchQuery::Dsl(conditions_to_dsl(&aqr.where_clause))
    } else {
        let mut query = build_query(aqr);
        query.limit = None;
        query.offset = None;
        SearchQuery::Sql { sql: query.to_sql() }
    };

    Ok(SearchPayload {
        index: aqr.table.clone(),
        query,
        sort,
        from: aqr.offset,
        size: aqr.limit,
    })
}
