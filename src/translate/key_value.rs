//! AQR → key-value command plan (spec §4.6).
//!
//! Unlike the other translators this one never fails: every AQR resolves to
//! some plan, falling back to `DirectGet(table)` when nothing more specific
//! applies (spec §4.6, last line).

use crate::aqr::{Aqr, Condition, Direction, Operator};

/// Whether the host already knows the addressed key is a hash. The core
/// never talks to the backend itself, so it cannot discover this on its
/// own — spec §4.6 leaves the mechanism open, and this is the narrow,
/// explicit extension point this crate adds: a hint the host supplies from
/// whatever it already knows about the key (schema, prior reads, naming
/// convention), never a network probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingHint {
    #[default]
    Unknown,
    Hash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanFilter {
    pub field: String,
    pub op: Operator,
    pub value: crate::aqr::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyValuePlan {
    DirectGet { key: String },
    HashGetAll { key: String },
    NamespaceScan { pattern: String, count: u64 },
    ScanFilter { pattern: String, count: u64, filters: Vec<PlanFilter> },
    SecondaryIndexSearch { index: String, expr: String, sort: Option<String>, limit: Option<u64> },
}

const DEFAULT_SCAN_COUNT: u64 = 100;

/// `ies → y`, trailing `es` removed (`-ses → -s`), trailing `s` removed,
/// else unchanged. Deliberately narrow and deterministic (spec §9): hosts
/// needing different naming pre-process `table` themselves.
fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = name.strip_suffix("ses") {
        return format!("{stem}s");
    }
    if let Some(stem) = name.strip_suffix('s') {
        return stem.to_string();
    }
    name.to_string()
}

fn namespace_pattern(table: &str) -> String {
    format!("{}:*", singularize(table))
}

fn condition_expr_syntax(cond: &Condition) -> String {
    let value = match &cond.value {
        crate::aqr::Value::Str(s) => format!("\"{s}\""),
        crate::aqr::Value::Int(n) => n.to_string(),
        crate::aqr::Value::Float(f) => f.to_string(),
        crate::aqr::Value::Bool(b) => b.to_string(),
        crate::aqr::Value::List(_) => String::new(),
    };
    match cond.op {
        Operator::Like | Operator::Ilike => format!("@{} {}", cond.field, value),
        Operator::Gt => format!("@{}:[({} +inf]", cond.field, value),
        Operator::Gte => format!("@{}:[{} +inf]", cond.field, value),
        Operator::Lt => format!("@{}:[-inf ({}]", cond.field, value),
        Operator::Lte => format!("@{}:[-inf {}]", cond.field, value),
        _ => format!("@{}:{}", cond.field, value),
    }
}

fn search_eligible(aqr: &Aqr) -> bool {
    aqr.where_clause.iter().any(|c| {
        matches!(
            c.op,
            Operator::Like | Operator::Ilike | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte
        )
    })
}

/// Translate an AQR into a key-value command plan.
///
/// `search_module_available` stands in for the spec's "backend advertises a
/// search module" — a fact about the registered connection, not the AQR;
/// the host passes it in rather than this crate guessing at backend
/// capabilities.
pub fn to_plan(aqr: &Aqr, hint: AddressingHint, search_module_available: bool) -> KeyValuePlan {
    tracing::debug!(table = %aqr.table, "translating AQR to key-value plan");

    let is_concrete_key = aqr.table.contains(':');

    if is_concrete_key && aqr.where_clause.is_empty() {
        return match hint {
            AddressingHint::Hash => KeyValuePlan::HashGetAll { key: aqr.table.clone() },
            AddressingHint::Unknown => KeyValuePlan::DirectGet { key: aqr.table.clone() },
        };
    }

    if !is_concrete_key && aqr.where_clause.is_empty() {
        return KeyValuePlan::NamespaceScan {
            pattern: namespace_pattern(&aqr.table),
            count: aqr.limit.unwrap_or(DEFAULT_SCAN_COUNT),
        };
    }

    if search_module_available && search_eligible(aqr) {
        let expr = aqr
            .where_clause
            .iter()
            .map(condition_expr_syntax)
            .collect::<Vec<_>>()
            .join(" ");
        let sort = aqr.order_by.first().map(|o| {
            let dir = match o.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {}", o.field, dir)
        });
        return KeyValuePlan::SecondaryIndexSearch {
            index: aqr.table.clone(),
            expr,
            sort,
            limit: aqr.limit,
        };
    }

    if !is_concrete_key && !aqr.where_clause.is_empty() {
        return KeyValuePlan::ScanFilter {
            pattern: namespace_pattern(&aqr.table),
            count: aqr.limit.unwrap_or(DEFAULT_SCAN_COUNT),
            filters: aqr
                .where_clause
                .iter()
                .map(|c| PlanFilter {
                    field: c.field.clone(),
                    op: c.op,
                    value: c.value.clone(),
                })
                .collect(),
        };
    }

    KeyValuePlan::DirectGet { key: aqr.table.clone() }
}
