//! AQR → PartiQL-compatible SQL with key-aware shaping (spec §4.5).
//!
//! Unlike the other four translators this one can fail on perfectly
//! ordinary-looking AQRs: aggregates, `GROUP BY`, and joins have no
//! representation on this backend and must raise `UnsupportedForBackend`
//! rather than degrade into a scan that silently ignores them.

use std::collections::HashMap;

use crate::aqr::{Aqr, Condition, Logical, Operator, Value};
use crate::registry::descriptor::WideColumnSchema;
use crate::sql::expr::{col, func, lit_bool, lit_float, lit_int, lit_str, BinaryOperator, Expr};
use crate::translate::error::{TranslateError, TranslateResult};

/// A subset of DynamoDB's reserved words likely to collide with a real
/// attribute name. Not exhaustive — the full reserved list runs to several
/// hundred entries — but enough to exercise the `#n` placeholder mechanism
/// for the attribute names this crate's tests and callers actually use.
const RESERVED_WORDS: &[&str] = &[
    "NAME", "STATUS", "DATA", "SIZE", "TYPE", "ORDER", "GROUP", "YEAR", "DATE", "TIMESTAMP",
    "REGION", "ROLE", "VALUE", "COUNT", "LEVEL", "STATE", "TABLE", "INDEX", "KEY", "TTL",
];

fn is_reserved(field: &str) -> bool {
    RESERVED_WORDS.contains(&field.to_ascii_uppercase().as_str())
}

/// The PartiQL statement and its reserved-name placeholder map.
#[derive(Debug, Clone, PartialEq)]
pub struct WideColumnPlan {
    pub statement: String,
    pub expression_attribute_names: HashMap<String, String>,
}

fn scalar_to_expr(v: &Value) -> Expr {
    match v {
        Value::Str(s) => lit_str(s),
        Value::Int(n) => lit_int(*n),
        Value::Float(f) => lit_float(*f),
        Value::Bool(b) => lit_bool(*b),
        Value::List(_) => Expr::Raw(String::new()),
    }
}

fn begins_with_prefix(pattern: &str) -> Option<&str> {
    if !pattern.starts_with('%') && pattern.ends_with('%') && pattern.len() > 1 {
        Some(&pattern[..pattern.len() - 1])
    } else {
        None
    }
}

/// Is this condition eligible to become (part of) the key condition, given
/// it targets the sort key? Spec §4.5: `=`, `BETWEEN`, `>`, `>=`, `<`, `<=`,
/// or a prefix `LIKE` mapped to `begins_with`.
fn sort_key_eligible(cond: &Condition) -> bool {
    match cond.op {
        Operator::Eq | Operator::Between | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => true,
        Operator::Like => matches!(&cond.value, Value::Str(s) if begins_with_prefix(s).is_some()),
        _ => false,
    }
}

fn condition_to_key_expr(cond: &Condition, names: &mut HashMap<String, String>) -> Expr {
    let field = col(&placeholder(&cond.field, names));
    match cond.op {
        Operator::Eq => Expr::BinaryOp {
            left: Box::new(field),
            op: BinaryOperator::Eq,
            right: Box::new(scalar_to_expr(&cond.value)),
        },
        Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
            let op = match cond.op {
                Operator::Gt => BinaryOperator::Gt,
                Operator::Gte => BinaryOperator::Gte,
                Operator::Lt => BinaryOperator::Lt,
                _ => BinaryOperator::Lte,
            };
            Expr::BinaryOp {
                left: Box::new(field),
                op,
                right: Box::new(scalar_to_expr(&cond.value)),
            }
        }
        Operator::Between => {
            let (low, high) = cond
                .value
                .as_list()
                .and_then(|items| match items {
                    [a, b] => Some((scalar_to_expr(a), scalar_to_expr(b))),
                    _ => None,
                })
                .unwrap_or((lit_str(""), lit_str("")));
            Expr::Between {
                expr: Box::new(field),
                low: Box::new(low),
                high: Box::new(high),
                negated: false,
            }
        }
        Operator::Like => {
            let prefix = match &cond.value {
                Value::Str(s) => begins_with_prefix(s).unwrap_or("").to_string(),
                _ => String::new(),
            };
            func("begins_with", vec![field, lit_str(&prefix)])
        }
        _ => unreachable!("sort_key_eligible excludes every other operator"),
    }
}

/// Filter expressions (non-key `WHERE` predicates) use the same operators a
/// key condition would, plus `IN`/`NOT IN`/`!=`; `LIKE`/`ILIKE` degrade to
/// `contains(...)` when the pattern isn't a pure prefix match, since
/// DynamoDB has no pattern-matching operator of its own.
fn condition_to_filter_expr(cond: &Condition, names: &mut HashMap<String, String>) -> Expr {
    let field = col(&placeholder(&cond.field, names));
    match cond.op {
        Operator::Eq | Operator::Ne | Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
            let op = match cond.op {
                Operator::Eq => BinaryOperator::Eq,
                Operator::Ne => BinaryOperator::Ne,
                Operator::Lt => BinaryOperator::Lt,
                Operator::Gt => BinaryOperator::Gt,
                Operator::Lte => BinaryOperator::Lte,
                _ => BinaryOperator::Gte,
            };
            Expr::BinaryOp {
                left: Box::new(field),
                op,
                right: Box::new(scalar_to_expr(&cond.value)),
            }
        }
        Operator::In | Operator::NotIn => {
            let values = cond
                .value
                .as_list()
                .map(|items| items.iter().map(scalar_to_expr).collect())
                .unwrap_or_default();
            Expr::In {
                expr: Box::new(field),
                values,
                negated: cond.op == Operator::NotIn,
            }
        }
        Operator::Between => condition_to_key_expr(cond, names),
        Operator::Like | Operator::Ilike => match &cond.value {
            Value::Str(s) => match begins_with_prefix(s) {
                Some(prefix) => func("begins_with", vec![field, lit_str(prefix)]),
                None => {
                    let needle = s.trim_matches('%');
                    func("contains", vec![field, lit_str(needle)])
                }
            },
            _ => func("contains", vec![field, lit_str("")]),
        },
    }
}

fn and_chain(items: Vec<(Expr, Logical)>) -> Option<Expr> {
    let mut iter = items.into_iter();
    let (first_expr, mut pending) = iter.next()?;
    let mut acc = first_expr;
    for (expr, logical) in iter {
        let op = match pending {
            Logical::And => BinaryOperator::And,
            Logical::Or => BinaryOperator::Or,
        };
        acc = Expr::BinaryOp {
            left: Box::new(acc),
            op,
            right: Box::new(expr),
        };
        pending = logical;
    }
    Some(acc)
}

fn render_projection(fields: &[String], names: &mut HashMap<String, String>) -> String {
    if fields.is_empty() {
        return "*".to_string();
    }
    fields
        .iter()
        .map(|f| placeholder(f, names))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholder(field: &str, names: &mut HashMap<String, String>) -> String {
    if is_reserved(field) {
        let token = format!("#{}", field.to_ascii_lowercase());
        names.insert(token.clone(), field.to_string());
        token
    } else {
        field.to_string()
    }
}

/// Translate an AQR into a wide-column execution plan.
pub fn to_wide_column(aqr: &Aqr, schema: &WideColumnSchema) -> TranslateResult<WideColumnPlan> {
    if !aqr.aggregate.is_empty() {
        return Err(TranslateError::UnsupportedForBackend {
            construct: "aggregate".to_string(),
            backend: "wide_column".to_string(),
        });
    }
    if !aqr.group_by.is_empty() {
        return Err(TranslateError::UnsupportedForBackend {
            construct: "group_by".to_string(),
            backend: "wide_column".to_string(),
        });
    }
    if !aqr.joins.is_empty() {
        return Err(TranslateError::UnsupportedForBackend {
            construct: "join".to_string(),
            backend: "wide_column".to_string(),
        });
    }

    tracing::debug!(table = %aqr.table, "translating AQR to wide-column plan");

    let partition_idx = aqr
        .where_clause
        .iter()
        .position(|c| c.field == schema.partition_key && c.op == Operator::Eq);

    let sort_idx = schema.sort_key.as_ref().and_then(|sort_key| {
        aqr.where_clause
            .iter()
            .position(|c| c.field == *sort_key && sort_key_eligible(c))
    });

    let mut names = HashMap::new();
    let mut key_expr = None;
    let mut consumed = std::collections::HashSet::new();

    if let Some(pidx) = partition_idx {
        consumed.insert(pidx);
        let mut expr = condition_to_key_expr(&aqr.where_clause[pidx], &mut names);
        if let Some(sidx) = sort_idx {
            if sidx != pidx {
                consumed.insert(sidx);
                expr = Expr::BinaryOp {
                    left: Box::new(expr),
                    op: BinaryOperator::And,
                    right: Box::new(condition_to_key_expr(&aqr.where_clause[sidx], &mut names)),
                };
            }
        }
        key_expr = Some(expr);
    }

    let filter_items: Vec<(Expr, Logical)> = aqr
        .where_clause
        .iter()
        .enumerate()
        .filter(|(i, _)| !consumed.contains(i))
        .map(|(_, c)| (condition_to_filter_expr(c, &mut names), c.logical))
        .collect();
    let filter_expr = and_chain(filter_items);

    let where_expr = match (key_expr, filter_expr) {
        (Some(k), Some(f)) => Some(Expr::BinaryOp {
            left: Box::new(k),
            op: BinaryOperator::And,
            right: Box::new(f),
        }),
        (Some(k), None) => Some(k),
        (None, Some(f)) => Some(f),
        (None, None) => None,
    };

    let projection = render_projection(&aqr.fields, &mut names);

    let mut statement = format!("SELECT {} FROM \"{}\"", projection, aqr.table);
    if let Some(index) = &aqr.sub_table {
        statement.push_str(&format!(".\"{}\"", index));
    }
    if let Some(expr) = where_expr {
        statement.push_str(" WHERE ");
        statement.push_str(&expr.to_tokens().serialize());
    }

    Ok(WideColumnPlan {
        statement,
        expression_attribute_names: names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uql::parser::parse;

    fn schema() -> WideColumnSchema {
        WideColumnSchema::new("user_id").with_sort_key("created_at")
    }

    #[test]
    fn rejects_aggregate() {
        let q = parse("FIND products GROUP BY category AGGREGATE COUNT(*)").unwrap();
        let err = to_wide_column(&q, &schema()).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedForBackend { construct, backend } if construct == "aggregate" && backend == "wide_column"));
    }

    #[test]
    fn rejects_join() {
        let q = parse("FIND users JOIN orders o ON users.id = o.user_id").unwrap();
        assert!(to_wide_column(&q, &schema()).is_err());
    }

    #[test]
    fn partition_key_equality_becomes_key_condition() {
        // `status` is one of this module's own RESERVED_WORDS, so the
        // filter condition on it must go through the same `#n` placeholder
        // as a reserved projection field (spec §4.5: the rule covers
        // reserved attribute names generally, not just projections).
        let q = parse(r#"FIND users WHERE user_id = "u1" AND status = "active""#).unwrap();
        let plan = to_wide_column(&q, &schema()).unwrap();
        assert!(plan.statement.contains("user_id = 'u1'"));
        assert!(plan.statement.contains("#status = 'active'"));
        assert_eq!(plan.expression_attribute_names.get("#status"), Some(&"status".to_string()));
        assert_eq!(plan.statement.matches("user_id").count(), 1);
    }

    #[test]
    fn sort_key_prefix_like_becomes_begins_with() {
        let q = parse(r#"FIND users WHERE user_id = "u1" AND created_at LIKE "2024%""#).unwrap();
        let plan = to_wide_column(&q, &schema()).unwrap();
        assert!(plan.statement.contains("begins_with(created_at, '2024')"));
    }

    #[test]
    fn no_partition_match_becomes_scan_with_filters() {
        let q = parse(r#"FIND users WHERE email = "jo@example.com""#).unwrap();
        let plan = to_wide_column(&q, &schema()).unwrap();
        assert!(plan.statement.contains("WHERE email = 'jo@example.com'"));
    }

    #[test]
    fn non_partition_reserved_filter_field_gets_placeholder() {
        let q = parse(r#"FIND users WHERE status = "active""#).unwrap();
        let plan = to_wide_column(&q, &schema()).unwrap();
        assert!(plan.statement.contains("WHERE #status = 'active'"));
        assert_eq!(plan.expression_attribute_names.get("#status"), Some(&"status".to_string()));
    }

    #[test]
    fn reserved_field_gets_placeholder() {
        let mut q = parse(r#"FIND users (status, name)"#).unwrap();
        q.fields = vec!["status".into(), "name".into()];
        let plan = to_wide_column(&q, &schema()).unwrap();
        assert!(plan.statement.contains("#status"));
        assert_eq!(plan.expression_attribute_names.get("#status"), Some(&"status".to_string()));
    }
}
