//! AQR → SQL string (spec §4.2).
//!
//! This is the translator every other backend path either calls directly
//! (the document and search translators reuse its output) or imitates at
//! the token level (the wide-column translator, since PartiQL is a SQL
//! subset). It is a pure function of its input: the same [`Aqr`] always
//! produces the same token sequence, because [`crate::sql::token`] never
//! reads ambient state while serializing.

use crate::aqr::{Aggregate, AggregateFn, Aqr, Condition, Join, JoinKind, Operator, Order, Value};
use crate::sql::expr::{col, func, lit_bool, lit_float, lit_int, lit_str, Expr};
use crate::sql::query::{
    Connective, Join as SqlJoin, JoinType, OrderByExpr, Query, SelectExpr, SortDir, TableRef,
    WhereItem,
};

fn scalar_to_expr(v: &Value) -> Expr {
    match v {
        Value::Str(s) => lit_str(s),
        Value::Int(n) => lit_int(*n),
        Value::Float(f) => lit_float(*f),
        Value::Bool(b) => lit_bool(*b),
        // Validated away before this point: IN/BETWEEN handle lists
        // themselves, and every other operator rejects a list value.
        Value::List(_) => Expr::Raw(String::new()),
    }
}

fn condition_to_expr(cond: &Condition) -> Expr {
    let field = col(&cond.field);
    match cond.op {
        Operator::Eq => bin(field, crate::sql::expr::BinaryOperator::Eq, &cond.value),
        Operator::Ne => bin(field, crate::sql::expr::BinaryOperator::Ne, &cond.value),
        Operator::Lt => bin(field, crate::sql::expr::BinaryOperator::Lt, &cond.value),
        Operator::Gt => bin(field, crate::sql::expr::BinaryOperator::Gt, &cond.value),
        Operator::Lte => bin(field, crate::sql::expr::BinaryOperator::Lte, &cond.value),
        Operator::Gte => bin(field, crate::sql::expr::BinaryOperator::Gte, &cond.value),
        Operator::Like => bin(field, crate::sql::expr::BinaryOperator::Like, &cond.value),
        Operator::Ilike => bin(field, crate::sql::expr::BinaryOperator::Ilike, &cond.value),
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
    }
}

fn bin(left: Expr, op: crate::sql::expr::BinaryOperator, value: &Value) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(scalar_to_expr(value)),
    }
}

fn conditions_to_where(conditions: &[Condition]) -> Vec<WhereItem> {
    conditions
        .iter()
        .map(|c| WhereItem {
            expr: condition_to_expr(c),
            connective: Some(match c.logical {
                crate::aqr::Logical::And => Connective::And,
                crate::aqr::Logical::Or => Connective::Or,
            }),
        })
        .collect()
}

fn join_kind_to_type(kind: JoinKind) -> JoinType {
    match kind {
        JoinKind::Inner => JoinType::Inner,
        JoinKind::Left => JoinType::Left,
        JoinKind::Right => JoinType::Right,
        JoinKind::Full => JoinType::Full,
    }
}

fn join_to_sql(j: &Join) -> SqlJoin {
    let mut table = TableRef::new(&j.table);
    if let Some(alias) = &j.alias {
        table = table.with_alias(alias);
    }
    SqlJoin {
        join_type: join_kind_to_type(j.kind),
        table,
        on: Expr::Raw(format!("{} = {}", j.on.left, j.on.right)),
    }
}

fn aggregate_expr(agg: &Aggregate) -> Expr {
    let arg = if agg.field == "*" {
        Expr::Star
    } else {
        col(&agg.field)
    };
    func(agg.function.as_str(), vec![arg])
}

/// Does `order.field` refer to this aggregate, either by its alias or by
/// its underlying `FUNC(field)` shape? Matches spec §4.2's order-by
/// compatibility rule.
fn order_matches_aggregate(order: &Order, agg: &Aggregate) -> bool {
    order.field == agg.effective_alias() || order.field == agg.field
}

/// Build the `ORDER BY` list, applying the aggregate-compatibility rule:
/// when the query has any aggregates, an order item surviving must
/// reference a `GROUP BY` field or rewrite to the aggregate expression it
/// names; anything else is dropped rather than emitted as a dangling
/// reference (spec §3 invariants, §4.2, §8).
fn build_order_by(aqr: &Aqr) -> Vec<OrderByExpr> {
    aqr.order_by
        .iter()
        .filter_map(|order| {
            let dir = match order.direction {
                crate::aqr::Direction::Asc => SortDir::Asc,
                crate::aqr::Direction::Desc => SortDir::Desc,
            };
            if aqr.aggregate.is_empty() {
                return Some(OrderByExpr {
                    expr: col(&order.field),
                    dir,
                });
            }
            if aqr.group_by.iter().any(|g| g == &order.field) {
                return Some(OrderByExpr {
                    expr: col(&order.field),
                    dir,
                });
            }
            aqr.aggregate
                .iter()
                .find(|agg| order_matches_aggregate(order, agg))
                .map(|agg| OrderByExpr {
                    expr: aggregate_expr(agg),
                    dir,
                })
        })
        .collect()
}

fn build_select(aqr: &Aqr) -> Vec<SelectExpr> {
    if !aqr.aggregate.is_empty() {
        let mut items: Vec<SelectExpr> = aqr.group_by.iter().map(|g| SelectExpr::new(col(g))).collect();
        for agg in &aqr.aggregate {
            items.push(SelectExpr::aliased(aggregate_expr(agg), agg.effective_alias()));
        }
        items
    } else if !aqr.fields.is_empty() {
        aqr.fields.iter().map(|f| SelectExpr::new(col(f))).collect()
    } else {
        Vec::new()
    }
}

/// Build the intermediate [`Query`] a relational, document, or search
/// translation all start from. Exposed separately from [`to_sql`] so the
/// document translator can walk the same structured form rather than
/// re-deriving its own mapping from the AQR.
pub fn build_query(aqr: &Aqr) -> Query {
    let mut from = TableRef::new(&aqr.table);
    if let Some(sub) = &aqr.sub_table {
        from = from.with_schema(sub);
    }

    Query {
        select: build_select(aqr),
        from: Some(from),
        joins: aqr.joins.iter().map(join_to_sql).collect(),
        where_clause: conditions_to_where(&aqr.where_clause),
        group_by: aqr.group_by.iter().map(|g| col(g)).collect(),
        having: conditions_to_where(&aqr.having),
        order_by: build_order_by(aqr),
        limit: aqr.limit,
        offset: aqr.offset,
    }
}

/// Translate an AQR into a SQL string. No trailing semicolon (spec §4.2).
pub fn to_sql(aqr: &Aqr) -> String {
    tracing::debug!(table = %aqr.table, "translating AQR to relational SQL");
    build_query(aqr).to_sql()
}
