//! Structural validation of an [`Aqr`] tree.
//!
//! `validate` never raises; it reports. A host that builds an `Aqr` directly
//! (bypassing the UQL parser) is expected to call this before handing the
//! tree to a translator, the same way the parser does internally.

use super::types::{Aqr, AggregateFn, Operator, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

fn err(errors: &mut Vec<ValidationError>, path: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        path: path.into(),
        message: message.into(),
    });
}

fn check_value_shape(path: &str, op: Operator, value: &Value, errors: &mut Vec<ValidationError>) {
    match op {
        Operator::In | Operator::NotIn => match value.as_list() {
            Some(items) if !items.is_empty() => {}
            Some(_) => err(errors, path, "IN/NOT IN requires a non-empty list"),
            None => err(errors, path, "IN/NOT IN requires a list value"),
        },
        Operator::Between => match value.as_list() {
            Some(items) if items.len() == 2 => {}
            Some(_) => err(errors, path, "BETWEEN requires exactly two bounds"),
            None => err(errors, path, "BETWEEN requires a two-element list value"),
        },
        _ => {
            if matches!(value, Value::List(_)) {
                err(errors, path, "this operator does not accept a list value");
            }
        }
    }
}

pub fn validate(q: &Aqr) -> ValidationResult {
    let mut errors = Vec::new();

    if q.table.trim().is_empty() {
        err(&mut errors, "table", "table name must not be empty");
    }

    for (i, cond) in q.where_clause.iter().enumerate() {
        check_value_shape(&format!("where[{i}]"), cond.op, &cond.value, &mut errors);
    }
    for (i, cond) in q.having.iter().enumerate() {
        check_value_shape(&format!("having[{i}]"), cond.op, &cond.value, &mut errors);
    }

    for (i, agg) in q.aggregate.iter().enumerate() {
        if agg.field == "*" && agg.function != AggregateFn::Count {
            err(
                &mut errors,
                &format!("aggregate[{i}].field"),
                "'*' is only permitted as the argument to COUNT",
            );
        }
    }

    for (i, join) in q.joins.iter().enumerate() {
        if join.table.trim().is_empty() {
            err(&mut errors, &format!("joins[{i}].table"), "join table must not be empty");
        }
        if join.on.left.trim().is_empty() || join.on.right.trim().is_empty() {
            err(&mut errors, &format!("joins[{i}].on"), "join condition must name both sides");
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}
