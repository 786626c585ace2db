//! The abstract query representation (AQR) — the canonical, backend-neutral
//! shape every surface syntax parses into and every translator consumes.
//!
//! Nothing in this module knows how to parse UQL text or emit SQL; it only
//! describes the tree. Keeping it free of parsing/translation concerns is
//! what lets five different translators share one validator.

use std::fmt;

/// The four operations a query can perform. Only `Find` is required of a
/// conforming backend; `Insert`/`Update`/`Delete` exist in the tree so a host
/// can represent mutations, but no translator in this crate implements them
/// yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Find,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Find => "FIND",
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A scalar or list value attached to a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render as a `serde_json::Value`, for the three translators and the
    /// key-value dispatcher's client-side filter that all need to hand a
    /// condition's value to something JSON-shaped rather than SQL-shaped.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Str(s) => serde_json::json!(s),
            Value::Int(n) => serde_json::json!(n),
            Value::Float(f) => serde_json::json!(f),
            Value::Bool(b) => serde_json::json!(b),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

/// Comparison and membership operators a condition can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    In,
    NotIn,
    Like,
    Ilike,
    Between,
}

/// How a condition chains to the one after it. The last condition in a list
/// carries a connective too, but it is never read — left-to-right evaluation
/// with no grouping means only the connectives *between* items matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: Value,
    pub logical: Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinOn {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: JoinOn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregateFn::Count),
            "SUM" => Some(AggregateFn::Sum),
            "AVG" => Some(AggregateFn::Avg),
            "MIN" => Some(AggregateFn::Min),
            "MAX" => Some(AggregateFn::Max),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFn,
    pub field: String,
    pub alias: Option<String>,
}

impl Aggregate {
    /// `COUNT(*)` defaults to `count`; every other aggregate defaults to its
    /// field name when no explicit alias was given.
    pub fn effective_alias(&self) -> &str {
        match &self.alias {
            Some(a) => a,
            None if self.function == AggregateFn::Count && self.field == "*" => "count",
            None => &self.field,
        }
    }
}

/// A fully constructed query tree, built either by the UQL parser or
/// directly by a host embedding this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Aqr {
    pub operation: Operation,
    pub table: String,
    /// Nested collection name for document/wide-column backends whose data
    /// model addresses a table and a sub-collection within it (e.g. a
    /// wide-column column family, or a document sub-resource). Relational
    /// and key-value backends ignore it.
    pub sub_table: Option<String>,
    pub fields: Vec<String>,
    pub where_clause: Vec<Condition>,
    pub joins: Vec<Join>,
    pub group_by: Vec<String>,
    pub aggregate: Vec<Aggregate>,
    pub having: Vec<Condition>,
    pub order_by: Vec<Order>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Aqr {
    pub fn new(operation: Operation, table: impl Into<String>) -> Self {
        Self {
            operation,
            table: table.into(),
            sub_table: None,
            fields: Vec::new(),
            where_clause: Vec::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            aggregate: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn has_aggregate(&self) -> bool {
        !self.aggregate.is_empty()
    }
}
