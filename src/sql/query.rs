//! SELECT query builder — assembles a token stream from structured clauses.
//!
//! `Query` mirrors the shape of an abstract query representation closely
//! enough that the SQL translator is mostly a field-by-field copy. WHERE and
//! HAVING are kept as a flat, left-to-right chain of items rather than a
//! binary expression tree: the source representation has no grouping either,
//! and folding into a tree would invent precedence that isn't there.

use super::expr::Expr;
use super::token::{Token, TokenStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn write_tokens(&self, ts: &mut TokenStream) {
        if let Some(schema) = &self.schema {
            ts.push(Token::Ident(schema.clone()));
            ts.push(Token::Dot);
        }
        ts.push(Token::Ident(self.table.clone()));
        if let Some(alias) = &self.alias {
            ts.space().push(Token::Ident(alias.clone()));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    /// Join condition, already rendered as `lhs = rhs`.
    pub on: Expr,
}

impl Join {
    fn write_tokens(&self, ts: &mut TokenStream) {
        match self.join_type {
            JoinType::Inner => {
                ts.push(Token::Inner).space().push(Token::Join);
            }
            JoinType::Left => {
                ts.push(Token::Left).space().push(Token::Join);
            }
            JoinType::Right => {
                ts.push(Token::Right).space().push(Token::Join);
            }
            JoinType::Full => {
                ts.push(Token::Full)
                    .space()
                    .push(Token::Outer)
                    .space()
                    .push(Token::Join);
            }
        }
        ts.space();
        self.table.write_tokens(ts);
        ts.space().push(Token::On).space();
        ts.append(&self.on.to_tokens());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

/// One item in a flat WHERE/HAVING chain: the predicate, and the connective
/// joining it to the *next* item (the last item's connective is ignored).
#[derive(Debug, Clone, PartialEq)]
pub struct WhereItem {
    pub expr: Expr,
    pub connective: Option<Connective>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    fn write_tokens(&self, ts: &mut TokenStream) {
        ts.append(&self.expr.to_tokens());
        if let Some(alias) = &self.alias {
            ts.space().push(Token::As).space().push(Token::Ident(alias.clone()));
        }
    }
}

/// A complete `SELECT` statement.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Vec<WhereItem>,
    pub group_by: Vec<Expr>,
    pub having: Vec<WhereItem>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_where_chain(items: &[WhereItem], ts: &mut TokenStream) {
        for (i, item) in items.iter().enumerate() {
            ts.append(&item.expr.to_tokens());
            if i + 1 < items.len() {
                ts.space();
                ts.push(match item.connective {
                    Some(Connective::Or) => Token::Or,
                    _ => Token::And,
                });
                ts.space();
            }
        }
    }

    /// Serialize this query to a SQL string. No trailing semicolon.
    pub fn to_sql(&self) -> String {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        if self.select.is_empty() {
            ts.push(Token::Star);
        } else {
            for (i, item) in self.select.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                item.write_tokens(&mut ts);
            }
        }

        if let Some(from) = &self.from {
            ts.space().push(Token::From).space();
            from.write_tokens(&mut ts);
        }

        for join in &self.joins {
            ts.space();
            join.write_tokens(&mut ts);
        }

        if !self.where_clause.is_empty() {
            ts.space().push(Token::Where).space();
            Self::write_where_chain(&self.where_clause, &mut ts);
        }

        if !self.group_by.is_empty() {
            ts.space().push(Token::GroupBy).space();
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens());
            }
        }

        if !self.having.is_empty() {
            ts.space().push(Token::Having).space();
            Self::write_where_chain(&self.having, &mut ts);
        }

        if !self.order_by.is_empty() {
            ts.space().push(Token::OrderBy).space();
            for (i, ob) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&ob.expr.to_tokens());
                ts.space().push(match ob.dir {
                    SortDir::Asc => Token::Asc,
                    SortDir::Desc => Token::Desc,
                });
            }
        }

        if let Some(limit) = self.limit {
            ts.space().push(Token::Limit).space().push(Token::LitInt(limit as i64));
        }

        if let Some(offset) = self.offset {
            ts.space().push(Token::Offset).space().push(Token::LitInt(offset as i64));
        }

        ts.serialize()
    }
}
