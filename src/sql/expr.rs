//! Expression AST for generated SQL.
//!
//! A deliberately small subset of what a general SQL builder needs: only the
//! shapes a `Condition`, `Aggregate`, or `Order` in the abstract query
//! representation can produce. No subqueries, no window functions, no CASE —
//! those have no source in the AQR this translator consumes.

use super::token::{Token, TokenStream};

/// A SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column { table: Option<String>, column: String },

    Literal(Literal),

    /// left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Aggregate or scalar function call: name(args...)
    Function { name: String, args: Vec<Expr> },

    /// expr [NOT] IN (values...)
    In {
        expr: Box<Expr>,
        values: Vec<Expr>,
        negated: bool,
    },

    /// expr [NOT] BETWEEN low AND high
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },

    /// `*`, used as the bare projection or inside `COUNT(*)`.
    Star,

    /// Escape hatch for a verbatim join condition (`lhs = rhs`) or similar
    /// fragments that already arrive as plain text from the parser.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
    Ilike,
    And,
    Or,
}

impl Expr {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        self.write_tokens(&mut ts);
        ts
    }

    fn write_tokens(&self, ts: &mut TokenStream) {
        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                });
            }

            Expr::BinaryOp { left, op, right } => {
                left.write_tokens(ts);
                ts.space();
                ts.push(binary_op_token(*op));
                ts.space();
                right.write_tokens(ts);
            }

            Expr::Function { name, args } => {
                ts.push(Token::FunctionName(name.clone()));
                ts.lparen();
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    arg.write_tokens(ts);
                }
                ts.rparen();
            }

            Expr::In {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    ts.push(if *negated { Token::True } else { Token::False });
                } else {
                    expr.write_tokens(ts);
                    if *negated {
                        ts.space().push(Token::Not);
                    }
                    ts.space().push(Token::In).space().lparen();
                    for (i, val) in values.iter().enumerate() {
                        if i > 0 {
                            ts.comma();
                        }
                        val.write_tokens(ts);
                    }
                    ts.rparen();
                }
            }

            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                expr.write_tokens(ts);
                if *negated {
                    ts.space().push(Token::Not);
                }
                ts.space().push(Token::Between).space();
                low.write_tokens(ts);
                ts.space().push(Token::And).space();
                high.write_tokens(ts);
            }

            Expr::Star => {
                ts.push(Token::Star);
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }
    }
}

fn binary_op_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::Like => Token::Like,
        BinaryOperator::Ilike => Token::Ilike,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
    }
}

pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_float(f: f64) -> Expr {
    Expr::Literal(Literal::Float(f))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
    }
}
