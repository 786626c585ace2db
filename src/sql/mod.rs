//! SQL generation.
//!
//! A small, typed SQL builder used by the relational translator directly and
//! by the wide-column translator (PartiQL is a SQL subset) and search
//! translator (which wraps the same SQL string in a JSON envelope). It
//! provides:
//!
//! - [`expr`] — expression AST
//! - [`query`] — SELECT statement builder
//! - [`token`] — token types and serialization

pub mod expr;
pub mod query;
pub mod token;

pub use expr::{col, func, lit_bool, lit_float, lit_int, lit_str, table_col, BinaryOperator, Expr, Literal};
pub use query::{Connective, Join, JoinType, OrderByExpr, Query, SelectExpr, SortDir, TableRef, WhereItem};
pub use token::{Token, TokenStream};
