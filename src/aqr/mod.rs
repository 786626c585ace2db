//! The abstract query representation: the tree every surface syntax parses
//! into and every backend translator consumes.

pub mod types;
pub mod validate;

pub use types::{
    Aggregate, AggregateFn, Aqr, Condition, Direction, Join, JoinKind, JoinOn, Logical, Operation,
    Operator, Order, Value,
};
pub use validate::{validate, ValidationError, ValidationResult};
