//! Errors produced while lexing or parsing a UQL query string.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("query must begin with FIND")]
    MissingEntryOperation,

    #[error("unterminated quoted literal starting at position {position}")]
    LexicalError { position: usize },

    #[error("unknown operator '{text}'")]
    UnknownOperator { text: String },

    #[error("malformed join: {reason}")]
    MalformedJoin { reason: String },

    #[error("could not interpret literal '{text}'")]
    LiteralError { text: String },

    #[error("section '{section}' may only appear once")]
    DuplicateSection { section: String },

    #[error("unexpected token '{found}' at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("schema validation failed at '{path}': {message}")]
    SchemaError { path: String, message: String },
}
