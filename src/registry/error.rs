//! Errors produced by the connection registry and dispatcher.

use thiserror::Error;

use crate::registry::capability::ExecutionError;
use crate::translate::error::TranslateError;
use crate::uql::error::ParseError;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// `Execute`/`Translate` named a connection id with no registered entry.
    #[error("no connection registered with id '{0}'")]
    UnknownConnection(String),

    /// The UQL string itself did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The AQR could not be translated for the target backend.
    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// The backend call failed, or was cancelled in flight.
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),
}
