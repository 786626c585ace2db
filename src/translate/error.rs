//! Errors produced while turning an [`Aqr`](crate::aqr::Aqr) into a
//! backend-specific query or execution plan.

use thiserror::Error;

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslateError {
    /// The AQR uses a construct the target backend cannot express —
    /// cross-backend joins on a key-value target, for instance.
    #[error("'{construct}' is not supported by the {backend} backend")]
    UnsupportedForBackend { construct: String, backend: String },

    /// The target's key schema (partition/sort key names) was required but
    /// missing or did not match the query.
    #[error("schema error at '{path}': {message}")]
    SchemaError { path: String, message: String },
}
