//! # Mantis
//!
//! A universal query abstraction layer: one surface syntax (UQL) compiled
//! into one canonical query tree (AQR), dispatched across five backend
//! families through dedicated translators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   UQL (surface syntax)                   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [uql::parser]
//! ┌─────────────────────────────────────────────────────────┐
//! │           AQR (abstract query representation)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translate::*]
//! ┌─────────┬──────────┬─────────┬─────────────┬─────────────┐
//! │relational│ document │  search │ wide_column │  key_value  │
//! └─────────┴──────────┴─────────┴─────────────┴─────────────┘
//!                          │
//!                          ▼ [registry::Registry, given a host-supplied handle]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     backend I/O                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every translator is a pure function of an [`aqr::Aqr`] and is directly
//! callable without a registered connection. [`registry::Registry`] adds
//! connection bookkeeping and dispatch on top, for hosts that want to both
//! translate and execute against a live backend.

pub mod aqr;
pub mod config;
pub mod registry;
pub mod sql;
pub mod translate;
pub mod uql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aqr::{Aggregate, AggregateFn, Aqr, Condition, Direction, Join, JoinKind, Logical, Operation, Operator, Order, Value};
    pub use crate::registry::{BackendKind, ClientHandle, ConnectionDescriptor, QueryResult, Registry, TranslatedQuery};
    pub use crate::translate::{
        to_document, to_plan, to_search, to_sql, to_wide_column, AddressingHint, DocumentPipeline, KeyValuePlan,
        SearchPayload, WideColumnPlan,
    };
    pub use crate::uql::parser::parse;
}
