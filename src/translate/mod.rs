//! Per-backend translators: the AQR → backend-native query mappings.
//!
//! Every function here is a pure mapping over its input (spec §8's
//! translator determinism property) — none of them touch a client handle or
//! the registry. `registry::dispatcher` is the only place that calls a
//! translator and then executes its output.

pub mod document;
pub mod error;
pub mod key_value;
pub mod relational;
pub mod search;
pub mod wide_column;

pub use document::{to_document, DocumentPipeline, DocumentStage};
pub use error::{TranslateError, TranslateResult};
pub use key_value::{to_plan, AddressingHint, KeyValuePlan, PlanFilter};
pub use relational::to_sql;
pub use search::{to_search, SearchPayload, SearchQuery, SearchSort};
pub use wide_column::{to_wide_column, WideColumnPlan};
