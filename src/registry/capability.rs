//! Capability traits: the narrow interface a host must implement on its own
//! client handle for a given backend kind (spec §9 design note, "opaque
//! client handles → narrow capability interfaces").
//!
//! The core never constructs these itself — it only calls through them.
//! Each trait corresponds to exactly one row in spec §4.7's dispatch table.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::translate::document::DocumentPipeline;
use crate::translate::search::SearchPayload;

/// One result record. Backends are heterogeneous enough (rows, documents,
/// hits, DynamoDB items, Redis hashes) that a typed schema would either
/// under-fit one of them or force the core to know about all of them;
/// `serde_json::Value` is the common currency every capability already
/// speaks when talking JSON-ish wire formats.
pub type Row = Map<String, Value>;

/// Raw rows returned by a capability call, before the dispatcher wraps them
/// into a `QueryResult`.
pub type Rows = Vec<Row>;

/// A failure surfaced by a client handle during execution, or a
/// cancellation that arrived while the call was in flight (spec §5, §7).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Backend(String),

    #[error("execution was cancelled")]
    Cancelled,
}

impl ExecutionError {
    pub fn backend(message: impl Into<String>) -> Self {
        ExecutionError::Backend(message.into())
    }
}

/// Capability for a relational (PostgreSQL-family) client handle.
#[async_trait]
pub trait RelationalClient: Send + Sync {
    async fn execute_sql(&self, sql: &str) -> Result<Rows, ExecutionError>;
}

/// Capability for a document (MongoDB-family) client handle.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn run_pipeline(&self, collection: &str, pipeline: &DocumentPipeline) -> Result<Rows, ExecutionError>;
}

/// Capability for a search (Elasticsearch/OpenSearch-family) client handle.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn post_sql(&self, index: &str, payload: &SearchPayload) -> Result<Rows, ExecutionError>;
}

/// Capability for a wide-column (DynamoDB/PartiQL-family) client handle.
#[async_trait]
pub trait WideColumnClient: Send + Sync {
    async fn execute_partiql(&self, statement: &str, names: &HashMap<String, String>) -> Result<Rows, ExecutionError>;
}

/// Capability for a key-value (Redis-family) client handle. Each method
/// matches exactly one key-value plan tag (spec §4.6/§4.7) — the
/// dispatcher calls only the method matching the plan it built.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Rows, ExecutionError>;
    async fn hgetall(&self, key: &str) -> Result<Rows, ExecutionError>;
    async fn scan(&self, pattern: &str, count: u64) -> Result<Rows, ExecutionError>;
    async fn search(
        &self,
        index: &str,
        expr: &str,
        sort: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Rows, ExecutionError>;
}

/// One handle per backend kind, stored alongside its descriptor in the
/// registry. A host supplies an adapter wrapping its own driver; the core
/// never opens a socket itself.
pub enum ClientHandle {
    Relational(Box<dyn RelationalClient>),
    Document(Box<dyn DocumentClient>),
    Search(Box<dyn SearchClient>),
    WideColumn(Box<dyn WideColumnClient>),
    KeyValue(Box<dyn KeyValueClient>),
}
