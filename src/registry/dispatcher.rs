//! The connection registry and its dispatch table (spec §4.7, §5, §9).
//!
//! `Registry` holds one mutex-guarded map from connection id to active
//! connection. The lock's job is limited to the map lookup and the
//! `last_used` bump; it is dropped before any `.await` that might touch the
//! network, per spec §9's "the critical section is small" design note. A
//! client handle is wrapped in an `Arc` precisely so the lock can be
//! released after cloning the handle out, rather than held across the
//! backend call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::aqr::Aqr;
use crate::registry::capability::{ClientHandle, ExecutionError, KeyValueClient, Row, Rows};
use crate::registry::descriptor::{BackendKind, ConnectionDescriptor, WideColumnSchema};
use crate::registry::error::{RegistryError, RegistryResult};
use crate::translate::key_value::{AddressingHint, KeyValuePlan, PlanFilter};
use crate::translate::{document, key_value, relational, search, wide_column};
use crate::uql::parser::parse;

struct ActiveConnection {
    descriptor: ConnectionDescriptor,
    handle: Arc<ClientHandle>,
    last_used: Instant,
    healthy: bool,
}

/// One translator's output, handed back by `Registry::translate` without
/// anything having been executed.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslatedQuery {
    Relational(String),
    Document(document::DocumentPipeline),
    Search(search::SearchPayload),
    WideColumn(wide_column::WideColumnPlan),
    KeyValue(KeyValuePlan),
}

impl TranslatedQuery {
    /// A single string rendering, for the `translated_query` field of
    /// `QueryResult` and for `mantis translate` CLI output.
    pub fn render(&self) -> String {
        match self {
            TranslatedQuery::Relational(sql) => sql.clone(),
            TranslatedQuery::Document(pipeline) => pipeline.to_json().to_string(),
            TranslatedQuery::Search(payload) => payload.to_json().to_string(),
            TranslatedQuery::WideColumn(plan) => plan.statement.clone(),
            TranslatedQuery::KeyValue(plan) => format!("{plan:?}"),
        }
    }
}

/// The result of `Registry::execute`: normalized rows plus the
/// observability fields spec §4.7 names.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub rows: Rows,
    pub count: usize,
    pub translated_query: String,
    pub original_query: String,
}

/// A single mutex-guarded mapping from connection id to active connection
/// (spec §9, "shared registry → single mutex-guarded mapping").
pub struct Registry {
    connections: Mutex<HashMap<String, ActiveConnection>>,
    order: Mutex<Vec<String>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self { connections: Mutex::new(HashMap::new()), order: Mutex::new(Vec::new()) }
    }

    /// Insert or replace an active connection entry. Performs no network
    /// operation itself — the handle is assumed already connected by the
    /// host (spec §4.7: "must not perform any network operation").
    pub fn register(&self, id: impl Into<String>, handle: ClientHandle, descriptor: ConnectionDescriptor) {
        let id = id.into();
        let entry = ActiveConnection {
            descriptor,
            handle: Arc::new(handle),
            last_used: Instant::now(),
            healthy: true,
        };
        let mut conns = self.connections.lock().expect("registry mutex poisoned");
        let replaced = conns.insert(id.clone(), entry).is_some();
        drop(conns);
        if !replaced {
            self.order.lock().expect("registry mutex poisoned").push(id);
        }
    }

    /// Remove the entry. The capability traits this crate defines expose no
    /// close operation, so there is nothing for the core to invoke itself —
    /// a host that needs one puts it in its own handle's `Drop` impl.
    pub fn unregister(&self, id: &str) {
        let removed = self.connections.lock().expect("registry mutex poisoned").remove(id).is_some();
        if removed {
            self.order.lock().expect("registry mutex poisoned").retain(|existing| existing != id);
        }
    }

    /// Current descriptors, in registration order.
    pub fn list(&self) -> Vec<ConnectionDescriptor> {
        let order = self.order.lock().expect("registry mutex poisoned");
        let conns = self.connections.lock().expect("registry mutex poisoned");
        order.iter().filter_map(|id| conns.get(id).map(|c| c.descriptor.clone())).collect()
    }

    /// Reports the internal `healthy` flag; this is bookkeeping only, never
    /// a network probe (spec §4.7).
    pub fn is_healthy(&self, id: &str) -> RegistryResult<bool> {
        let conns = self.connections.lock().expect("registry mutex poisoned");
        conns
            .get(id)
            .map(|c| c.healthy)
            .ok_or_else(|| RegistryError::UnknownConnection(id.to_string()))
    }

    /// Marks a connection unhealthy, e.g. after the host observes a
    /// connection-level failure outside of `execute`. Not named in spec
    /// §4.7's surface directly, but `is_healthy`'s flag has to be set by
    /// something; `execute` also flips it on a failed backend call.
    pub fn mark_unhealthy(&self, id: &str) {
        if let Some(entry) = self.connections.lock().expect("registry mutex poisoned").get_mut(id) {
            entry.healthy = false;
        }
    }

    /// Unregisters every connection.
    pub fn cleanup(&self) {
        self.connections.lock().expect("registry mutex poisoned").clear();
        self.order.lock().expect("registry mutex poisoned").clear();
    }

    /// Parse once, route to the translator matching `target_kind`, and
    /// return its output without executing anything.
    pub fn translate(&self, uql: &str, target_kind: BackendKind) -> RegistryResult<TranslatedQuery> {
        let aqr = parse(uql)?;
        Ok(Self::translate_aqr(&aqr, target_kind, None)?)
    }

    fn translate_aqr(
        aqr: &Aqr,
        kind: BackendKind,
        schema: Option<&WideColumnSchema>,
    ) -> Result<TranslatedQuery, crate::translate::error::TranslateError> {
        Ok(match kind {
            BackendKind::Relational => TranslatedQuery::Relational(relational::to_sql(aqr)),
            BackendKind::Document => TranslatedQuery::Document(document::to_document(aqr)?),
            BackendKind::Search => TranslatedQuery::Search(search::to_search(aqr)?),
            BackendKind::WideColumn => {
                let schema = schema.cloned().unwrap_or_default();
                TranslatedQuery::WideColumn(wide_column::to_wide_column(aqr, &schema)?)
            }
            BackendKind::KeyValue => {
                TranslatedQuery::KeyValue(key_value::to_plan(aqr, AddressingHint::Unknown, false))
            }
        })
    }

    /// Parse, translate against the connection's kind, dispatch to the
    /// backend, normalize the result, and bump `last_used`.
    pub async fn execute(&self, connection_id: &str, uql: &str) -> RegistryResult<QueryResult> {
        let aqr = parse(uql)?;

        let (kind, schema, handle) = {
            let mut conns = self.connections.lock().expect("registry mutex poisoned");
            let entry = conns
                .get_mut(connection_id)
                .ok_or_else(|| RegistryError::UnknownConnection(connection_id.to_string()))?;
            entry.last_used = Instant::now();
            (entry.descriptor.kind, entry.descriptor.wide_column_schema.clone(), Arc::clone(&entry.handle))
        };

        let translated = Self::translate_aqr(&aqr, kind, schema.as_ref())?;
        let translated_query = translated.render();

        let dispatched = Self::dispatch(&handle, &translated).await;
        if dispatched.is_err() {
            self.mark_unhealthy(connection_id);
        }
        let rows = dispatched?;

        Ok(QueryResult { count: rows.len(), rows, translated_query, original_query: uql.to_string() })
    }

    /// Route to exactly the client-handle method matching the translated
    /// query's backend kind (spec §4.7's dispatch table). The variant
    /// pairing between `ClientHandle` and `TranslatedQuery` is an invariant
    /// of `translate_aqr`, never of caller input, so a mismatch here would
    /// be this module's own bug rather than a reachable runtime state.
    async fn dispatch(handle: &ClientHandle, translated: &TranslatedQuery) -> Result<Rows, ExecutionError> {
        match (handle, translated) {
            (ClientHandle::Relational(client), TranslatedQuery::Relational(sql)) => client.execute_sql(sql).await,
            (ClientHandle::Document(client), TranslatedQuery::Document(pipeline)) => {
                client.run_pipeline(&pipeline.collection, pipeline).await
            }
            (ClientHandle::Search(client), TranslatedQuery::Search(payload)) => {
                client.post_sql(&payload.index, payload).await
            }
            (ClientHandle::WideColumn(client), TranslatedQuery::WideColumn(plan)) => {
                client.execute_partiql(&plan.statement, &plan.expression_attribute_names).await
            }
            (ClientHandle::KeyValue(client), TranslatedQuery::KeyValue(plan)) => {
                Self::dispatch_key_value(client.as_ref(), plan).await
            }
            _ => Err(ExecutionError::backend(
                "client handle kind does not match the translated query's backend kind",
            )),
        }
    }

    /// Each key-value plan variant calls exactly one handle operation (spec
    /// §4.6/§4.7). `ScanFilter`'s predicate list has no matching capability
    /// method — the backend only knows how to scan — so those filters are
    /// applied here, after the scan returns, instead of being sent over the
    /// wire.
    async fn dispatch_key_value(client: &dyn KeyValueClient, plan: &KeyValuePlan) -> Result<Rows, ExecutionError> {
        match plan {
            KeyValuePlan::DirectGet { key } => client.get(key).await,
            KeyValuePlan::HashGetAll { key } => client.hgetall(key).await,
            KeyValuePlan::NamespaceScan { pattern, count } => client.scan(pattern, *count).await,
            KeyValuePlan::ScanFilter { pattern, count, filters } => {
                let rows = client.scan(pattern, *count).await?;
                Ok(rows.into_iter().filter(|row| filters.iter().all(|f| filter_matches(row, f))).collect())
            }
            KeyValuePlan::SecondaryIndexSearch { index, expr, sort, limit } => {
                client.search(index, expr, sort.as_deref(), *limit).await
            }
        }
    }
}

/// Whether a scanned row satisfies one client-side filter. Comparisons
/// outside `Eq`/`Ne`/`In`/`NotIn` fall back to ordering over the value's
/// JSON rendering, since a bare scan gives no schema to compare against.
fn filter_matches(row: &Row, filter: &PlanFilter) -> bool {
    use crate::aqr::Operator;

    let Some(actual) = row.get(&filter.field) else {
        return false;
    };
    let expected = filter.value.to_json();

    match filter.op {
        Operator::Eq => *actual == expected,
        Operator::Ne => *actual != expected,
        Operator::In => expected.as_array().is_some_and(|items| items.contains(actual)),
        Operator::NotIn => !expected.as_array().is_some_and(|items| items.contains(actual)),
        Operator::Lt => compare(actual, &expected).is_some_and(|o| o.is_lt()),
        Operator::Lte => compare(actual, &expected).is_some_and(|o| o.is_le()),
        Operator::Gt => compare(actual, &expected).is_some_and(|o| o.is_gt()),
        Operator::Gte => compare(actual, &expected).is_some_and(|o| o.is_ge()),
        Operator::Between => filter
            .value
            .as_list()
            .and_then(|items| match items {
                [low, high] => Some((low.to_json(), high.to_json())),
                _ => None,
            })
            .is_some_and(|(low, high)| {
                compare(actual, &low).is_some_and(|o| o.is_ge()) && compare(actual, &high).is_some_and(|o| o.is_le())
            }),
        Operator::Like | Operator::Ilike => {
            let (Some(text), Some(pattern)) = (actual.as_str(), expected.as_str()) else {
                return false;
            };
            like_matches(text, pattern, filter.op == Operator::Ilike)
        }
    }
}

fn compare(actual: &serde_json::Value, expected: &serde_json::Value) -> Option<std::cmp::Ordering> {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (actual.as_str(), expected.as_str()) {
        return Some(a.cmp(b));
    }
    None
}

/// `%`/`_` SQL-style wildcard matching (`%` = any run of characters, `_` =
/// exactly one), fully anchored. Classic two-pointer glob match with a
/// backtrack point recorded at the last `%`.
fn like_matches(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_ascii_lowercase(), pattern.to_ascii_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0usize, 0usize);
    let (mut star_pi, mut star_ti) = (None, 0usize);

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) {
            ti += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '%' {
        pi += 1;
    }
    pi == p.len()
}
