//! The connection descriptor: metadata a host registers alongside a client
//! handle so the dispatcher knows which translator to route a query
//! through and — for the wide-column backend — how to shape key
//! conditions.

use std::collections::HashMap;
use std::fmt;

/// The five backend families this crate's translators cover.
///
/// A connection's kind is immutable for its lifetime; re-registering the
/// same id with a different kind replaces the entry entirely rather than
/// mutating it in place (`registry::Registry::register`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Relational,
    Document,
    Search,
    WideColumn,
    KeyValue,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
            BackendKind::Search => "search",
            BackendKind::WideColumn => "wide_column",
            BackendKind::KeyValue => "key_value",
        };
        f.write_str(s)
    }
}

/// A secondary index on a wide-column table: its own key attribute,
/// distinct from the table's primary partition/sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

/// Partition/sort key attribute names for a wide-column connection, plus
/// any secondary indexes. Supplied by the host at registration time — the
/// core never introspects a schema itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WideColumnSchema {
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub secondary_indexes: Vec<SecondaryIndex>,
}

impl WideColumnSchema {
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
            secondary_indexes: Vec::new(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    pub fn with_index(mut self, index: SecondaryIndex) -> Self {
        self.secondary_indexes.push(index);
        self
    }
}

/// Metadata identifying a registered backend connection (spec §3).
///
/// The descriptor never carries the client handle itself — that lives
/// alongside it in `registry::ActiveConnection` — so it can be returned
/// wholesale from `Registry::list` without leaking the handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDescriptor {
    pub id: String,
    pub name: String,
    pub kind: BackendKind,
    pub host: String,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub credentials: Option<String>,
    pub region: Option<String>,
    pub wide_column_schema: Option<WideColumnSchema>,
    /// Free-form tags the host may use for its own bookkeeping (e.g. the
    /// logical database number for a key-value connection, carried here
    /// rather than as a dedicated field since only one backend kind uses
    /// it and nothing in the core reads it).
    pub extra: HashMap<String, String>,
}

impl ConnectionDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: BackendKind, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            host: host.into(),
            port: None,
            database: None,
            credentials: None,
            region: None,
            wide_column_schema: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_wide_column_schema(mut self, schema: WideColumnSchema) -> Self {
        self.wide_column_schema = Some(schema);
        self
    }
}
