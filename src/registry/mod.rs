//! The connection registry: where a host hands this crate a client handle
//! and gets back a place to dispatch `Execute`/`Translate` calls against it
//! (spec §3, §4.7, §9).

pub mod capability;
pub mod descriptor;
pub mod dispatcher;
pub mod error;

pub use capability::{
    ClientHandle, DocumentClient, ExecutionError, KeyValueClient, RelationalClient, Row, Rows, SearchClient,
    WideColumnClient,
};
pub use descriptor::{BackendKind, ConnectionDescriptor, SecondaryIndex, WideColumnSchema};
pub use dispatcher::{QueryResult, Registry, TranslatedQuery};
pub use error::{RegistryError, RegistryResult};
