//! Configuration: TOML connection descriptors plus environment variable
//! expansion.

mod descriptors;

pub use descriptors::{
    expand_env_vars, ConnectionEntry, DescriptorFile, DescriptorFileError, SchemaEntry, SecondaryIndexEntry,
};
