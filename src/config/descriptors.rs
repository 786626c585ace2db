//! TOML-based connection descriptor loading.
//!
//! A convenience loader a host may use to seed `Registry::register` calls —
//! the registry itself never touches the filesystem. Kept close to the
//! teacher's `Settings::load()` search order and `${VAR}` expansion, now
//! loading `[[connections]]` entries shaped like the connection descriptor
//! (`id`, `name`, `kind`, `host`, `port`, `database`, `credentials`,
//! `region`, `wide_column_schema`) instead of driver/connection-string
//! pairs.
//!
//! ```toml
//! [[connections]]
//! id = "prod-pg"
//! name = "production postgres"
//! kind = "relational"
//! host = "db.internal"
//! port = 5432
//! database = "app"
//! credentials = "${PROD_DB_PASSWORD}"
//!
//! [[connections]]
//! id = "prod-ddb"
//! name = "production dynamodb"
//! kind = "wide_column"
//! host = "dynamodb.us-east-1.amazonaws.com"
//! region = "us-east-1"
//!
//! [connections.wide_column_schema]
//! partition_key = "user_id"
//! sort_key = "created_at"
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::descriptor::{BackendKind, ConnectionDescriptor, SecondaryIndex, WideColumnSchema};

/// Error type for descriptor-file loading.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorFileError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("unsupported backend kind: {0}")]
    UnsupportedKind(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),
}

/// A single `[[connections]]` entry as it appears in TOML, before
/// `kind` is resolved into `BackendKind` and `credentials` has its
/// environment variables expanded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionEntry {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub wide_column_schema: Option<SchemaEntry>,
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaEntry {
    pub partition_key: String,
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub secondary_indexes: Vec<SecondaryIndexEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecondaryIndexEntry {
    pub name: String,
    pub partition_key: String,
    #[serde(default)]
    pub sort_key: Option<String>,
}

fn parse_kind(kind: &str) -> Result<BackendKind, DescriptorFileError> {
    match kind.to_ascii_lowercase().as_str() {
        "relational" | "sql" => Ok(BackendKind::Relational),
        "document" => Ok(BackendKind::Document),
        "search" => Ok(BackendKind::Search),
        "wide_column" | "wide-column" => Ok(BackendKind::WideColumn),
        "key_value" | "key-value" => Ok(BackendKind::KeyValue),
        other => Err(DescriptorFileError::UnsupportedKind(other.to_string())),
    }
}

impl ConnectionEntry {
    /// Resolve into a `ConnectionDescriptor`, expanding `${VAR}`/`$VAR` in
    /// `credentials`.
    pub fn resolve(&self) -> Result<ConnectionDescriptor, DescriptorFileError> {
        let kind = parse_kind(&self.kind)?;
        let credentials = self.credentials.as_deref().map(expand_env_vars).transpose()?;

        let mut descriptor = ConnectionDescriptor::new(&self.id, &self.name, kind, &self.host);
        descriptor.port = self.port;
        descriptor.database = self.database.clone();
        descriptor.credentials = credentials;
        descriptor.region = self.region.clone();
        descriptor.extra = self.extra.clone();
        descriptor.wide_column_schema = self.wide_column_schema.as_ref().map(|s| {
            let mut schema = WideColumnSchema::new(&s.partition_key);
            if let Some(sort_key) = &s.sort_key {
                schema = schema.with_sort_key(sort_key);
            }
            for index in &s.secondary_indexes {
                schema = schema.with_index(SecondaryIndex {
                    name: index.name.clone(),
                    partition_key: index.partition_key.clone(),
                    sort_key: index.sort_key.clone(),
                });
            }
            schema
        });
        Ok(descriptor)
    }
}

/// Root of a `mantis.toml`-shaped descriptor file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DescriptorFile {
    #[serde(default, rename = "connections")]
    pub connections: Vec<ConnectionEntry>,
}

impl DescriptorFile {
    /// Load from an explicit path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DescriptorFileError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DescriptorFileError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Search order: `MANTIS_CONFIG` env var, then `./mantis.toml`, then
    /// `~/.config/mantis/config.toml`, then an empty default.
    pub fn load() -> Result<Self, DescriptorFileError> {
        if let Ok(path) = env::var("MANTIS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("mantis.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mantis").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(DescriptorFile::default())
    }

    /// Resolve every entry into a `ConnectionDescriptor`.
    pub fn resolve_all(&self) -> Result<Vec<ConnectionDescriptor>, DescriptorFileError> {
        self.connections.iter().map(ConnectionEntry::resolve).collect()
    }

    /// Resolve a single entry by id.
    pub fn resolve_one(&self, id: &str) -> Result<ConnectionDescriptor, DescriptorFileError> {
        self.connections
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| DescriptorFileError::ConnectionNotFound(id.to_string()))?
            .resolve()
    }
}

/// Expand `${VAR}` and `$VAR` references in a string.
pub fn expand_env_vars(s: &str) -> Result<String, DescriptorFileError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            let value = env::var(&var_name).map_err(|_| DescriptorFileError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                result.push('$');
            } else {
                let value = env::var(&var_name).map_err(|_| DescriptorFileError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
