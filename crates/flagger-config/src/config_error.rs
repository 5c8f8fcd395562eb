use thiserror::Error;

use crate::field_access::FieldType;

#[derive(Debug, Error)]
/// Enumerates failures raised by configuration stores and accessors.
pub enum ConfigError {
    #[error("configuration io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("failed to persist configuration: {0}")]
    Persist(String),
    #[error("configuration directory '{0}' is not a directory")]
    InvalidDirectory(String),
    #[error("community id '{0}' cannot be used as a configuration key")]
    InvalidCommunityId(String),
    #[error("unknown configuration field '{0}'")]
    UnknownField(String),
    #[error("configuration field '{key}' expects a {expected} value")]
    FieldTypeMismatch { key: String, expected: FieldType },
    #[error("guild directory lookup failed: {0}")]
    Directory(String),
}
