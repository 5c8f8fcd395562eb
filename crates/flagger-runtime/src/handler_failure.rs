use flagger_config::ConfigError;
use flagger_interactions::{ComponentIdError, TransportError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates failures scoped to a single message or interaction.
///
/// None of these stop the process; handlers log them and report them in their
/// outcome.
pub enum HandlerFailure {
    /// Malformed component id, unknown field key, or mistyped value.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A field the operation needs is not configured.
    #[error("configuration incomplete: {0} is not set")]
    ConfigurationIncomplete(&'static str),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transient delivery failure: {0}")]
    TransientDelivery(String),
    /// The configuration store or directory could not be read or written.
    #[error("configuration unavailable: {0}")]
    ConfigurationUnavailable(String),
}

impl From<TransportError> for HandlerFailure {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::PermissionDenied(detail) => Self::PermissionDenied(detail),
            other => Self::TransientDelivery(other.to_string()),
        }
    }
}

impl From<ConfigError> for HandlerFailure {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::UnknownField(_) | ConfigError::FieldTypeMismatch { .. } => {
                Self::Protocol(error.to_string())
            }
            other => Self::ConfigurationUnavailable(other.to_string()),
        }
    }
}

impl From<ComponentIdError> for HandlerFailure {
    fn from(error: ComponentIdError) -> Self {
        Self::Protocol(error.to_string())
    }
}
