//! Per-community configuration for the moderator proxy.
//!
//! Holds the configuration record, the store contract with file-backed and
//! in-memory implementations, directory lookups used for validation, and the
//! key-based field accessor that binds menu controls to record fields.

pub mod config_error;
pub mod directory;
pub mod field_access;
pub mod guild_configuration;
pub mod store;
pub mod validation;

pub use config_error::ConfigError;
pub use directory::{GuildChannel, GuildDirectory, GuildRole, StaticGuildDirectory};
pub use field_access::{
    duration_field_keys, field_keys, field_type, get_duration_ms, get_field, set_duration_ms,
    set_field, FieldType, FieldValue,
};
pub use guild_configuration::{
    GuildConfiguration, DEFAULT_CONFIRMATION_MESSAGE, DEFAULT_CONFIRM_TIMEOUT_MS,
    DEFAULT_TOO_FREQUENT_PING_MESSAGE,
};
pub use store::{ConfigurationService, FileConfigurationStore, InMemoryConfigurationStore};
pub use validation::{validate_configuration, ConfigValidation, ConfigValidationReport};
