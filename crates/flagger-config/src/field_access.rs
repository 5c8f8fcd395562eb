//! Key-based access to configuration fields.
//!
//! UI components name the field they edit with a string key. The key is looked
//! up in a fixed table of typed accessor pairs, so binding a control to a field
//! needs no per-field handler. Only `bool` and `str` values travel through the
//! generic table; the numeric duration fields have their own table and are
//! edited through a dedicated flow.

use std::fmt;

use flagger_core::{ChannelId, RoleId};

use crate::{ConfigError, GuildConfiguration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Wire type of a field value.
pub enum FieldType {
    Bool,
    Str,
}

impl FieldType {
    /// Returns the tag used in encoded component ids.
    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Str => "str",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bool" => Some(Self::Bool),
            "str" => Some(Self::Str),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A value read from or written to a configuration field.
pub enum FieldValue {
    Bool(bool),
    /// Text value. For optional identifier fields the empty string means "unset".
    Str(String),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Str(_) => FieldType::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(text) => Some(text.as_str()),
            Self::Bool(_) => None,
        }
    }
}

struct FieldAccessor {
    key: &'static str,
    field_type: FieldType,
    get: fn(&GuildConfiguration) -> Option<FieldValue>,
    // Only called with a value whose type matches `field_type`.
    set: fn(&mut GuildConfiguration, FieldValue),
}

macro_rules! bool_field {
    ($key:literal, $field:ident) => {
        FieldAccessor {
            key: $key,
            field_type: FieldType::Bool,
            get: |config| Some(FieldValue::Bool(config.$field)),
            set: |config, value| {
                if let FieldValue::Bool(flag) = value {
                    config.$field = flag;
                }
            },
        }
    };
}

macro_rules! text_field {
    ($key:literal, $field:ident) => {
        FieldAccessor {
            key: $key,
            field_type: FieldType::Str,
            get: |config| Some(FieldValue::Str(config.$field.clone())),
            set: |config, value| {
                if let FieldValue::Str(text) = value {
                    config.$field = text;
                }
            },
        }
    };
}

macro_rules! optional_id_field {
    ($key:literal, $field:ident, $id:ty) => {
        FieldAccessor {
            key: $key,
            field_type: FieldType::Str,
            get: |config| {
                config
                    .$field
                    .as_ref()
                    .map(|id| FieldValue::Str(id.as_str().to_string()))
            },
            set: |config, value| {
                if let FieldValue::Str(raw) = value {
                    config.$field = non_empty(raw).map(<$id>::new);
                }
            },
        }
    };
}

static FIELD_ACCESSORS: &[FieldAccessor] = &[
    bool_field!("enabled", enabled),
    FieldAccessor {
        key: "pingModsInCurrentChannel",
        field_type: FieldType::Bool,
        get: |config| Some(FieldValue::Bool(config.ping_mods_in_current_channel)),
        set: set_ping_mods_in_current_channel,
    },
    optional_id_field!("modRole", mod_role, RoleId),
    optional_id_field!("proxyModRole", proxy_mod_role, RoleId),
    optional_id_field!("modPingChannel", mod_ping_channel, ChannelId),
    optional_id_field!("logChannel", log_channel, ChannelId),
    text_field!("confirmationMessage", confirmation_message),
    text_field!("tooFrequentPingMessage", too_frequent_ping_message),
];

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn set_ping_mods_in_current_channel(config: &mut GuildConfiguration, value: FieldValue) {
    if let FieldValue::Bool(flag) = value {
        // A dedicated channel is meaningless while pinging in place.
        if flag {
            config.mod_ping_channel = None;
        }
        config.ping_mods_in_current_channel = flag;
    }
}

fn accessor(key: &str) -> Result<&'static FieldAccessor, ConfigError> {
    FIELD_ACCESSORS
        .iter()
        .find(|accessor| accessor.key == key)
        .ok_or_else(|| ConfigError::UnknownField(key.to_string()))
}

/// Returns every key exposed through the generic accessor table.
pub fn field_keys() -> impl Iterator<Item = &'static str> {
    FIELD_ACCESSORS.iter().map(|accessor| accessor.key)
}

/// Returns the wire type of `key`, or `UnknownField`.
pub fn field_type(key: &str) -> Result<FieldType, ConfigError> {
    accessor(key).map(|accessor| accessor.field_type)
}

/// Reads field `key`. `Ok(None)` means the field exists but is unset.
pub fn get_field(config: &GuildConfiguration, key: &str) -> Result<Option<FieldValue>, ConfigError> {
    accessor(key).map(|accessor| (accessor.get)(config))
}

/// Writes `value` into field `key` after checking its wire type.
pub fn set_field(
    config: &mut GuildConfiguration,
    key: &str,
    value: FieldValue,
) -> Result<(), ConfigError> {
    let accessor = accessor(key)?;
    if value.field_type() != accessor.field_type {
        return Err(ConfigError::FieldTypeMismatch {
            key: key.to_string(),
            expected: accessor.field_type,
        });
    }
    (accessor.set)(config, value);
    Ok(())
}

struct DurationAccessor {
    key: &'static str,
    get: fn(&GuildConfiguration) -> u64,
    set: fn(&mut GuildConfiguration, u64),
}

static DURATION_ACCESSORS: &[DurationAccessor] = &[
    DurationAccessor {
        key: "confirmTimeout",
        get: |config| config.confirm_timeout_ms,
        set: |config, millis| config.confirm_timeout_ms = millis,
    },
    DurationAccessor {
        key: "minTimeBetweenPings",
        get: |config| config.min_time_between_pings_ms,
        set: |config, millis| config.min_time_between_pings_ms = millis,
    },
];

fn duration_accessor(key: &str) -> Result<&'static DurationAccessor, ConfigError> {
    DURATION_ACCESSORS
        .iter()
        .find(|accessor| accessor.key == key)
        .ok_or_else(|| ConfigError::UnknownField(key.to_string()))
}

pub fn duration_field_keys() -> impl Iterator<Item = &'static str> {
    DURATION_ACCESSORS.iter().map(|accessor| accessor.key)
}

/// Reads the duration field `key` in milliseconds.
pub fn get_duration_ms(config: &GuildConfiguration, key: &str) -> Result<u64, ConfigError> {
    duration_accessor(key).map(|accessor| (accessor.get)(config))
}

/// Writes the duration field `key` in milliseconds.
pub fn set_duration_ms(
    config: &mut GuildConfiguration,
    key: &str,
    millis: u64,
) -> Result<(), ConfigError> {
    let accessor = duration_accessor(key)?;
    (accessor.set)(config, millis);
    Ok(())
}
