//! Component id codec.
//!
//! Every button and select option the bot renders carries an id that encodes
//! what should happen when it is used. Callbacks are stateless: the id is the
//! only thing that survives between rendering a message and handling a click
//! on it, possibly long after a restart. Grammar:
//!
//! ```text
//! menu:<page>
//! option:<verb>:<key>:<bool|str>;<value>
//! proxy:<user>:<channel>:<message>:<confirm|deny>
//! ```
//!
//! Every segment except `<value>` is non-empty and free of `:` and `;`.
//! Decoding never fails loudly: ids from stale messages simply decode to
//! `None`.

use flagger_config::{FieldType, FieldValue};
use flagger_core::{ChannelId, MessageId, UserId};
use thiserror::Error;

/// Discord rejects component ids and option values longer than this.
pub const MAX_COMPONENT_ID_LEN: usize = 100;

const MENU_PREFIX: &str = "menu";
const OPTION_PREFIX: &str = "option";
const PROXY_PREFIX: &str = "proxy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What an `option:` component does with its key and value.
pub enum OptionVerb {
    /// Assign a configuration field through the field accessor.
    Set,
    /// Assign an ephemeral render-state key.
    State,
    /// Move a pagination cursor; the value is the target page.
    Page,
    /// Ask the user to type a new value for a text field.
    Edit,
    /// Assign a duration field; the value is milliseconds.
    Duration,
}

impl OptionVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::State => "state",
            Self::Page => "page",
            Self::Edit => "edit",
            Self::Duration => "duration",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "set" => Some(Self::Set),
            "state" => Some(Self::State),
            "page" => Some(Self::Page),
            "edit" => Some(Self::Edit),
            "duration" => Some(Self::Duration),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyAction {
    Confirm,
    Deny,
}

impl ProxyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Deny => "deny",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "confirm" => Some(Self::Confirm),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decoded intent of a component id.
pub enum ComponentId {
    Menu {
        page: String,
    },
    Option {
        verb: OptionVerb,
        key: String,
        value: FieldValue,
    },
    Proxy {
        user: UserId,
        channel: ChannelId,
        message: MessageId,
        action: ProxyAction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates reasons a component id cannot be encoded.
pub enum ComponentIdError {
    #[error("component id segment '{0}' is empty or contains ':' or ';'")]
    InvalidSegment(String),
    #[error("encoded component id is {len} characters long; the limit is {limit}")]
    TooLong { len: usize, limit: usize },
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains([':', ';'])
}

fn check_segment(segment: &str) -> Result<(), ComponentIdError> {
    if is_valid_segment(segment) {
        Ok(())
    } else {
        Err(ComponentIdError::InvalidSegment(segment.to_string()))
    }
}

impl ComponentId {
    pub fn menu(page: impl Into<String>) -> Self {
        Self::Menu { page: page.into() }
    }

    pub fn option(verb: OptionVerb, key: impl Into<String>, value: FieldValue) -> Self {
        Self::Option {
            verb,
            key: key.into(),
            value,
        }
    }

    /// Shorthand for an `option:` id carrying a text value.
    pub fn option_str(verb: OptionVerb, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::option(verb, key, FieldValue::Str(value.into()))
    }

    pub fn encode(&self) -> Result<String, ComponentIdError> {
        let encoded = match self {
            Self::Menu { page } => {
                check_segment(page)?;
                format!("{MENU_PREFIX}:{page}")
            }
            Self::Option { verb, key, value } => {
                check_segment(key)?;
                let (field_type, raw) = match value {
                    FieldValue::Bool(flag) => (FieldType::Bool, flag.to_string()),
                    FieldValue::Str(text) => (FieldType::Str, text.clone()),
                };
                format!(
                    "{OPTION_PREFIX}:{}:{key}:{};{raw}",
                    verb.as_str(),
                    field_type.as_tag()
                )
            }
            Self::Proxy {
                user,
                channel,
                message,
                action,
            } => {
                check_segment(user.as_str())?;
                check_segment(channel.as_str())?;
                check_segment(message.as_str())?;
                format!(
                    "{PROXY_PREFIX}:{user}:{channel}:{message}:{}",
                    action.as_str()
                )
            }
        };
        let len = encoded.chars().count();
        if len > MAX_COMPONENT_ID_LEN {
            return Err(ComponentIdError::TooLong {
                len,
                limit: MAX_COMPONENT_ID_LEN,
            });
        }
        Ok(encoded)
    }

    /// Decodes `raw`, returning `None` for anything outside the grammar.
    pub fn decode(raw: &str) -> Option<Self> {
        let (prefix, rest) = raw.split_once(':')?;
        match prefix {
            MENU_PREFIX => is_valid_segment(rest).then(|| Self::menu(rest)),
            OPTION_PREFIX => decode_option(rest),
            PROXY_PREFIX => decode_proxy(rest),
            _ => None,
        }
    }

    pub fn is_proxy(raw: &str) -> bool {
        raw.starts_with("proxy:")
    }
}

fn decode_option(rest: &str) -> Option<ComponentId> {
    let (head, raw_value) = rest.split_once(';')?;
    let segments: Vec<&str> = head.split(':').collect();
    let [verb, key, tag] = segments.as_slice() else {
        return None;
    };
    let verb = OptionVerb::parse(verb)?;
    if !is_valid_segment(key) {
        return None;
    }
    let value = match FieldType::from_tag(tag)? {
        FieldType::Bool => match raw_value {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => return None,
        },
        FieldType::Str => FieldValue::Str(raw_value.to_string()),
    };
    Some(ComponentId::option(verb, *key, value))
}

fn decode_proxy(rest: &str) -> Option<ComponentId> {
    let segments: Vec<&str> = rest.split(':').collect();
    let [user, channel, message, action] = segments.as_slice() else {
        return None;
    };
    if ![user, channel, message].iter().all(|segment| !segment.is_empty()) {
        return None;
    }
    Some(ComponentId::Proxy {
        user: UserId::new(*user),
        channel: ChannelId::new(*channel),
        message: MessageId::new(*message),
        action: ProxyAction::parse(action)?,
    })
}
