//! Inbound events and the outbound transport contract.
//!
//! The platform adapter converts gateway events into these structs and
//! implements `Transport` for everything the handlers send back.

use std::fmt;

use async_trait::async_trait;
use flagger_core::{ChannelId, CommunityId, MessageId, RoleId, UserId};
use thiserror::Error;

use crate::{ActionRow, MessageView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAuthor {
    pub id: UserId,
    /// Human-readable name used when quoting the author, e.g. `name#0001`.
    pub display_name: String,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A message posted in a community channel.
pub struct MessageReceived {
    pub community: CommunityId,
    pub channel: ChannelId,
    pub message: MessageId,
    pub author: MessageAuthor,
    pub content: String,
    pub mentioned_roles: Vec<RoleId>,
}

impl MessageReceived {
    pub fn mentions_role(&self, role: &RoleId) -> bool {
        self.mentioned_roles.iter().any(|mentioned| mentioned == role)
    }
}

#[derive(Clone, PartialEq, Eq)]
/// Opaque token that authorizes responses to one interaction.
pub struct InteractionToken(String);

impl InteractionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InteractionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InteractionToken(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where a component interaction happened and what the message looked like.
pub struct InteractionContext {
    pub community: CommunityId,
    pub channel: ChannelId,
    /// Message carrying the component that was used.
    pub message: MessageId,
    pub user: UserId,
    pub token: InteractionToken,
    /// Rows of the message as the user saw them.
    pub rows: Vec<ActionRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonClicked {
    pub component_id: String,
    pub interaction: InteractionContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectChosen {
    pub component_id: String,
    pub chosen_values: Vec<String>,
    pub interaction: InteractionContext,
}

impl SelectChosen {
    /// First chosen value; menus are single-choice.
    pub fn chosen(&self) -> Option<&str> {
        self.chosen_values.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub view: MessageView,
    pub reply_to: Option<MessageId>,
    /// Roles the message may actually notify. Every other mention is inert.
    pub allowed_role_mentions: Vec<RoleId>,
}

impl OutgoingMessage {
    pub fn new(view: MessageView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn replying_to(mut self, message: MessageId) -> Self {
        self.reply_to = Some(message);
        self
    }

    pub fn allowing_role_mention(mut self, role: RoleId) -> Self {
        self.allowed_role_mentions.push(role);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: MessageAuthor,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates transport failures.
pub enum TransportError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
/// Trait contract for messages and interaction responses sent to the platform.
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError>;

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        view: MessageView,
    ) -> Result<(), TransportError>;

    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<FetchedMessage, TransportError>;

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), TransportError>;

    /// Replaces the message the interaction came from.
    async fn update_interaction(
        &self,
        token: &InteractionToken,
        view: MessageView,
    ) -> Result<(), TransportError>;

    /// Sends a message only the interacting user can see.
    async fn send_ephemeral_followup(
        &self,
        token: &InteractionToken,
        content: &str,
    ) -> Result<(), TransportError>;
}

/// Mention markup that pings `role`.
pub fn role_mention(role: &RoleId) -> String {
    format!("<@&{role}>")
}

/// Mention markup for `channel`.
pub fn channel_mention(channel: &ChannelId) -> String {
    format!("<#{channel}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_mentions_use_platform_markup() {
        assert_eq!(role_mention(&RoleId::new("42")), "<@&42>");
        assert_eq!(channel_mention(&ChannelId::new("7")), "<#7>");
    }

    #[test]
    fn unit_interaction_token_is_redacted_in_debug_output() {
        let token = InteractionToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "InteractionToken(..)");
        assert_eq!(token.as_str(), "secret-token");
    }
}
