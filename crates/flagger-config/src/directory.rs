//! Community directory lookups (roles, channels, bot permissions).
//!
//! The directory is owned by the chat platform; the core only asks whether
//! something exists and whether the bot may post somewhere.

use std::collections::HashSet;

use async_trait::async_trait;
use flagger_core::{ChannelId, CommunityId, RoleId, UserId};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRole {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildChannel {
    pub id: ChannelId,
    pub name: String,
}

#[async_trait]
/// Trait contract for role, channel, and permission lookups in a community.
pub trait GuildDirectory: Send + Sync {
    async fn roles(&self, community: &CommunityId) -> Result<Vec<GuildRole>, ConfigError>;

    /// Text channels the bot is able to send messages to.
    async fn text_channels(&self, community: &CommunityId)
        -> Result<Vec<GuildChannel>, ConfigError>;

    /// [`Self::text_channels`] narrowed to channels `viewer` can see.
    async fn text_channels_visible_to(
        &self,
        community: &CommunityId,
        viewer: &UserId,
    ) -> Result<Vec<GuildChannel>, ConfigError>;

    async fn bot_can_send(&self, community: &CommunityId, channel: &ChannelId) -> bool;
}

#[derive(Debug, Clone, Default)]
/// Directory over a fixed snapshot of one community.
///
/// Useful for offline replay of recorded events and for tests.
pub struct StaticGuildDirectory {
    roles: Vec<GuildRole>,
    channels: Vec<GuildChannel>,
    muted_channels: HashSet<ChannelId>,
    hidden_channels: HashSet<(ChannelId, UserId)>,
}

impl StaticGuildDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, id: &str, name: &str) -> Self {
        self.roles.push(GuildRole {
            id: RoleId::new(id),
            name: name.to_string(),
        });
        self
    }

    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.push(GuildChannel {
            id: ChannelId::new(id),
            name: name.to_string(),
        });
        self
    }

    /// Marks `id` as a channel the bot cannot send to.
    pub fn without_send_permission(mut self, id: &str) -> Self {
        self.muted_channels.insert(ChannelId::new(id));
        self
    }

    /// Hides channel `id` from `user`.
    pub fn hidden_from(mut self, id: &str, user: &str) -> Self {
        self.hidden_channels
            .insert((ChannelId::new(id), UserId::new(user)));
        self
    }
}

#[async_trait]
impl GuildDirectory for StaticGuildDirectory {
    async fn roles(&self, _community: &CommunityId) -> Result<Vec<GuildRole>, ConfigError> {
        Ok(self.roles.clone())
    }

    async fn text_channels(
        &self,
        _community: &CommunityId,
    ) -> Result<Vec<GuildChannel>, ConfigError> {
        Ok(self
            .channels
            .iter()
            .filter(|channel| !self.muted_channels.contains(&channel.id))
            .cloned()
            .collect())
    }

    async fn text_channels_visible_to(
        &self,
        community: &CommunityId,
        viewer: &UserId,
    ) -> Result<Vec<GuildChannel>, ConfigError> {
        let mut channels = self.text_channels(community).await?;
        channels.retain(|channel| {
            !self
                .hidden_channels
                .contains(&(channel.id.clone(), viewer.clone()))
        });
        Ok(channels)
    }

    async fn bot_can_send(&self, _community: &CommunityId, channel: &ChannelId) -> bool {
        self.channels.iter().any(|known| &known.id == channel)
            && !self.muted_channels.contains(channel)
    }
}
