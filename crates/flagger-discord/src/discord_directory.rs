//! Role and channel lookups against the Discord REST API.

use std::sync::Arc;

use async_trait::async_trait;
use flagger_config::{ConfigError, GuildChannel, GuildDirectory, GuildRole};
use flagger_core::{ChannelId, CommunityId, RoleId, UserId as FlaggerUserId};
use serenity::http::Http;
use serenity::model::channel::{Channel, ChannelType, GuildChannel as DiscordGuildChannel};
use serenity::model::guild::{Member, PartialGuild};
use serenity::model::id::{ChannelId as DiscordChannelId, GuildId, UserId};
use tokio::sync::OnceCell;

use crate::discord_conversion::{channel_id, discord_channel, discord_guild, parse_snowflake};

/// Channel kinds that are listed in pickers and may receive pings.
fn is_postable(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Text | ChannelType::News)
}

fn is_thread(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
    )
}

/// [`GuildDirectory`] backed by live guild data.
pub struct SerenityDirectory {
    http: Arc<Http>,
    bot_user: OnceCell<UserId>,
}

impl SerenityDirectory {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            bot_user: OnceCell::new(),
        }
    }

    async fn bot_user(&self) -> Result<UserId, serenity::Error> {
        self.bot_user
            .get_or_try_init(|| async { self.http.get_current_user().await.map(|user| user.id) })
            .await
            .copied()
    }

    async fn bot_member(&self, guild: GuildId) -> Result<Member, serenity::Error> {
        guild.member(&*self.http, self.bot_user().await?).await
    }

    /// Postable channels where the bot's effective permissions include sending.
    async fn sendable_channels(
        &self,
        guild: GuildId,
    ) -> Result<(PartialGuild, Vec<DiscordGuildChannel>), serenity::Error> {
        let partial = guild.to_partial_guild(&*self.http).await?;
        let member = self.bot_member(guild).await?;
        let mut channels: Vec<DiscordGuildChannel> = guild
            .channels(&*self.http)
            .await?
            .into_values()
            .filter(|channel| is_postable(channel.kind))
            .filter(|channel| {
                let permissions = partial.user_permissions_in(channel, &member);
                permissions.view_channel() && permissions.send_messages()
            })
            .collect();
        channels.sort_by_key(|channel| channel.position);
        Ok((partial, channels))
    }

    async fn guild_channel(
        &self,
        channel: DiscordChannelId,
    ) -> Result<Option<DiscordGuildChannel>, serenity::Error> {
        match self.http.get_channel(channel).await? {
            Channel::Guild(channel) => Ok(Some(channel)),
            _ => Ok(None),
        }
    }

    /// Resolves `channel` directly so threads and announcement channels are
    /// covered; threads are judged by their parent's permissions.
    async fn can_send_in(
        &self,
        guild: GuildId,
        channel: DiscordChannelId,
    ) -> Result<bool, serenity::Error> {
        let Some(target) = self.guild_channel(channel).await? else {
            return Ok(false);
        };
        if target.guild_id != guild {
            return Ok(false);
        }
        let partial = guild.to_partial_guild(&*self.http).await?;
        let member = self.bot_member(guild).await?;
        if is_thread(target.kind) {
            let Some(parent) = target.parent_id else {
                return Ok(false);
            };
            let Some(parent) = self.guild_channel(parent).await? else {
                return Ok(false);
            };
            let permissions = partial.user_permissions_in(&parent, &member);
            return Ok(permissions.view_channel() && permissions.send_messages_in_threads());
        }
        if !is_postable(target.kind) {
            return Ok(false);
        }
        let permissions = partial.user_permissions_in(&target, &member);
        Ok(permissions.view_channel() && permissions.send_messages())
    }
}

fn lookup_error(community: &CommunityId, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::Directory(format!("community {community}: {error}"))
}

#[async_trait]
impl GuildDirectory for SerenityDirectory {
    async fn roles(&self, community: &CommunityId) -> Result<Vec<GuildRole>, ConfigError> {
        let guild = discord_guild(community).map_err(|error| lookup_error(community, error))?;
        let mut roles: Vec<_> = guild
            .roles(&*self.http)
            .await
            .map_err(|error| lookup_error(community, error))?
            .into_values()
            .collect();
        roles.sort_by(|left, right| right.position.cmp(&left.position));
        Ok(roles
            .into_iter()
            .map(|role| GuildRole {
                id: RoleId::new(role.id.to_string()),
                name: role.name,
            })
            .collect())
    }

    async fn text_channels(
        &self,
        community: &CommunityId,
    ) -> Result<Vec<GuildChannel>, ConfigError> {
        let guild = discord_guild(community).map_err(|error| lookup_error(community, error))?;
        let (_, channels) = self
            .sendable_channels(guild)
            .await
            .map_err(|error| lookup_error(community, error))?;
        Ok(channels
            .into_iter()
            .map(|channel| GuildChannel {
                id: channel_id(channel.id),
                name: channel.name,
            })
            .collect())
    }

    async fn text_channels_visible_to(
        &self,
        community: &CommunityId,
        viewer: &FlaggerUserId,
    ) -> Result<Vec<GuildChannel>, ConfigError> {
        let guild = discord_guild(community).map_err(|error| lookup_error(community, error))?;
        let viewer = parse_snowflake(viewer.as_str())
            .map(|id| UserId::new(id.get()))
            .ok_or_else(|| lookup_error(community, format!("invalid user id '{viewer}'")))?;
        let (partial, channels) = self
            .sendable_channels(guild)
            .await
            .map_err(|error| lookup_error(community, error))?;
        let member = guild
            .member(&*self.http, viewer)
            .await
            .map_err(|error| lookup_error(community, error))?;
        Ok(channels
            .into_iter()
            .filter(|channel| partial.user_permissions_in(channel, &member).view_channel())
            .map(|channel| GuildChannel {
                id: channel_id(channel.id),
                name: channel.name,
            })
            .collect())
    }

    async fn bot_can_send(&self, community: &CommunityId, channel: &ChannelId) -> bool {
        let (Ok(guild), Ok(target)) = (discord_guild(community), discord_channel(channel)) else {
            return false;
        };
        match self.can_send_in(guild, target).await {
            Ok(allowed) => allowed,
            Err(error) => {
                tracing::warn!(%community, %channel, %error, "permission lookup failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_announcement_channels_are_postable_and_threads_are_not_listed() {
        assert!(is_postable(ChannelType::Text));
        assert!(is_postable(ChannelType::News));
        assert!(!is_postable(ChannelType::Voice));
        assert!(!is_postable(ChannelType::PublicThread));
        for kind in [
            ChannelType::PublicThread,
            ChannelType::PrivateThread,
            ChannelType::NewsThread,
        ] {
            assert!(is_thread(kind));
        }
        assert!(!is_thread(ChannelType::News));
    }
}
