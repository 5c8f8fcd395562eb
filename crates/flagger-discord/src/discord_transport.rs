use std::sync::Arc;

use async_trait::async_trait;
use flagger_core::{ChannelId, MessageId};
use flagger_interactions::{
    FetchedMessage, InteractionToken, MessageView, OutgoingMessage, Transport, TransportError,
};
use serenity::builder::{
    CreateAllowedMentions, CreateInteractionResponseFollowup, CreateMessage,
    EditInteractionResponse, EditMessage,
};
use serenity::http::Http;

use crate::discord_conversion::{
    author, build_embeds, build_rows, channel_id, discord_channel, discord_message, discord_role,
    message_id, transport_error,
};

/// [`Transport`] over the Discord REST API.
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        let target = discord_channel(channel)?;
        let roles = message
            .allowed_role_mentions
            .iter()
            .map(discord_role)
            .collect::<Result<Vec<_>, _>>()?;
        let mut builder = CreateMessage::new()
            .embeds(build_embeds(&message.view))
            .components(build_rows(&message.view))
            .allowed_mentions(CreateAllowedMentions::new().roles(roles));
        if let Some(content) = &message.view.content {
            builder = builder.content(content.clone());
        }
        if let Some(reply_to) = &message.reply_to {
            builder = builder.reference_message((target, discord_message(reply_to)?));
        }
        let sent = target
            .send_message(&*self.http, builder)
            .await
            .map_err(|error| transport_error("send message", error))?;
        tracing::debug!(channel = %channel, message = %sent.id, "sent message");
        Ok(message_id(sent.id))
    }

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        view: MessageView,
    ) -> Result<(), TransportError> {
        let target = discord_channel(channel)?;
        let mut builder = EditMessage::new()
            .embeds(build_embeds(&view))
            .components(build_rows(&view));
        if let Some(content) = &view.content {
            builder = builder.content(content.clone());
        }
        target
            .edit_message(&*self.http, discord_message(message)?, builder)
            .await
            .map_err(|error| transport_error("edit message", error))?;
        Ok(())
    }

    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<FetchedMessage, TransportError> {
        let fetched = discord_channel(channel)?
            .message(&*self.http, discord_message(message)?)
            .await
            .map_err(|error| transport_error("fetch message", error))?;
        Ok(FetchedMessage {
            id: message_id(fetched.id),
            channel: channel_id(fetched.channel_id),
            author: author(&fetched.author),
            content: fetched.content,
        })
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), TransportError> {
        discord_channel(channel)?
            .delete_message(&*self.http, discord_message(message)?)
            .await
            .map_err(|error| transport_error("delete message", error))
    }

    async fn update_interaction(
        &self,
        token: &InteractionToken,
        view: MessageView,
    ) -> Result<(), TransportError> {
        let mut builder = EditInteractionResponse::new()
            .embeds(build_embeds(&view))
            .components(build_rows(&view));
        if let Some(content) = &view.content {
            builder = builder.content(content.clone());
        }
        self.http
            .edit_original_interaction_response(token.as_str(), &builder, Vec::new())
            .await
            .map_err(|error| transport_error("update interaction", error))?;
        Ok(())
    }

    async fn send_ephemeral_followup(
        &self,
        token: &InteractionToken,
        content: &str,
    ) -> Result<(), TransportError> {
        let builder = CreateInteractionResponseFollowup::new()
            .content(content)
            .ephemeral(true);
        self.http
            .create_followup_message(token.as_str(), &builder, Vec::new())
            .await
            .map_err(|error| transport_error("send followup", error))?;
        Ok(())
    }
}
