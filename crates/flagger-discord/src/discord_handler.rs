//! Gateway event handler.
//!
//! Translates serenity events into router events. Component interactions are
//! acknowledged with a deferred update before dispatch so the handlers can
//! edit the menu through the interaction token.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use flagger_core::RoleId;
use flagger_interactions::{
    ButtonClicked, InteractionContext, InteractionToken, MessageReceived, SelectChosen,
};
use flagger_runtime::{describe_duration, ConfigPage, EventRouter};
use serenity::builder::{
    CreateCommand, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse,
};
use serenity::client::{Context, EventHandler};
use serenity::http::Http;
use serenity::model::application::{
    Command, CommandInteraction, ComponentInteraction, ComponentInteractionDataKind, Interaction,
};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::GuildId;
use serenity::model::permissions::Permissions;

use crate::discord_conversion::{
    author, build_embeds, build_rows, channel_id, community_id, message_id, read_rows,
};

pub(crate) const CONFIG_COMMAND: &str = "config";
pub(crate) const PING_COMMAND: &str = "ping";

/// Serenity event handler that feeds the [`EventRouter`].
pub struct FlaggerHandler {
    router: Arc<EventRouter>,
    command_guilds: Vec<GuildId>,
}

impl FlaggerHandler {
    /// `command_guilds` empty registers slash commands globally.
    pub fn new(router: Arc<EventRouter>, command_guilds: Vec<GuildId>) -> Self {
        Self {
            router,
            command_guilds,
        }
    }

    async fn handle_component(&self, ctx: &Context, component: &ComponentInteraction) {
        let Some(guild) = component.guild_id else {
            tracing::debug!("ignoring component interaction outside a guild");
            return;
        };
        if let Err(error) = component
            .create_response(ctx, CreateInteractionResponse::Acknowledge)
            .await
        {
            tracing::warn!(%error, custom_id = %component.data.custom_id, "failed to acknowledge interaction");
            return;
        }
        let interaction = InteractionContext {
            community: community_id(guild),
            channel: channel_id(component.channel_id),
            message: message_id(component.message.id),
            user: author(&component.user).id,
            token: InteractionToken::new(component.token.clone()),
            rows: read_rows(&component.message.components),
        };
        match &component.data.kind {
            ComponentInteractionDataKind::Button => {
                let click = ButtonClicked {
                    component_id: component.data.custom_id.clone(),
                    interaction,
                };
                let route = self.router.handle_button_click(&click).await;
                tracing::debug!(?route, "handled button click");
            }
            ComponentInteractionDataKind::StringSelect { values } => {
                let select = SelectChosen {
                    component_id: component.data.custom_id.clone(),
                    chosen_values: values.clone(),
                    interaction,
                };
                let outcome = self.router.handle_select_menu(&select).await;
                tracing::debug!(?outcome, "handled select menu");
            }
            other => tracing::debug!(kind = ?other, "ignoring unsupported component"),
        }
    }

    async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        let result = match command.data.name.as_str() {
            CONFIG_COMMAND => self.config_command(ctx, command).await,
            PING_COMMAND => ping_command(ctx, command).await,
            other => {
                tracing::debug!(command = other, "ignoring unknown command");
                Ok(())
            }
        };
        if let Err(error) = result {
            tracing::warn!(command = %command.data.name, %error, "failed to answer command");
        }
    }

    async fn config_command(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        let reply = CreateInteractionResponseMessage::new().ephemeral(true);
        let reply = match command.guild_id {
            None => reply.content("This command can only be used in a server"),
            Some(guild) => {
                match self
                    .router
                    .render_page(&community_id(guild), ConfigPage::Overview)
                    .await
                {
                    Ok(view) => {
                        let reply = reply
                            .embeds(build_embeds(&view))
                            .components(build_rows(&view));
                        match view.content {
                            Some(content) => reply.content(content),
                            None => reply,
                        }
                    }
                    Err(failure) => {
                        tracing::warn!(%failure, %guild, "failed to render configuration menu");
                        reply.content("The configuration menu is unavailable right now")
                    }
                }
            }
        };
        command
            .create_response(ctx, CreateInteractionResponse::Message(reply))
            .await
    }
}

async fn ping_command(ctx: &Context, command: &CommandInteraction) -> Result<(), serenity::Error> {
    let started = Instant::now();
    command
        .create_response(
            ctx,
            CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new()),
        )
        .await?;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    command
        .edit_response(
            ctx,
            EditInteractionResponse::new().content(format!("Pong! {}", describe_duration(elapsed_ms))),
        )
        .await?;
    Ok(())
}

pub(crate) fn slash_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(PING_COMMAND)
            .description("Check's the bot's ping")
            .default_member_permissions(Permissions::MANAGE_ROLES),
        CreateCommand::new(CONFIG_COMMAND)
            .description("Displays the configuration")
            .default_member_permissions(Permissions::MANAGE_ROLES),
    ]
}

async fn register_commands(http: &Http, guilds: &[GuildId]) -> Result<(), serenity::Error> {
    if guilds.is_empty() {
        let registered = Command::set_global_commands(http, slash_commands()).await?;
        tracing::info!(count = registered.len(), "updated global slash commands");
        return Ok(());
    }
    for guild in guilds {
        let registered = guild.set_commands(http, slash_commands()).await?;
        tracing::info!(%guild, count = registered.len(), "updated guild slash commands");
    }
    Ok(())
}

/// Converts a gateway message into a router event; `None` for bot and DM messages.
pub(crate) fn message_received(message: &Message) -> Option<MessageReceived> {
    if message.author.bot {
        return None;
    }
    let guild = message.guild_id?;
    Some(MessageReceived {
        community: community_id(guild),
        channel: channel_id(message.channel_id),
        message: message_id(message.id),
        author: author(&message.author),
        content: message.content.clone(),
        mentioned_roles: message
            .mention_roles
            .iter()
            .map(|role| RoleId::new(role.to_string()))
            .collect(),
    })
}

#[async_trait]
impl EventHandler for FlaggerHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to discord");
        if let Err(error) = register_commands(&ctx.http, &self.command_guilds).await {
            tracing::warn!(%error, "failed to register slash commands");
        }
    }

    async fn message(&self, _ctx: Context, message: Message) {
        let Some(event) = message_received(&message) else {
            return;
        };
        let route = self.router.handle_message(&event).await;
        tracing::debug!(?route, "handled message");
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.handle_command(&ctx, &command).await,
            Interaction::Component(component) => self.handle_component(&ctx, &component).await,
            _ => {}
        }
    }
}
