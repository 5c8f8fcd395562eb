//! Mapping between the platform-neutral view model and serenity types.

use std::num::NonZeroU64;

use flagger_core::{ChannelId, CommunityId, MessageId, RoleId, UserId};
use flagger_interactions::{
    ActionRow, Button, ButtonStyle, Embed, MessageAuthor, MessageView, SelectMenu, SelectOption,
    TransportError,
};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateEmbed, CreateSelectMenu, CreateSelectMenuKind,
    CreateSelectMenuOption,
};
use serenity::model::application::{
    ActionRow as DiscordActionRow, ActionRowComponent, ButtonKind,
    ButtonStyle as DiscordButtonStyle, SelectMenu as DiscordSelectMenu,
};
use serenity::model::id as discord_id;
use serenity::model::user::User;

/// Parses a snowflake id. Discord ids are never zero.
pub(crate) fn parse_snowflake(raw: &str) -> Option<NonZeroU64> {
    raw.trim().parse::<NonZeroU64>().ok()
}

fn snowflake(raw: &str) -> Result<u64, TransportError> {
    parse_snowflake(raw)
        .map(NonZeroU64::get)
        .ok_or_else(|| TransportError::InvalidId(raw.to_string()))
}

pub(crate) fn discord_channel(id: &ChannelId) -> Result<discord_id::ChannelId, TransportError> {
    snowflake(id.as_str()).map(discord_id::ChannelId::new)
}

pub(crate) fn discord_message(id: &MessageId) -> Result<discord_id::MessageId, TransportError> {
    snowflake(id.as_str()).map(discord_id::MessageId::new)
}

pub(crate) fn discord_role(id: &RoleId) -> Result<discord_id::RoleId, TransportError> {
    snowflake(id.as_str()).map(discord_id::RoleId::new)
}

pub(crate) fn discord_guild(id: &CommunityId) -> Result<discord_id::GuildId, TransportError> {
    snowflake(id.as_str()).map(discord_id::GuildId::new)
}

pub(crate) fn community_id(guild: discord_id::GuildId) -> CommunityId {
    CommunityId::new(guild.to_string())
}

pub(crate) fn channel_id(channel: discord_id::ChannelId) -> ChannelId {
    ChannelId::new(channel.to_string())
}

pub(crate) fn message_id(message: discord_id::MessageId) -> MessageId {
    MessageId::new(message.to_string())
}

pub(crate) fn author(user: &User) -> MessageAuthor {
    MessageAuthor {
        id: UserId::new(user.id.to_string()),
        display_name: user.tag(),
        is_bot: user.bot,
    }
}

/// Classifies a serenity failure by HTTP status where one is available.
pub(crate) fn transport_error(action: &str, error: serenity::Error) -> TransportError {
    if let serenity::Error::Http(http_error) = &error {
        match http_error.status_code().map(|status| status.as_u16()) {
            Some(403) => return TransportError::PermissionDenied(format!("{action}: {error}")),
            Some(404) => return TransportError::NotFound(format!("{action}: {error}")),
            _ => {}
        }
    }
    TransportError::Delivery(format!("{action}: {error}"))
}

pub(crate) fn build_embeds(view: &MessageView) -> Vec<CreateEmbed> {
    view.embeds.iter().map(build_embed).collect()
}

fn build_embed(embed: &Embed) -> CreateEmbed {
    CreateEmbed::new()
        .description(embed.description.clone())
        .colour(embed.color)
}

pub(crate) fn build_rows(view: &MessageView) -> Vec<CreateActionRow> {
    view.rows
        .iter()
        .map(|row| match row {
            ActionRow::Buttons(buttons) => {
                CreateActionRow::Buttons(buttons.iter().map(build_button).collect())
            }
            ActionRow::Select(select) => CreateActionRow::SelectMenu(build_select(select)),
        })
        .collect()
}

fn build_button(button: &Button) -> CreateButton {
    let style = match button.style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    };
    CreateButton::new(button.custom_id.clone())
        .label(button.label.clone())
        .style(style)
        .disabled(button.disabled)
}

fn build_select(select: &SelectMenu) -> CreateSelectMenu {
    let options = select
        .options
        .iter()
        .map(|option| {
            let mut builder = CreateSelectMenuOption::new(option.label.clone(), option.value.clone())
                .default_selection(option.default);
            if let Some(description) = &option.description {
                builder = builder.description(description.clone());
            }
            builder
        })
        .collect();
    let mut builder =
        CreateSelectMenu::new(select.custom_id.clone(), CreateSelectMenuKind::String { options })
            .min_values(select.min_values)
            .max_values(select.max_values)
            .disabled(select.disabled);
    if let Some(placeholder) = &select.placeholder {
        builder = builder.placeholder(placeholder.clone());
    }
    builder
}

/// Reads the live component rows of a message back into the view model.
///
/// Link buttons and non-string selects never carry flagger intents and are
/// dropped.
pub(crate) fn read_rows(rows: &[DiscordActionRow]) -> Vec<ActionRow> {
    rows.iter()
        .filter_map(|row| {
            let mut buttons = Vec::new();
            for component in &row.components {
                match component {
                    ActionRowComponent::Button(button) => {
                        if let ButtonKind::NonLink { custom_id, style } = &button.data {
                            buttons.push(
                                Button::new(
                                    custom_id.clone(),
                                    button.label.clone().unwrap_or_default(),
                                    read_style(*style),
                                )
                                .disabled(button.disabled),
                            );
                        }
                    }
                    ActionRowComponent::SelectMenu(select) => {
                        return Some(ActionRow::Select(read_select(select)));
                    }
                    _ => {}
                }
            }
            (!buttons.is_empty()).then_some(ActionRow::Buttons(buttons))
        })
        .collect()
}

fn read_style(style: DiscordButtonStyle) -> ButtonStyle {
    match style {
        DiscordButtonStyle::Primary => ButtonStyle::Primary,
        DiscordButtonStyle::Success => ButtonStyle::Success,
        DiscordButtonStyle::Danger => ButtonStyle::Danger,
        _ => ButtonStyle::Secondary,
    }
}

fn read_select(select: &DiscordSelectMenu) -> SelectMenu {
    let options = select
        .options
        .iter()
        .map(|option| {
            let mut read = SelectOption::new(option.label.clone(), option.value.clone())
                .with_default(option.default);
            if let Some(description) = &option.description {
                read = read.with_description(description.clone());
            }
            read
        })
        .collect();
    let mut read = SelectMenu::new(select.custom_id.clone().unwrap_or_default(), options);
    read.min_values = select.min_values.unwrap_or(1);
    read.max_values = select.max_values.unwrap_or(1);
    read.disabled = select.disabled;
    if let Some(placeholder) = &select.placeholder {
        read = read.with_placeholder(placeholder.clone());
    }
    read
}
