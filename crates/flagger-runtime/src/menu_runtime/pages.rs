//! Page renderers.
//!
//! Each page is a pure function of one configuration snapshot and the render
//! state. Every control that changes something carries its intent in its
//! component id or option value.

use flagger_config::{
    get_field, ConfigValidationReport, FieldValue, GuildChannel, GuildConfiguration, GuildRole,
};
use flagger_interactions::{
    paginated_select, role_mention, ActionRow, Button, ButtonStyle, ComponentId,
    ComponentIdError, MessageView, OptionVerb, SelectMenu, SelectOption, DEFAULT_PAGE_SIZE,
};

use super::state::{ConfigPage, MenuState, NAVIGATION_SELECT_ID};

pub(crate) const GREEN_CHECK: &str = "✅";
pub(crate) const RED_X: &str = "❌";
pub(crate) const NOT_CONFIGURED: &str = "Not Configured";
pub(crate) const EVERYONE_ROLE: &str = "@everyone";
pub(crate) const NO_ROLES_AVAILABLE: &str = "No roles available";
pub(crate) const NO_CHANNELS_AVAILABLE: &str = "No channels available";

pub(crate) const ROLE_PAGE_STATE: &str = "role_page";
pub(crate) const ROLE_PAGE_CURSOR: &str = "role_page_paginator";
pub(crate) const MESSAGE_STATE: &str = "message";
pub(crate) const CHANNEL_CATEGORY_STATE: &str = "category";
pub(crate) const LOG_CHANNEL_CURSOR: &str = "log_channel_page";
pub(crate) const MOD_PING_CURSOR: &str = "mod_ping_page";

pub(crate) const CONFIRM_TIMEOUT_PRESETS_MS: [u64; 5] = [5_000, 10_000, 15_000, 30_000, 60_000];
pub(crate) const MIN_TIME_BETWEEN_PINGS_PRESETS_MS: [u64; 7] =
    [0, 60_000, 300_000, 600_000, 900_000, 1_800_000, 3_600_000];

struct SubPage {
    label: &'static str,
    value: &'static str,
    description: &'static str,
}

const ROLE_SUB_PAGES: [SubPage; 2] = [
    SubPage {
        label: "Proxy Role",
        value: "proxyModRole",
        description: "The role that users will ping",
    },
    SubPage {
        label: "Mod Role",
        value: "modRole",
        description: "The moderator role that will be pinged by the bot",
    },
];

const MESSAGE_SUB_PAGES: [SubPage; 2] = [
    SubPage {
        label: "Confirmation Message",
        value: "confirmationMessage",
        description: "The message sent to users asking them to confirm pinging",
    },
    SubPage {
        label: "Too Frequent Message",
        value: "tooFrequentPingMessage",
        description: "The message sent to users when they're pinging the mod role too frequently",
    },
];

const CHANNEL_SUB_PAGES: [SubPage; 2] = [
    SubPage {
        label: "Log Channel",
        value: "logChannel",
        description: "Configure the log channel",
    },
    SubPage {
        label: "Mod Ping Channel",
        value: "modPingChannel",
        description: "Configure settings for where moderators should be pinged",
    },
];

/// Everything a page may read, fetched once per render.
pub(crate) struct PageSnapshot {
    pub(crate) configuration: GuildConfiguration,
    pub(crate) report: Option<ConfigValidationReport>,
    pub(crate) roles: Vec<GuildRole>,
    pub(crate) channels: Vec<GuildChannel>,
}

pub(crate) fn render(
    state: &MenuState,
    snapshot: &PageSnapshot,
) -> Result<MessageView, ComponentIdError> {
    let mut view = MessageView::new().with_row(navigation_row(state.page())?);
    match state.page() {
        ConfigPage::Overview => render_overview(&mut view, snapshot)?,
        ConfigPage::RoleConfig => render_roles(&mut view, state, snapshot)?,
        ConfigPage::MessageConfig => render_messages(&mut view, state, snapshot)?,
        ConfigPage::ChannelConfig => render_channels(&mut view, state, snapshot)?,
        ConfigPage::TimeoutConfig => render_timeouts(&mut view, snapshot)?,
    }
    Ok(view)
}

fn navigation_row(current: ConfigPage) -> Result<ActionRow, ComponentIdError> {
    let options = ConfigPage::ALL
        .into_iter()
        .map(|page| -> Result<SelectOption, ComponentIdError> {
            Ok(SelectOption::new(
                page.display_name(),
                ComponentId::menu(page.wire_name()).encode()?,
            )
            .with_default(page == current))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ActionRow::Select(SelectMenu::new(NAVIGATION_SELECT_ID, options)))
}

fn sub_page_row(
    state_key: &str,
    placeholder: &str,
    sub_pages: &[SubPage],
    state: &MenuState,
) -> Result<ActionRow, ComponentIdError> {
    let selected = state.value(state_key);
    let options = sub_pages
        .iter()
        .map(|sub_page| -> Result<SelectOption, ComponentIdError> {
            Ok(SelectOption::new(
                sub_page.label,
                ComponentId::option_str(OptionVerb::State, state_key, sub_page.value).encode()?,
            )
            .with_description(sub_page.description)
            .with_default(selected == Some(sub_page.value)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ActionRow::Select(
        SelectMenu::new(format!("select:{state_key}"), options).with_placeholder(placeholder),
    ))
}

/// The sub-page of `sub_pages` selected in `state`, ignoring unknown values.
fn selected_sub_page<'a>(
    state: &MenuState,
    state_key: &str,
    sub_pages: &'a [SubPage],
) -> Option<&'a SubPage> {
    let selected = state.value(state_key)?;
    sub_pages.iter().find(|sub_page| sub_page.value == selected)
}

fn toggle_button(key: &str, current: bool) -> Result<Button, ComponentIdError> {
    let (label, style) = if current {
        ("Enabled", ButtonStyle::Success)
    } else {
        ("Disabled", ButtonStyle::Danger)
    };
    let custom_id = ComponentId::option(OptionVerb::Set, key, FieldValue::Bool(!current)).encode()?;
    Ok(Button::new(custom_id, label, style))
}

fn label_button(name: &str, label: &str) -> Button {
    Button::new(format!("label:{name}"), label, ButtonStyle::Secondary).disabled(true)
}

fn set_value_id(key: &str, value: &str) -> Result<String, ComponentIdError> {
    ComponentId::option_str(OptionVerb::Set, key, value).encode()
}

fn current_id(configuration: &GuildConfiguration, key: &str) -> Option<String> {
    match get_field(configuration, key) {
        Ok(Some(FieldValue::Str(id))) => Some(id),
        _ => None,
    }
}

/// Select menus need at least one option, so empty pickers become a note.
fn append_line(view: &mut MessageView, line: &str) {
    let content = view.content.get_or_insert_with(String::new);
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(line);
}

fn role_label(role: &GuildRole) -> String {
    format!("@{} [{}]", role.name, role.id)
}

fn render_overview(view: &mut MessageView, snapshot: &PageSnapshot) -> Result<(), ComponentIdError> {
    let mut lines = vec!["**Overview**".to_string()];
    if let Some(report) = &snapshot.report {
        lines.extend(report.iter().map(|(check, passed)| {
            let mark = if passed { GREEN_CHECK } else { RED_X };
            format!("{}: {mark}", check.friendly_name())
        }));
    }
    view.content = Some(lines.join("\n"));
    view.rows.push(ActionRow::Buttons(vec![
        label_button("enabled", "Enabled"),
        toggle_button("enabled", snapshot.configuration.enabled)?,
    ]));
    Ok(())
}

fn render_roles(
    view: &mut MessageView,
    state: &MenuState,
    snapshot: &PageSnapshot,
) -> Result<(), ComponentIdError> {
    let configuration = &snapshot.configuration;
    let describe = |configured: Option<&flagger_core::RoleId>| {
        configured
            .filter(|id| snapshot.roles.iter().any(|role| &role.id == *id))
            .map(role_mention)
            .unwrap_or_else(|| NOT_CONFIGURED.to_string())
    };
    view.content = Some(
        [
            "**Role Configuration**".to_string(),
            format!("Moderator Role: {}", describe(configuration.mod_role.as_ref())),
            format!("Proxy Role: {}", describe(configuration.proxy_mod_role.as_ref())),
        ]
        .join("\n"),
    );
    view.rows.push(sub_page_row(
        ROLE_PAGE_STATE,
        "Select a role to configure",
        &ROLE_SUB_PAGES,
        state,
    )?);

    let Some(sub_page) = selected_sub_page(state, ROLE_PAGE_STATE, &ROLE_SUB_PAGES) else {
        return Ok(());
    };
    let field = sub_page.value;
    let current = current_id(configuration, field);
    let roles: Vec<&GuildRole> = snapshot
        .roles
        .iter()
        .filter(|role| role.name != EVERYONE_ROLE)
        .collect();
    let options = roles
        .iter()
        .map(|role| -> Result<SelectOption, ComponentIdError> {
            Ok(
                SelectOption::new(role_label(role), set_value_id(field, role.id.as_str())?)
                    .with_default(current.as_deref() == Some(role.id.as_str())),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    if options.is_empty() {
        append_line(view, NO_ROLES_AVAILABLE);
        return Ok(());
    }
    let placeholder = roles
        .iter()
        .find(|role| current.as_deref() == Some(role.id.as_str()))
        .map(|role| role_label(role))
        .unwrap_or_else(|| "Select a Role".to_string());
    let select = paginated_select(
        ROLE_PAGE_CURSOR,
        &options,
        state.cursor(ROLE_PAGE_CURSOR),
        DEFAULT_PAGE_SIZE,
        SelectOption::clone,
    )?
    .with_placeholder(placeholder);
    view.rows.push(ActionRow::Select(select));
    Ok(())
}

fn render_messages(
    view: &mut MessageView,
    state: &MenuState,
    snapshot: &PageSnapshot,
) -> Result<(), ComponentIdError> {
    let selected = selected_sub_page(state, MESSAGE_STATE, &MESSAGE_SUB_PAGES);
    let mut lines = vec!["**Messages**".to_string()];
    if let Some(sub_page) = selected {
        if let Ok(Some(FieldValue::Str(text))) = get_field(&snapshot.configuration, sub_page.value) {
            lines.push(format!("```{text}```"));
        }
    }
    view.content = Some(lines.join("\n"));
    view.rows.push(sub_page_row(
        MESSAGE_STATE,
        "Select a message to configure",
        &MESSAGE_SUB_PAGES,
        state,
    )?);
    if let Some(sub_page) = selected {
        let edit = ComponentId::option_str(OptionVerb::Edit, sub_page.value, "").encode()?;
        view.rows.push(ActionRow::Buttons(vec![Button::new(
            edit,
            "Edit",
            ButtonStyle::Primary,
        )]));
    }
    Ok(())
}

fn channel_picker(
    key: &str,
    cursor: &str,
    leading_disabled: bool,
    state: &MenuState,
    snapshot: &PageSnapshot,
) -> Result<Option<SelectMenu>, ComponentIdError> {
    let current = current_id(&snapshot.configuration, key);
    let mut options = Vec::with_capacity(snapshot.channels.len() + 1);
    if leading_disabled {
        options.push(SelectOption::new("Disabled", set_value_id(key, "")?).with_default(current.is_none()));
    }
    for channel in &snapshot.channels {
        options.push(
            SelectOption::new(format!("#{}", channel.name), set_value_id(key, channel.id.as_str())?)
                .with_default(current.as_deref() == Some(channel.id.as_str())),
        );
    }
    if options.is_empty() {
        return Ok(None);
    }
    let placeholder = snapshot
        .channels
        .iter()
        .find(|channel| current.as_deref() == Some(channel.id.as_str()))
        .map(|channel| format!("#{}", channel.name))
        .unwrap_or_else(|| "Select a Channel".to_string());
    let select = paginated_select(
        cursor,
        &options,
        state.cursor(cursor),
        DEFAULT_PAGE_SIZE,
        SelectOption::clone,
    )?;
    Ok(Some(select.with_placeholder(placeholder)))
}

fn render_channels(
    view: &mut MessageView,
    state: &MenuState,
    snapshot: &PageSnapshot,
) -> Result<(), ComponentIdError> {
    view.content = Some(
        "**Channel Configuration**\n\nNot seeing the channel you're looking for? Ensure I have permissions to send messages there!"
            .to_string(),
    );
    view.rows.push(sub_page_row(
        CHANNEL_CATEGORY_STATE,
        "Select a channel setting to configure",
        &CHANNEL_SUB_PAGES,
        state,
    )?);
    let Some(sub_page) = selected_sub_page(state, CHANNEL_CATEGORY_STATE, &CHANNEL_SUB_PAGES) else {
        return Ok(());
    };
    match sub_page.value {
        "logChannel" => {
            if let Some(picker) =
                channel_picker("logChannel", LOG_CHANNEL_CURSOR, true, state, snapshot)?
            {
                view.rows.push(ActionRow::Select(picker));
            }
        }
        _ => {
            let in_place = snapshot.configuration.ping_mods_in_current_channel;
            view.rows.push(ActionRow::Buttons(vec![
                label_button("pingModsInCurrentChannel", "Ping Mods in Current Channel"),
                toggle_button("pingModsInCurrentChannel", in_place)?,
            ]));
            if !in_place {
                match channel_picker("modPingChannel", MOD_PING_CURSOR, false, state, snapshot)? {
                    Some(picker) => view.rows.push(ActionRow::Select(picker)),
                    None => append_line(view, NO_CHANNELS_AVAILABLE),
                }
            }
        }
    }
    Ok(())
}

/// Human-readable duration, e.g. `30 seconds`, `5 minutes`, `Off` for zero.
pub fn describe_duration(millis: u64) -> String {
    let plural = |count: u64, unit: &str| {
        if count == 1 {
            format!("1 {unit}")
        } else {
            format!("{count} {unit}s")
        }
    };
    match millis {
        0 => "Off".to_string(),
        ms if ms % 3_600_000 == 0 => plural(ms / 3_600_000, "hour"),
        ms if ms % 60_000 == 0 => plural(ms / 60_000, "minute"),
        ms if ms % 1_000 == 0 => plural(ms / 1_000, "second"),
        ms => format!("{ms} ms"),
    }
}

fn duration_select(
    key: &str,
    placeholder: &str,
    presets: &[u64],
    current: u64,
) -> Result<ActionRow, ComponentIdError> {
    let options = presets
        .iter()
        .map(|millis| -> Result<SelectOption, ComponentIdError> {
            let value =
                ComponentId::option_str(OptionVerb::Duration, key, millis.to_string()).encode()?;
            Ok(SelectOption::new(describe_duration(*millis), value).with_default(*millis == current))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ActionRow::Select(
        SelectMenu::new(format!("select:{key}"), options).with_placeholder(placeholder),
    ))
}

fn render_timeouts(view: &mut MessageView, snapshot: &PageSnapshot) -> Result<(), ComponentIdError> {
    let configuration = &snapshot.configuration;
    view.content = Some(
        [
            "**Timeout Configuration**".to_string(),
            format!(
                "Confirmation Timeout: {}",
                describe_duration(configuration.confirm_timeout_ms)
            ),
            format!(
                "Minimum Time Between Pings: {}",
                describe_duration(configuration.min_time_between_pings_ms)
            ),
        ]
        .join("\n"),
    );
    view.rows.push(duration_select(
        "confirmTimeout",
        "Confirmation timeout",
        &CONFIRM_TIMEOUT_PRESETS_MS,
        configuration.confirm_timeout_ms,
    )?);
    view.rows.push(duration_select(
        "minTimeBetweenPings",
        "Minimum time between pings",
        &MIN_TIME_BETWEEN_PINGS_PRESETS_MS,
        configuration.min_time_between_pings_ms,
    )?);
    Ok(())
}
