//! Interactive configuration menu.
//!
//! Every interaction re-reads the render state from the message it came from,
//! applies the intent decoded from the component, and re-renders the page from
//! a freshly fetched configuration snapshot. Free-text fields are edited by
//! capturing the user's next message in the channel.

use std::time::Duration;

use flagger_config::{
    field_type, set_duration_ms, set_field, validate_configuration, ConfigError, FieldType,
    FieldValue, GuildConfiguration,
};
use flagger_core::{ChannelId, CommunityId, UserId};
use flagger_interactions::{
    ButtonClicked, ComponentId, InteractionContext, InteractionToken, MessageReceived,
    MessageView, OptionVerb, ResponseRegistry, SelectChosen,
};

use crate::{HandlerFailure, RuntimeServices};

mod pages;
mod state;

pub use pages::describe_duration;
pub use state::{ConfigPage, MenuState, NAVIGATION_SELECT_ID};

use pages::PageSnapshot;

/// Ephemeral reply sent when a free-text edit starts.
pub const EDIT_PROMPT: &str = "Type the new message into the chat and send it";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Stale or foreign component; nothing changed.
    Ignored,
    Rerendered { page: ConfigPage },
    /// A capture was started for the text field `key`.
    AwaitingInput { key: String },
    Failed(HandlerFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// No capture was waiting on this author and channel.
    NotCaptured,
    /// A blank message (e.g. attachments only) reached a waiting capture; the
    /// wait stays open.
    BlankIgnored,
    Applied { key: String },
    Failed(HandlerFailure),
}

struct PendingCapture {
    community: CommunityId,
    key: String,
    token: InteractionToken,
    state: MenuState,
}

/// Configuration menu bound to one set of runtime services.
pub struct MenuRuntime {
    services: RuntimeServices,
    captures: ResponseRegistry<PendingCapture>,
}

impl MenuRuntime {
    pub fn new(services: RuntimeServices, capture_timeout: Duration) -> Self {
        let captures = ResponseRegistry::new(services.scheduler.clone(), capture_timeout);
        Self { services, captures }
    }

    /// Renders `page` with fresh render state.
    pub async fn render_page(
        &self,
        community: &CommunityId,
        page: ConfigPage,
    ) -> Result<MessageView, HandlerFailure> {
        self.render(community, &MenuState::new(page)).await
    }

    pub async fn render(
        &self,
        community: &CommunityId,
        state: &MenuState,
    ) -> Result<MessageView, HandlerFailure> {
        let snapshot = self.snapshot(community, state.page(), None).await?;
        pages::render(state, &snapshot).map_err(HandlerFailure::from)
    }

    /// Like [`Self::render`], listing only channels `viewer` can see.
    pub async fn render_for(
        &self,
        community: &CommunityId,
        state: &MenuState,
        viewer: &UserId,
    ) -> Result<MessageView, HandlerFailure> {
        let snapshot = self.snapshot(community, state.page(), Some(viewer)).await?;
        pages::render(state, &snapshot).map_err(HandlerFailure::from)
    }

    async fn snapshot(
        &self,
        community: &CommunityId,
        page: ConfigPage,
        viewer: Option<&UserId>,
    ) -> Result<PageSnapshot, HandlerFailure> {
        let configuration = self.services.configuration.get(community).await?;
        let directory = self.services.directory.as_ref();
        let report = match page {
            ConfigPage::Overview => {
                Some(validate_configuration(community, &configuration, directory).await?)
            }
            _ => None,
        };
        let roles = match page {
            ConfigPage::RoleConfig => directory.roles(community).await?,
            _ => Vec::new(),
        };
        let channels = match (page, viewer) {
            (ConfigPage::ChannelConfig, Some(viewer)) => {
                directory.text_channels_visible_to(community, viewer).await?
            }
            (ConfigPage::ChannelConfig, None) => directory.text_channels(community).await?,
            _ => Vec::new(),
        };
        Ok(PageSnapshot {
            configuration,
            report,
            roles,
            channels,
        })
    }

    /// Whether a free-text edit is waiting on `user` in `channel`.
    pub fn is_capturing(&self, user: &UserId, channel: &ChannelId) -> bool {
        self.captures.is_waiting(user, channel)
    }

    #[tracing::instrument(
        name = "flagger.menu.handle_button_click",
        skip(self, click),
        fields(community = %click.interaction.community, component_id = %click.component_id)
    )]
    pub async fn handle_button_click(&self, click: &ButtonClicked) -> MenuOutcome {
        match ComponentId::decode(&click.component_id) {
            Some(intent) => self.apply(&click.interaction, intent).await,
            None => {
                tracing::debug!("ignoring unrecognized button");
                MenuOutcome::Ignored
            }
        }
    }

    #[tracing::instrument(
        name = "flagger.menu.handle_select_menu",
        skip(self, select),
        fields(community = %select.interaction.community, component_id = %select.component_id)
    )]
    pub async fn handle_select_menu(&self, select: &SelectChosen) -> MenuOutcome {
        match select.chosen().and_then(ComponentId::decode) {
            Some(intent) => self.apply(&select.interaction, intent).await,
            None => {
                tracing::debug!(chosen = ?select.chosen_values, "ignoring unrecognized selection");
                MenuOutcome::Ignored
            }
        }
    }

    async fn apply(&self, interaction: &InteractionContext, intent: ComponentId) -> MenuOutcome {
        let mut state = MenuState::from_rows(&interaction.rows);
        match intent {
            ComponentId::Menu { page } => match ConfigPage::from_wire(&page) {
                Some(page) => state = MenuState::new(page),
                None => {
                    tracing::debug!(%page, "unknown menu page");
                    return MenuOutcome::Ignored;
                }
            },
            ComponentId::Option {
                verb: OptionVerb::State,
                key,
                value: FieldValue::Str(value),
            } => state.set_value(key, value),
            ComponentId::Option {
                verb: OptionVerb::Page,
                key,
                value: FieldValue::Str(value),
            } => match value.parse::<usize>() {
                Ok(page) => state.set_cursor(key, page),
                Err(_) => {
                    tracing::debug!(cursor = %key, %value, "invalid page index");
                    return MenuOutcome::Ignored;
                }
            },
            ComponentId::Option {
                verb: OptionVerb::Set,
                key,
                value,
            } => {
                let updated = self
                    .update_configuration(&interaction.community, |configuration| {
                        set_field(configuration, &key, value)
                    })
                    .await;
                if let Err(failure) = updated {
                    return MenuOutcome::Failed(failure);
                }
            }
            ComponentId::Option {
                verb: OptionVerb::Duration,
                key,
                value: FieldValue::Str(value),
            } => {
                let Ok(millis) = value.parse::<u64>() else {
                    tracing::debug!(field = %key, %value, "invalid duration");
                    return MenuOutcome::Ignored;
                };
                let updated = self
                    .update_configuration(&interaction.community, |configuration| {
                        set_duration_ms(configuration, &key, millis)
                    })
                    .await;
                if let Err(failure) = updated {
                    return MenuOutcome::Failed(failure);
                }
            }
            ComponentId::Option {
                verb: OptionVerb::Edit,
                key,
                ..
            } => return self.start_capture(interaction, key, state).await,
            ComponentId::Option { verb, key, .. } => {
                tracing::debug!(verb = verb.as_str(), %key, "ignoring option with mistyped value");
                return MenuOutcome::Ignored;
            }
            ComponentId::Proxy { .. } => return MenuOutcome::Ignored,
        }
        self.rerender(interaction, &state).await
    }

    /// Applies `mutate` to a fresh snapshot and persists it.
    async fn update_configuration(
        &self,
        community: &CommunityId,
        mutate: impl FnOnce(&mut GuildConfiguration) -> Result<(), ConfigError>,
    ) -> Result<(), HandlerFailure> {
        let mut configuration = self.services.configuration.get(community).await?;
        if let Err(error) = mutate(&mut configuration) {
            report_field_error(&error);
            return Err(error.into());
        }
        self.services
            .configuration
            .set(community, configuration)
            .await?;
        Ok(())
    }

    async fn rerender(&self, interaction: &InteractionContext, state: &MenuState) -> MenuOutcome {
        let view = match self
            .render_for(&interaction.community, state, &interaction.user)
            .await
        {
            Ok(view) => view,
            Err(failure) => {
                tracing::warn!(%failure, "failed to render menu");
                return MenuOutcome::Failed(failure);
            }
        };
        match self
            .services
            .transport
            .update_interaction(&interaction.token, view)
            .await
        {
            Ok(()) => MenuOutcome::Rerendered { page: state.page() },
            Err(error) => {
                tracing::warn!(%error, "failed to update menu message");
                MenuOutcome::Failed(error.into())
            }
        }
    }

    async fn start_capture(
        &self,
        interaction: &InteractionContext,
        key: String,
        state: MenuState,
    ) -> MenuOutcome {
        match field_type(&key) {
            Ok(FieldType::Str) => {}
            Ok(FieldType::Bool) => {
                tracing::debug!(field = %key, "free-text edit requested for a toggle");
                return MenuOutcome::Failed(HandlerFailure::Protocol(format!(
                    "field '{key}' is not a text field"
                )));
            }
            Err(error) => {
                report_field_error(&error);
                return MenuOutcome::Failed(error.into());
            }
        }
        if let Err(error) = self
            .services
            .transport
            .send_ephemeral_followup(&interaction.token, EDIT_PROMPT)
            .await
        {
            tracing::warn!(%error, "failed to send edit prompt");
            return MenuOutcome::Failed(error.into());
        }
        tracing::debug!(field = %key, user = %interaction.user, "waiting for free-text input");
        self.captures.await_response(
            interaction.user.clone(),
            interaction.channel.clone(),
            PendingCapture {
                community: interaction.community.clone(),
                key: key.clone(),
                token: interaction.token.clone(),
                state,
            },
        );
        MenuOutcome::AwaitingInput { key }
    }

    /// Feeds an inbound message to a waiting capture, if there is one.
    #[tracing::instrument(
        name = "flagger.menu.handle_message",
        skip(self, message),
        fields(community = %message.community, message = %message.message)
    )]
    pub async fn handle_message(&self, message: &MessageReceived) -> CaptureOutcome {
        if message.content.trim().is_empty()
            && self.captures.is_waiting(&message.author.id, &message.channel)
        {
            tracing::debug!(user = %message.author.id, "ignoring blank capture input");
            return CaptureOutcome::BlankIgnored;
        }
        let Some(capture) = self.captures.resolve(&message.author.id, &message.channel) else {
            return CaptureOutcome::NotCaptured;
        };
        tracing::debug!(field = %capture.key, "applying captured text");
        let text = FieldValue::Str(message.content.clone());
        let updated = self
            .update_configuration(&capture.community, |configuration| {
                set_field(configuration, &capture.key, text)
            })
            .await;
        if let Err(failure) = updated {
            return CaptureOutcome::Failed(failure);
        }

        if let Err(error) = self
            .services
            .transport
            .delete_message(&message.channel, &message.message)
            .await
        {
            tracing::warn!(%error, "failed to delete captured message");
        }
        match self
            .render_for(&capture.community, &capture.state, &message.author.id)
            .await
        {
            Ok(view) => {
                if let Err(error) = self
                    .services
                    .transport
                    .update_interaction(&capture.token, view)
                    .await
                {
                    tracing::warn!(%error, "failed to refresh menu after edit");
                }
            }
            Err(failure) => tracing::warn!(%failure, "failed to render menu after edit"),
        }
        CaptureOutcome::Applied { key: capture.key }
    }
}

fn report_field_error(error: &ConfigError) {
    match error {
        ConfigError::UnknownField(key) => {
            tracing::error!(field = %key, "component references an unknown configuration field");
            if cfg!(debug_assertions) {
                panic!("unknown configuration field '{key}'");
            }
        }
        other => tracing::warn!(error = %other, "rejected configuration change"),
    }
}
