//! Confirmation and rate-limited escalation of proxy role mentions.
//!
//! A message mentioning the proxy role gets either the too-frequent reply or a
//! Yes/No confirmation prompt. The prompt is tracked as a pending confirmation
//! keyed by the triggering message; exactly one of confirm, deny, or the
//! timeout retires it and disables the buttons. Confirming sends the real
//! moderator ping.
//!
//! The entry is registered before the prompt is sent, so a click that beats
//! the send's completion still finds it.

use std::sync::{Arc, Mutex, PoisonError};

use flagger_config::GuildConfiguration;
use flagger_core::{ChannelId, CommunityId, MessageId};
use flagger_interactions::{
    role_mention, ActionRow, Button, ButtonClicked, ButtonStyle, ComponentId, ComponentIdError,
    Embed, MessageReceived, MessageView, OutgoingMessage, PendingRegistry, ProxyAction, Transport,
    CONFIRMATION_EMBED_COLOR,
};

use crate::{HandlerFailure, LastPingLedger, RuntimeServices};


/// Mention text used when the configured moderator role no longer exists.
pub const MOD_ROLE_NOT_FOUND: &str = "<<Mod Role Not Found>>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptSlot {
    Sending,
    Sent(MessageId),
    /// The timeout fired before the send returned; the sender disables it.
    ExpiredWhileSending,
}

#[derive(Debug, Clone)]
struct PendingConfirmation {
    channel: ChannelId,
    view: MessageView,
    slot: Arc<Mutex<PromptSlot>>,
}

impl PendingConfirmation {
    fn sent_prompt(&self) -> Option<MessageId> {
        match &*self.slot.lock().unwrap_or_else(PoisonError::into_inner) {
            PromptSlot::Sent(prompt) => Some(prompt.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of inspecting one inbound message.
pub enum ProxyMessageOutcome {
    Disabled,
    NotTriggered,
    /// The too-frequent reply was sent; no confirmation was created.
    RateLimited,
    AwaitingConfirmation {
        prompt: MessageId,
    },
    Failed(HandlerFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of a confirm or deny click.
pub enum ProxyClickOutcome {
    Unrecognized,
    /// Someone other than the author clicked; the prompt stays live.
    WrongUser,
    /// The confirmation was already retired by another click or the timeout.
    AlreadyRetired,
    Confirmed(EscalationOutcome),
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    Sent {
        channel: ChannelId,
        message: MessageId,
    },
    /// The triggering message could not be fetched, typically because it was deleted.
    OriginalMessageUnavailable,
    Skipped(HandlerFailure),
    DeliveryFailed(HandlerFailure),
}

/// Escalation workflow bound to one set of runtime services.
pub struct ProxyRuntime {
    services: RuntimeServices,
    ledger: Arc<LastPingLedger>,
    pending: PendingRegistry<MessageId, PendingConfirmation>,
}

impl ProxyRuntime {
    pub fn new(services: RuntimeServices) -> Self {
        Self {
            services,
            ledger: Arc::new(LastPingLedger::new()),
            pending: PendingRegistry::new(),
        }
    }

    pub fn last_mod_role_ping(&self, community: &CommunityId) -> Option<u64> {
        self.ledger.last_ping(community)
    }

    pub fn reset_last_mod_role_ping(&self, community: &CommunityId) {
        self.ledger.reset(community);
    }

    pub fn is_eligible_for_ping(
        &self,
        community: &CommunityId,
        configuration: &GuildConfiguration,
        now_unix_ms: u64,
    ) -> bool {
        self.ledger
            .is_eligible(community, configuration.min_time_between_pings_ms, now_unix_ms)
    }

    /// Number of prompts still waiting for a click or timeout.
    pub fn pending_confirmations(&self) -> usize {
        self.pending.len()
    }

    #[tracing::instrument(
        name = "flagger.proxy.handle_message",
        skip(self, message),
        fields(community = %message.community, message = %message.message)
    )]
    pub async fn handle_message(&self, message: &MessageReceived) -> ProxyMessageOutcome {
        if message.author.is_bot {
            return ProxyMessageOutcome::NotTriggered;
        }
        let configuration = match self.services.configuration.get(&message.community).await {
            Ok(configuration) => configuration,
            Err(error) => {
                tracing::warn!(%error, "failed to load configuration");
                return ProxyMessageOutcome::Failed(error.into());
            }
        };
        if !configuration.enabled {
            tracing::debug!("proxy disabled, ignoring message");
            return ProxyMessageOutcome::Disabled;
        }
        let triggered = configuration
            .proxy_mod_role
            .as_ref()
            .is_some_and(|role| message.mentions_role(role));
        if !triggered {
            tracing::debug!("no proxy role mention");
            return ProxyMessageOutcome::NotTriggered;
        }

        let now = self.services.clock.now_unix_ms();
        if !self.is_eligible_for_ping(&message.community, &configuration, now) {
            tracing::info!(author = %message.author.display_name, "sending too-frequent reply");
            let reply = OutgoingMessage::new(MessageView::text(
                configuration.too_frequent_ping_message.clone(),
            ))
            .replying_to(message.message.clone());
            return match self.services.transport.send_message(&message.channel, reply).await {
                Ok(_) => ProxyMessageOutcome::RateLimited,
                Err(error) => {
                    tracing::warn!(%error, "failed to send too-frequent reply");
                    ProxyMessageOutcome::Failed(error.into())
                }
            };
        }

        tracing::info!(author = %message.author.display_name, "sending confirmation prompt");
        self.send_confirmation_prompt(message, &configuration).await
    }

    async fn send_confirmation_prompt(
        &self,
        message: &MessageReceived,
        configuration: &GuildConfiguration,
    ) -> ProxyMessageOutcome {
        let view = match confirmation_prompt(message, &configuration.confirmation_message) {
            Ok(view) => view,
            Err(error) => {
                tracing::error!(%error, "cannot encode confirmation buttons");
                return ProxyMessageOutcome::Failed(error.into());
            }
        };
        let slot = Arc::new(Mutex::new(PromptSlot::Sending));
        let pending = PendingConfirmation {
            channel: message.channel.clone(),
            view: view.clone(),
            slot: Arc::clone(&slot),
        };
        let transport = Arc::clone(&self.services.transport);
        self.pending.register(
            message.message.clone(),
            pending,
            configuration.confirm_timeout(),
            self.services.scheduler.as_ref(),
            move |original, pending| async move {
                tracing::debug!(%original, "timed out waiting for confirmation");
                let prompt = {
                    let mut slot = pending.slot.lock().unwrap_or_else(PoisonError::into_inner);
                    match &*slot {
                        PromptSlot::Sent(prompt) => Some(prompt.clone()),
                        _ => {
                            *slot = PromptSlot::ExpiredWhileSending;
                            None
                        }
                    }
                };
                if let Some(prompt) = prompt {
                    disable_prompt(transport.as_ref(), &pending.channel, &prompt, &pending.view)
                        .await;
                }
            },
        );

        let outgoing = OutgoingMessage::new(view.clone()).replying_to(message.message.clone());
        let prompt = match self.services.transport.send_message(&message.channel, outgoing).await {
            Ok(prompt) => prompt,
            Err(error) => {
                tracing::warn!(%error, "failed to send confirmation prompt");
                self.pending.retire(&message.message);
                return ProxyMessageOutcome::Failed(error.into());
            }
        };
        let expired = {
            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let expired = *slot == PromptSlot::ExpiredWhileSending;
            *slot = PromptSlot::Sent(prompt.clone());
            expired
        };
        if expired {
            tracing::debug!(%prompt, "confirmation timed out while the prompt was sending");
            disable_prompt(
                self.services.transport.as_ref(),
                &message.channel,
                &prompt,
                &view,
            )
            .await;
        }
        ProxyMessageOutcome::AwaitingConfirmation { prompt }
    }

    #[tracing::instrument(
        name = "flagger.proxy.handle_button_click",
        skip(self, click),
        fields(
            community = %click.interaction.community,
            user = %click.interaction.user,
            component_id = %click.component_id
        )
    )]
    pub async fn handle_button_click(&self, click: &ButtonClicked) -> ProxyClickOutcome {
        let Some(ComponentId::Proxy {
            user,
            channel,
            message,
            action,
        }) = ComponentId::decode(&click.component_id)
        else {
            tracing::debug!("not a proxy component");
            return ProxyClickOutcome::Unrecognized;
        };
        if user != click.interaction.user {
            tracing::debug!(expected = %user, "ignoring click from another user");
            return ProxyClickOutcome::WrongUser;
        }
        let Some(pending) = self.pending.retire(&message) else {
            tracing::debug!(%message, "confirmation already retired");
            return ProxyClickOutcome::AlreadyRetired;
        };

        let outcome = match action {
            ProxyAction::Confirm => ProxyClickOutcome::Confirmed(
                self.escalate(&click.interaction.community, &channel, &message)
                    .await,
            ),
            ProxyAction::Deny => {
                tracing::info!(%message, "escalation denied by author");
                ProxyClickOutcome::Denied
            }
        };
        // Before the send returns, the clicked message is the prompt.
        let prompt = pending
            .sent_prompt()
            .unwrap_or_else(|| click.interaction.message.clone());
        disable_prompt(
            self.services.transport.as_ref(),
            &pending.channel,
            &prompt,
            &pending.view,
        )
        .await;
        outcome
    }

    /// Sends the real moderator ping for `original` in `channel`.
    ///
    /// Configuration is fetched again here since the prompt may have waited a
    /// long time.
    async fn escalate(
        &self,
        community: &CommunityId,
        channel: &ChannelId,
        original: &MessageId,
    ) -> EscalationOutcome {
        let configuration = match self.services.configuration.get(community).await {
            Ok(configuration) => configuration,
            Err(error) => {
                tracing::warn!(%error, "failed to load configuration for escalation");
                return EscalationOutcome::Skipped(error.into());
            }
        };
        let original = match self.services.transport.fetch_message(channel, original).await {
            Ok(original) => original,
            Err(error) => {
                tracing::warn!(%error, %original, "original message unavailable, skipping escalation");
                return EscalationOutcome::OriginalMessageUnavailable;
            }
        };
        let Some(mod_role) = configuration.mod_role.clone() else {
            tracing::warn!("moderator role not configured, skipping escalation");
            return EscalationOutcome::Skipped(HandlerFailure::ConfigurationIncomplete("modRole"));
        };
        let target = if configuration.ping_mods_in_current_channel {
            channel.clone()
        } else {
            match configuration.mod_ping_channel.clone() {
                Some(target) => target,
                None => {
                    tracing::warn!("mod ping channel not configured, skipping escalation");
                    return EscalationOutcome::Skipped(HandlerFailure::ConfigurationIncomplete(
                        "modPingChannel",
                    ));
                }
            }
        };
        if !self.services.directory.bot_can_send(community, &target).await {
            tracing::warn!(%target, "no permission to send the moderator ping");
            return EscalationOutcome::Skipped(HandlerFailure::PermissionDenied(format!(
                "cannot send messages in channel {target}"
            )));
        }

        let mention = match self.services.directory.roles(community).await {
            Ok(roles) if !roles.iter().any(|role| role.id == mod_role) => {
                MOD_ROLE_NOT_FOUND.to_string()
            }
            Ok(_) => role_mention(&mod_role),
            Err(error) => {
                tracing::warn!(%error, "role lookup failed, mentioning configured role");
                role_mention(&mod_role)
            }
        };
        let text = format!("{mention} {}: {}", original.author.display_name, original.content);
        let ping = OutgoingMessage::new(MessageView::text(text)).allowing_role_mention(mod_role);

        self.ledger
            .record(community, self.services.clock.now_unix_ms());
        match self.services.transport.send_message(&target, ping).await {
            Ok(message) => {
                tracing::info!(channel = %target, %message, "sent moderator ping");
                EscalationOutcome::Sent {
                    channel: target,
                    message,
                }
            }
            Err(error) => {
                tracing::warn!(%error, channel = %target, "failed to send moderator ping");
                EscalationOutcome::DeliveryFailed(error.into())
            }
        }
    }
}

/// Builds the Yes/No prompt for a message that mentioned the proxy role.
pub fn confirmation_prompt(
    message: &MessageReceived,
    confirmation_message: &str,
) -> Result<MessageView, ComponentIdError> {
    let component_id = |action| {
        ComponentId::Proxy {
            user: message.author.id.clone(),
            channel: message.channel.clone(),
            message: message.message.clone(),
            action,
        }
        .encode()
    };
    Ok(MessageView::new()
        .with_embed(Embed {
            description: confirmation_message.to_string(),
            color: CONFIRMATION_EMBED_COLOR,
        })
        .with_row(ActionRow::Buttons(vec![
            Button::new(component_id(ProxyAction::Confirm)?, "Yes", ButtonStyle::Success),
            Button::new(component_id(ProxyAction::Deny)?, "No", ButtonStyle::Danger),
        ])))
}

async fn disable_prompt(
    transport: &dyn Transport,
    channel: &ChannelId,
    prompt: &MessageId,
    view: &MessageView,
) {
    if let Err(error) = transport
        .edit_message(channel, prompt, view.with_components_disabled())
        .await
    {
        tracing::warn!(%error, %prompt, "failed to disable confirmation buttons");
    }
}
