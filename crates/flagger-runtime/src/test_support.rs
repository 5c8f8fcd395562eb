//! Fakes shared by the runtime unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::Notify;
use flagger_config::{
    GuildConfiguration, InMemoryConfigurationStore, StaticGuildDirectory,
};
use flagger_core::{ChannelId, CommunityId, ManualClock, MessageId, RoleId, UserId};
use flagger_interactions::{
    FetchedMessage, InteractionToken, ManualScheduler, MessageAuthor, MessageReceived,
    MessageView, OutgoingMessage, Transport, TransportError,
};

use crate::RuntimeServices;

pub(crate) const COMMUNITY: &str = "100";
pub(crate) const CHANNEL: &str = "200";
pub(crate) const MOD_CHANNEL: &str = "201";
pub(crate) const AUTHOR: &str = "300";
pub(crate) const MOD_ROLE: &str = "400";
pub(crate) const PROXY_ROLE: &str = "401";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TransportCall {
    Send {
        channel: ChannelId,
        message: OutgoingMessage,
    },
    Edit {
        channel: ChannelId,
        message: MessageId,
        view: MessageView,
    },
    Delete {
        channel: ChannelId,
        message: MessageId,
    },
    UpdateInteraction {
        view: MessageView,
    },
    Ephemeral {
        content: String,
    },
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    stored: Mutex<HashMap<MessageId, FetchedMessage>>,
    next_id: AtomicU64,
    fail_sends: AtomicBool,
    held_send: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl RecordingTransport {
    pub(crate) fn store(&self, message: FetchedMessage) {
        self.stored
            .lock()
            .expect("stored lock")
            .insert(message.id.clone(), message);
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Parks the next send after it is recorded. The first notify fires once
    /// the send is parked; notifying the second lets it return.
    pub(crate) fn hold_next_send(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.held_send.lock().expect("held send lock") =
            Some((Arc::clone(&entered), Arc::clone(&release)));
        (entered, release)
    }

    pub(crate) fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn sends(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Send { channel, message } => Some((channel, message)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn edits(&self) -> Vec<(MessageId, MessageView)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Edit { message, view, .. } => Some((message, view)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn updates(&self) -> Vec<MessageView> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::UpdateInteraction { view } => Some(view),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Delivery("send rejected".to_string()));
        }
        self.record(TransportCall::Send {
            channel: channel.clone(),
            message,
        });
        let id = 9_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        let held = self.held_send.lock().expect("held send lock").take();
        if let Some((entered, release)) = held {
            entered.notify_one();
            release.notified().await;
        }
        Ok(MessageId::new(id.to_string()))
    }

    async fn edit_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
        view: MessageView,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Edit {
            channel: channel.clone(),
            message: message.clone(),
            view,
        });
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel: &ChannelId,
        message: &MessageId,
    ) -> Result<FetchedMessage, TransportError> {
        self.stored
            .lock()
            .expect("stored lock")
            .get(message)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(message.to_string()))
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Delete {
            channel: channel.clone(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn update_interaction(
        &self,
        _token: &InteractionToken,
        view: MessageView,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::UpdateInteraction { view });
        Ok(())
    }

    async fn send_ephemeral_followup(
        &self,
        _token: &InteractionToken,
        content: &str,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Ephemeral {
            content: content.to_string(),
        });
        Ok(())
    }
}

pub(crate) struct Harness {
    pub(crate) services: RuntimeServices,
    pub(crate) store: Arc<InMemoryConfigurationStore>,
    pub(crate) transport: Arc<RecordingTransport>,
    pub(crate) scheduler: Arc<ManualScheduler>,
    pub(crate) clock: Arc<ManualClock>,
}

pub(crate) fn directory() -> StaticGuildDirectory {
    StaticGuildDirectory::new()
        .with_role(COMMUNITY, "@everyone")
        .with_role(MOD_ROLE, "Moderators")
        .with_role(PROXY_ROLE, "Mods")
        .with_channel(CHANNEL, "general")
        .with_channel(MOD_CHANNEL, "mod-pings")
}

pub(crate) fn enabled_configuration() -> GuildConfiguration {
    GuildConfiguration {
        enabled: true,
        mod_role: Some(RoleId::new(MOD_ROLE)),
        proxy_mod_role: Some(RoleId::new(PROXY_ROLE)),
        ..GuildConfiguration::default()
    }
}

pub(crate) fn harness_with(
    configuration: GuildConfiguration,
    directory: StaticGuildDirectory,
) -> Harness {
    let directory = Arc::new(directory);
    let store = Arc::new(
        InMemoryConfigurationStore::new(directory.clone()).with_record(COMMUNITY, configuration),
    );
    let transport = Arc::new(RecordingTransport::default());
    let scheduler = Arc::new(ManualScheduler::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let services = RuntimeServices {
        configuration: store.clone(),
        directory,
        transport: transport.clone(),
        scheduler: scheduler.clone(),
        clock: clock.clone(),
    };
    Harness {
        services,
        store,
        transport,
        scheduler,
        clock,
    }
}

pub(crate) fn harness(configuration: GuildConfiguration) -> Harness {
    harness_with(configuration, directory())
}

pub(crate) fn community() -> CommunityId {
    CommunityId::new(COMMUNITY)
}

pub(crate) fn author() -> MessageAuthor {
    MessageAuthor {
        id: UserId::new(AUTHOR),
        display_name: "alice#0001".to_string(),
        is_bot: false,
    }
}

/// A message from the test author in the general channel.
pub(crate) fn message(id: &str, content: &str, mentioned_roles: &[&str]) -> MessageReceived {
    MessageReceived {
        community: community(),
        channel: ChannelId::new(CHANNEL),
        message: MessageId::new(id),
        author: author(),
        content: content.to_string(),
        mentioned_roles: mentioned_roles.iter().copied().map(RoleId::new).collect(),
    }
}

pub(crate) fn fetched(message: &MessageReceived) -> FetchedMessage {
    FetchedMessage {
        id: message.message.clone(),
        channel: message.channel.clone(),
        author: message.author.clone(),
        content: message.content.clone(),
    }
}
