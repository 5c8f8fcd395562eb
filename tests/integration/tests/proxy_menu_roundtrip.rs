use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use flagger_config::{
    ConfigurationService, FileConfigurationStore, GuildConfiguration, GuildDirectory,
    StaticGuildDirectory,
};
use flagger_core::{
    ChannelId, Clock, CommunityId, ManualClock, MessageId, RoleId, SystemClock, UserId,
};
use flagger_interactions::{
    ActionRow, ButtonClicked, FetchedMessage, InteractionContext, InteractionToken,
    ManualScheduler, MessageAuthor, MessageReceived, MessageView, OutgoingMessage, Scheduler,
    SelectChosen, TokioScheduler, Transport, TransportError,
};
use flagger_runtime::{
    ButtonRoute, ConfigPage, EscalationOutcome, EventRouter, MenuOutcome, MessageRoute,
    ProxyClickOutcome, ProxyMessageOutcome, RuntimeServices,
};
use tempfile::TempDir;

const GUILD: &str = "100";
const GENERAL: &str = "200";
const MOD_PINGS: &str = "201";
const AUTHOR: &str = "300";
const MODERATORS: &str = "400";
const PROXY: &str = "401";

#[derive(Default)]
struct ChannelTransport {
    sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    edits: Mutex<Vec<MessageId>>,
    updates: Mutex<Vec<MessageView>>,
    archive: Mutex<HashMap<MessageId, FetchedMessage>>,
    next_id: AtomicU64,
}

impl ChannelTransport {
    fn archive(&self, message: &MessageReceived) {
        self.archive.lock().expect("archive").insert(
            message.message.clone(),
            FetchedMessage {
                id: message.message.clone(),
                channel: message.channel.clone(),
                author: message.author.clone(),
                content: message.content.clone(),
            },
        );
    }

    fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.sent.lock().expect("sent").clone()
    }

    fn pings(&self) -> Vec<(ChannelId, String)> {
        self.sent()
            .into_iter()
            .filter(|(_, message)| !message.allowed_role_mentions.is_empty())
            .map(|(channel, message)| (channel, message.view.content.unwrap_or_default()))
            .collect()
    }

    fn edit_count(&self) -> usize {
        self.edits.lock().expect("edits").len()
    }

    fn last_update(&self) -> MessageView {
        self.updates
            .lock()
            .expect("updates")
            .last()
            .cloned()
            .expect("menu was updated")
    }

    fn live_rows(&self) -> Vec<ActionRow> {
        self.updates
            .lock()
            .expect("updates")
            .last()
            .map(|view| view.rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        self.sent
            .lock()
            .expect("sent")
            .push((channel.clone(), message));
        let id = 5_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageId::new(id.to_string()))
    }

    async fn edit_message(
        &self,
        _channel: &ChannelId,
        message: &MessageId,
        _view: MessageView,
    ) -> Result<(), TransportError> {
        self.edits.lock().expect("edits").push(message.clone());
        Ok(())
    }

    async fn fetch_message(
        &self,
        _channel: &ChannelId,
        message: &MessageId,
    ) -> Result<FetchedMessage, TransportError> {
        self.archive
            .lock()
            .expect("archive")
            .get(message)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(message.to_string()))
    }

    async fn delete_message(
        &self,
        _channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), TransportError> {
        self.archive.lock().expect("archive").remove(message);
        Ok(())
    }

    async fn update_interaction(
        &self,
        _token: &InteractionToken,
        view: MessageView,
    ) -> Result<(), TransportError> {
        self.updates.lock().expect("updates").push(view);
        Ok(())
    }

    async fn send_ephemeral_followup(
        &self,
        _token: &InteractionToken,
        _content: &str,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

struct Deployment {
    _root: TempDir,
    store: Arc<FileConfigurationStore>,
    transport: Arc<ChannelTransport>,
    router: EventRouter,
}

fn directory() -> Arc<dyn GuildDirectory> {
    Arc::new(
        StaticGuildDirectory::new()
            .with_role(GUILD, "@everyone")
            .with_role(MODERATORS, "Moderators")
            .with_role(PROXY, "Mods")
            .with_channel(GENERAL, "general")
            .with_channel(MOD_PINGS, "mod-pings"),
    )
}

fn deploy(scheduler: Arc<dyn Scheduler>, clock: Arc<dyn Clock>) -> Deployment {
    let root = TempDir::new().expect("tempdir");
    let directory = directory();
    let store = Arc::new(
        FileConfigurationStore::open(root.path().join("settings"), directory.clone())
            .expect("open store"),
    );
    let transport = Arc::new(ChannelTransport::default());
    let services = RuntimeServices {
        configuration: store.clone(),
        directory,
        transport: transport.clone(),
        scheduler,
        clock,
    };
    Deployment {
        _root: root,
        store,
        transport,
        router: EventRouter::new(services, Duration::from_secs(30)),
    }
}

fn community() -> CommunityId {
    CommunityId::new(GUILD)
}

fn interaction(user: &str, rows: Vec<ActionRow>) -> InteractionContext {
    InteractionContext {
        community: community(),
        channel: ChannelId::new(GENERAL),
        message: MessageId::new("7000"),
        user: UserId::new(user),
        token: InteractionToken::new("integration-token"),
        rows,
    }
}

fn chat(id: &str, content: &str, mentions: &[&str]) -> MessageReceived {
    MessageReceived {
        community: community(),
        channel: ChannelId::new(GENERAL),
        message: MessageId::new(id),
        author: MessageAuthor {
            id: UserId::new(AUTHOR),
            display_name: "alice#0001".to_string(),
            is_bot: false,
        },
        content: content.to_string(),
        mentioned_roles: mentions.iter().copied().map(RoleId::new).collect(),
    }
}

async fn choose(deployment: &Deployment, value: &str) -> MenuOutcome {
    let rows = deployment.transport.live_rows();
    deployment
        .router
        .handle_select_menu(&SelectChosen {
            component_id: "select".to_string(),
            chosen_values: vec![value.to_string()],
            interaction: interaction(AUTHOR, rows),
        })
        .await
}

async fn press(deployment: &Deployment, component_id: &str) -> ButtonRoute {
    deployment
        .router
        .handle_button_click(&ButtonClicked {
            component_id: component_id.to_string(),
            interaction: interaction(AUTHOR, deployment.transport.live_rows()),
        })
        .await
}

async fn seed(deployment: &Deployment, configuration: GuildConfiguration) {
    deployment
        .store
        .set(&community(), configuration)
        .await
        .expect("seed configuration");
}

fn enabled() -> GuildConfiguration {
    GuildConfiguration {
        enabled: true,
        mod_role: Some(RoleId::new(MODERATORS)),
        proxy_mod_role: Some(RoleId::new(PROXY)),
        ..GuildConfiguration::default()
    }
}

#[tokio::test]
async fn integration_menu_configures_guild_then_proxy_pings_dedicated_channel() {
    let deployment = deploy(Arc::new(ManualScheduler::new()), Arc::new(SystemClock));
    let overview = deployment
        .router
        .render_page(&community(), ConfigPage::Overview)
        .await
        .expect("render overview");
    deployment
        .transport
        .updates
        .lock()
        .expect("updates")
        .push(overview);

    for value in [
        "menu:ROLE_CONFIG",
        "option:state:role_page:str;proxyModRole",
        "option:set:proxyModRole:str;401",
        "option:state:role_page:str;modRole",
        "option:set:modRole:str;400",
        "menu:CHANNEL_CONFIG",
        "option:state:category:str;modPingChannel",
    ] {
        assert!(
            matches!(choose(&deployment, value).await, MenuOutcome::Rerendered { .. }),
            "{value}"
        );
    }
    assert!(matches!(
        press(&deployment, "option:set:pingModsInCurrentChannel:bool;false").await,
        ButtonRoute::Menu(MenuOutcome::Rerendered { .. })
    ));
    choose(&deployment, "option:set:modPingChannel:str;201").await;
    choose(&deployment, "menu:OVERVIEW").await;
    press(&deployment, "option:set:enabled:bool;true").await;

    let stored = deployment.store.get(&community()).await.expect("get");
    assert!(stored.enabled);
    assert_eq!(stored.mod_role, Some(RoleId::new(MODERATORS)));
    assert_eq!(stored.proxy_mod_role, Some(RoleId::new(PROXY)));
    assert_eq!(stored.mod_ping_channel, Some(ChannelId::new(MOD_PINGS)));
    let overview = deployment.transport.last_update().content.expect("overview text");
    assert!(overview.contains("Mod Ping Channel Exists: ✅"));
    assert!(overview.contains("Log Channel Exists: ❌"));

    let trigger = chat("1", "<@&401> spam in here", &[PROXY]);
    deployment.transport.archive(&trigger);
    let MessageRoute::Proxy(ProxyMessageOutcome::AwaitingConfirmation { .. }) =
        deployment.router.handle_message(&trigger).await
    else {
        panic!("expected a confirmation prompt");
    };
    let confirmed = press(&deployment, &format!("proxy:{AUTHOR}:{GENERAL}:1:confirm")).await;
    assert!(matches!(
        confirmed,
        ButtonRoute::Proxy(ProxyClickOutcome::Confirmed(EscalationOutcome::Sent { ref channel, .. }))
            if channel.as_str() == MOD_PINGS
    ));
    assert_eq!(
        deployment.transport.pings(),
        vec![(
            ChannelId::new(MOD_PINGS),
            "<@&400> alice#0001: <@&401> spam in here".to_string()
        )]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn integration_confirm_and_timeout_race_retires_exactly_once() {
    for _ in 0..20 {
        let scheduler = Arc::new(ManualScheduler::new());
        let deployment = Arc::new(deploy(scheduler.clone(), Arc::new(SystemClock)));
        seed(&deployment, enabled()).await;
        let trigger = chat("1", "<@&401> help", &[PROXY]);
        deployment.transport.archive(&trigger);
        deployment.router.handle_message(&trigger).await;
        let timer = scheduler.take_next().expect("confirmation timer");

        let clicker = {
            let deployment = deployment.clone();
            tokio::spawn(async move {
                press(&deployment, &format!("proxy:{AUTHOR}:{GENERAL}:1:confirm")).await
            })
        };
        let expiry = tokio::spawn(timer);
        let click = clicker.await.expect("click task");
        expiry.await.expect("timer task");

        let pings = deployment.transport.pings().len();
        match click {
            ButtonRoute::Proxy(ProxyClickOutcome::Confirmed(_)) => assert_eq!(pings, 1),
            ButtonRoute::Proxy(ProxyClickOutcome::AlreadyRetired) => assert_eq!(pings, 0),
            other => panic!("unexpected click outcome {other:?}"),
        }
        assert_eq!(deployment.transport.edit_count(), 1);
        assert_eq!(deployment.router.proxy().pending_confirmations(), 0);
    }
}

#[tokio::test]
async fn integration_real_timer_disables_prompt_after_confirm_timeout() {
    let deployment = deploy(Arc::new(TokioScheduler::current()), Arc::new(SystemClock));
    seed(
        &deployment,
        GuildConfiguration {
            confirm_timeout_ms: 50,
            ..enabled()
        },
    )
    .await;
    let trigger = chat("1", "<@&401> help", &[PROXY]);
    deployment.transport.archive(&trigger);
    deployment.router.handle_message(&trigger).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(deployment.transport.edit_count(), 1);
    let late = press(&deployment, &format!("proxy:{AUTHOR}:{GENERAL}:1:confirm")).await;
    assert_eq!(late, ButtonRoute::Proxy(ProxyClickOutcome::AlreadyRetired));
    assert!(deployment.transport.pings().is_empty());
}

#[tokio::test]
async fn integration_rate_limit_spans_confirmations_and_survives_restart_of_store() {
    let clock = Arc::new(ManualClock::new(10_000_000));
    let deployment = deploy(Arc::new(ManualScheduler::new()), clock.clone());
    seed(
        &deployment,
        GuildConfiguration {
            min_time_between_pings_ms: 60_000,
            ..enabled()
        },
    )
    .await;

    let first = chat("1", "<@&401> first", &[PROXY]);
    deployment.transport.archive(&first);
    deployment.router.handle_message(&first).await;
    press(&deployment, &format!("proxy:{AUTHOR}:{GENERAL}:1:confirm")).await;
    assert_eq!(deployment.transport.pings().len(), 1);
    assert_eq!(
        deployment.router.proxy().last_mod_role_ping(&community()),
        Some(clock.now_unix_ms())
    );

    clock.advance_ms(59_999);
    let second = chat("2", "<@&401> second", &[PROXY]);
    assert_eq!(
        deployment.router.handle_message(&second).await,
        MessageRoute::Proxy(ProxyMessageOutcome::RateLimited)
    );

    clock.advance_ms(1);
    let third = chat("3", "<@&401> third", &[PROXY]);
    assert!(matches!(
        deployment.router.handle_message(&third).await,
        MessageRoute::Proxy(ProxyMessageOutcome::AwaitingConfirmation { .. })
    ));

    let reopened = FileConfigurationStore::open(deployment.store.root(), directory()).expect("reopen");
    assert_eq!(
        reopened
            .get(&community())
            .await
            .expect("get")
            .min_time_between_pings_ms,
        60_000
    );
}
