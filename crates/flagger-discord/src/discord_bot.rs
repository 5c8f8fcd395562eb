use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use flagger_config::FileConfigurationStore;
use flagger_core::SystemClock;
use flagger_interactions::TokioScheduler;
use flagger_runtime::{EventRouter, RuntimeServices};
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use serenity::model::id::GuildId;
use serenity::Client;

use crate::discord_conversion::parse_snowflake;
use crate::{FlaggerHandler, SerenityDirectory, SerenityTransport};

#[derive(Debug, Clone)]
/// Startup settings for the gateway bot.
pub struct DiscordBotConfig {
    pub token: String,
    pub config_dir: PathBuf,
    /// Guilds to register slash commands in; empty registers them globally.
    pub command_guilds: Vec<String>,
    pub capture_timeout: Duration,
}

/// Parses the guild ids slash commands are registered to.
pub fn parse_command_guilds(raw: &[String]) -> Result<Vec<GuildId>> {
    raw.iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match parse_snowflake(entry) {
            Some(id) => Ok(GuildId::new(id.get())),
            None => bail!("invalid command guild id '{entry}'"),
        })
        .collect()
}

/// Connects to the gateway and runs until the connection ends or ctrl-c.
pub async fn run_discord_bot(config: DiscordBotConfig) -> Result<()> {
    let command_guilds = parse_command_guilds(&config.command_guilds)?;
    let http = Arc::new(Http::new(&config.token));
    let directory = Arc::new(SerenityDirectory::new(http.clone()));
    let store = FileConfigurationStore::open(&config.config_dir, directory.clone())
        .with_context(|| {
            format!(
                "failed to open configuration directory {}",
                config.config_dir.display()
            )
        })?;
    let services = RuntimeServices {
        configuration: Arc::new(store),
        directory,
        transport: Arc::new(SerenityTransport::new(http)),
        scheduler: Arc::new(TokioScheduler::current()),
        clock: Arc::new(SystemClock),
    };
    let router = Arc::new(EventRouter::new(services, config.capture_timeout));

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&config.token, intents)
        .event_handler(FlaggerHandler::new(router, command_guilds))
        .await
        .context("failed to build discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            shard_manager.shutdown_all().await;
        }
    });

    tracing::info!(
        config_dir = %config.config_dir.display(),
        capture_timeout = ?config.capture_timeout,
        "starting discord gateway client"
    );
    client.start().await.context("discord gateway client failed")
}
