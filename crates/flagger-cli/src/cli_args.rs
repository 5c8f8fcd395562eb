use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_level_filter(value: &str) -> Result<LevelFilter, String> {
    value
        .parse::<LevelFilter>()
        .map_err(|error| format!("invalid log level '{value}': {error}"))
}

#[derive(Debug, Parser)]
#[command(
    name = "flagger",
    about = "Discord bot that confirms and rate-limits moderator pings",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "discord-token",
        env = "FLAGGER_DISCORD_TOKEN",
        hide_env_values = true,
        help = "Bot token used for the gateway connection and REST calls."
    )]
    pub(crate) discord_token: String,

    #[arg(
        long = "config-dir",
        env = "FLAGGER_CONFIG_DIR",
        default_value = "./config/settings",
        help = "Directory holding one <guild id>.json configuration file per guild."
    )]
    pub(crate) config_dir: PathBuf,

    #[arg(
        long = "command-guilds",
        env = "FLAGGER_COMMAND_GUILDS",
        value_delimiter = ',',
        help = "Guild ids to register slash commands in. Registers globally when empty."
    )]
    pub(crate) command_guilds: Vec<String>,

    #[arg(
        long = "capture-timeout-seconds",
        env = "FLAGGER_CAPTURE_TIMEOUT_SECONDS",
        default_value_t = 30,
        value_parser = parse_positive_u64,
        help = "How long the configuration menu waits for a typed message."
    )]
    pub(crate) capture_timeout_seconds: u64,

    #[arg(
        long = "log-level",
        env = "FLAGGER_LOG_LEVEL",
        value_parser = parse_level_filter,
        help = "Default log level when RUST_LOG does not set one (error, warn, info, debug, trace)."
    )]
    pub(crate) log_level: Option<LevelFilter>,
}

impl Cli {
    pub(crate) fn capture_timeout(&self) -> Duration {
        Duration::from_secs(self.capture_timeout_seconds)
    }
}
