mod bootstrap_helpers;
mod cli_args;

use anyhow::Result;
use clap::Parser;
use flagger_discord::{run_discord_bot, DiscordBotConfig};

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    let capture_timeout = cli.capture_timeout();
    run_discord_bot(DiscordBotConfig {
        token: cli.discord_token,
        config_dir: cli.config_dir,
        command_guilds: cli.command_guilds,
        capture_timeout,
    })
    .await
}
