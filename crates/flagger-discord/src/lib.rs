//! Discord adapter for flagger, built on serenity.
//!
//! Implements the transport and directory contracts over the Discord REST
//! API, translates gateway events for the [`flagger_runtime::EventRouter`],
//! and registers the `config` and `ping` slash commands.

mod discord_bot;
mod discord_conversion;
mod discord_directory;
mod discord_handler;
mod discord_transport;

pub use discord_bot::{parse_command_guilds, run_discord_bot, DiscordBotConfig};
pub use discord_directory::SerenityDirectory;
pub use discord_handler::FlaggerHandler;
pub use discord_transport::SerenityTransport;
