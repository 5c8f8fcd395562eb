use std::time::Duration;

use flagger_core::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIRM_TIMEOUT_MS: u64 = 10 * 1_000;
pub const DEFAULT_CONFIRMATION_MESSAGE: &str = "Are you sure you want to ping the moderators?";
pub const DEFAULT_TOO_FREQUENT_PING_MESSAGE: &str = "Moderators have been pinged too recently and may still be looking at chat. Tag an online moderator for assistance instead";

/// Per-community proxy configuration.
///
/// Serialized with camelCase keys; missing keys fall back to the defaults so
/// records written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuildConfiguration {
    /// Whether proxy pings are intercepted at all.
    pub enabled: bool,
    /// Role that is pinged once a user confirms.
    pub mod_role: Option<RoleId>,
    /// Role users mention to ask for a moderator.
    pub proxy_mod_role: Option<RoleId>,
    /// Ping moderators in the channel the request came from instead of `mod_ping_channel`.
    pub ping_mods_in_current_channel: bool,
    pub mod_ping_channel: Option<ChannelId>,
    pub log_channel: Option<ChannelId>,
    #[serde(rename = "confirmTimeout")]
    pub confirm_timeout_ms: u64,
    pub confirmation_message: String,
    #[serde(rename = "minTimeBetweenPings")]
    pub min_time_between_pings_ms: u64,
    pub too_frequent_ping_message: String,
}

impl Default for GuildConfiguration {
    fn default() -> Self {
        Self {
            enabled: false,
            mod_role: None,
            proxy_mod_role: None,
            ping_mods_in_current_channel: true,
            mod_ping_channel: None,
            log_channel: None,
            confirm_timeout_ms: DEFAULT_CONFIRM_TIMEOUT_MS,
            confirmation_message: DEFAULT_CONFIRMATION_MESSAGE.to_string(),
            min_time_between_pings_ms: 0,
            too_frequent_ping_message: DEFAULT_TOO_FREQUENT_PING_MESSAGE.to_string(),
        }
    }
}

impl GuildConfiguration {
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn min_time_between_pings(&self) -> Duration {
        Duration::from_millis(self.min_time_between_pings_ms)
    }
}
