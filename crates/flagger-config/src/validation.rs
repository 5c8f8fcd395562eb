use flagger_core::CommunityId;

use crate::{ConfigError, GuildConfiguration, GuildDirectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates the configuration checks shown on the overview page.
pub enum ConfigValidation {
    Enabled,
    ModRoleExists,
    ProxyRoleExists,
    LogChannelExists,
    ModPingChannelExists,
}

impl ConfigValidation {
    pub const ALL: [Self; 5] = [
        Self::Enabled,
        Self::ModRoleExists,
        Self::ProxyRoleExists,
        Self::LogChannelExists,
        Self::ModPingChannelExists,
    ];

    pub fn friendly_name(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::ModRoleExists => "Mod Role Exists",
            Self::ProxyRoleExists => "Proxy Role Exists",
            Self::LogChannelExists => "Log Channel Exists",
            Self::ModPingChannelExists => "Mod Ping Channel Exists",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ordered check results, in [`ConfigValidation::ALL`] order.
pub struct ConfigValidationReport {
    checks: Vec<(ConfigValidation, bool)>,
}

impl ConfigValidationReport {
    pub fn iter(&self) -> impl Iterator<Item = (ConfigValidation, bool)> + '_ {
        self.checks.iter().copied()
    }

    pub fn passed(&self, check: ConfigValidation) -> bool {
        self.checks
            .iter()
            .any(|(candidate, passed)| *candidate == check && *passed)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|(_, passed)| *passed)
    }
}

/// Evaluates every check for `config` against the live community directory.
pub async fn validate_configuration(
    community: &CommunityId,
    config: &GuildConfiguration,
    directory: &dyn GuildDirectory,
) -> Result<ConfigValidationReport, ConfigError> {
    let roles = directory.roles(community).await?;
    let channels = directory.text_channels(community).await?;
    let role_exists = |id: Option<&flagger_core::RoleId>| {
        id.is_some_and(|id| roles.iter().any(|role| &role.id == id))
    };
    let channel_exists = |id: Option<&flagger_core::ChannelId>| {
        id.is_some_and(|id| channels.iter().any(|channel| &channel.id == id))
    };

    let checks = ConfigValidation::ALL
        .iter()
        .map(|check| {
            let passed = match check {
                ConfigValidation::Enabled => config.enabled,
                ConfigValidation::ModRoleExists => role_exists(config.mod_role.as_ref()),
                ConfigValidation::ProxyRoleExists => role_exists(config.proxy_mod_role.as_ref()),
                ConfigValidation::LogChannelExists => channel_exists(config.log_channel.as_ref()),
                ConfigValidation::ModPingChannelExists => {
                    config.ping_mods_in_current_channel
                        || channel_exists(config.mod_ping_channel.as_ref())
                }
            };
            (*check, passed)
        })
        .collect();
    Ok(ConfigValidationReport { checks })
}

#[cfg(test)]
mod tests {
    use flagger_core::{ChannelId, RoleId};

    use super::*;
    use crate::StaticGuildDirectory;

    fn directory() -> StaticGuildDirectory {
        StaticGuildDirectory::new()
            .with_role("10", "Moderators")
            .with_role("11", "Proxy")
            .with_channel("20", "mod-log")
            .with_channel("21", "mod-pings")
    }

    #[tokio::test]
    async fn functional_complete_configuration_passes_every_check() {
        let config = GuildConfiguration {
            enabled: true,
            mod_role: Some(RoleId::new("10")),
            proxy_mod_role: Some(RoleId::new("11")),
            log_channel: Some(ChannelId::new("20")),
            ping_mods_in_current_channel: false,
            mod_ping_channel: Some(ChannelId::new("21")),
            ..GuildConfiguration::default()
        };
        let report = validate_configuration(&CommunityId::new("1"), &config, &directory())
            .await
            .expect("validate");
        assert!(report.all_passed());
        let order: Vec<_> = report.iter().map(|(check, _)| check).collect();
        assert_eq!(order, ConfigValidation::ALL.to_vec());
    }

    #[tokio::test]
    async fn functional_dangling_ids_fail_their_checks() {
        let config = GuildConfiguration {
            enabled: false,
            mod_role: Some(RoleId::new("404")),
            proxy_mod_role: None,
            log_channel: Some(ChannelId::new("404")),
            ping_mods_in_current_channel: false,
            mod_ping_channel: None,
            ..GuildConfiguration::default()
        };
        let report = validate_configuration(&CommunityId::new("1"), &config, &directory())
            .await
            .expect("validate");
        for check in ConfigValidation::ALL {
            assert!(!report.passed(check), "{check:?} should fail");
        }
    }

    #[tokio::test]
    async fn unit_ping_in_current_channel_satisfies_mod_ping_channel_check() {
        let config = GuildConfiguration::default();
        let report = validate_configuration(&CommunityId::new("1"), &config, &directory())
            .await
            .expect("validate");
        assert!(report.passed(ConfigValidation::ModPingChannelExists));
        assert!(!report.all_passed());
    }
}
