//! Configuration persistence.
//!
//! `FileConfigurationStore` keeps one `<community>.json` record per community
//! and serves reads from an in-process cache that every write refreshes.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use flagger_core::{write_text_atomic, CommunityId};

use crate::{
    validate_configuration, ConfigError, ConfigValidationReport, GuildConfiguration,
    GuildDirectory,
};

#[async_trait]
/// Trait contract for fetching, storing, and validating community configuration.
pub trait ConfigurationService: Send + Sync {
    /// Returns the stored record, or defaults when the community has none.
    async fn get(&self, community: &CommunityId) -> Result<GuildConfiguration, ConfigError>;

    async fn set(
        &self,
        community: &CommunityId,
        configuration: GuildConfiguration,
    ) -> Result<(), ConfigError>;

    async fn validate(&self, community: &CommunityId) -> Result<ConfigValidationReport, ConfigError>;
}

/// File-backed configuration store.
pub struct FileConfigurationStore {
    root: PathBuf,
    directory: Arc<dyn GuildDirectory>,
    cache: Mutex<HashMap<CommunityId, GuildConfiguration>>,
}

impl FileConfigurationStore {
    /// Opens the store rooted at `root`, creating the directory when missing.
    pub fn open(
        root: impl Into<PathBuf>,
        directory: Arc<dyn GuildDirectory>,
    ) -> Result<Self, ConfigError> {
        let root = root.into();
        if root.exists() {
            if !root.is_dir() {
                return Err(ConfigError::InvalidDirectory(root.display().to_string()));
            }
        } else {
            tracing::info!(path = %root.display(), "creating configuration directory");
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self {
            root,
            directory,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn record_path(&self, community: &CommunityId) -> Result<PathBuf, ConfigError> {
        let raw = community.as_str();
        let usable = !raw.is_empty()
            && raw
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !usable {
            return Err(ConfigError::InvalidCommunityId(raw.to_string()));
        }
        Ok(self.root.join(format!("{raw}.json")))
    }

    fn load_record(&self, community: &CommunityId) -> Result<GuildConfiguration, ConfigError> {
        let path = self.record_path(community)?;
        if !path.exists() {
            return Ok(GuildConfiguration::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<GuildConfiguration>(&raw) {
            Ok(config) => Ok(config),
            Err(error) => {
                tracing::warn!(
                    community = %community,
                    path = %path.display(),
                    %error,
                    "could not deserialize settings; falling back to defaults"
                );
                Ok(GuildConfiguration::default())
            }
        }
    }
}

#[async_trait]
impl ConfigurationService for FileConfigurationStore {
    async fn get(&self, community: &CommunityId) -> Result<GuildConfiguration, ConfigError> {
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(community)
        {
            return Ok(cached.clone());
        }
        let config = self.load_record(community)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(community.clone(), config.clone());
        Ok(config)
    }

    async fn set(
        &self,
        community: &CommunityId,
        configuration: GuildConfiguration,
    ) -> Result<(), ConfigError> {
        let path = self.record_path(community)?;
        let mut payload = serde_json::to_string_pretty(&configuration)?;
        payload.push('\n');
        write_text_atomic(&path, &payload)
            .map_err(|error| ConfigError::Persist(format!("{error:#}")))?;
        tracing::debug!(community = %community, path = %path.display(), "persisted configuration");
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(community.clone(), configuration);
        Ok(())
    }

    async fn validate(&self, community: &CommunityId) -> Result<ConfigValidationReport, ConfigError> {
        let config = self.get(community).await?;
        validate_configuration(community, &config, self.directory.as_ref()).await
    }
}

/// Configuration store that never touches disk.
pub struct InMemoryConfigurationStore {
    directory: Arc<dyn GuildDirectory>,
    records: Mutex<HashMap<CommunityId, GuildConfiguration>>,
}

impl InMemoryConfigurationStore {
    pub fn new(directory: Arc<dyn GuildDirectory>) -> Self {
        Self {
            directory,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds `community` with `configuration`, replacing any previous record.
    pub fn with_record(self, community: &str, configuration: GuildConfiguration) -> Self {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(CommunityId::new(community), configuration);
        self
    }
}

#[async_trait]
impl ConfigurationService for InMemoryConfigurationStore {
    async fn get(&self, community: &CommunityId) -> Result<GuildConfiguration, ConfigError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(community)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(
        &self,
        community: &CommunityId,
        configuration: GuildConfiguration,
    ) -> Result<(), ConfigError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(community.clone(), configuration);
        Ok(())
    }

    async fn validate(&self, community: &CommunityId) -> Result<ConfigValidationReport, ConfigError> {
        let config = self.get(community).await?;
        validate_configuration(community, &config, self.directory.as_ref()).await
    }
}
