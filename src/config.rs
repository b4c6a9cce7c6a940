//! Agent configuration.
//!
//! Everything the agent needs is passed in explicitly here rather than
//! living in module-scoped constants, so multiple agent instances can
//! run (and be tested) independently. Configs round-trip through JSON
//! on disk so hosts can ship them as a deployment artifact.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application name used for the default cache directory path.
const APP_NAME: &str = "offcache";

/// Background-sync configuration.
///
/// The endpoint is a full URL supplied by the host; the agent never
/// guesses a base URL for it. With no `SyncConfig`, sync events are
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Tag identifying the one supported background-sync task. Events
    /// carrying any other tag are ignored.
    pub tag: String,
    /// GET endpoint returning JSON.
    pub endpoint: Url,
    /// Fixed synthetic request identity the sync result is stored
    /// under, so readers of this one key always see the latest payload.
    pub cache_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Logical cache name, e.g. `city-neuro`.
    pub cache_name: String,
    /// Version counter for this deployment, e.g. `v4`.
    pub version: String,
    /// Origin that manifest paths resolve against.
    pub base_url: Url,
    /// Paths that must be cached before this agent version may activate.
    pub precache_manifest: Vec<String>,
    /// The manifest path served when nothing better is available for an
    /// HTML-accepting request.
    pub offline_document: String,
    /// Skip the normal wait-for-no-open-clients step after install.
    #[serde(default)]
    pub skip_waiting_on_install: bool,
    /// Where generations are persisted. `None` keeps the cache in memory.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Icon reference attached to push notifications.
    #[serde(default)]
    pub notification_icon: Option<String>,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
}

impl AgentConfig {
    /// The generation tag this agent version reads and writes:
    /// `"{cache_name}-{version}"`. Only one tag is current at a time;
    /// activation deletes every other tag found in storage.
    pub fn generation_tag(&self) -> String {
        format!("{}-{}", self.cache_name, self.version)
    }

    /// Resolve a manifest path against the configured origin.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// The offline fallback document's absolute URL.
    pub fn offline_url(&self) -> Result<Url> {
        self.resolve(&self.offline_document)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_name.is_empty() || self.version.is_empty() {
            bail!("cache_name and version must be non-empty");
        }
        if self.precache_manifest.is_empty() {
            bail!("precache manifest is empty - nothing would be cached before activation");
        }
        if !self.precache_manifest.contains(&self.offline_document) {
            bail!(
                "offline document {:?} is not in the precache manifest",
                self.offline_document
            );
        }
        Ok(())
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default persistent cache location: `<platform cache dir>/offcache/<cache_name>`.
    pub fn default_cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(&self.cache_name))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig {
            cache_name: "city-neuro".to_string(),
            version: "v4".to_string(),
            base_url: Url::parse("https://example.com/").unwrap(),
            precache_manifest: vec!["/".to_string(), "/offline.html".to_string()],
            offline_document: "/offline.html".to_string(),
            skip_waiting_on_install: false,
            cache_dir: None,
            notification_icon: None,
            sync: None,
        }
    }

    #[test]
    fn test_generation_tag_combines_name_and_version() {
        assert_eq!(config().generation_tag(), "city-neuro-v4");
    }

    #[test]
    fn test_resolve_manifest_path() {
        let url = config().resolve("/app.js").unwrap();
        assert_eq!(url.as_str(), "https://example.com/app.js");
    }

    #[test]
    fn test_validate_rejects_missing_offline_document() {
        let mut bad = config();
        bad.offline_document = "/not-listed.html".to_string();
        assert!(bad.validate().is_err());
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.json");

        config().save(&path).unwrap();
        let loaded = AgentConfig::from_file(&path).unwrap();

        assert_eq!(loaded.generation_tag(), "city-neuro-v4");
        assert_eq!(loaded.offline_document, "/offline.html");
    }
}
