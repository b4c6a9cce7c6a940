use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::{RequestKey, ResponseSnapshot};

/// One cache generation: request identity -> latest response snapshot.
/// Writes overwrite in place; at most one snapshot per identity.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Generation {
    entries: HashMap<String, ResponseSnapshot>,
}

/// On-disk form of a generation (`<tag>.json` in the cache directory).
#[derive(Debug, Serialize, Deserialize)]
struct StoredGeneration {
    tag: String,
    saved_at: DateTime<Utc>,
    entries: HashMap<String, ResponseSnapshot>,
}

/// Versioned key-value store of request/response pairs.
///
/// Safe for concurrent use from overlapping event handlers: every
/// operation is a single read or a single last-write-wins overwrite, so
/// there are no read-modify-write sequences to guard. A write dropped at
/// an await boundary leaves the store coherent.
pub struct CacheStore {
    cache_dir: Option<PathBuf>,
    generations: RwLock<HashMap<String, Generation>>,
}

impl CacheStore {
    /// Open a store over `cache_dir`, reloading any generation files
    /// already present. `None` keeps everything in memory.
    pub fn open(cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut generations = HashMap::new();

        if let Some(ref dir) = cache_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

            for entry in std::fs::read_dir(dir)
                .with_context(|| format!("Failed to read cache directory: {}", dir.display()))?
            {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    continue;
                }
                // A torn file from an aborted write must not break startup.
                match Self::load_generation(&path) {
                    Ok(stored) => {
                        debug!(tag = %stored.tag, entries = stored.entries.len(), "Loaded cache generation");
                        generations.insert(stored.tag, Generation { entries: stored.entries });
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable generation file");
                    }
                }
            }
        }

        Ok(Self {
            cache_dir,
            generations: RwLock::new(generations),
        })
    }

    /// In-memory store, used by tests and hosts without durable storage.
    pub fn in_memory() -> Self {
        Self {
            cache_dir: None,
            generations: RwLock::new(HashMap::new()),
        }
    }

    fn load_generation(path: &std::path::Path) -> Result<StoredGeneration> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read generation file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse generation file: {}", path.display()))
    }

    fn generation_path(&self, tag: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(format!("{}.json", tag)))
    }

    fn persist(&self, tag: &str, generation: &Generation) -> Result<()> {
        let Some(path) = self.generation_path(tag) else {
            return Ok(());
        };
        let stored = StoredGeneration {
            tag: tag.to_string(),
            saved_at: Utc::now(),
            entries: generation.entries.clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write generation file: {}", path.display()))?;
        Ok(())
    }

    /// Create the generation if absent. Idempotent.
    pub async fn open_generation(&self, tag: &str) {
        let mut generations = self.generations.write().await;
        if !generations.contains_key(tag) {
            let generation = Generation::default();
            if let Err(e) = self.persist(tag, &generation) {
                warn!(tag, error = %e, "Failed to persist new generation");
            }
            generations.insert(tag.to_string(), generation);
        }
    }

    /// Store a snapshot under `key`, overwriting any previous one.
    ///
    /// An `Err` is a disk persistence failure; the in-memory write has
    /// already landed. Callers on the request path log and swallow it.
    pub async fn put(&self, tag: &str, key: &RequestKey, snapshot: ResponseSnapshot) -> Result<()> {
        let mut generations = self.generations.write().await;
        let generation = generations.entry(tag.to_string()).or_default();
        generation.entries.insert(key.storage_key(), snapshot);
        self.persist(tag, generation)
    }

    /// Exact-match lookup. Absence is normal, not a failure.
    pub async fn get(&self, tag: &str, key: &RequestKey) -> Option<ResponseSnapshot> {
        let generations = self.generations.read().await;
        generations
            .get(tag)
            .and_then(|generation| generation.entries.get(&key.storage_key()))
            .cloned()
    }

    /// Swap in a fully-built generation as one unit.
    ///
    /// Used by install so that either every manifest entry lands or the
    /// attempt leaves no trace: the file is written before the in-memory
    /// map is touched, and a disk failure aborts the whole swap.
    pub async fn install_generation(
        &self,
        tag: &str,
        entries: Vec<(RequestKey, ResponseSnapshot)>,
    ) -> Result<()> {
        let generation = Generation {
            entries: entries
                .into_iter()
                .map(|(key, snapshot)| (key.storage_key(), snapshot))
                .collect(),
        };

        let mut generations = self.generations.write().await;
        self.persist(tag, &generation)?;
        generations.insert(tag.to_string(), generation);
        Ok(())
    }

    /// Remove a generation and its file. Returns whether it existed.
    pub async fn delete_generation(&self, tag: &str) -> bool {
        let mut generations = self.generations.write().await;
        let existed = generations.remove(tag).is_some();

        if let Some(path) = self.generation_path(tag) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(tag, error = %e, "Failed to remove generation file");
                }
            }
        }

        existed
    }

    /// Tags of every generation currently in storage.
    pub async fn list_generations(&self) -> Vec<String> {
        self.generations.read().await.keys().cloned().collect()
    }

    /// Number of entries in a generation; 0 if it does not exist.
    pub async fn entry_count(&self, tag: &str) -> usize {
        self.generations
            .read()
            .await
            .get(tag)
            .map(|generation| generation.entries.len())
            .unwrap_or(0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn snapshot(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, Map::new(), body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_miss_is_none_not_error() {
        let store = CacheStore::in_memory();
        let key = RequestKey::get("https://example.com/missing.js");
        assert!(store.get("v1", &key).await.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_in_place() {
        let store = CacheStore::in_memory();
        let key = RequestKey::get("https://example.com/data.json");

        store.put("v1", &key, snapshot("first")).await.unwrap();
        store.put("v1", &key, snapshot("second")).await.unwrap();

        assert_eq!(store.entry_count("v1").await, 1);
        let hit = store.get("v1", &key).await.unwrap();
        assert_eq!(hit.body_text(), "second");
    }

    #[tokio::test]
    async fn test_open_generation_idempotent() {
        let store = CacheStore::in_memory();
        store.open_generation("v1").await;
        store.open_generation("v1").await;
        assert_eq!(store.list_generations().await, vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let store = CacheStore::in_memory();
        let key = RequestKey::get("https://example.com/app.js");

        store.put("v1", &key, snapshot("old")).await.unwrap();
        store.put("v2", &key, snapshot("new")).await.unwrap();

        assert_eq!(store.get("v1", &key).await.unwrap().body_text(), "old");
        assert_eq!(store.get("v2", &key).await.unwrap().body_text(), "new");
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let store = CacheStore::in_memory();
        store.open_generation("v1").await;

        assert!(store.delete_generation("v1").await);
        assert!(!store.delete_generation("v1").await);
        assert!(store.list_generations().await.is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let key = RequestKey::get("https://example.com/index.html");

        {
            let store = CacheStore::open(Some(dir.path().to_path_buf())).unwrap();
            store
                .install_generation("app-v1", vec![(key.clone(), snapshot("<html>"))])
                .await
                .unwrap();
        }

        let store = CacheStore::open(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(store.list_generations().await, vec!["app-v1".to_string()]);
        assert_eq!(store.get("app-v1", &key).await.unwrap().body_text(), "<html>");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(Some(dir.path().to_path_buf())).unwrap();
        store.open_generation("app-v1").await;

        let path = dir.path().join("app-v1.json");
        assert!(path.exists());

        store.delete_generation("app-v1").await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_file_skipped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("garbage.json"), "not json").unwrap();

        let store = CacheStore::open(Some(dir.path().to_path_buf())).unwrap();
        assert!(store.list_generations().await.is_empty());
    }
}
