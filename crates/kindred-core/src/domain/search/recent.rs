//! Recent search terms
//!
//! [`RecentQueryStore`] keeps the last few terms a user searched for on top
//! of any [`KeyValueStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

/// Most remembered terms; the default and the ceiling
pub const MAX_RECENT: usize = 5;

/// Key the list is stored under
pub const RECENT_SEARCHES_KEY: &str = "recent_searches";

/// String key-value persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local key-value store
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Key-value store persisted as one JSON object on disk
///
/// The whole file is rewritten on every change.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

/// Most-recent-first list of distinct search terms
#[derive(Clone)]
pub struct RecentQueryStore {
    store: Arc<dyn KeyValueStore>,
    max_entries: usize,
}

impl std::fmt::Debug for RecentQueryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecentQueryStore")
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

impl RecentQueryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            max_entries: MAX_RECENT,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    /// Keep fewer terms; never more than [`MAX_RECENT`]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.clamp(1, MAX_RECENT);
        self
    }

    /// Record a term, moving it to the front if already present
    ///
    /// Blank terms are ignored.
    pub async fn save(&self, term: &str) -> Result<()> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(());
        }

        let mut terms = self.list().await?;
        terms.retain(|t| t != term);
        terms.insert(0, term.to_string());
        terms.truncate(self.max_entries);

        debug!(term, entries = terms.len(), "Saved recent search");
        self.store
            .set(RECENT_SEARCHES_KEY, serde_json::to_string(&terms)?)
            .await
    }

    /// Stored terms, most recent first
    pub async fn list(&self) -> Result<Vec<String>> {
        let Some(raw) = self.store.get(RECENT_SEARCHES_KEY).await? else {
            return Ok(Vec::new());
        };
        let mut terms: Vec<String> = serde_json::from_str(&raw)?;
        terms.truncate(self.max_entries);
        Ok(terms)
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(RECENT_SEARCHES_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_most_recent_first_and_deduped() {
        let recent = RecentQueryStore::in_memory();
        for term in ["rust", "tokio", "rust", "  serde "] {
            recent.save(term).await.unwrap();
        }
        assert_eq!(recent.list().await.unwrap(), vec!["serde", "rust", "tokio"]);
    }

    #[tokio::test]
    async fn test_capped_at_max() {
        let recent = RecentQueryStore::in_memory();
        for term in ["a1", "a2", "a3", "a4", "a5", "a6", "a7"] {
            recent.save(term).await.unwrap();
        }
        assert_eq!(
            recent.list().await.unwrap(),
            vec!["a7", "a6", "a5", "a4", "a3"]
        );
    }

    #[tokio::test]
    async fn test_max_entries_cannot_exceed_limit() {
        let recent = RecentQueryStore::in_memory().with_max_entries(40);
        for i in 0..8 {
            recent.save(&format!("term {i}")).await.unwrap();
        }
        assert_eq!(recent.list().await.unwrap().len(), MAX_RECENT);

        let recent = RecentQueryStore::in_memory().with_max_entries(2);
        for term in ["a", "b", "c"] {
            recent.save(term).await.unwrap();
        }
        assert_eq!(recent.list().await.unwrap(), vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_blank_ignored_and_clear() {
        let recent = RecentQueryStore::in_memory();
        recent.save("   ").await.unwrap();
        assert!(recent.list().await.unwrap().is_empty());

        recent.save("rust").await.unwrap();
        recent.clear().await.unwrap();
        assert!(recent.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("recent.json");

        let recent = RecentQueryStore::new(Arc::new(JsonFileKeyValueStore::new(&path)));
        recent.save("rust").await.unwrap();
        recent.save("async").await.unwrap();

        let reopened = RecentQueryStore::new(Arc::new(JsonFileKeyValueStore::new(&path)));
        assert_eq!(reopened.list().await.unwrap(), vec!["async", "rust"]);

        reopened.clear().await.unwrap();
        assert!(recent.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKeyValueStore::new(dir.path().join("none.json"));
        assert_eq!(store.get("k").await.unwrap(), None);
        store.remove("k").await.unwrap();
    }
}
