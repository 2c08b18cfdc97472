//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::search::SortBy;
use crate::domain::search::entity::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use crate::domain::search::recent::MAX_RECENT;
use crate::domain::search::suggestion::{MAX_SAMPLE_SIZE, MAX_SUGGESTIONS, MIN_CHARS};
use crate::storage::database::default_database_path;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "KINDRED_CONFIG_DIR";

/// Kindred configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub suggestions: SuggestionConfig,
    pub recent: RecentConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_page_size: u32,
    pub default_sort: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub min_chars: usize,
    pub sample_size: u32,
    pub max_results: usize,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentConfig {
    pub max_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            default_sort: SortBy::Relevance.as_str().to_string(),
        }
    }
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            min_chars: MIN_CHARS,
            sample_size: MAX_SAMPLE_SIZE,
            max_results: MAX_SUGGESTIONS,
            debounce_ms: 300,
        }
    }
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_RECENT,
            file: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 64,
            ttl_secs: 30,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("kindred")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.search.default_page_size) {
            return Err(anyhow!(
                "search.default_page_size must be between {} and {}",
                MIN_PAGE_SIZE,
                MAX_PAGE_SIZE
            ));
        }
        if SortBy::from_str(&self.search.default_sort).is_none() {
            return Err(anyhow!(
                "Invalid search.default_sort: {}. Valid options: relevance, newest, popular",
                self.search.default_sort
            ));
        }
        if self.suggestions.min_chars < MIN_CHARS {
            return Err(anyhow!("suggestions.min_chars must be at least {}", MIN_CHARS));
        }
        if !(1..=MAX_SAMPLE_SIZE).contains(&self.suggestions.sample_size) {
            return Err(anyhow!(
                "suggestions.sample_size must be between 1 and {}",
                MAX_SAMPLE_SIZE
            ));
        }
        if !(1..=MAX_SUGGESTIONS).contains(&self.suggestions.max_results) {
            return Err(anyhow!(
                "suggestions.max_results must be between 1 and {}",
                MAX_SUGGESTIONS
            ));
        }
        if !(1..=MAX_RECENT).contains(&self.recent.max_entries) {
            return Err(anyhow!(
                "recent.max_entries must be between 1 and {}",
                MAX_RECENT
            ));
        }
        if self.cache.capacity == 0 {
            return Err(anyhow!("cache.capacity must be at least 1"));
        }
        Ok(())
    }

    /// Default sort order
    pub fn default_sort(&self) -> SortBy {
        SortBy::from_str(&self.search.default_sort).unwrap_or_default()
    }

    /// Pause before suggestion requests
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.suggestions.debounce_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Database file, falling back to the data directory
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Recent-searches file, falling back to the data directory
    pub fn recent_file(&self) -> PathBuf {
        self.recent.file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join("kindred"))
                .unwrap_or_default()
                .join("recent.json")
        })
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Search settings
            "search.default_page_size" => Ok(self.search.default_page_size.to_string()),
            "search.default_sort" => Ok(self.search.default_sort.clone()),

            // Suggestion settings
            "suggestions.min_chars" => Ok(self.suggestions.min_chars.to_string()),
            "suggestions.sample_size" => Ok(self.suggestions.sample_size.to_string()),
            "suggestions.max_results" => Ok(self.suggestions.max_results.to_string()),
            "suggestions.debounce_ms" => Ok(self.suggestions.debounce_ms.to_string()),

            // Recent searches
            "recent.max_entries" => Ok(self.recent.max_entries.to_string()),
            "recent.file" => Ok(self.recent_file().display().to_string()),

            // Result cache
            "cache.enabled" => Ok(self.cache.enabled.to_string()),
            "cache.capacity" => Ok(self.cache.capacity.to_string()),
            "cache.ttl_secs" => Ok(self.cache.ttl_secs.to_string()),

            // Storage
            "storage.database_path" => Ok(self.database_path().display().to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `kindred config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "search.default_page_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid default_page_size value: {}", value))?;
                if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size) {
                    return Err(anyhow!(
                        "Page size must be between {} and {}",
                        MIN_PAGE_SIZE,
                        MAX_PAGE_SIZE
                    ));
                }
                self.search.default_page_size = size;
            }
            "search.default_sort" => {
                let sort = SortBy::from_str(value).ok_or_else(|| {
                    anyhow!(
                        "Invalid sort order: {}. Valid options: relevance, newest, popular",
                        value
                    )
                })?;
                self.search.default_sort = sort.as_str().to_string();
            }

            "suggestions.min_chars" => {
                let min: usize = value
                    .parse()
                    .with_context(|| format!("Invalid min_chars value: {}", value))?;
                if min < MIN_CHARS {
                    return Err(anyhow!("min_chars must be at least {}", MIN_CHARS));
                }
                self.suggestions.min_chars = min;
            }
            "suggestions.sample_size" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid sample_size value: {}", value))?;
                if !(1..=MAX_SAMPLE_SIZE).contains(&size) {
                    return Err(anyhow!("sample_size must be between 1 and {}", MAX_SAMPLE_SIZE));
                }
                self.suggestions.sample_size = size;
            }
            "suggestions.max_results" => {
                let max: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_results value: {}", value))?;
                if !(1..=MAX_SUGGESTIONS).contains(&max) {
                    return Err(anyhow!("max_results must be between 1 and {}", MAX_SUGGESTIONS));
                }
                self.suggestions.max_results = max;
            }
            "suggestions.debounce_ms" => {
                self.suggestions.debounce_ms = value
                    .parse()
                    .with_context(|| format!("Invalid debounce_ms value: {}", value))?;
            }

            "recent.max_entries" => {
                let max: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_entries value: {}", value))?;
                if !(1..=MAX_RECENT).contains(&max) {
                    return Err(anyhow!("max_entries must be between 1 and {}", MAX_RECENT));
                }
                self.recent.max_entries = max;
            }
            "recent.file" => {
                self.recent.file = Some(PathBuf::from(value));
            }

            "cache.enabled" => {
                self.cache.enabled = value
                    .parse()
                    .with_context(|| format!("Invalid enabled value: {} (use true or false)", value))?;
            }
            "cache.capacity" => {
                let capacity: usize = value
                    .parse()
                    .with_context(|| format!("Invalid capacity value: {}", value))?;
                if capacity == 0 {
                    return Err(anyhow!("capacity must be at least 1"));
                }
                self.cache.capacity = capacity;
            }
            "cache.ttl_secs" => {
                self.cache.ttl_secs = value
                    .parse()
                    .with_context(|| format!("Invalid ttl_secs value: {}", value))?;
            }

            "storage.database_path" => {
                self.storage.database_path = Some(PathBuf::from(value));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `kindred config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "search.default_page_size",
            "search.default_sort",
            "suggestions.min_chars",
            "suggestions.sample_size",
            "suggestions.max_results",
            "suggestions.debounce_ms",
            "recent.max_entries",
            "recent.file",
            "cache.enabled",
            "cache.capacity",
            "cache.ttl_secs",
            "storage.database_path",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.default_sort(), SortBy::Relevance);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.suggestions.max_results, 10);
        assert_eq!(config.recent.max_entries, 5);
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("search.default_sort", "Popular").unwrap();
        config.set("search.default_page_size", "50").unwrap();
        config.set("cache.enabled", "false").unwrap();
        config.set("storage.database_path", "/tmp/k.db").unwrap();

        assert_eq!(config.get("search.default_sort").unwrap(), "popular");
        assert_eq!(config.get("search.default_page_size").unwrap(), "50");
        assert_eq!(config.get("cache.enabled").unwrap(), "false");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/k.db"));
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("search.default_page_size", "0").is_err());
        assert!(config.set("search.default_page_size", "101").is_err());
        assert!(config.set("search.default_sort", "oldest").is_err());
        assert!(config.set("suggestions.min_chars", "1").is_err());
        assert!(config.set("suggestions.sample_size", "100").is_err());
        assert!(config.set("suggestions.max_results", "50").is_err());
        assert!(config.set("recent.max_entries", "40").is_err());
        assert!(config.set("cache.enabled", "maybe").is_err());
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_enforces_suggestion_and_recent_limits() {
        let mut config = Config::default();
        config.suggestions.max_results = 50;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.suggestions.sample_size = 100;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.suggestions.min_chars = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recent.max_entries = 40;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.suggestions.min_chars = 3;
        config.suggestions.sample_size = 5;
        config.suggestions.max_results = 1;
        config.recent.max_entries = 1;
        config.validate().unwrap();
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        let entries = config.list().unwrap();
        assert_eq!(entries.len(), 12);
        for (key, value) in entries {
            assert_eq!(config.get(&key).unwrap(), value);
        }
    }

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [search]
            default_sort = "newest"

            [cache]
            ttl_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.default_sort(), SortBy::Newest);
        assert_eq!(config.search.default_page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert!(config.cache.enabled);

        let text = toml::to_string_pretty(&config).unwrap();
        let reparsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }
}
