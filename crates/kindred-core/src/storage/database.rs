//! SQLite connection pool for the local document store

use crate::storage::migrations;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where and how to open the store
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file; `None` opens a private in-memory database
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    /// WAL lets searches read while a corpus import writes
    pub journal_mode: SqliteJournalMode,
}

impl DatabaseConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            journal_mode: SqliteJournalMode::Wal,
        }
    }

    /// In-memory store for tests and fixtures
    pub fn in_memory() -> Self {
        Self {
            path: None,
            // every in-memory connection would be a separate database
            max_connections: 1,
            journal_mode: SqliteJournalMode::Memory,
        }
    }

    fn connect_options(&self) -> sqlx::Result<SqliteConnectOptions> {
        let options = match &self.path {
            Some(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            None => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };
        Ok(options.journal_mode(self.journal_mode))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::with_path(default_database_path())
    }
}

/// `<data_dir>/kindred/kindred.db`, or `kindred.db` when there is no data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("kindred").join("kindred.db"))
        .unwrap_or_else(|| PathBuf::from("kindred.db"))
}

/// Migrated connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Open the store, creating its directory if needed, and migrate it
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await
            .with_context(|| match &config.path {
                Some(path) => format!("Failed to open database {}", path.display()),
                None => "Failed to open in-memory database".to_string(),
            })?;

        migrations::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self {
            pool,
            path: config.path,
        })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::new(DatabaseConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn migration_status(&self) -> Result<migrations::MigrationStatus> {
        migrations::migration_status(&self.pool)
            .await
            .context("Failed to check migration status")
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    /// Wait for in-flight writes and close the pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::in_memory().await.unwrap();
        db.health_check().await.unwrap();
        assert!(db.path().is_none());

        let status = db.migration_status().await.unwrap();
        assert!(!status.needs_migration);
    }

    #[test]
    fn test_config_paths() {
        let config = DatabaseConfig::with_path("/tmp/kindred-test.db");
        assert_eq!(config.path, Some(PathBuf::from("/tmp/kindred-test.db")));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);

        let memory = DatabaseConfig::in_memory();
        assert!(memory.path.is_none());
        assert_eq!(memory.max_connections, 1);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kindred.db");

        let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
        db.health_check().await.unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        db.close().await;
    }
}
