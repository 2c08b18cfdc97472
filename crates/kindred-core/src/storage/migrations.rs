//! Database migrations
//!
//! Versioned SQLite schema for the local document store. Migrations are
//! applied automatically when a database is opened.

use sqlx::SqlitePool;
use tracing::info;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: document table
///
/// Documents are stored whole as JSON; the columns beside `body` are the
/// projections the search constraints and orderings need.
const MIGRATION_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        scope_id TEXT,
        author_id TEXT,
        visibility TEXT,
        popularity REAL NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL DEFAULT 0,
        body TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_records_scope ON records(collection, scope_id);
    CREATE INDEX IF NOT EXISTS idx_records_author ON records(collection, author_id);
    CREATE INDEX IF NOT EXISTS idx_records_popularity ON records(collection, popularity);
    CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(collection, created_at);
"#;

/// Migration 2: search telemetry log
const MIGRATION_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS search_events (
        id TEXT PRIMARY KEY NOT NULL,
        event_type TEXT NOT NULL,
        user_id TEXT,
        data TEXT,
        created_at TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_search_events_type ON search_events(event_type);
    CREATE INDEX IF NOT EXISTS idx_search_events_user ON search_events(user_id);
"#;

const MIGRATIONS: &[(i32, &str)] = &[(1, MIGRATION_V1), (2, MIGRATION_V2)];

async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current = get_current_version(pool).await?;

    for (version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        sqlx::raw_sql(sql).execute(pool).await?;
        record_migration(pool, *version).await?;
        info!(version, "Applied database migration");
    }

    Ok(())
}

/// Check if migrations need to be run
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    Ok(get_current_version(pool).await? < CURRENT_VERSION)
}

/// Get migration status
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version
    pub current_version: i32,
    /// Target schema version
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
