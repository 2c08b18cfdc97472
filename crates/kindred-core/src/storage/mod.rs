//! Storage layer - SQLite document store
//!
//! Provides database management, migrations and corpus import for kindred.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `corpus`: JSON corpus import into the `records` table
//!
//! # Usage
//!
//! ```ignore
//! use kindred_core::storage::{Corpus, Database};
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Seed it from a corpus file
//! let summary = Corpus::load("corpus.json")?.import(&db).await?;
//! ```

pub mod corpus;
pub mod database;
pub mod migrations;

// Re-export commonly used types
pub use corpus::{Corpus, ImportSummary};
pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
