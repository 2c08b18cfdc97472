//! Corpus import
//!
//! A corpus is one JSON document holding the three collections:
//!
//! ```json
//! { "posts": [...], "communities": [...], "profiles": [...] }
//! ```
//!
//! Missing collections are treated as empty. Import upserts by id, so
//! re-importing a corpus is idempotent.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::search::{ContentRecord, GroupRecord, ProfileRecord, SqliteRecordStore};
use crate::error::{Error, Result};

use super::database::Database;

/// All searchable records of one corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Corpus {
    pub posts: Vec<ContentRecord>,
    pub communities: Vec<GroupRecord>,
    pub profiles: Vec<ProfileRecord>,
}

/// Records written per collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub posts: usize,
    pub communities: usize,
    pub profiles: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.posts + self.communities + self.profiles
    }
}

impl Corpus {
    /// Parse a corpus from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a corpus file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("Cannot read corpus {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.communities.is_empty() && self.profiles.is_empty()
    }

    /// Upsert every record into the database
    pub async fn import(&self, db: &Database) -> Result<ImportSummary> {
        let pool = db.pool();
        let summary = ImportSummary {
            posts: SqliteRecordStore::<ContentRecord>::new(pool.clone())
                .upsert_all(&self.posts)
                .await?,
            communities: SqliteRecordStore::<GroupRecord>::new(pool.clone())
                .upsert_all(&self.communities)
                .await?,
            profiles: SqliteRecordStore::<ProfileRecord>::new(pool.clone())
                .upsert_all(&self.profiles)
                .await?,
        };

        info!(
            posts = summary.posts,
            communities = summary.communities,
            profiles = summary.profiles,
            "Imported corpus"
        );
        Ok(summary)
    }
}
