//! Native record types for each searchable collection
//!
//! Records are owned by the document store. Each one knows how to expose its
//! searchable text, its store-indexed fields and its canonical sort keys so a
//! generic adapter can score and map it.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::entity::{EntityType, SearchResult};
use super::filter::StoreField;

/// Visibility value the store uses for public communities
pub const PUBLIC_VISIBILITY: &str = "public";

/// Timestamp as found in stored documents
///
/// Older documents carry raw epoch milliseconds, documents written by the
/// store SDK carry `{seconds, nanoseconds}`, imported fixtures carry RFC 3339
/// strings. Everything is compared through [`RecordTimestamp::to_epoch_millis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTimestamp {
    EpochMillis(i64),
    Native { seconds: i64, nanoseconds: u32 },
    Rfc3339(DateTime<Utc>),
}

impl RecordTimestamp {
    /// Canonical epoch-millisecond value
    pub fn to_epoch_millis(&self) -> i64 {
        match *self {
            Self::EpochMillis(millis) => millis,
            Self::Native {
                seconds,
                nanoseconds,
            } => seconds
                .saturating_mul(1_000)
                .saturating_add(i64::from(nanoseconds / 1_000_000)),
            Self::Rfc3339(at) => at.timestamp_millis(),
        }
    }
}

impl Default for RecordTimestamp {
    fn default() -> Self {
        Self::EpochMillis(0)
    }
}

impl From<i64> for RecordTimestamp {
    fn from(millis: i64) -> Self {
        Self::EpochMillis(millis)
    }
}

impl From<DateTime<Utc>> for RecordTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Rfc3339(at)
    }
}

/// A stored record that can be searched
pub trait SearchableRecord:
    Clone + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Entity type this record maps to
    const ENTITY_TYPE: EntityType;

    /// Store collection name
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Display name or title; used for suggestions
    fn title(&self) -> &str;

    fn description(&self) -> &str;

    /// Concatenated text the scorer runs against
    fn searchable_text(&self) -> String;

    fn tags(&self) -> &[String];

    fn created_at(&self) -> RecordTimestamp;

    /// Entity-specific popularity scalar
    fn popularity(&self) -> f64;

    /// Value of a text field the store indexes, if this record has it
    fn text_field(&self, field: StoreField) -> Option<&str>;

    /// Type-specific result metadata
    fn metadata(&self) -> Map<String, Value>;

    /// Map into the common result shape
    fn to_result(&self, relevance_score: u32) -> SearchResult {
        SearchResult::new(
            self.id(),
            Self::ENTITY_TYPE,
            self.title(),
            self.description(),
        )
        .with_score(relevance_score)
        .with_created_at(self.created_at().to_epoch_millis())
        .with_metadata(self.metadata())
        .with_popularity(self.popularity())
    }
}

fn join_text(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A post inside a community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub author_id: String,
    #[serde(default)]
    pub community_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub votes: i64,
    #[serde(default)]
    pub comment_count: u32,
    #[serde(default)]
    pub created_at: RecordTimestamp,
}

impl ContentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: String::new(),
            author_id: author_id.into(),
            community_id: None,
            tags: Vec::new(),
            votes: 0,
            comment_count: 0,
            created_at: RecordTimestamp::default(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_community(mut self, community_id: impl Into<String>) -> Self {
        self.community_id = Some(community_id.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_votes(mut self, votes: i64) -> Self {
        self.votes = votes;
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<RecordTimestamp>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

impl SearchableRecord for ContentRecord {
    const ENTITY_TYPE: EntityType = EntityType::Content;
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.body
    }

    fn searchable_text(&self) -> String {
        join_text(&[&self.title, &self.body])
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn created_at(&self) -> RecordTimestamp {
        self.created_at
    }

    fn popularity(&self) -> f64 {
        self.votes as f64
    }

    fn text_field(&self, field: StoreField) -> Option<&str> {
        match field {
            StoreField::ScopeId => self.community_id.as_deref(),
            StoreField::AuthorId => Some(&self.author_id),
            _ => None,
        }
    }

    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("authorId".into(), json!(self.author_id));
        metadata.insert("communityId".into(), json!(self.community_id));
        metadata.insert("votes".into(), json!(self.votes));
        metadata.insert("commentCount".into(), json!(self.comment_count));
        metadata.insert("tags".into(), json!(self.tags));
        metadata
    }
}

/// A community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: RecordTimestamp,
}

fn default_visibility() -> String {
    PUBLIC_VISIBILITY.to_string()
}

impl GroupRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            owner_id: owner_id.into(),
            member_count: 0,
            visibility: default_visibility(),
            tags: Vec::new(),
            created_at: RecordTimestamp::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_members(mut self, member_count: u32) -> Self {
        self.member_count = member_count;
        self
    }

    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<RecordTimestamp>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

impl SearchableRecord for GroupRecord {
    const ENTITY_TYPE: EntityType = EntityType::Group;
    const COLLECTION: &'static str = "communities";

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn searchable_text(&self) -> String {
        join_text(&[&self.name, &self.description])
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn created_at(&self) -> RecordTimestamp {
        self.created_at
    }

    fn popularity(&self) -> f64 {
        f64::from(self.member_count)
    }

    fn text_field(&self, field: StoreField) -> Option<&str> {
        match field {
            StoreField::AuthorId => Some(&self.owner_id),
            StoreField::Visibility => Some(&self.visibility),
            _ => None,
        }
    }

    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("ownerId".into(), json!(self.owner_id));
        metadata.insert("memberCount".into(), json!(self.member_count));
        metadata.insert("visibility".into(), json!(self.visibility));
        metadata.insert("tags".into(), json!(self.tags));
        metadata
    }
}

/// A user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub created_at: RecordTimestamp,
}

impl ProfileRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            bio: String::new(),
            skills: Vec::new(),
            role: None,
            rating: 0.0,
            created_at: RecordTimestamp::default(),
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<RecordTimestamp>) -> Self {
        self.created_at = created_at.into();
        self
    }
}

impl SearchableRecord for ProfileRecord {
    const ENTITY_TYPE: EntityType = EntityType::Profile;
    const COLLECTION: &'static str = "profiles";

    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.display_name
    }

    fn description(&self) -> &str {
        &self.bio
    }

    fn searchable_text(&self) -> String {
        let skills = self.skills.join(" ");
        join_text(&[&self.display_name, &self.bio, &skills])
    }

    // Skills double as tags for tag filters
    fn tags(&self) -> &[String] {
        &self.skills
    }

    fn created_at(&self) -> RecordTimestamp {
        self.created_at
    }

    fn popularity(&self) -> f64 {
        self.rating
    }

    fn text_field(&self, _field: StoreField) -> Option<&str> {
        None
    }

    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("role".into(), json!(self.role));
        metadata.insert("skills".into(), json!(self.skills));
        metadata.insert("rating".into(), json!(self.rating));
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_representations_normalize() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let millis = at.timestamp_millis();

        let raw = RecordTimestamp::EpochMillis(millis);
        let native = RecordTimestamp::Native {
            seconds: at.timestamp(),
            nanoseconds: 0,
        };
        let iso = RecordTimestamp::from(at);

        assert_eq!(raw.to_epoch_millis(), millis);
        assert_eq!(native.to_epoch_millis(), millis);
        assert_eq!(iso.to_epoch_millis(), millis);
    }

    #[test]
    fn test_native_timestamp_keeps_millis_from_nanos() {
        let ts = RecordTimestamp::Native {
            seconds: 10,
            nanoseconds: 250_000_000,
        };
        assert_eq!(ts.to_epoch_millis(), 10_250);
    }

    #[test]
    fn test_timestamp_deserializes_every_shape() {
        let raw: RecordTimestamp = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(raw, RecordTimestamp::EpochMillis(1_700_000_000_000));

        let native: RecordTimestamp =
            serde_json::from_str(r#"{"seconds": 1700000000, "nanoseconds": 0}"#).unwrap();
        assert_eq!(native.to_epoch_millis(), 1_700_000_000_000);

        let iso: RecordTimestamp = serde_json::from_str(r#""2023-11-14T22:13:20Z""#).unwrap();
        assert_eq!(iso.to_epoch_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_searchable_text_per_entity() {
        let post = ContentRecord::new("p1", "Intro to Rust", "u1").with_body("Ownership basics");
        assert_eq!(post.searchable_text(), "Intro to Rust Ownership basics");

        let group = GroupRecord::new("g1", "Rustaceans", "u1");
        assert_eq!(group.searchable_text(), "Rustaceans");

        let profile = ProfileRecord::new("u1", "Ada")
            .with_bio("Systems mentor")
            .with_skills(&["rust", "c"]);
        assert_eq!(profile.searchable_text(), "Ada Systems mentor rust c");
    }

    #[test]
    fn test_to_result_carries_canonical_keys() {
        let post = ContentRecord::new("p1", "Intro", "u1")
            .with_votes(12)
            .with_created_at(RecordTimestamp::Native {
                seconds: 5,
                nanoseconds: 0,
            });
        let result = post.to_result(50);

        assert_eq!(result.entity_type, EntityType::Content);
        assert_eq!(result.created_at, 5_000);
        assert_eq!(result.popularity, 12.0);
        assert_eq!(result.metadata["popularity"], json!(12.0));
        assert_eq!(result.metadata["votes"], json!(12));
    }

    #[test]
    fn test_group_defaults_to_public() {
        let group: GroupRecord =
            serde_json::from_str(r#"{"id":"g1","name":"Go","ownerId":"u1"}"#).unwrap();
        assert_eq!(group.visibility, PUBLIC_VISIBILITY);
        assert_eq!(group.text_field(StoreField::Visibility), Some("public"));
    }
}
