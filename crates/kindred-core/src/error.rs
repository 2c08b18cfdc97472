//! Error types for Kindred search

use thiserror::Error;

use crate::domain::search::EntityType;

/// Result type alias using Kindred's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Generic message shown to users when a search fails outright.
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed, please try again.";

/// Kindred error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Query errors (E001-E099)
    #[error("Invalid search query: {0}")]
    Validation(String),

    // Source errors (E100-E199)
    #[error("Search source '{entity_type}' is unavailable: {reason}")]
    SourceUnavailable {
        entity_type: EntityType,
        reason: String,
    },

    #[error("All {attempted} search sources failed: {}", failures.join("; "))]
    Aggregation {
        attempted: usize,
        failures: Vec<String>,
    },

    // Storage errors (E400-E499)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a source failure for one entity type
    pub fn source_unavailable(entity_type: EntityType, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            entity_type,
            reason: reason.to_string(),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E001",
            Self::SourceUnavailable { .. } => "E100",
            Self::Aggregation { .. } => "E101",
            Self::Storage(_) => "E400",
            Self::Serialization(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Aggregation { .. } => Some("Try the search again in a moment".to_string()),
            Self::Storage(_) => Some("kindred seed <corpus.json>".to_string()),
            Self::ConfigError(_) => Some("kindred config list".to_string()),
            _ => None,
        }
    }

    /// Message safe to show to end users; never carries per-source detail
    pub fn user_message(&self) -> String {
        match self {
            Self::Aggregation { .. } | Self::SourceUnavailable { .. } | Self::Storage(_) => {
                SEARCH_FAILED_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether this error represents a total search failure
    pub fn is_aggregation(&self) -> bool {
        matches!(self, Self::Aggregation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Validation("empty".into()).code(), "E001");
        assert_eq!(
            Error::source_unavailable(EntityType::Group, "timeout").code(),
            "E100"
        );
        let err = Error::Aggregation {
            attempted: 2,
            failures: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.code(), "E101");
        assert!(err.is_aggregation());
    }

    #[test]
    fn test_aggregation_message_lists_failures() {
        let err = Error::Aggregation {
            attempted: 2,
            failures: vec!["content down".into(), "group down".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("All 2 search sources failed"));
        assert!(msg.contains("content down; group down"));
    }

    #[test]
    fn test_user_message_hides_source_detail() {
        let err = Error::Aggregation {
            attempted: 3,
            failures: vec!["profile store: connection refused".into()],
        };
        assert_eq!(err.user_message(), SEARCH_FAILED_MESSAGE);
        assert!(err.suggestion().is_some());

        let err = Error::source_unavailable(EntityType::Profile, "connection refused");
        assert!(!err.user_message().contains("refused"));
    }
}
