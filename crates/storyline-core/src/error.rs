//! Error types for Storyline core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while building or validating stories and groups
#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Story expiry {expires_at} does not follow creation time {created_at}")]
    InvalidLifetime {
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },

    #[error("Story media URL is empty")]
    EmptyMediaUrl,

    #[error("No active story groups")]
    EmptyGroups,

    #[error("Group index {index} out of range for {len} groups")]
    GroupOutOfRange { index: usize, len: usize },
}

/// Result type alias for core story operations
pub type StoryResult<T> = Result<T, StoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_error_display() {
        let err = StoryError::InvalidId("not-a-uuid".to_string());
        assert!(format!("{}", err).contains("Invalid identifier"));
        assert!(format!("{}", err).contains("not-a-uuid"));

        assert!(format!("{}", StoryError::EmptyMediaUrl).contains("empty"));
        assert!(format!("{}", StoryError::EmptyGroups).contains("No active"));

        let err = StoryError::GroupOutOfRange { index: 4, len: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains("4"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn test_invalid_lifetime_display() {
        let created_at = Utc::now();
        let err = StoryError::InvalidLifetime {
            created_at,
            expires_at: created_at,
        };
        assert!(format!("{}", err).contains("does not follow"));
    }
}
