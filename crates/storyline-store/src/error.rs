//! Error types for storyline-store

use storyline_core::StoryError;
use thiserror::Error;

/// Errors raised by the platform collaborators (object storage, tables)
#[derive(Debug, Error)]
pub enum StoreError {
    /// An object already exists at the upload path
    #[error("object already exists: {0}")]
    ObjectExists(String),

    /// Upload larger than the platform accepts
    #[error("object too large: {size} bytes exceeds limit of {max}")]
    TooLarge { size: u64, max: u64 },

    /// Upload rejected by object storage
    #[error("upload failed: {0}")]
    Upload(String),

    /// Row insert rejected by the table
    #[error("insert failed: {0}")]
    Insert(String),

    /// A stored row could not be turned into a story
    #[error("invalid story row: {0}")]
    InvalidRow(#[from] StoryError),
}

/// Result type for platform operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Message shown to the user whenever publishing a story fails
pub const CREATE_STORY_FAILED_MESSAGE: &str = "Failed to post story";

/// The single user-facing error of story creation
///
/// Upload and insert failures are both retryable from the user's point of
/// view: nothing became visible, so posting again is safe.
#[derive(Debug, Error)]
pub enum CreateStoryError {
    /// No signed-in user
    #[error("not authenticated")]
    NotAuthenticated,

    /// The draft carries no media bytes
    #[error("no media selected")]
    MissingMedia,

    /// Media or audio upload failed
    #[error("upload failed: {0}")]
    UploadFailure(#[source] StoreError),

    /// Uploads succeeded but the story row was not inserted
    #[error("insert failed: {0}")]
    InsertFailure(#[source] StoreError),
}

impl CreateStoryError {
    /// Whether retrying the same draft can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CreateStoryError::UploadFailure(_) | CreateStoryError::InsertFailure(_)
        )
    }

    /// Text to put in front of the user
    pub fn user_message(&self) -> &'static str {
        match self {
            CreateStoryError::NotAuthenticated => "Not authenticated",
            CreateStoryError::MissingMedia => "Please select an image first.",
            CreateStoryError::UploadFailure(_) | CreateStoryError::InsertFailure(_) => {
                CREATE_STORY_FAILED_MESSAGE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::ObjectExists("stories/a/1.jpg".to_string());
        assert!(format!("{}", err).contains("stories/a/1.jpg"));

        let err = StoreError::TooLarge { size: 10, max: 5 };
        let msg = format!("{}", err);
        assert!(msg.contains("10"));
        assert!(msg.contains("5"));

        let err: StoreError = StoryError::EmptyMediaUrl.into();
        assert!(matches!(err, StoreError::InvalidRow(_)));
    }

    #[test]
    fn test_create_story_error_retryable() {
        assert!(!CreateStoryError::NotAuthenticated.is_retryable());
        assert!(!CreateStoryError::MissingMedia.is_retryable());

        let err = CreateStoryError::UploadFailure(StoreError::Upload("offline".to_string()));
        assert!(err.is_retryable());
        assert_eq!(err.user_message(), CREATE_STORY_FAILED_MESSAGE);

        let err = CreateStoryError::InsertFailure(StoreError::Insert("rls".to_string()));
        assert!(err.is_retryable());
        assert!(format!("{}", err).contains("rls"));
    }
}
