//! Error types for storyline-playback
//!
//! None of these are fatal to the host: an empty or invalid open is a
//! no-op, media and audio failures are logged while playback carries on,
//! and a closed session simply stops accepting commands.

use storyline_core::{StoryError, StoryId};
use thiserror::Error;

/// Errors that can occur while playing stories
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Open was called without any active stories
    #[error("no story groups to play")]
    EmptyGroups,

    /// Open was called with a start group that does not exist
    #[error("start group {index} out of range for {len} groups")]
    InvalidStart { index: usize, len: usize },

    /// A story's image or video failed to load
    #[error("media for story {story} failed to load: {reason}")]
    MediaLoad { story: StoryId, reason: String },

    /// A story's audio track could not be played
    #[error("audio {url} failed to play: {reason}")]
    AudioPlayback { url: String, reason: String },

    /// The viewer session has already closed
    #[error("viewer session closed")]
    SessionClosed,

    /// Any other story validation failure
    #[error("invalid story data: {0}")]
    Story(#[source] StoryError),
}

impl From<StoryError> for PlaybackError {
    fn from(e: StoryError) -> Self {
        match e {
            StoryError::EmptyGroups => PlaybackError::EmptyGroups,
            StoryError::GroupOutOfRange { index, len } => PlaybackError::InvalidStart { index, len },
            other => PlaybackError::Story(other),
        }
    }
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_error_display() {
        assert!(format!("{}", PlaybackError::EmptyGroups).contains("no story groups"));
        assert!(format!("{}", PlaybackError::SessionClosed).contains("closed"));

        let err = PlaybackError::InvalidStart { index: 3, len: 2 };
        let msg = format!("{}", err);
        assert!(msg.contains("3"));
        assert!(msg.contains("2"));

        let err = PlaybackError::AudioPlayback {
            url: "https://cdn/a.mp3".to_string(),
            reason: "decoder".to_string(),
        };
        assert!(format!("{}", err).contains("https://cdn/a.mp3"));
    }

    #[test]
    fn test_story_error_conversion() {
        let err: PlaybackError = StoryError::EmptyGroups.into();
        assert!(matches!(err, PlaybackError::EmptyGroups));

        let err: PlaybackError = StoryError::GroupOutOfRange { index: 5, len: 1 }.into();
        assert!(matches!(err, PlaybackError::InvalidStart { index: 5, len: 1 }));

        let err: PlaybackError = StoryError::InvalidId("not-a-uuid".to_string()).into();
        assert!(matches!(err, PlaybackError::Story(StoryError::InvalidId(_))));
        assert!(format!("{}", err).contains("not-a-uuid"));
    }
}
