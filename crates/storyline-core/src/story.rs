//! Story records and their expiry window

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoryError, StoryResult};
use crate::ids::{StoryId, UserId};

/// How long a story stays visible after it is created
pub const STORY_LIFETIME_HOURS: i64 = 24;

/// Placeholder shown when an author has no usable display name
pub const PLACEHOLDER_DISPLAY_NAME: &str = "User";

/// Story lifetime as a chrono duration
pub fn story_lifetime() -> chrono::Duration {
    chrono::Duration::hours(STORY_LIFETIME_HOURS)
}

/// Kind of media a story displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extensions played as video
    pub const VIDEO_EXTENSIONS: &'static [&'static str] = &["mp4", "mov"];

    /// Infer the media kind from a URL's path suffix
    ///
    /// Query strings and fragments are ignored and the comparison is
    /// case-insensitive. Anything that is not a known video extension is an
    /// image.
    pub fn from_url(url: &str) -> Self {
        match url_extension(url) {
            Some(ext)
                if Self::VIDEO_EXTENSIONS
                    .iter()
                    .any(|v| ext.eq_ignore_ascii_case(v)) =>
            {
                MediaKind::Video
            }
            _ => MediaKind::Image,
        }
    }

    /// MIME top-level type for uploads of this kind
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Extract the extension of the last path segment of a URL or file name
pub fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = last_segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// A single ephemeral story
///
/// The expiry timestamp is fixed at creation; there is no way to extend or
/// shorten a story once it exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    id: StoryId,
    author_id: UserId,
    media_url: String,
    media_kind: MediaKind,
    audio_url: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Story {
    /// Create a story that expires [`STORY_LIFETIME_HOURS`] after `created_at`
    pub fn new(
        id: StoryId,
        author_id: UserId,
        media_url: impl Into<String>,
        audio_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> StoryResult<Self> {
        Self::from_parts(
            id,
            author_id,
            media_url,
            audio_url,
            created_at,
            created_at + story_lifetime(),
        )
    }

    /// Rebuild a story from a stored row
    ///
    /// Rows written by other clients carry their own expiry, so it is taken
    /// as-is as long as it lies after the creation time.
    pub fn from_parts(
        id: StoryId,
        author_id: UserId,
        media_url: impl Into<String>,
        audio_url: Option<String>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StoryResult<Self> {
        let media_url = media_url.into();
        if media_url.trim().is_empty() {
            return Err(StoryError::EmptyMediaUrl);
        }
        if expires_at <= created_at {
            return Err(StoryError::InvalidLifetime {
                created_at,
                expires_at,
            });
        }
        let audio_url = audio_url.filter(|url| !url.trim().is_empty());

        Ok(Self {
            id,
            author_id,
            media_kind: MediaKind::from_url(&media_url),
            media_url,
            audio_url,
            created_at,
            expires_at,
        })
    }

    pub fn id(&self) -> StoryId {
        self.id
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// A story is active strictly before its expiry instant
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Header label for how long ago the story was posted
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        age_label(self.created_at, now)
    }
}

/// Compact relative-time label: `now`, `12m`, `5h`, `2d`
///
/// Timestamps in the future (clock skew between devices) read as `now`.
pub fn age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    let hours = minutes / 60;

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else if hours < 24 {
        format!("{}h", hours)
    } else {
        format!("{}d", hours / 24)
    }
}

/// Public profile fields joined onto each fetched story
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthorProfile {
    pub fn new(display_name: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            avatar_url,
        }
    }

    /// Display name, falling back to the placeholder when missing or blank
    pub fn display_name_or_default(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(PLACEHOLDER_DISPLAY_NAME)
    }

    /// Avatar URL, treating a blank string as absent
    pub fn avatar(&self) -> Option<&str> {
        self.avatar_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}

/// Upper-cased first letter of a display name, for avatar placeholders
pub fn placeholder_initial(display_name: &str) -> Option<char> {
    display_name
        .trim()
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
}

/// A story row joined with its author's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub story: Story,
    pub author: AuthorProfile,
}

impl StoryRecord {
    pub fn new(story: Story, author: AuthorProfile) -> Self {
        Self { story, author }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_media_kind_from_url() {
        assert_eq!(MediaKind::from_url("https://cdn/x/clip.mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_url("https://cdn/x/CLIP.MOV"), MediaKind::Video);
        assert_eq!(
            MediaKind::from_url("https://cdn/x/clip.mp4?token=abc#t=3"),
            MediaKind::Video
        );
        assert_eq!(MediaKind::from_url("https://cdn/x/photo.jpg"), MediaKind::Image);
        assert_eq!(MediaKind::from_url("https://cdn/mp4/photo"), MediaKind::Image);
        assert_eq!(MediaKind::from_url(""), MediaKind::Image);
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("a/b/c.png"), Some("png"));
        assert_eq!(url_extension("c.tar.gz"), Some("gz"));
        assert_eq!(url_extension("file:///tmp/.hidden"), None);
        assert_eq!(url_extension("noext"), None);
        assert_eq!(url_extension("dir.v2/noext"), None);
    }

    #[test]
    fn test_new_story_expires_after_24_hours() {
        let created = at(10, 0);
        let story = Story::new(
            StoryId::generate(),
            UserId::generate(),
            "https://cdn/s.jpg",
            None,
            created,
        )
        .unwrap();

        assert_eq!(story.expires_at() - story.created_at(), chrono::Duration::hours(24));
        assert!(story.is_active(created));
        assert!(story.is_active(story.expires_at() - chrono::Duration::seconds(1)));
        assert!(!story.is_active(story.expires_at()));
    }

    #[test]
    fn test_from_parts_rejects_bad_rows() {
        let created = at(10, 0);
        let err = Story::from_parts(
            StoryId::generate(),
            UserId::generate(),
            "https://cdn/s.jpg",
            None,
            created,
            created,
        )
        .unwrap_err();
        assert!(matches!(err, StoryError::InvalidLifetime { .. }));

        let err = Story::new(StoryId::generate(), UserId::generate(), "  ", None, created)
            .unwrap_err();
        assert!(matches!(err, StoryError::EmptyMediaUrl));
    }

    #[test]
    fn test_blank_audio_url_is_dropped() {
        let story = Story::new(
            StoryId::generate(),
            UserId::generate(),
            "https://cdn/s.jpg",
            Some(String::new()),
            at(9, 0),
        )
        .unwrap();
        assert_eq!(story.audio_url(), None);
    }

    #[test]
    fn test_age_label() {
        let created = at(10, 0);
        assert_eq!(age_label(created, created), "now");
        assert_eq!(age_label(created, created + chrono::Duration::seconds(59)), "now");
        assert_eq!(age_label(created, at(10, 1)), "1m");
        assert_eq!(age_label(created, at(10, 59)), "59m");
        assert_eq!(age_label(created, at(11, 0)), "1h");
        assert_eq!(age_label(created, at(23, 59)), "13h");
        assert_eq!(age_label(created, created + chrono::Duration::hours(49)), "2d");
        assert_eq!(age_label(at(11, 0), created), "now");
    }

    #[test]
    fn test_author_profile_fallbacks() {
        let profile = AuthorProfile::default();
        assert_eq!(profile.display_name_or_default(), "User");
        assert_eq!(profile.avatar(), None);

        let profile = AuthorProfile {
            display_name: Some("   ".to_string()),
            avatar_url: Some(String::new()),
        };
        assert_eq!(profile.display_name_or_default(), "User");
        assert_eq!(profile.avatar(), None);

        let profile = AuthorProfile::new("ada", Some("https://cdn/a.png".to_string()));
        assert_eq!(profile.display_name_or_default(), "ada");
        assert_eq!(profile.avatar(), Some("https://cdn/a.png"));
    }

    #[test]
    fn test_placeholder_initial() {
        assert_eq!(placeholder_initial("ada"), Some('A'));
        assert_eq!(placeholder_initial("  émile"), Some('É'));
        assert_eq!(placeholder_initial(""), None);
    }
}
