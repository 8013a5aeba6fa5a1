//! Story drafts: what the user picked before posting

use bytes::Bytes;
use storyline_core::{MediaKind, UserId, url_extension};

/// Extension assumed for media files without one
pub const DEFAULT_MEDIA_EXTENSION: &str = "jpg";

/// Extension assumed for audio files without one
pub const DEFAULT_AUDIO_EXTENSION: &str = "mp3";

/// A local file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// Name or local URI of the picked file; only its extension is used
    pub file_name: String,
    pub data: Bytes,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Extension of the picked file, or `default` when it has none
    pub fn extension_or<'a>(&'a self, default: &'a str) -> &'a str {
        url_extension(&self.file_name).unwrap_or(default)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Media plus optional looping audio, ready to post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub media: MediaUpload,
    pub audio: Option<MediaUpload>,
}

impl StoryDraft {
    pub fn new(media: MediaUpload) -> Self {
        Self { media, audio: None }
    }

    /// Attach an audio track
    pub fn with_audio(mut self, audio: MediaUpload) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Media extension used for the object path
    pub fn media_extension(&self) -> &str {
        self.media.extension_or(DEFAULT_MEDIA_EXTENSION)
    }

    /// Kind of media, judged from the picked file's extension
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_url(&self.media.file_name)
    }

    /// Content type sent with the media upload
    pub fn media_content_type(&self) -> String {
        format!("{}/{}", self.media_kind().mime_prefix(), self.media_extension())
    }

    /// Extension and content type of the audio upload, if any
    pub fn audio_upload_meta(&self) -> Option<(&str, String)> {
        self.audio.as_ref().map(|audio| {
            let ext = audio.extension_or(DEFAULT_AUDIO_EXTENSION);
            (ext, format!("audio/{}", ext))
        })
    }
}

/// Object path for a story's media: `stories/{author}/{millis}.{ext}`
pub fn story_object_path(author: UserId, unix_millis: i64, extension: &str) -> String {
    format!("stories/{}/{}.{}", author, unix_millis, extension)
}

/// Object path for a story's soundtrack: `stories/{author}/{millis}-audio.{ext}`
///
/// Shares the media's timestamp but never its path, whatever the extensions.
pub fn story_audio_path(author: UserId, unix_millis: i64, extension: &str) -> String {
    format!("stories/{}/{}-audio.{}", author, unix_millis, extension)
}
