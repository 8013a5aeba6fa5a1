//! Story soundtrack handling
//!
//! A story may carry an audio track that loops for as long as the story is
//! on screen. The platform player is abstracted behind [`AudioBackend`];
//! [`AudioSlot`] owns the single live clip and guarantees the previous one
//! is stopped before anything else starts.

use std::fmt;
use std::sync::Arc;

use storyline_core::{Story, StoryId};
use tracing::{debug, warn};

use crate::error::{PlaybackError, PlaybackResult};

/// A clip that is currently loaded in the platform player
///
/// Dropping a clip must release it as well; `stop` is the explicit form.
pub trait AudioClip: Send {
    /// Pause without releasing
    fn pause(&mut self);

    /// Continue after [`AudioClip::pause`]
    fn resume(&mut self);

    /// Stop playback and release the underlying handle
    fn stop(&mut self);
}

/// Something that can start looping audio from a URL
pub trait AudioBackend: Send + Sync {
    /// Load `url` and start it looping
    fn play_looped(&self, url: &str) -> PlaybackResult<Box<dyn AudioClip>>;
}

/// Holder of the one live audio clip
pub struct AudioSlot {
    backend: Arc<dyn AudioBackend>,
    current: Option<(StoryId, Box<dyn AudioClip>)>,
}

impl fmt::Debug for AudioSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSlot")
            .field("current", &self.current_story())
            .finish()
    }
}

impl AudioSlot {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Story whose clip is live, if any
    pub fn current_story(&self) -> Option<StoryId> {
        self.current.as_ref().map(|(id, _)| *id)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Make `story`'s track the live clip
    ///
    /// The previous clip is always released first. A story without audio
    /// leaves the slot empty. If the backend fails the slot also stays empty
    /// and the error is returned for logging; playback is not affected.
    pub fn switch_to(&mut self, story: &Story) -> PlaybackResult<()> {
        self.release();

        let Some(url) = story.audio_url() else {
            return Ok(());
        };

        match self.backend.play_looped(url) {
            Ok(clip) => {
                debug!(story = %story.id().short_id(), url, "Audio started");
                self.current = Some((story.id(), clip));
                Ok(())
            }
            Err(e) => {
                warn!(story = %story.id().short_id(), url, error = %e, "Audio failed, continuing silently");
                Err(e)
            }
        }
    }

    /// Stop and drop the live clip, if any
    pub fn release(&mut self) {
        if let Some((id, mut clip)) = self.current.take() {
            clip.stop();
            debug!(story = %id.short_id(), "Audio released");
        }
    }

    pub fn pause(&mut self) {
        if let Some((_, clip)) = self.current.as_mut() {
            clip.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some((_, clip)) = self.current.as_mut() {
            clip.resume();
        }
    }
}

impl Drop for AudioSlot {
    fn drop(&mut self) {
        self.release();
    }
}

/// Backend that plays nothing, for hosts without audio output
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudioBackend;

struct SilentClip;

impl AudioClip for SilentClip {
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {}
}

impl AudioBackend for SilentAudioBackend {
    fn play_looped(&self, url: &str) -> PlaybackResult<Box<dyn AudioClip>> {
        if url.trim().is_empty() {
            return Err(PlaybackError::AudioPlayback {
                url: url.to_string(),
                reason: "empty url".to_string(),
            });
        }
        Ok(Box::new(SilentClip))
    }
}
