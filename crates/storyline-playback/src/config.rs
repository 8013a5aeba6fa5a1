//! Playback tuning

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the story viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// How long each story stays on screen
    #[serde(with = "duration_millis", rename = "story_duration_ms")]
    pub story_duration: Duration,
    /// Downward drag (logical px) past which a release closes the viewer
    pub dismiss_threshold: f32,
    /// Vertical movement (logical px) before a drag is claimed
    pub drag_activation: f32,
    /// Fraction of the viewport width taken by each side tap zone
    pub tap_zone_fraction: f32,
    /// How often a running session republishes progress
    #[serde(with = "duration_millis", rename = "frame_interval_ms")]
    pub frame_interval: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            story_duration: Duration::from_secs(5),
            dismiss_threshold: 100.0,
            drag_activation: 10.0,
            tap_zone_fraction: 1.0 / 3.0,
            frame_interval: Duration::from_millis(100),
        }
    }
}

impl PlaybackConfig {
    /// Set the per-story display duration
    pub fn with_story_duration(mut self, duration: Duration) -> Self {
        self.story_duration = duration;
        self
    }

    /// Set the swipe-down dismiss threshold
    pub fn with_dismiss_threshold(mut self, threshold: f32) -> Self {
        self.dismiss_threshold = threshold;
        self
    }

    /// Set how often sessions republish progress
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
