//! Progress bars across the top of the viewer
//!
//! One segment per story of the current group. The whole bar is a pure
//! function of the cursor and one elapsed fraction, so it can be rebuilt on
//! every frame without keeping any state.

use serde::{Deserialize, Serialize};
use storyline_core::StoryGroups;

use crate::sequencer::PlaybackCursor;

/// Fill level of each segment, each in `[0, 1]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressBar {
    segments: Vec<f32>,
}

impl ProgressBar {
    /// Segments for a group of `story_count` stories showing `story_index`
    ///
    /// Earlier segments are full, the current one holds `fraction`, later
    /// ones are empty. Out-of-range fractions are clamped and NaN reads as 0.
    pub fn for_group(story_count: usize, story_index: usize, fraction: f32) -> Self {
        let current = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };

        let segments = (0..story_count)
            .map(|i| match i.cmp(&story_index) {
                std::cmp::Ordering::Less => 1.0,
                std::cmp::Ordering::Equal => current,
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect();

        Self { segments }
    }

    /// Segments for `cursor` within `groups`; empty if the cursor is invalid
    pub fn at(groups: &StoryGroups, cursor: PlaybackCursor, fraction: f32) -> Self {
        match groups.get(cursor.group_index) {
            Some(group) if cursor.story_index < group.len() => {
                Self::for_group(group.len(), cursor.story_index, fraction)
            }
            _ => Self::default(),
        }
    }

    pub fn segments(&self) -> &[f32] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Fill of the segment at `story_index`, or `None` past the last segment
    pub fn current(&self, story_index: usize) -> Option<f32> {
        self.segments.get(story_index).copied()
    }

    /// Render as text, e.g. `[####|##..|....]`, for logs and the simulation
    pub fn render(&self, width_per_segment: usize) -> String {
        let mut out = String::from("[");
        for (i, fill) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            let filled = (fill * width_per_segment as f32).round() as usize;
            out.extend(std::iter::repeat_n('#', filled.min(width_per_segment)));
            out.extend(std::iter::repeat_n('.', width_per_segment.saturating_sub(filled)));
        }
        out.push(']');
        out
    }
}
