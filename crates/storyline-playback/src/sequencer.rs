//! The playback state machine
//!
//! ```text
//!            open(groups, g)               advance / retreat
//!   Closed ──────────────────▶ Playing(g, 0) ◀──────────────┐
//!     ▲                          │   └──────────────────────┘
//!     │    dismiss, or advance   │
//!     └──── past the last story ─┘
//! ```
//!
//! The sequencer knows nothing about time, audio or input devices; it only
//! moves a cursor over an immutable list of groups. Everything that must
//! happen when the cursor moves is driven from the [`Transition`] each call
//! returns.

use serde::{Deserialize, Serialize};
use storyline_core::{Story, StoryGroup, StoryGroups};
use tracing::debug;

use crate::error::{PlaybackError, PlaybackResult};

/// Position of the story on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackCursor {
    pub group_index: usize,
    pub story_index: usize,
}

impl PlaybackCursor {
    pub fn new(group_index: usize, story_index: usize) -> Self {
        Self {
            group_index,
            story_index,
        }
    }
}

impl std::fmt::Display for PlaybackCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.group_index, self.story_index)
    }
}

/// Viewer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Closed,
    Playing(PlaybackCursor),
}

impl PlaybackState {
    pub fn cursor(&self) -> Option<PlaybackCursor> {
        match self {
            PlaybackState::Closed => None,
            PlaybackState::Playing(cursor) => Some(*cursor),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }
}

/// Why the viewer closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Close button or swipe down
    Dismissed,
    /// Advanced past the last story of the last group
    Exhausted,
}

/// Result of feeding an input to the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    /// Playback started at this cursor
    Opened(PlaybackCursor),
    /// The cursor moved
    Moved {
        from: PlaybackCursor,
        to: PlaybackCursor,
    },
    /// Nothing changed
    Unchanged,
    /// Playback ended
    Closed(CloseReason),
}

impl Transition {
    /// Cursor now on screen, if this transition put a new story there
    pub fn entered(&self) -> Option<PlaybackCursor> {
        match self {
            Transition::Opened(cursor) => Some(*cursor),
            Transition::Moved { to, .. } => Some(*to),
            Transition::Unchanged | Transition::Closed(_) => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Transition::Closed(_))
    }
}

/// Cursor over a fixed list of story groups
#[derive(Debug, Clone)]
pub struct Sequencer {
    groups: StoryGroups,
    state: PlaybackState,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    /// Create a closed sequencer
    pub fn new() -> Self {
        Self {
            groups: StoryGroups::default(),
            state: PlaybackState::Closed,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> Option<PlaybackCursor> {
        self.state.cursor()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Groups of the current session (empty while closed)
    pub fn groups(&self) -> &StoryGroups {
        &self.groups
    }

    pub fn current_group(&self) -> Option<&StoryGroup> {
        self.cursor().and_then(|c| self.groups.get(c.group_index))
    }

    pub fn current_story(&self) -> Option<&Story> {
        self.cursor()
            .and_then(|c| self.groups.story(c.group_index, c.story_index))
    }

    /// Start playback at the first story of `start_group`
    ///
    /// With no groups or an out-of-range start the sequencer stays (or
    /// becomes) closed and the error says why. Opening while already
    /// playing replaces the session.
    pub fn open(&mut self, groups: StoryGroups, start_group: usize) -> PlaybackResult<Transition> {
        if let Err(e) = groups.check_start(start_group) {
            self.close_quietly();
            return Err(PlaybackError::from(e));
        }

        let cursor = PlaybackCursor::new(start_group, 0);
        debug!(
            groups = groups.len(),
            stories = groups.total_stories(),
            start = %cursor,
            "Sequencer opened"
        );
        self.groups = groups;
        self.state = PlaybackState::Playing(cursor);
        Ok(Transition::Opened(cursor))
    }

    /// Move to the next story, the next author, or close after the last one
    pub fn advance(&mut self) -> Transition {
        let Some(from) = self.cursor() else {
            return Transition::Unchanged;
        };
        let group_len = self.groups[from.group_index].len();

        let next = if from.story_index + 1 < group_len {
            Some(PlaybackCursor::new(from.group_index, from.story_index + 1))
        } else if from.group_index + 1 < self.groups.len() {
            Some(PlaybackCursor::new(from.group_index + 1, 0))
        } else {
            None
        };

        match next {
            Some(to) => self.move_to(from, to),
            None => self.close(CloseReason::Exhausted),
        }
    }

    /// Move to the previous story, or the last story of the previous author
    ///
    /// At the very first story this does nothing.
    pub fn retreat(&mut self) -> Transition {
        let Some(from) = self.cursor() else {
            return Transition::Unchanged;
        };

        let prev = if from.story_index > 0 {
            Some(PlaybackCursor::new(from.group_index, from.story_index - 1))
        } else if from.group_index > 0 {
            let group_index = from.group_index - 1;
            Some(PlaybackCursor::new(group_index, self.groups[group_index].last_index()))
        } else {
            None
        };

        match prev {
            Some(to) => self.move_to(from, to),
            None => Transition::Unchanged,
        }
    }

    /// Close the viewer from any playing state
    pub fn dismiss(&mut self) -> Transition {
        if !self.is_playing() {
            return Transition::Unchanged;
        }
        self.close(CloseReason::Dismissed)
    }

    fn move_to(&mut self, from: PlaybackCursor, to: PlaybackCursor) -> Transition {
        self.state = PlaybackState::Playing(to);
        Transition::Moved { from, to }
    }

    fn close(&mut self, reason: CloseReason) -> Transition {
        debug!(?reason, "Sequencer closed");
        self.close_quietly();
        Transition::Closed(reason)
    }

    fn close_quietly(&mut self) {
        self.state = PlaybackState::Closed;
        self.groups = StoryGroups::default();
    }
}
