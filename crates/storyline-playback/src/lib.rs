//! # Storyline Playback
//!
//! The story viewer's engine: which story is on screen, when it moves on,
//! and what the progress bars and audio are doing meanwhile.
//!
//! ## Layers
//!
//! - [`Sequencer`]: pure `Closed` / `Playing(group, story)` state machine
//! - [`StoryTimer`]: pausable per-story countdown with generation tokens
//! - [`AudioSlot`]: the one looping audio clip allowed at a time
//! - [`ProgressBar`]: segment fills derived from cursor and elapsed fraction
//! - [`DismissGesture`] and [`classify_tap`]: touch input to transitions
//! - [`StoryPlayer`]: all of the above behind one synchronous, clock-driven API
//! - [`ViewerSession`]: a tokio task driving a player from commands and its
//!   own deadline, publishing snapshots
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storyline_playback::{MockAudioBackend, PlaybackConfig, ViewerSession};
//!
//! let session = ViewerSession::open(groups, 0, Arc::new(MockAudioBackend::new()), PlaybackConfig::default())?;
//! let mut snapshots = session.subscribe();
//!
//! session.tap(300.0, 390.0).await?;
//! let reason = session.closed().await;
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod gesture;
pub mod mock_audio;
pub mod player;
pub mod progress;
pub mod sequencer;
pub mod session;
pub mod timer;

// Re-exports
pub use audio::{AudioBackend, AudioClip, AudioSlot, SilentAudioBackend};
pub use config::PlaybackConfig;
pub use error::{PlaybackError, PlaybackResult};
pub use gesture::{DismissGesture, GestureOutcome, TapAction, classify_tap};
pub use mock_audio::MockAudioBackend;
pub use player::{PlayerSnapshot, StoryPlayer};
pub use progress::ProgressBar;
pub use sequencer::{CloseReason, PlaybackCursor, PlaybackState, Sequencer, Transition};
pub use session::{ViewerCommand, ViewerEvent, ViewerSession};
pub use timer::{StoryTimer, TimerToken};
