//! # Storyline Core
//!
//! Core types, grouping logic and errors for Storyline ephemeral stories.
//!
//! Stories are short-lived media posts that stay visible for 24 hours after
//! creation. This crate owns everything about a story that does not depend
//! on a backend or a runtime: identity, expiry, author grouping and the
//! tray summary shown above the feed.
//!
//! ## Key Types
//!
//! - [`Story`]: A single story with media, optional audio and its expiry window
//! - [`StoryRecord`]: A story joined with its author's profile, as fetched
//! - [`StoryGroup`]: All active stories of one author, played as a unit
//! - [`StoryGroups`]: The immutable list of groups a playback session runs over
//! - [`StoryTray`]: The tray of author entries used to pick where playback starts
//!
//! ## Key Traits
//!
//! - [`Clock`]: Time abstraction for testability

pub mod clock;
pub mod error;
pub mod group;
pub mod ids;
pub mod story;
pub mod tray;

// Re-export main types
pub use clock::*;
pub use error::*;
pub use group::*;
pub use ids::*;
pub use story::*;
pub use tray::*;
