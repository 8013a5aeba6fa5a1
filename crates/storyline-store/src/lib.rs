//! # Storyline Store
//!
//! The story data service: the single seam between story playback and the
//! hosted backend platform.
//!
//! Reads return every active story joined with its author's profile,
//! newest first. Writes upload the media (and optional audio) to object
//! storage and then insert the story row with a 24 hour expiry. Either step
//! failing surfaces as one retryable [`CreateStoryError`].
//!
//! The platform itself (auth, buckets, relational tables) is external. The
//! [`memory`] module provides an in-process stand-in used by tests and the
//! simulation binary.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storyline_store::{MemoryPlatform, StoryDraft, MediaUpload, StoryDataService, StoryFeed};
//!
//! let platform = MemoryPlatform::new();
//! let author = platform.register_user("ada", None);
//! platform.sign_in(author);
//!
//! let service = platform.service();
//! service.create_story(StoryDraft::new(MediaUpload::new("sunset.jpg", jpeg_bytes))).await?;
//!
//! let feed = StoryFeed::load(&service).await?;
//! println!("{} authors with stories", feed.groups().len());
//! ```

pub mod config;
pub mod draft;
pub mod error;
pub mod feed;
pub mod memory;
pub mod object_store;
pub mod service;
pub mod table;

// Re-exports
pub use config::PlatformConfig;
pub use draft::{MediaUpload, StoryDraft};
pub use error::{CreateStoryError, StoreError, StoreResult};
pub use feed::StoryFeed;
pub use memory::{MemoryObjectStore, MemoryPlatform, MemoryStoryTable};
pub use object_store::{ObjectStore, StoredObject};
pub use service::{AuthSession, PlatformStoryService, StoryDataService};
pub use table::{NewStoryRow, StoryTable};
