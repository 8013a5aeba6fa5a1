//! Relational access to the `stories` table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storyline_core::{Story, StoryRecord, UserId};

use crate::error::StoreResult;

/// Columns written by the client when posting a story
///
/// `id` and `created_at` are assigned by the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStoryRow {
    pub author_id: UserId,
    pub media_url: String,
    pub audio_url: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// The `stories` table joined with `profiles`
#[async_trait]
pub trait StoryTable: Send + Sync {
    /// Insert a story row and return the stored story
    async fn insert(&self, row: NewStoryRow) -> StoreResult<Story>;

    /// Stories with `expires_at > now`, joined with their author's profile,
    /// newest created first
    async fn select_active(&self, now: DateTime<Utc>) -> StoreResult<Vec<StoryRecord>>;
}
