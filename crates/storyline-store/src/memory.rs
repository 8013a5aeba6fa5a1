//! In-memory platform stand-in
//!
//! These implementations mimic the hosted platform closely enough for tests
//! and the simulation: uploads never overwrite, inserts need an existing
//! author profile, reads filter expired rows and order newest first.
//! Failures can be switched on to exercise error paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use storyline_core::{AuthorProfile, Clock, Story, StoryId, StoryRecord, SystemClock, UserId};
use tracing::{debug, trace};

use crate::config::PlatformConfig;
use crate::error::{StoreError, StoreResult};
use crate::object_store::{ObjectStore, StoredObject, public_object_url};
use crate::service::{AuthSession, PlatformStoryService};
use crate::table::{NewStoryRow, StoryTable};

/// In-memory object storage
#[derive(Debug)]
pub struct MemoryObjectStore {
    /// Object metadata keyed by `bucket/path`; payloads are not kept
    objects: DashMap<String, StoredObject>,
    public_base_url: String,
    fail_uploads: AtomicBool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new(PlatformConfig::default().public_base_url)
    }
}

impl MemoryObjectStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: DashMap::new(),
            public_base_url: public_base_url.into(),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// Make every following upload fail (or succeed again)
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Metadata of every stored object
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.iter().map(|entry| entry.value().clone()).collect()
    }

    fn key(bucket: &str, path: &str) -> String {
        format!("{}/{}", bucket, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<StoredObject> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Upload("storage unavailable".to_string()));
        }

        let key = Self::key(bucket, path);
        let object = StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
            public_url: public_object_url(&self.public_base_url, bucket, path),
        };

        match self.objects.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Err(StoreError::ObjectExists(entry.key().clone())),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                trace!(path, size = object.size, "Stored object");
                entry.insert(object.clone());
                Ok(object)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct StoryRow {
    story: Story,
}

/// In-memory `stories` and `profiles` tables
pub struct MemoryStoryTable {
    profiles: DashMap<UserId, AuthorProfile>,
    stories: DashMap<StoryId, StoryRow>,
    clock: Arc<dyn Clock>,
    fail_inserts: AtomicBool,
}

impl MemoryStoryTable {
    /// Create empty tables stamping rows with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            profiles: DashMap::new(),
            stories: DashMap::new(),
            clock,
            fail_inserts: AtomicBool::new(false),
        }
    }

    /// Create or replace a profile row
    pub fn upsert_profile(&self, user: UserId, profile: AuthorProfile) {
        self.profiles.insert(user, profile);
    }

    /// Insert an existing story as-is (seeding, backdated fixtures)
    pub fn insert_story(&self, story: Story) {
        self.stories.insert(story.id(), StoryRow { story });
    }

    /// Make every following insert fail (or succeed again)
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Total rows, expired ones included
    pub fn story_count(&self) -> usize {
        self.stories.len()
    }
}

impl Default for MemoryStoryTable {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl StoryTable for MemoryStoryTable {
    async fn insert(&self, row: NewStoryRow) -> StoreResult<Story> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Insert("database unavailable".to_string()));
        }
        if !self.profiles.contains_key(&row.author_id) {
            return Err(StoreError::Insert(format!(
                "author {} has no profile",
                row.author_id
            )));
        }

        let story = Story::from_parts(
            StoryId::generate(),
            row.author_id,
            row.media_url,
            row.audio_url,
            self.clock.now_utc(),
            row.expires_at,
        )
        .map_err(|e| StoreError::Insert(e.to_string()))?;

        debug!(story = %story.id().short_id(), "Inserted story row");
        self.insert_story(story.clone());
        Ok(story)
    }

    async fn select_active(&self, now: DateTime<Utc>) -> StoreResult<Vec<StoryRecord>> {
        let mut records: Vec<StoryRecord> = self
            .stories
            .iter()
            .filter(|entry| entry.value().story.expires_at() > now)
            .map(|entry| {
                let story = entry.value().story.clone();
                let author = self
                    .profiles
                    .get(&story.author_id())
                    .map(|p| p.value().clone())
                    .unwrap_or_default();
                StoryRecord::new(story, author)
            })
            .collect();

        records.sort_by(|a, b| b.story.created_at().cmp(&a.story.created_at()));
        Ok(records)
    }
}

/// A whole in-memory platform: auth session, tables and object storage
pub struct MemoryPlatform {
    objects: Arc<MemoryObjectStore>,
    table: Arc<MemoryStoryTable>,
    auth: AuthSession,
    clock: Arc<dyn Clock>,
    config: PlatformConfig,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Platform on the system clock with default configuration
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), PlatformConfig::default())
    }

    /// Platform on a specific clock and configuration
    pub fn with_clock(clock: Arc<dyn Clock>, config: PlatformConfig) -> Self {
        Self {
            objects: Arc::new(MemoryObjectStore::new(config.public_base_url.clone())),
            table: Arc::new(MemoryStoryTable::new(clock.clone())),
            auth: AuthSession::new(),
            clock,
            config,
        }
    }

    /// Create a user with a profile row
    pub fn register_user(&self, display_name: impl Into<String>, avatar_url: Option<String>) -> UserId {
        let user = UserId::generate();
        self.table
            .upsert_profile(user, AuthorProfile::new(display_name, avatar_url));
        user
    }

    pub fn sign_in(&self, user: UserId) {
        self.auth.sign_in(user);
    }

    pub fn sign_out(&self) {
        self.auth.sign_out();
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn objects(&self) -> &Arc<MemoryObjectStore> {
        &self.objects
    }

    pub fn table(&self) -> &Arc<MemoryStoryTable> {
        &self.table
    }

    /// A story data service talking to this platform
    pub fn service(&self) -> PlatformStoryService<MemoryObjectStore, MemoryStoryTable> {
        PlatformStoryService::new(self.objects.clone(), self.table.clone(), self.auth.clone())
            .with_clock(self.clock.clone())
            .with_config(self.config.clone())
    }
}
