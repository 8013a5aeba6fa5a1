//! The story data service
//!
//! [`StoryDataService`] is the contract playback and story creation code
//! depend on. [`PlatformStoryService`] implements it on top of any
//! [`ObjectStore`] and [`StoryTable`] pair plus the signed-in session.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use storyline_core::{Clock, Story, StoryRecord, SystemClock, UserId, story_lifetime};
use tracing::{debug, info, instrument, warn};

use crate::config::PlatformConfig;
use crate::draft::{StoryDraft, story_audio_path, story_object_path};
use crate::error::{CreateStoryError, StoreError, StoreResult};
use crate::object_store::{ObjectStore, StoredObject};
use crate::table::{NewStoryRow, StoryTable};

/// Read and write access to stories
#[async_trait]
pub trait StoryDataService: Send + Sync {
    /// Every active story joined with its author, newest created first
    async fn fetch_active_stories(&self) -> StoreResult<Vec<StoryRecord>>;

    /// Upload the draft's media (and audio) and insert the story row
    async fn create_story(&self, draft: StoryDraft) -> Result<Story, CreateStoryError>;
}

/// The signed-in user, shared between the service and the host app
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    user: Arc<RwLock<Option<UserId>>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already signed in as `user`
    pub fn signed_in(user: UserId) -> Self {
        let session = Self::new();
        session.sign_in(user);
        session
    }

    pub fn sign_in(&self, user: UserId) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    pub fn current_user(&self) -> Option<UserId> {
        *self.user.read().unwrap_or_else(|p| p.into_inner())
    }
}

/// Story data service backed by platform object storage and tables
pub struct PlatformStoryService<O: ObjectStore, T: StoryTable> {
    objects: Arc<O>,
    table: Arc<T>,
    auth: AuthSession,
    clock: Arc<dyn Clock>,
    config: PlatformConfig,
}

impl<O: ObjectStore, T: StoryTable> PlatformStoryService<O, T> {
    /// Create a service using the system clock and default configuration
    pub fn new(objects: Arc<O>, table: Arc<T>, auth: AuthSession) -> Self {
        Self {
            objects,
            table,
            auth,
            clock: Arc::new(SystemClock),
            config: PlatformConfig::default(),
        }
    }

    /// Use a specific clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> StoreResult<StoredObject> {
        let size = data.len() as u64;
        if size > self.config.max_upload_bytes {
            return Err(StoreError::TooLarge {
                size,
                max: self.config.max_upload_bytes,
            });
        }
        self.objects
            .upload(&self.config.bucket, path, data, content_type)
            .await
    }
}

#[async_trait]
impl<O: ObjectStore, T: StoryTable> StoryDataService for PlatformStoryService<O, T> {
    #[instrument(skip(self))]
    async fn fetch_active_stories(&self) -> StoreResult<Vec<StoryRecord>> {
        let now = self.clock.now_utc();
        let mut records = self.table.select_active(now).await?;

        // The table filters already; a row racing its expiry still must not leak.
        records.retain(|record| record.story.is_active(now));
        records.sort_by(|a, b| b.story.created_at().cmp(&a.story.created_at()));

        debug!(count = records.len(), "Fetched active stories");
        Ok(records)
    }

    #[instrument(skip(self, draft), fields(media_size = draft.media.size(), has_audio = draft.audio.is_some()))]
    async fn create_story(&self, draft: StoryDraft) -> Result<Story, CreateStoryError> {
        let author = self
            .auth
            .current_user()
            .ok_or(CreateStoryError::NotAuthenticated)?;

        if draft.media.data.is_empty() {
            return Err(CreateStoryError::MissingMedia);
        }

        // One timestamp names every object of this story.
        let now = self.clock.now_utc();
        let millis = now.timestamp_millis();

        let media_path = story_object_path(author, millis, draft.media_extension());
        let media = self
            .upload(&media_path, draft.media.data.clone(), &draft.media_content_type())
            .await
            .map_err(|e| {
                warn!(path = %media_path, error = %e, "Story media upload failed");
                CreateStoryError::UploadFailure(e)
            })?;

        let mut audio_url = None;
        if let (Some(audio), Some((ext, content_type))) = (&draft.audio, draft.audio_upload_meta()) {
            if audio.data.is_empty() {
                debug!("Skipping empty audio attachment");
            } else {
                let audio_path = story_audio_path(author, millis, ext);
                let stored = self
                    .upload(&audio_path, audio.data.clone(), &content_type)
                    .await
                    .map_err(|e| {
                        warn!(
                            path = %audio_path,
                            orphaned = %media.path,
                            error = %e,
                            "Story audio upload failed"
                        );
                        CreateStoryError::UploadFailure(e)
                    })?;
                audio_url = Some(stored.public_url);
            }
        }

        let row = NewStoryRow {
            author_id: author,
            media_url: media.public_url.clone(),
            audio_url,
            expires_at: now + story_lifetime(),
        };

        let story = self.table.insert(row).await.map_err(|e| {
            warn!(orphaned = %media.path, error = %e, "Story insert failed");
            CreateStoryError::InsertFailure(e)
        })?;

        info!(
            story = %story.id().short_id(),
            author = %author.short_id(),
            kind = %story.media_kind(),
            "Story published"
        );
        Ok(story)
    }
}

#[async_trait]
impl<S: StoryDataService + ?Sized> StoryDataService for Arc<S> {
    async fn fetch_active_stories(&self) -> StoreResult<Vec<StoryRecord>> {
        (**self).fetch_active_stories().await
    }

    async fn create_story(&self, draft: StoryDraft) -> Result<Story, CreateStoryError> {
        (**self).create_story(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_session_shared_between_clones() {
        let session = AuthSession::new();
        let handle = session.clone();
        assert_eq!(handle.current_user(), None);

        let user = UserId::generate();
        session.sign_in(user);
        assert_eq!(handle.current_user(), Some(user));

        handle.sign_out();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_signed_in_constructor() {
        let user = UserId::generate();
        assert_eq!(AuthSession::signed_in(user).current_user(), Some(user));
    }
}
