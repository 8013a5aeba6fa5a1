//! Feed shaping: one fetch, grouped and ready to play

use chrono::{DateTime, Utc};
use storyline_core::{StoryGroups, StoryTray, TrayViewer};
use tracing::debug;

use crate::error::StoreResult;
use crate::service::StoryDataService;

/// Story groups fetched once for a feed screen or a playback session
#[derive(Debug, Clone)]
pub struct StoryFeed {
    groups: StoryGroups,
    fetched_at: DateTime<Utc>,
}

impl StoryFeed {
    /// Fetch active stories and group them for playback
    pub async fn load<S: StoryDataService + ?Sized>(service: &S) -> StoreResult<Self> {
        Self::load_at(service, Utc::now()).await
    }

    /// Fetch and group, treating `now` as the current time for expiry
    pub async fn load_at<S: StoryDataService + ?Sized>(
        service: &S,
        now: DateTime<Utc>,
    ) -> StoreResult<Self> {
        let records = service.fetch_active_stories().await?;
        let groups = StoryGroups::from_records(records, now).into_playback_order();

        debug!(
            groups = groups.len(),
            stories = groups.total_stories(),
            "Story feed loaded"
        );

        Ok(Self {
            groups,
            fetched_at: now,
        })
    }

    /// Groups in most-recent-author-first order, each oldest story first
    pub fn groups(&self) -> &StoryGroups {
        &self.groups
    }

    pub fn into_groups(self) -> StoryGroups {
        self.groups
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Tray entries for the signed-in user
    pub fn tray(&self, viewer: Option<&TrayViewer>) -> StoryTray {
        StoryTray::build(&self.groups, viewer)
    }
}
