//! Grouping of active stories by author
//!
//! The feed arrives as a flat, newest-first list of stories. Playback works
//! on per-author groups, so the list is folded into an insertion-ordered
//! association from author to group in a single pass.

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoryError, StoryResult};
use crate::ids::UserId;
use crate::story::{Story, StoryRecord};

/// All active stories of one author, played back as a unit
///
/// A group always holds at least one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGroup {
    author_id: UserId,
    author_display_name: String,
    author_avatar_url: Option<String>,
    stories: Vec<Story>,
}

impl StoryGroup {
    /// Start a group from the first story seen for an author
    fn seeded(record: StoryRecord) -> Self {
        Self {
            author_id: record.story.author_id(),
            author_display_name: record.author.display_name_or_default().to_string(),
            author_avatar_url: record.author.avatar().map(str::to_string),
            stories: vec![record.story],
        }
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn author_display_name(&self) -> &str {
        &self.author_display_name
    }

    pub fn author_avatar_url(&self) -> Option<&str> {
        self.author_avatar_url.as_deref()
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Number of stories in the group (never zero)
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Index of the last story in the group
    pub fn last_index(&self) -> usize {
        self.stories.len() - 1
    }

    pub fn story(&self, index: usize) -> Option<&Story> {
        self.stories.get(index)
    }

    /// Creation time of the newest story in the group
    pub fn latest_created_at(&self) -> DateTime<Utc> {
        self.stories
            .iter()
            .map(Story::created_at)
            .max()
            .unwrap_or_else(|| self.stories[0].created_at())
    }
}

/// Fold a flat story list into per-author groups
///
/// Authors appear in the order they are first seen and each group keeps
/// its stories in the order received. Author metadata is taken from the
/// first record seen for that author.
pub fn group_by_author<R>(records: R) -> Vec<StoryGroup>
where
    R: IntoIterator<Item = StoryRecord>,
{
    let mut groups: Vec<StoryGroup> = Vec::new();
    let mut index_by_author: HashMap<UserId, usize> = HashMap::new();

    for record in records {
        let author_id = record.story.author_id();
        match index_by_author.get(&author_id) {
            Some(&index) => groups[index].stories.push(record.story),
            None => {
                index_by_author.insert(author_id, groups.len());
                groups.push(StoryGroup::seeded(record));
            }
        }
    }

    groups
}

/// Immutable, cheaply cloneable list of story groups
///
/// This is the input to a playback session. It is built once from a fetch
/// and never changes while a viewer is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryGroups {
    groups: Arc<[StoryGroup]>,
}

impl StoryGroups {
    /// Group records by author, dropping any story that is no longer active
    pub fn from_records<R>(records: R, now: DateTime<Utc>) -> Self
    where
        R: IntoIterator<Item = StoryRecord>,
    {
        let mut dropped = 0usize;
        let active = records.into_iter().filter(|record| {
            let active = record.story.is_active(now);
            if !active {
                dropped += 1;
            }
            active
        });
        let groups = group_by_author(active);

        if dropped > 0 {
            debug!(dropped, "Filtered expired stories while grouping");
        }

        Self::from(groups)
    }

    /// Re-sort every group's stories oldest first, the order they are played in
    ///
    /// Group order is left alone.
    pub fn into_playback_order(self) -> Self {
        let groups = self
            .groups
            .iter()
            .cloned()
            .map(|mut group| {
                group.stories.sort_by_key(Story::created_at);
                group
            })
            .collect::<Vec<_>>();
        Self::from(groups)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StoryGroup> {
        self.groups.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoryGroup> {
        self.groups.iter()
    }

    pub fn as_slice(&self) -> &[StoryGroup] {
        &self.groups
    }

    /// Total number of stories across all groups
    pub fn total_stories(&self) -> usize {
        self.groups.iter().map(StoryGroup::len).sum()
    }

    /// Story at a `(group, story)` position
    pub fn story(&self, group_index: usize, story_index: usize) -> Option<&Story> {
        self.groups.get(group_index)?.story(story_index)
    }

    /// Index of an author's group, if they have active stories
    pub fn position_of(&self, author_id: UserId) -> Option<usize> {
        self.groups.iter().position(|g| g.author_id == author_id)
    }

    /// Check that playback can start at `index`
    pub fn check_start(&self, index: usize) -> StoryResult<()> {
        if self.groups.is_empty() {
            return Err(StoryError::EmptyGroups);
        }
        if index >= self.groups.len() {
            return Err(StoryError::GroupOutOfRange {
                index,
                len: self.groups.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<StoryGroup>> for StoryGroups {
    fn from(groups: Vec<StoryGroup>) -> Self {
        // Groups are only ever built with a seed story.
        debug_assert!(groups.iter().all(|g| !g.is_empty()));
        Self {
            groups: groups.into(),
        }
    }
}

impl Index<usize> for StoryGroups {
    type Output = StoryGroup;

    fn index(&self, index: usize) -> &Self::Output {
        &self.groups[index]
    }
}

impl<'a> IntoIterator for &'a StoryGroups {
    type Item = &'a StoryGroup;
    type IntoIter = std::slice::Iter<'a, StoryGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}
