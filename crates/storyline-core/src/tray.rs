//! Story tray shown above the feed
//!
//! The tray is a row of author entries. The signed-in user's own entry
//! always comes first and leads to story creation; every other entry opens
//! the viewer at that author's group.

use serde::{Deserialize, Serialize};

use crate::group::StoryGroups;
use crate::ids::UserId;
use crate::story::{AuthorProfile, placeholder_initial};

/// Default number of other authors shown in the tray
pub const DEFAULT_TRAY_ENTRIES: usize = 8;

/// Label used for the signed-in user's own entry
pub const OWN_ENTRY_LABEL: &str = "Your Story";

/// What selecting a tray entry should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraySelection {
    /// Open the viewer starting at this group
    OpenViewer { group_index: usize },
    /// Go to story creation
    CreateStory,
}

/// One entry of the tray
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayEntry {
    pub author_id: UserId,
    pub label: String,
    pub avatar_url: Option<String>,
    /// Shown in place of the avatar when there is none
    pub placeholder_initial: Option<char>,
    /// Draws the highlighted ring
    pub has_new_story: bool,
    pub is_current_user: bool,
    pub selection: TraySelection,
}

/// The signed-in user, as far as the tray cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayViewer {
    pub user_id: UserId,
    pub profile: AuthorProfile,
}

/// Ordered tray entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryTray {
    entries: Vec<TrayEntry>,
}

impl StoryTray {
    /// Build the tray with the default entry limit
    pub fn build(groups: &StoryGroups, viewer: Option<&TrayViewer>) -> Self {
        Self::build_with_limit(groups, viewer, DEFAULT_TRAY_ENTRIES)
    }

    /// Build the tray showing at most `max_entries` other authors
    pub fn build_with_limit(
        groups: &StoryGroups,
        viewer: Option<&TrayViewer>,
        max_entries: usize,
    ) -> Self {
        let mut entries = Vec::with_capacity(max_entries + 1);

        if let Some(viewer) = viewer {
            let name = viewer.profile.display_name_or_default();
            entries.push(TrayEntry {
                author_id: viewer.user_id,
                label: OWN_ENTRY_LABEL.to_string(),
                avatar_url: viewer.profile.avatar().map(str::to_string),
                placeholder_initial: placeholder_initial(name),
                has_new_story: groups.position_of(viewer.user_id).is_some(),
                is_current_user: true,
                selection: TraySelection::CreateStory,
            });
        }

        let viewer_id = viewer.map(|v| v.user_id);
        let others = groups
            .iter()
            .enumerate()
            .filter(|(_, group)| Some(group.author_id()) != viewer_id)
            .take(max_entries)
            .map(|(group_index, group)| TrayEntry {
                author_id: group.author_id(),
                label: group.author_display_name().to_string(),
                avatar_url: group.author_avatar_url().map(str::to_string),
                placeholder_initial: placeholder_initial(group.author_display_name()),
                has_new_story: true,
                is_current_user: false,
                selection: TraySelection::OpenViewer { group_index },
            });
        entries.extend(others);

        Self { entries }
    }

    pub fn entries(&self) -> &[TrayEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a tap on the entry at `position`
    pub fn select(&self, position: usize) -> Option<TraySelection> {
        self.entries.get(position).map(|entry| entry.selection)
    }
}
