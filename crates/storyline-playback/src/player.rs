//! The story player engine
//!
//! [`StoryPlayer`] wires the [`Sequencer`] to its timer, the audio slot and
//! the gesture tracker. Every input goes through [`StoryPlayer::apply`] so
//! the side effects of a cursor change happen in exactly one place:
//!
//! - entering a story restarts the timer (held at zero while paused),
//!   clears the media failure flag and swaps the soundtrack;
//! - closing cancels the timer and releases audio.
//!
//! The player is synchronous and reads time from a [`Clock`], so tests can
//! drive it with a manual clock while [`crate::ViewerSession`] drives it
//! from a tokio task.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use storyline_core::{Clock, MediaKind, StoryGroups, StoryId, UserId};
use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, AudioSlot};
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, PlaybackResult};
use crate::gesture::{DismissGesture, GestureOutcome, TapAction, classify_tap};
use crate::progress::ProgressBar;
use crate::sequencer::{PlaybackCursor, PlaybackState, Sequencer, Transition};
use crate::timer::{StoryTimer, TimerToken};

/// Everything the presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub author_avatar: Option<String>,
    pub story_id: Option<StoryId>,
    pub media_url: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub age_label: Option<String>,
    pub progress: ProgressBar,
    pub audio_active: bool,
    pub paused: bool,
    pub media_failed: bool,
    /// Downward drag preview offset
    pub drag_offset: f32,
}

impl PlayerSnapshot {
    /// Snapshot of a closed viewer
    pub fn closed() -> Self {
        Self {
            state: PlaybackState::Closed,
            author_id: None,
            author_name: None,
            author_avatar: None,
            story_id: None,
            media_url: None,
            media_kind: None,
            age_label: None,
            progress: ProgressBar::default(),
            audio_active: false,
            paused: false,
            media_failed: false,
            drag_offset: 0.0,
        }
    }

    pub fn cursor(&self) -> Option<PlaybackCursor> {
        self.state.cursor()
    }
}

/// Synchronous story viewer engine
pub struct StoryPlayer {
    sequencer: Sequencer,
    timer: StoryTimer,
    audio: AudioSlot,
    gesture: DismissGesture,
    clock: Arc<dyn Clock>,
    config: PlaybackConfig,
    paused: bool,
    media_failed: bool,
}

impl std::fmt::Debug for StoryPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryPlayer")
            .field("sequencer", &self.sequencer)
            .field("timer", &self.timer)
            .field("audio", &self.audio)
            .field("paused", &self.paused)
            .field("media_failed", &self.media_failed)
            .finish_non_exhaustive()
    }
}

impl StoryPlayer {
    /// Create a closed player
    pub fn new(audio: Arc<dyn AudioBackend>, clock: Arc<dyn Clock>, config: PlaybackConfig) -> Self {
        Self {
            sequencer: Sequencer::new(),
            timer: StoryTimer::new(config.story_duration),
            audio: AudioSlot::new(audio),
            gesture: DismissGesture::new(config.dismiss_threshold, config.drag_activation),
            clock,
            config,
            paused: false,
            media_failed: false,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.sequencer.state()
    }

    pub fn cursor(&self) -> Option<PlaybackCursor> {
        self.sequencer.cursor()
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn groups(&self) -> &StoryGroups {
        self.sequencer.groups()
    }

    /// Open the viewer at the first story of `start_group`
    ///
    /// An empty or out-of-range open leaves the player closed, releasing
    /// anything a previous session still held.
    pub fn open(&mut self, groups: StoryGroups, start_group: usize) -> PlaybackResult<Transition> {
        self.paused = false;
        match self.sequencer.open(groups, start_group) {
            Ok(transition) => Ok(self.apply(transition)),
            Err(e) => {
                debug!(error = %e, "Open ignored");
                self.shut_down();
                Err(e)
            }
        }
    }

    pub fn advance(&mut self) -> Transition {
        let transition = self.sequencer.advance();
        self.apply(transition)
    }

    pub fn retreat(&mut self) -> Transition {
        let transition = self.sequencer.retreat();
        self.apply(transition)
    }

    pub fn dismiss(&mut self) -> Transition {
        let transition = self.sequencer.dismiss();
        self.apply(transition)
    }

    /// Advance if the current story's time is up
    pub fn tick(&mut self) -> Transition {
        if self.timer.is_expired(self.clock.now()) {
            debug!(cursor = ?self.cursor(), "Story timer expired");
            self.advance()
        } else {
            Transition::Unchanged
        }
    }

    /// Handle a wake-up scheduled for `token`
    ///
    /// A token from an earlier arming is ignored, so a deadline computed for
    /// a previous story cannot move the cursor.
    pub fn expire(&mut self, token: TimerToken) -> Transition {
        if !self.timer.is_current(token) {
            debug!(?token, "Stale timer wake-up ignored");
            return Transition::Unchanged;
        }
        self.tick()
    }

    /// Instant the current story runs out, if the timer is running
    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn timer_token(&self) -> Option<TimerToken> {
        self.timer.token()
    }

    /// Handle a tap at `x` on a viewport `width` wide
    pub fn tap(&mut self, x: f32, width: f32) -> Transition {
        if !self.is_playing() {
            return Transition::Unchanged;
        }
        match classify_tap(x, width, self.config.tap_zone_fraction) {
            TapAction::Retreat => self.retreat(),
            TapAction::Advance => self.advance(),
            TapAction::None => Transition::Unchanged,
        }
    }

    /// Track a vertical drag; returns the preview offset
    pub fn drag_move(&mut self, dy: f32) -> f32 {
        if !self.is_playing() {
            return 0.0;
        }
        self.gesture.update(dy)
    }

    /// Release a vertical drag
    pub fn drag_end(&mut self, dy: f32) -> Transition {
        match self.gesture.release(dy) {
            GestureOutcome::Dismiss => self.dismiss(),
            GestureOutcome::Ignored => Transition::Unchanged,
        }
    }

    /// Freeze the timer and audio; returns false if nothing changed
    pub fn pause(&mut self) -> bool {
        if !self.is_playing() || self.paused {
            return false;
        }
        self.paused = true;
        self.timer.pause(self.clock.now());
        self.audio.pause();
        debug!(cursor = ?self.cursor(), "Playback paused");
        true
    }

    /// Continue from the held progress; returns false if nothing changed
    pub fn resume(&mut self) -> bool {
        if !self.is_playing() || !self.paused {
            return false;
        }
        self.paused = false;
        self.timer.resume(self.clock.now());
        self.audio.resume();
        debug!(cursor = ?self.cursor(), "Playback resumed");
        true
    }

    /// The host could not load a story's image or video
    ///
    /// The failure is logged and shown in snapshots; the timer keeps
    /// running so the viewer moves on by itself. Returns false when the
    /// report is for a story that is no longer on screen.
    pub fn report_media_failure(&mut self, story_id: StoryId, reason: impl Into<String>) -> bool {
        let current = self.sequencer.current_story().map(|s| s.id());
        if current != Some(story_id) {
            debug!(story = %story_id.short_id(), "Media failure for off-screen story ignored");
            return false;
        }
        let error = PlaybackError::MediaLoad {
            story: story_id,
            reason: reason.into(),
        };
        warn!(error = %error, "Media failed to load");
        self.media_failed = true;
        true
    }

    /// Progress bar for the story on screen
    pub fn progress(&self) -> ProgressBar {
        match self.cursor() {
            Some(cursor) => ProgressBar::at(
                self.sequencer.groups(),
                cursor,
                self.timer.fraction(self.clock.now()),
            ),
            None => ProgressBar::default(),
        }
    }

    /// Current frame
    pub fn snapshot(&self) -> PlayerSnapshot {
        let (Some(group), Some(story)) = (self.sequencer.current_group(), self.sequencer.current_story())
        else {
            return PlayerSnapshot::closed();
        };

        PlayerSnapshot {
            state: self.state(),
            author_id: Some(group.author_id()),
            author_name: Some(group.author_display_name().to_string()),
            author_avatar: group.author_avatar_url().map(str::to_string),
            story_id: Some(story.id()),
            media_url: Some(story.media_url().to_string()),
            media_kind: Some(story.media_kind()),
            age_label: Some(story.age_label(self.clock.now_utc())),
            progress: self.progress(),
            audio_active: self.audio.is_active(),
            paused: self.paused,
            media_failed: self.media_failed,
            drag_offset: self.gesture.offset(),
        }
    }

    /// Run the side effects of `transition`
    fn apply(&mut self, transition: Transition) -> Transition {
        if let Some(cursor) = transition.entered() {
            self.enter(cursor);
        } else if let Transition::Closed(reason) = transition {
            self.shut_down();
            info!(?reason, "Viewer closed");
        }
        transition
    }

    fn enter(&mut self, cursor: PlaybackCursor) {
        if self.paused {
            self.timer.restart_paused();
        } else {
            self.timer.restart(self.clock.now());
        }
        self.media_failed = false;
        self.gesture.reset();

        if let Some(story) = self.sequencer.current_story() {
            // Audio errors are already logged by the slot and never block playback.
            if self.audio.switch_to(story).is_ok() && self.paused {
                self.audio.pause();
            }
            debug!(%cursor, story = %story.id().short_id(), "Showing story");
        }
    }

    fn shut_down(&mut self) {
        self.timer.cancel();
        self.audio.release();
        self.gesture.reset();
        self.paused = false;
        self.media_failed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_audio::MockAudioBackend;
    use crate::sequencer::CloseReason;
    use chrono::Utc;
    use std::time::Duration;
    use storyline_core::{AuthorProfile, ManualClock, Story, StoryRecord};

    struct Fixture {
        player: StoryPlayer,
        clock: ManualClock,
        audio: MockAudioBackend,
    }

    /// One author per entry; every story carries audio
    fn fixture(sizes: &[usize]) -> (Fixture, StoryGroups) {
        let clock = ManualClock::starting_at(Utc::now());
        let audio = MockAudioBackend::new();
        let now = clock.now_utc();

        let mut records = Vec::new();
        for (g, &size) in sizes.iter().enumerate() {
            let author = UserId::generate();
            for s in 0..size {
                let story = Story::new(
                    StoryId::generate(),
                    author,
                    format!("https://cdn/{}-{}.jpg", g, s),
                    Some(format!("https://cdn/{}-{}.mp3", g, s)),
                    now - chrono::Duration::minutes((size - s) as i64),
                )
                .unwrap();
                records.push(StoryRecord::new(story, AuthorProfile::new(format!("author{}", g), None)));
            }
        }
        let groups = StoryGroups::from_records(records, now).into_playback_order();

        let player = StoryPlayer::new(
            Arc::new(audio.clone()),
            Arc::new(clock.clone()),
            PlaybackConfig::default(),
        );
        (Fixture { player, clock, audio }, groups)
    }

    #[test]
    fn test_timer_advances_through_everything() {
        let (mut f, groups) = fixture(&[2, 1]);
        f.player.open(groups, 0).unwrap();

        f.clock.advance(Duration::from_millis(4999));
        assert_eq!(f.player.tick(), Transition::Unchanged);

        f.clock.advance(Duration::from_millis(1));
        assert!(matches!(f.player.tick(), Transition::Moved { .. }));
        assert_eq!(f.player.cursor(), Some(PlaybackCursor::new(0, 1)));

        f.clock.advance(Duration::from_secs(5));
        f.player.tick();
        f.clock.advance(Duration::from_secs(5));
        assert_eq!(f.player.tick(), Transition::Closed(CloseReason::Exhausted));
        assert_eq!(f.audio.active(), 0);
        assert_eq!(f.audio.max_active(), 1);
    }

    #[test]
    fn test_cursor_change_resets_progress_and_timer() {
        let (mut f, groups) = fixture(&[3]);
        f.player.open(groups, 0).unwrap();
        f.clock.advance(Duration::from_millis(4000));
        assert!(f.player.progress().segments()[0] > 0.79);

        let stale = f.player.timer_token().unwrap();
        f.player.advance();
        assert_eq!(f.player.progress().segments(), &[1.0, 0.0, 0.0]);

        // The old deadline passes but the new story only started 1.5s ago.
        f.clock.advance(Duration::from_millis(1500));
        assert_eq!(f.player.expire(stale), Transition::Unchanged);
        assert_eq!(f.player.tick(), Transition::Unchanged);
        assert_eq!(f.player.cursor(), Some(PlaybackCursor::new(0, 1)));
    }

    #[test]
    fn test_tap_left_from_second_group_lands_on_last_story() {
        let (mut f, groups) = fixture(&[3, 1]);
        f.player.open(groups, 1).unwrap();
        let t = f.player.tap(39.0, 390.0);
        assert_eq!(
            t,
            Transition::Moved {
                from: PlaybackCursor::new(1, 0),
                to: PlaybackCursor::new(0, 2),
            }
        );
        assert_eq!(f.player.tap(195.0, 390.0), Transition::Unchanged);
    }

    #[test]
    fn test_dismiss_releases_audio() {
        let (mut f, groups) = fixture(&[2]);
        f.player.open(groups, 0).unwrap();
        f.player.advance();
        assert_eq!(f.audio.active(), 1);

        assert_eq!(f.player.dismiss(), Transition::Closed(CloseReason::Dismissed));
        assert_eq!(f.audio.active(), 0);
        assert_eq!(f.player.timer_deadline(), None);
        assert_eq!(f.player.snapshot(), PlayerSnapshot::closed());
    }

    #[test]
    fn test_drag_release_past_threshold_dismisses() {
        let (mut f, groups) = fixture(&[1]);
        f.player.open(groups, 0).unwrap();
        assert_eq!(f.player.drag_move(60.0), 60.0);
        assert_eq!(f.player.snapshot().drag_offset, 60.0);
        assert_eq!(f.player.drag_end(60.0), Transition::Unchanged);
        assert!(f.player.is_playing());
        assert_eq!(f.player.drag_end(140.0), Transition::Closed(CloseReason::Dismissed));
    }

    #[test]
    fn test_pause_holds_progress_across_cursor_change() {
        let (mut f, groups) = fixture(&[2]);
        f.player.open(groups, 0).unwrap();
        f.clock.advance(Duration::from_secs(2));
        assert!(f.player.pause());
        assert!(!f.player.pause());
        assert_eq!(f.audio.paused(), 1);

        f.clock.advance(Duration::from_secs(30));
        assert_eq!(f.player.tick(), Transition::Unchanged);
        assert!((f.player.progress().segments()[0] - 0.4).abs() < 1e-3);

        f.player.advance();
        assert!(f.player.is_paused());
        assert_eq!(f.player.progress().segments(), &[1.0, 0.0]);
        // The next story's soundtrack starts out paused too.
        assert_eq!(f.audio.active(), 1);
        assert_eq!(f.audio.paused(), 1);

        assert!(f.player.resume());
        assert_eq!(f.audio.paused(), 0);
        f.clock.advance(Duration::from_secs(5));
        assert_eq!(f.player.tick(), Transition::Closed(CloseReason::Exhausted));
    }

    #[test]
    fn test_audio_failure_is_not_fatal() {
        let (mut f, groups) = fixture(&[2]);
        f.audio.fail_url("https://cdn/0-0.mp3");
        f.player.open(groups, 0).unwrap();
        assert!(f.player.is_playing());
        assert!(!f.player.snapshot().audio_active);

        f.player.advance();
        assert!(f.player.snapshot().audio_active);
    }

    #[test]
    fn test_media_failure_does_not_block_timer() {
        let (mut f, groups) = fixture(&[2]);
        f.player.open(groups, 0).unwrap();
        let story_id = f.player.snapshot().story_id.unwrap();

        assert!(!f.player.report_media_failure(StoryId::generate(), "404"));
        assert!(f.player.report_media_failure(story_id, "404"));
        assert!(f.player.snapshot().media_failed);

        f.clock.advance(Duration::from_secs(5));
        assert!(matches!(f.player.tick(), Transition::Moved { .. }));
        assert!(!f.player.snapshot().media_failed);
    }

    #[test]
    fn test_failed_open_closes_previous_session() {
        let (mut f, groups) = fixture(&[1]);
        f.player.open(groups, 0).unwrap();
        assert_eq!(f.audio.active(), 1);

        let result = f.player.open(StoryGroups::default(), 0);
        assert!(matches!(result, Err(PlaybackError::EmptyGroups)));
        assert_eq!(f.player.state(), PlaybackState::Closed);
        assert_eq!(f.audio.active(), 0);
    }

    #[test]
    fn test_snapshot_describes_story() {
        let (mut f, groups) = fixture(&[2]);
        f.player.open(groups, 0).unwrap();
        let snap = f.player.snapshot();
        assert_eq!(snap.author_name.as_deref(), Some("author0"));
        assert_eq!(snap.media_url.as_deref(), Some("https://cdn/0-0.jpg"));
        assert_eq!(snap.media_kind, Some(MediaKind::Image));
        assert_eq!(snap.age_label.as_deref(), Some("2m"));
        assert!(snap.audio_active);
        assert_eq!(snap.progress.len(), 2);
    }
}
