//! Async viewer session
//!
//! [`ViewerSession`] owns a [`StoryPlayer`] inside a spawned tokio task.
//! The task wakes on three things: a command from the host, the current
//! story's deadline, and a frame tick that republishes progress and checks
//! the timer against the player's clock. The frame check is what moves a
//! session running on a [`storyline_core::ManualClock`].
//! After every wake-up it publishes a fresh [`PlayerSnapshot`] on a watch
//! channel and announces cursor changes on a broadcast channel.
//!
//! The deadline future is rebuilt on every loop iteration from the player's
//! timer together with its [`crate::TimerToken`], so a deadline computed
//! before a cursor change can never advance the story that replaced it.
//!
//! Dropping the session handle closes the command channel, which the task
//! treats as a dismiss: the timer is cancelled and audio released.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use storyline_core::{Clock, StoryGroups, StoryId, SystemClock};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::audio::AudioBackend;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, PlaybackResult};
use crate::player::{PlayerSnapshot, StoryPlayer};
use crate::sequencer::{CloseReason, PlaybackCursor, Transition};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 64;

/// Input from the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViewerCommand {
    Advance,
    Retreat,
    Dismiss,
    Tap { x: f32, width: f32 },
    DragMove { dy: f32 },
    DragEnd { dy: f32 },
    Pause,
    Resume,
    MediaFailed { story_id: StoryId, reason: String },
}

/// Lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerEvent {
    Opened(PlaybackCursor),
    StoryChanged {
        from: PlaybackCursor,
        to: PlaybackCursor,
    },
    Closed(CloseReason),
}

/// Handle to a running viewer
pub struct ViewerSession {
    id: Uuid,
    commands: mpsc::Sender<ViewerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<ViewerEvent>,
    task: JoinHandle<CloseReason>,
}

impl ViewerSession {
    /// Open the viewer at `start_group` and start playing
    ///
    /// Fails without spawning anything when `groups` is empty or the start
    /// is out of range. Must be called from within a tokio runtime.
    pub fn open(
        groups: StoryGroups,
        start_group: usize,
        audio: Arc<dyn AudioBackend>,
        config: PlaybackConfig,
    ) -> PlaybackResult<Self> {
        Self::open_with_clock(groups, start_group, audio, Arc::new(SystemClock), config)
    }

    /// Like [`ViewerSession::open`], timing stories with `clock`
    pub fn open_with_clock(
        groups: StoryGroups,
        start_group: usize,
        audio: Arc<dyn AudioBackend>,
        clock: Arc<dyn Clock>,
        config: PlaybackConfig,
    ) -> PlaybackResult<Self> {
        let id = Uuid::new_v4();
        let frame_interval = config.frame_interval.max(Duration::from_millis(1));

        let mut player = StoryPlayer::new(audio, clock, config);
        let opened = player.open(groups, start_group)?;

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshots_tx, snapshots_rx) = watch::channel(player.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        if let Transition::Opened(cursor) = opened {
            let _ = events_tx.send(ViewerEvent::Opened(cursor));
        }

        let span = info_span!("viewer_session", session_id = %id);
        let task = tokio::spawn(
            run(player, commands_rx, snapshots_tx, events_tx.clone(), frame_interval).instrument(span),
        );

        info!(session_id = %id, start_group, "Viewer session opened");

        Ok(Self {
            id,
            commands: commands_tx,
            snapshots: snapshots_rx,
            events: events_tx,
            task,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a command for the session task
    pub async fn send(&self, command: ViewerCommand) -> PlaybackResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn advance(&self) -> PlaybackResult<()> {
        self.send(ViewerCommand::Advance).await
    }

    pub async fn retreat(&self) -> PlaybackResult<()> {
        self.send(ViewerCommand::Retreat).await
    }

    pub async fn dismiss(&self) -> PlaybackResult<()> {
        self.send(ViewerCommand::Dismiss).await
    }

    pub async fn tap(&self, x: f32, width: f32) -> PlaybackResult<()> {
        self.send(ViewerCommand::Tap { x, width }).await
    }

    pub async fn drag_move(&self, dy: f32) -> PlaybackResult<()> {
        self.send(ViewerCommand::DragMove { dy }).await
    }

    pub async fn drag_end(&self, dy: f32) -> PlaybackResult<()> {
        self.send(ViewerCommand::DragEnd { dy }).await
    }

    pub async fn pause(&self) -> PlaybackResult<()> {
        self.send(ViewerCommand::Pause).await
    }

    pub async fn resume(&self) -> PlaybackResult<()> {
        self.send(ViewerCommand::Resume).await
    }

    pub async fn media_failed(&self, story_id: StoryId, reason: impl Into<String>) -> PlaybackResult<()> {
        self.send(ViewerCommand::MediaFailed {
            story_id,
            reason: reason.into(),
        })
        .await
    }

    /// Latest published frame
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch every published frame
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    /// Receive lifecycle events from now on
    pub fn events(&self) -> broadcast::Receiver<ViewerEvent> {
        self.events.subscribe()
    }

    /// Whether the session task has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Wait for the viewer to close and say why
    pub async fn closed(self) -> CloseReason {
        let Self { commands, task, id, .. } = self;
        let reason = match task.await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(session_id = %id, error = %e, "Viewer session task failed");
                CloseReason::Dismissed
            }
        };
        drop(commands);
        reason
    }
}

impl std::fmt::Debug for ViewerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerSession")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

async fn run(
    mut player: StoryPlayer,
    mut commands: mpsc::Receiver<ViewerCommand>,
    snapshots: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<ViewerEvent>,
    frame_interval: Duration,
) -> CloseReason {
    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        let wake = player.timer_deadline().zip(player.timer_token());
        let deadline = async {
            match wake {
                Some((at, _)) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                None => std::future::pending().await,
            }
        };

        let transition = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => handle(&mut player, command),
                None => {
                    debug!("Command channel dropped, dismissing");
                    player.dismiss()
                }
            },
            _ = deadline => match wake {
                Some((_, token)) => player.expire(token),
                None => Transition::Unchanged,
            },
            _ = frames.tick() => player.tick(),
        };

        snapshots.send_replace(player.snapshot());

        match transition {
            Transition::Moved { from, to } => {
                let _ = events.send(ViewerEvent::StoryChanged { from, to });
            }
            Transition::Opened(cursor) => {
                let _ = events.send(ViewerEvent::Opened(cursor));
            }
            Transition::Closed(reason) => {
                let _ = events.send(ViewerEvent::Closed(reason));
                info!(?reason, "Viewer session finished");
                return reason;
            }
            Transition::Unchanged => {}
        }
    }
}

fn handle(player: &mut StoryPlayer, command: ViewerCommand) -> Transition {
    match command {
        ViewerCommand::Advance => player.advance(),
        ViewerCommand::Retreat => player.retreat(),
        ViewerCommand::Dismiss => player.dismiss(),
        ViewerCommand::Tap { x, width } => player.tap(x, width),
        ViewerCommand::DragMove { dy } => {
            player.drag_move(dy);
            Transition::Unchanged
        }
        ViewerCommand::DragEnd { dy } => player.drag_end(dy),
        ViewerCommand::Pause => {
            player.pause();
            Transition::Unchanged
        }
        ViewerCommand::Resume => {
            player.resume();
            Transition::Unchanged
        }
        ViewerCommand::MediaFailed { story_id, reason } => {
            player.report_media_failure(story_id, reason);
            Transition::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_audio::MockAudioBackend;

    #[tokio::test]
    async fn test_open_empty_does_not_spawn() {
        let result = ViewerSession::open(
            StoryGroups::default(),
            0,
            Arc::new(MockAudioBackend::new()),
            PlaybackConfig::default(),
        );
        assert!(matches!(result, Err(PlaybackError::EmptyGroups)));
    }

    #[test]
    fn test_command_serde() {
        let json = serde_json::to_string(&ViewerCommand::Tap { x: 1.0, width: 3.0 }).unwrap();
        let back: ViewerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ViewerCommand::Tap { x: 1.0, width: 3.0 });
    }
}
