//! End-to-end viewer behaviour: the synchronous player and the tokio
//! session, both mostly under a manual clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use storyline_core::{AuthorProfile, ManualClock, Story, StoryGroups, StoryId, StoryRecord, UserId};
use storyline_playback::{
    CloseReason, MockAudioBackend, PlaybackConfig, PlaybackCursor, PlaybackState, StoryPlayer, Transition,
    ViewerEvent, ViewerSession,
};
use tokio::time::timeout;

/// Newest-first feed for authors with the given story counts, every story
/// with a soundtrack, already in playback order
fn feed(sizes: &[usize]) -> StoryGroups {
    let now = Utc::now();
    let mut records = Vec::new();
    let mut age = 0;
    for (g, &size) in sizes.iter().enumerate() {
        let author = UserId::generate();
        for s in 0..size {
            age += 1;
            let story = Story::new(
                StoryId::generate(),
                author,
                format!("https://cdn/{}-{}.jpg", g, s),
                Some(format!("https://cdn/{}-{}.mp3", g, s)),
                now - chrono::Duration::minutes(age),
            )
            .unwrap();
            records.push(StoryRecord::new(story, AuthorProfile::new(format!("author{}", g), None)));
        }
    }
    StoryGroups::from_records(records, now).into_playback_order()
}

fn fast_config() -> PlaybackConfig {
    PlaybackConfig::default()
        .with_story_duration(Duration::from_millis(40))
        .with_frame_interval(Duration::from_millis(5))
}

#[test]
fn test_audio_never_overlaps_under_rapid_input() {
    let clock = ManualClock::new();
    let audio = MockAudioBackend::new();
    let mut player = StoryPlayer::new(Arc::new(audio.clone()), Arc::new(clock.clone()), PlaybackConfig::default());
    player.open(feed(&[3, 2, 4]), 0).unwrap();

    for i in 0..40 {
        let transition = if i % 3 == 0 { player.retreat() } else { player.advance() };
        assert!(audio.active() <= 1);
        if transition.is_closed() {
            break;
        }
        clock.advance(Duration::from_millis(10));
        player.tick();
    }

    assert_eq!(audio.max_active(), 1);
}

#[test]
fn test_every_cursor_change_restarts_progress() {
    let clock = ManualClock::new();
    let mut player = StoryPlayer::new(
        Arc::new(MockAudioBackend::new()),
        Arc::new(clock.clone()),
        PlaybackConfig::default(),
    );
    player.open(feed(&[2, 2]), 0).unwrap();

    let mut changes = 0;
    loop {
        clock.advance(Duration::from_secs(3));
        let t = if changes % 2 == 0 { player.advance() } else { player.tap(350.0, 390.0) };
        match t {
            Transition::Moved { to, .. } => {
                changes += 1;
                assert_eq!(player.progress().current(to.story_index), Some(0.0));
                // A fresh five seconds: three more seconds must not advance.
                clock.advance(Duration::from_secs(3));
                assert_eq!(player.tick(), Transition::Unchanged);
            }
            Transition::Closed(reason) => {
                assert_eq!(reason, CloseReason::Exhausted);
                break;
            }
            other => panic!("unexpected transition {:?}", other),
        }
    }
    assert_eq!(changes, 3);
}

#[test]
fn test_dismiss_mid_group_releases_audio() {
    let audio = MockAudioBackend::new();
    let mut player = StoryPlayer::new(
        Arc::new(audio.clone()),
        Arc::new(ManualClock::new()),
        PlaybackConfig::default(),
    );
    player.open(feed(&[2, 1]), 0).unwrap();
    player.advance();
    assert_eq!(player.cursor(), Some(PlaybackCursor::new(0, 1)));

    assert_eq!(player.dismiss(), Transition::Closed(CloseReason::Dismissed));
    assert_eq!(player.state(), PlaybackState::Closed);
    assert_eq!(audio.active(), 0);
}

#[tokio::test]
async fn test_session_plays_to_exhaustion() {
    let audio = MockAudioBackend::new();
    let session = ViewerSession::open(feed(&[2, 1]), 0, Arc::new(audio.clone()), fast_config()).unwrap();
    assert_eq!(session.snapshot().cursor(), Some(PlaybackCursor::new(0, 0)));

    let reason = timeout(Duration::from_secs(5), session.closed())
        .await
        .expect("session should close on its own");
    assert_eq!(reason, CloseReason::Exhausted);
    assert_eq!(audio.active(), 0);
    assert_eq!(audio.started().len(), 3);
}

#[tokio::test]
async fn test_session_reports_story_changes() {
    let config = PlaybackConfig::default().with_frame_interval(Duration::from_millis(5));
    let session = ViewerSession::open(feed(&[1, 1]), 0, Arc::new(MockAudioBackend::new()), config).unwrap();
    let mut events = session.events();

    session.tap(380.0, 390.0).await.unwrap();
    let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        ViewerEvent::StoryChanged {
            from: PlaybackCursor::new(0, 0),
            to: PlaybackCursor::new(1, 0),
        }
    );

    session.drag_end(150.0).await.unwrap();
    let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(event, ViewerEvent::Closed(CloseReason::Dismissed));
    assert_eq!(session.closed().await, CloseReason::Dismissed);
}

fn manual_session(sizes: &[usize], clock: &ManualClock) -> ViewerSession {
    let config = PlaybackConfig::default().with_frame_interval(Duration::from_millis(2));
    ViewerSession::open_with_clock(
        feed(sizes),
        0,
        Arc::new(MockAudioBackend::new()),
        Arc::new(clock.clone()),
        config,
    )
    .unwrap()
}

#[tokio::test]
async fn test_session_follows_manual_clock() {
    let clock = ManualClock::new();
    let session = manual_session(&[2], &clock);
    let mut events = session.events();

    clock.advance(Duration::from_secs(3));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.snapshot().cursor(), Some(PlaybackCursor::new(0, 0)));

    clock.advance(Duration::from_secs(2));
    let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        ViewerEvent::StoryChanged {
            from: PlaybackCursor::new(0, 0),
            to: PlaybackCursor::new(0, 1),
        }
    );

    clock.advance(Duration::from_secs(5));
    let reason = timeout(Duration::from_secs(2), session.closed()).await.unwrap();
    assert_eq!(reason, CloseReason::Exhausted);
}

#[tokio::test]
async fn test_paused_session_does_not_advance() {
    let clock = ManualClock::new();
    let session = manual_session(&[2], &clock);
    session.pause().await.unwrap();

    let mut snapshots = session.subscribe();
    timeout(Duration::from_secs(2), snapshots.wait_for(|s| s.paused))
        .await
        .unwrap()
        .unwrap();

    clock.advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.snapshot().cursor(), Some(PlaybackCursor::new(0, 0)));

    session.resume().await.unwrap();
    timeout(Duration::from_secs(2), snapshots.wait_for(|s| !s.paused))
        .await
        .unwrap()
        .unwrap();
    clock.advance(Duration::from_secs(5));
    timeout(Duration::from_secs(2), snapshots.wait_for(|s| s.cursor() == Some(PlaybackCursor::new(0, 1))))
        .await
        .unwrap()
        .unwrap();
    clock.advance(Duration::from_secs(5));
    let reason = timeout(Duration::from_secs(2), session.closed()).await.unwrap();
    assert_eq!(reason, CloseReason::Exhausted);
}

#[tokio::test]
async fn test_dropping_session_releases_audio() {
    let audio = MockAudioBackend::new();
    let session = ViewerSession::open(feed(&[3]), 0, Arc::new(audio.clone()), PlaybackConfig::default()).unwrap();
    assert_eq!(audio.active(), 1);
    drop(session);

    timeout(Duration::from_secs(2), async {
        while audio.active() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("audio should be released after the handle is dropped");
}

#[tokio::test]
async fn test_commands_after_close_fail() {
    let session = ViewerSession::open(feed(&[1]), 0, Arc::new(MockAudioBackend::new()), PlaybackConfig::default())
        .unwrap();
    session.dismiss().await.unwrap();

    timeout(Duration::from_secs(2), async {
        while session.advance().await.is_ok() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("commands should be rejected once the session closed");
    assert!(session.is_closed());
}
