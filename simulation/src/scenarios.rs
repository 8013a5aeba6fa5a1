//! Pre-defined playback scenarios
//!
//! Includes the canonical two-author walk-through and a randomized chaos
//! run that checks the viewer's invariants after every input.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail, ensure};
use chrono::Utc;
use rand::Rng;
use storyline_core::{AuthorProfile, Clock, ManualClock, Story, StoryGroups, StoryId, StoryRecord, TraySelection, UserId};
use storyline_logging::ViewerContextGuard;
use storyline_playback::{
    CloseReason, MockAudioBackend, PlaybackConfig, PlaybackCursor, StoryPlayer, Transition, ViewerEvent,
    ViewerSession,
};
use storyline_store::{CreateStoryError, MediaUpload, MemoryPlatform, StoryDataService, StoryDraft};
use tracing::info;

use crate::config::SimulationConfig;
use crate::world::World;

/// What the reference walk-through observed
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceReport {
    /// Cursors visited by auto-advance, in order
    pub visited: Vec<PlaybackCursor>,
    pub close_reason: Option<CloseReason>,
    /// Live audio clips right after dismissing mid-group
    pub audio_after_dismiss: usize,
    /// Where a left-zone tap from the second author landed
    pub tap_landing: Option<PlaybackCursor>,
}

/// Two authors, `A:[s1, s2]` and `B:[s3]`, with a soundtrack on `s2`
pub fn reference_groups() -> anyhow::Result<StoryGroups> {
    let now = Utc::now();
    let a = UserId::generate();
    let b = UserId::generate();
    let post = |author: UserId, name: &str, minutes_ago: i64, audio: Option<&str>| -> anyhow::Result<StoryRecord> {
        let story = Story::new(
            StoryId::generate(),
            author,
            format!("https://cdn.local/{}.jpg", name),
            audio.map(str::to_string),
            now - chrono::Duration::minutes(minutes_ago),
        )?;
        Ok(StoryRecord::new(story, AuthorProfile::new(name, None)))
    };

    // Newest first, as the data service returns them.
    let records = vec![
        post(a, "A", 5, Some("https://cdn.local/s2.mp3"))?,
        post(b, "B", 10, None)?,
        post(a, "A", 20, None)?,
    ];
    Ok(StoryGroups::from_records(records, now).into_playback_order())
}

/// Run the canonical scenario:
///
/// ```text
/// open(0)               -> (0, 0)
/// 5s pass               -> (0, 1)   s2's soundtrack starts
/// 5s pass               -> (1, 0)   soundtrack released
/// 5s pass               -> Closed(Exhausted)
///
/// open(0), advance      -> (0, 1)
/// dismiss               -> Closed(Dismissed), audio released
///
/// open(1), tap 0.1 W    -> (0, 1)   last story of the previous author
/// ```
pub fn run_reference_scenario(viewport_width: f32) -> anyhow::Result<ReferenceReport> {
    info!("=== Running reference scenario ===");
    let clock = ManualClock::new();
    let audio = MockAudioBackend::new();
    let config = PlaybackConfig::default();
    let step = config.story_duration;
    let mut player = StoryPlayer::new(Arc::new(audio.clone()), Arc::new(clock.clone()), config);

    println!("\n--- Auto-advance through every story ---");
    let mut visited = Vec::new();
    let mut close_reason = None;
    player.open(reference_groups()?, 0)?;
    visited.extend(player.cursor());
    println!("  {}", describe(&player));
    for _ in 0..10 {
        clock.advance(step);
        match player.tick() {
            Transition::Moved { to, .. } => {
                visited.push(to);
                println!("  {}", describe(&player));
            }
            Transition::Closed(reason) => {
                close_reason = Some(reason);
                println!("  closed: {:?}", reason);
                break;
            }
            Transition::Opened(_) | Transition::Unchanged => {}
        }
    }
    ensure!(audio.active() == 0, "audio still live after the viewer closed");

    println!("\n--- Dismiss while the soundtrack plays ---");
    player.open(reference_groups()?, 0)?;
    player.advance();
    println!("  {}", describe(&player));
    player.dismiss();
    let audio_after_dismiss = audio.active();
    println!("  dismissed, live audio clips: {}", audio_after_dismiss);

    println!("\n--- Tap the left zone from the second author ---");
    player.open(reference_groups()?, 1)?;
    println!("  {}", describe(&player));
    player.tap(viewport_width * 0.1, viewport_width);
    let tap_landing = player.cursor();
    println!("  {}", describe(&player));
    player.dismiss();

    println!("\n=== Audio ===");
    println!("  clips started: {}", audio.started().len());
    println!("  most clips live at once: {}", audio.max_active());

    Ok(ReferenceReport {
        visited,
        close_reason,
        audio_after_dismiss,
        tap_landing,
    })
}

/// Outcome of the story creation walk-through
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostReport {
    pub rejected_anonymous: bool,
    pub rejected_empty: bool,
    pub upload_failure_retryable: bool,
    /// Objects left behind by a failed insert
    pub orphaned_objects: usize,
    pub published: usize,
}

/// Exercise every creation outcome against a fresh platform
pub async fn run_post_scenario(config: &SimulationConfig) -> anyhow::Result<PostReport> {
    info!("=== Running post scenario ===");
    let clock = ManualClock::new();
    let platform = MemoryPlatform::with_clock(Arc::new(clock.clone()), config.platform.clone());
    let service = platform.service();
    let author = platform.register_user("ada", None);
    let draft = || {
        StoryDraft::new(MediaUpload::new("beach.JPG", b"jpeg bytes".to_vec()))
            .with_audio(MediaUpload::new("waves.mp3", b"mp3 bytes".to_vec()))
    };
    let mut report = PostReport::default();

    println!("\n--- Post while signed out ---");
    let err = expect_failure(service.create_story(draft()).await)?;
    report.rejected_anonymous = matches!(err, CreateStoryError::NotAuthenticated);
    println!("  {} ({})", err.user_message(), err);

    platform.sign_in(author);

    println!("\n--- Post without media ---");
    let err = expect_failure(
        service
            .create_story(StoryDraft::new(MediaUpload::new("empty.jpg", Vec::new())))
            .await,
    )?;
    report.rejected_empty = matches!(err, CreateStoryError::MissingMedia);
    println!("  {} ({})", err.user_message(), err);

    println!("\n--- Storage is down ---");
    platform.objects().set_fail_uploads(true);
    let err = expect_failure(service.create_story(draft()).await)?;
    report.upload_failure_retryable = err.is_retryable();
    println!("  {} ({}), retryable: {}", err.user_message(), err, err.is_retryable());
    platform.objects().set_fail_uploads(false);

    println!("\n--- Database rejects the row ---");
    platform.table().set_fail_inserts(true);
    let err = expect_failure(service.create_story(draft()).await)?;
    report.orphaned_objects = platform.objects().len();
    println!(
        "  {} ({}), orphaned objects: {}, stories: {}",
        err.user_message(),
        err,
        report.orphaned_objects,
        platform.table().story_count()
    );
    platform.table().set_fail_inserts(false);

    println!("\n--- Retry ---");
    clock.advance(Duration::from_millis(1));
    let story = service.create_story(draft()).await?;
    report.published = service.fetch_active_stories().await?.len();
    println!(
        "  published {} ({}) audio: {}",
        story.id().short_id(),
        story.media_kind(),
        story.audio_url().unwrap_or("-")
    );
    println!("  expires at {}", story.expires_at());

    Ok(report)
}

fn expect_failure<T>(result: Result<T, CreateStoryError>) -> anyhow::Result<CreateStoryError> {
    match result {
        Ok(_) => bail!("story creation unexpectedly succeeded"),
        Err(e) => Ok(e),
    }
}

/// Print the tray for the seeded world
pub async fn run_tray(world: &World) -> anyhow::Result<()> {
    let feed = world.feed().await?;
    let tray = feed.tray(Some(&world.tray_viewer()));
    let now = world.clock.now_utc();

    println!("\n=== Story tray ({} active stories) ===", feed.groups().total_stories());
    for (position, entry) in tray.entries().iter().enumerate() {
        let avatar = match (&entry.avatar_url, entry.placeholder_initial) {
            (Some(_), _) => "avatar".to_string(),
            (None, Some(initial)) => format!("[{}]", initial),
            (None, None) => "[?]".to_string(),
        };
        let detail = match entry.selection {
            TraySelection::CreateStory => "create".to_string(),
            TraySelection::OpenViewer { group_index } => {
                let group = &feed.groups()[group_index];
                format!(
                    "{} stories, latest {}",
                    group.len(),
                    storyline_core::age_label(group.latest_created_at(), now)
                )
            }
        };
        let ring = if entry.has_new_story { "*" } else { " " };
        println!("  {}{} {:<10} {:<8} {}", position, ring, entry.label, avatar, detail);
    }
    Ok(())
}

/// Play the seeded feed in a live viewer session until it closes
///
/// With `dismiss_after`, the viewer is swiped away once that many stories
/// have been shown.
pub async fn run_playback(
    world: &World,
    config: &PlaybackConfig,
    start_group: usize,
    dismiss_after: Option<usize>,
) -> anyhow::Result<CloseReason> {
    let feed = world.feed().await?;
    let groups = feed.into_groups();
    ensure!(!groups.is_empty(), "no active stories to play");

    let audio = MockAudioBackend::new();
    let session = {
        let _ctx = ViewerContextGuard::new(Some(world.viewer));
        ViewerSession::open(groups.clone(), start_group, Arc::new(audio.clone()), config.clone())
            .context("opening viewer")?
    };
    let mut events = session.events();
    let mut frames = tokio::time::interval(Duration::from_millis(250));
    let mut shown = 1;

    println!("\n=== Playing {} stories from group {} ===", groups.total_stories(), start_group);
    print_frame(&session);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ViewerEvent::StoryChanged { to, .. }) => {
                    shown += 1;
                    println!("  -> {}", to);
                    if dismiss_after.is_some_and(|n| shown > n) {
                        session.drag_end(config.dismiss_threshold + 1.0).await?;
                    }
                }
                Ok(ViewerEvent::Closed(reason)) => {
                    println!("  closed: {:?}", reason);
                    break;
                }
                Ok(ViewerEvent::Opened(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = frames.tick() => print_frame(&session),
        }
    }

    let reason = session.closed().await;
    ensure!(audio.max_active() <= 1, "more than one soundtrack played at once");
    println!("  soundtracks started: {}", audio.started().len());
    Ok(reason)
}

fn print_frame(session: &ViewerSession) {
    let snap = session.snapshot();
    if let Some(cursor) = snap.cursor() {
        println!(
            "  {} {} {:<8} {:>4} {}{}",
            cursor,
            snap.progress.render(6),
            snap.author_name.as_deref().unwrap_or("?"),
            snap.age_label.as_deref().unwrap_or(""),
            if snap.audio_active { "♪" } else { " " },
            if snap.paused { " (paused)" } else { "" },
        );
    }
}

fn describe(player: &StoryPlayer) -> String {
    let snap = player.snapshot();
    match snap.cursor() {
        Some(cursor) => format!(
            "{} {} {} audio: {}",
            cursor,
            snap.author_name.as_deref().unwrap_or("?"),
            snap.progress.render(4),
            if snap.audio_active { "on" } else { "off" }
        ),
        None => "closed".to_string(),
    }
}

/// Counters from a chaos run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChaosReport {
    pub steps: usize,
    pub sessions: usize,
    pub cursor_changes: usize,
    pub exhausted: usize,
    pub dismissed: usize,
    pub media_failures: usize,
    pub max_live_audio: usize,
}

/// Random taps, drags, pauses and clock jumps against one player
///
/// After every input the run checks that the cursor is valid, that a new
/// story starts at zero progress, and that no more than one soundtrack is
/// live. Any violation ends the run with an error.
pub async fn run_chaos<R: Rng>(
    world: &World,
    config: &SimulationConfig,
    rng: &mut R,
) -> anyhow::Result<ChaosReport> {
    info!(steps = config.chaos.steps, "=== Running chaos scenario ===");
    let groups = world.feed().await?.into_groups();
    ensure!(!groups.is_empty(), "no active stories to play");

    let audio = MockAudioBackend::new();
    for story in groups.iter().flat_map(|g| g.stories()) {
        let Some(url) = story.audio_url() else {
            continue;
        };
        if rng.random_bool(config.chaos.audio_failure_probability.clamp(0.0, 1.0)) {
            audio.fail_url(url);
        }
    }

    let clock = world.clock.clone();
    let width = config.world.viewport_width.max(1.0);
    let mut player = StoryPlayer::new(Arc::new(audio.clone()), Arc::new(clock.clone()), config.playback.clone());
    let mut report = ChaosReport::default();

    for step in 0..config.chaos.steps {
        if !player.is_playing() {
            let start = rng.random_range(0..groups.len());
            player.open(groups.clone(), start)?;
            report.sessions += 1;
        }

        let transition = match rng.random_range(0..100) {
            0..35 => {
                clock.advance(Duration::from_millis(rng.random_range(0..=config.chaos.max_gap_ms)));
                player.tick()
            }
            35..55 => player.tap(rng.random_range(0.0..width), width),
            55..62 => {
                let dy = rng.random_range(-50.0..200.0);
                player.drag_move(dy * 0.5);
                player.drag_move(dy);
                player.drag_end(dy)
            }
            62..70 => {
                if player.is_paused() {
                    player.resume();
                } else {
                    player.pause();
                }
                Transition::Unchanged
            }
            70..75 => {
                let reported = player
                    .snapshot()
                    .story_id
                    .is_some_and(|id| player.report_media_failure(id, "simulated decode error"));
                if reported {
                    report.media_failures += 1;
                }
                Transition::Unchanged
            }
            75..85 => player.advance(),
            85..95 => player.retreat(),
            _ => player.dismiss(),
        };

        match transition {
            Transition::Moved { to, .. } => {
                report.cursor_changes += 1;
                let fill = player.progress().current(to.story_index);
                ensure!(fill == Some(0.0), "step {}: progress {:?} after moving to {}", step, fill, to);
            }
            Transition::Closed(CloseReason::Exhausted) => report.exhausted += 1,
            Transition::Closed(CloseReason::Dismissed) => report.dismissed += 1,
            Transition::Opened(_) | Transition::Unchanged => {}
        }

        if let Some(cursor) = player.cursor() {
            let group = player
                .groups()
                .get(cursor.group_index)
                .with_context(|| format!("step {}: cursor {} outside the groups", step, cursor))?;
            ensure!(cursor.story_index < group.len(), "step {}: cursor {} past group end", step, cursor);
            ensure!(player.progress().len() == group.len(), "step {}: wrong segment count", step);
        }
        ensure!(audio.active() <= 1, "step {}: {} soundtracks live", step, audio.active());
        report.steps += 1;
    }

    player.dismiss();
    ensure!(audio.active() == 0, "soundtrack left playing after the run");
    report.max_live_audio = audio.max_active();

    println!("\n=== Chaos results ===");
    println!("  steps: {}", report.steps);
    println!("  sessions opened: {}", report.sessions);
    println!("  cursor changes: {}", report.cursor_changes);
    println!("  ran out: {}, dismissed: {}", report.exhausted, report.dismissed);
    println!("  media failures reported: {}", report.media_failures);
    println!("  most soundtracks live at once: {}", report.max_live_audio);

    Ok(report)
}
