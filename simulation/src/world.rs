//! A seeded in-memory world: authors, their posts, and a signed-in viewer
//!
//! Posts go through the real creation path (`create_story` on the
//! in-memory platform) with the clock rewound, so stories carry realistic
//! ages and a share of them has already expired by the time the viewer
//! looks.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use storyline_core::{AuthorProfile, Clock, ManualClock, StoryTray, TrayViewer, UserId};
use storyline_store::{MediaUpload, MemoryPlatform, StoryDataService, StoryDraft, StoryFeed};
use tracing::{debug, info};

use crate::config::{SimulationConfig, WorldConfig};

const AUTHOR_NAMES: &[&str] = &[
    "ada", "bea", "cy", "dee", "eli", "fay", "gus", "hal", "ivy", "jo", "kit", "lu",
];

/// Display name of the simulated viewer
pub const VIEWER_NAME: &str = "you";

/// How far back the world's history starts
const HISTORY_HOURS: i64 = 30;

/// The seeded platform and who lives on it
pub struct World {
    pub platform: MemoryPlatform,
    pub clock: ManualClock,
    pub viewer: UserId,
    pub authors: Vec<UserId>,
    /// Stories created, including ones that have since expired
    pub posted: usize,
    pub expired: usize,
}

struct PlannedPost {
    author: UserId,
    at: DateTime<Utc>,
    video: bool,
    audio: bool,
}

impl World {
    /// Seed a world per `config.world`, ending at the current wall-clock time
    pub async fn seed<R: Rng>(config: &SimulationConfig, rng: &mut R) -> anyhow::Result<Self> {
        let now = Utc::now();
        let start = now - Duration::hours(HISTORY_HOURS);
        let clock = ManualClock::starting_at(start);
        let platform = MemoryPlatform::with_clock(Arc::new(clock.clone()), config.platform.clone());

        let viewer = platform.register_user(VIEWER_NAME, None);
        let authors: Vec<UserId> = (0..config.world.authors)
            .map(|i| {
                let avatar = rng
                    .random_bool(0.5)
                    .then(|| format!("https://avatars.local/{}.png", i));
                platform.register_user(author_name(i), avatar)
            })
            .collect();

        let mut plan = plan_posts(&config.world, &authors, viewer, start, now, rng);
        plan.sort_by_key(|p| p.at);

        let service = platform.service();
        let mut expired = 0;
        let mut last_at = start;
        for (i, post) in plan.iter().enumerate() {
            // Object paths are keyed by millis; keep every post on its own.
            let at = post.at.max(last_at + Duration::milliseconds(1));
            last_at = at;
            clock.set_utc(at);
            platform.sign_in(post.author);

            let mut draft = StoryDraft::new(MediaUpload::new(
                if post.video { format!("clip{}.mp4", i) } else { format!("photo{}.jpg", i) },
                random_bytes(rng),
            ));
            if post.audio {
                draft = draft.with_audio(MediaUpload::new(format!("track{}.mp3", i), random_bytes(rng)));
            }
            let story = service.create_story(draft).await?;
            if !story.is_active(now) {
                expired += 1;
            }
            debug!(story = %story.id().short_id(), author = %post.author.short_id(), "Seeded story");
        }

        clock.set_utc(now);
        platform.sign_in(viewer);

        info!(
            authors = authors.len(),
            posted = plan.len(),
            expired,
            "World seeded"
        );

        Ok(Self {
            platform,
            clock,
            viewer,
            authors,
            posted: plan.len(),
            expired,
        })
    }

    /// The viewer as the tray sees them
    pub fn tray_viewer(&self) -> TrayViewer {
        TrayViewer {
            user_id: self.viewer,
            profile: AuthorProfile::new(VIEWER_NAME, None),
        }
    }

    /// Fetch and group the active stories, as of the world clock
    pub async fn feed(&self) -> anyhow::Result<StoryFeed> {
        let service = self.platform.service();
        Ok(StoryFeed::load_at(&service, self.clock.now_utc()).await?)
    }

    pub async fn tray(&self) -> anyhow::Result<StoryTray> {
        Ok(self.feed().await?.tray(Some(&self.tray_viewer())))
    }

    /// Number of active stories according to the data service
    pub async fn active_count(&self) -> anyhow::Result<usize> {
        Ok(self.platform.service().fetch_active_stories().await?.len())
    }
}

fn author_name(i: usize) -> String {
    let base = AUTHOR_NAMES[i % AUTHOR_NAMES.len()];
    match i / AUTHOR_NAMES.len() {
        0 => base.to_string(),
        round => format!("{}{}", base, round + 1),
    }
}

fn plan_posts<R: Rng>(
    world: &WorldConfig,
    authors: &[UserId],
    viewer: UserId,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<PlannedPost> {
    let history = (now - start).num_seconds();
    let lifetime = Duration::hours(storyline_core::STORY_LIFETIME_HOURS).num_seconds();
    // Expired posts land before the 24h window, active ones inside it.
    let expired_range = 0..(history - lifetime - 60).max(1);
    let active_range = (history - lifetime + 60)..(history - 30);

    let mut posters: Vec<(UserId, usize)> = authors
        .iter()
        .map(|&author| (author, rng.random_range(1..=world.max_stories_per_author.max(1))))
        .collect();
    if world.viewer_posts {
        posters.push((viewer, 1));
    }

    let mut plan = Vec::new();
    for (author, count) in posters {
        for _ in 0..count {
            let offset = if rng.random_bool(world.expired_probability.clamp(0.0, 1.0)) {
                rng.random_range(expired_range.clone())
            } else {
                rng.random_range(active_range.clone())
            };
            plan.push(PlannedPost {
                author,
                at: start + Duration::seconds(offset),
                video: rng.random_bool(world.video_probability.clamp(0.0, 1.0)),
                audio: rng.random_bool(world.audio_probability.clamp(0.0, 1.0)),
            });
        }
    }
    plan
}

fn random_bytes<R: Rng>(rng: &mut R) -> Vec<u8> {
    let len = rng.random_range(16..256);
    (0..len).map(|_| rng.random()).collect()
}
