//! Scenario runs checked end to end

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use storyline_playback::{CloseReason, PlaybackCursor};

use crate::config::SimulationConfig;
use crate::scenarios::{run_chaos, run_playback, run_post_scenario, run_reference_scenario};
use crate::world::World;

#[test]
fn test_reference_scenario() {
    let report = run_reference_scenario(390.0).unwrap();

    assert_eq!(
        report.visited,
        vec![
            PlaybackCursor::new(0, 0),
            PlaybackCursor::new(0, 1),
            PlaybackCursor::new(1, 0),
        ]
    );
    assert_eq!(report.close_reason, Some(CloseReason::Exhausted));
    assert_eq!(report.audio_after_dismiss, 0);
    assert_eq!(report.tap_landing, Some(PlaybackCursor::new(0, 1)));
}

#[tokio::test]
async fn test_post_scenario() {
    let report = run_post_scenario(&SimulationConfig::default()).await.unwrap();

    assert!(report.rejected_anonymous);
    assert!(report.rejected_empty);
    assert!(report.upload_failure_retryable);
    assert_eq!(report.orphaned_objects, 2);
    assert_eq!(report.published, 1);
}

#[tokio::test]
async fn test_chaos_holds_invariants_across_seeds() {
    let mut config = SimulationConfig::default();
    config.chaos.steps = 300;

    for seed in [1, 2, 3, 42] {
        let mut rng = StdRng::seed_from_u64(seed);
        let world = World::seed(&config, &mut rng).await.unwrap();
        let report = run_chaos(&world, &config, &mut rng).await.unwrap();

        assert_eq!(report.steps, 300);
        assert!(report.sessions >= 1);
        assert!(report.max_live_audio <= 1);
    }
}

#[tokio::test]
async fn test_live_playback_dismissed_after_two_stories() {
    let mut config = SimulationConfig::default();
    config.world.authors = 3;
    config.world.expired_probability = 0.0;
    config.playback.story_duration = Duration::from_millis(200);

    let mut rng = StdRng::seed_from_u64(5);
    let world = World::seed(&config, &mut rng).await.unwrap();
    let reason = run_playback(&world, &config.playback, 0, Some(2)).await.unwrap();
    assert_eq!(reason, CloseReason::Dismissed);
}
