//! Installs the global subscriber once, so this suite holds a single test

use storyline_core::UserId;
use storyline_logging::{
    FileConfig, LogConfig, RotationStrategy, StorylineSubscriberBuilder, ViewerContextGuard,
};

#[test]
fn test_file_output_is_jsonl_with_span_fields() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig {
        default_level: "info".to_string(),
        ..LogConfig::default()
    };

    let guard = StorylineSubscriberBuilder::new()
        .with_config(config)
        .with_console(false)
        .with_file_output(FileConfig {
            directory: dir.path().to_path_buf(),
            prefix: "viewer".to_string(),
            rotation: RotationStrategy::Never,
            max_files: None,
        })
        .init()
        .unwrap()
        .expect("file output returns a guard");

    let viewer = UserId::generate();
    {
        let _ctx = ViewerContextGuard::new(Some(viewer));
        let span = tracing::info_span!("viewer_session", session_id = "s-1");
        let _entered = span.enter();
        tracing::info!(story = "abc", "Showing story");
        tracing::debug!("filtered out at info");
    }
    drop(guard);

    // A second install fails instead of panicking.
    assert!(StorylineSubscriberBuilder::new().init().is_err());

    let contents = std::fs::read_to_string(dir.path().join("viewer.log")).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "Showing story");
    assert_eq!(lines[0]["story"], "abc");
    assert_eq!(lines[0]["span"]["session_id"], "s-1");

    // The guard's span sits at the root of the span list.
    let spans = lines[0]["spans"].as_array().unwrap();
    assert_eq!(spans[0]["name"], "viewer");
    assert_eq!(spans[0]["viewer_id"], viewer.short_id());
    assert!(spans[0]["session_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(spans[1]["name"], "viewer_session");
}
