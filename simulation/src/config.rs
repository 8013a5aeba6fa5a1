//! Simulation configuration, loadable from TOML
//!
//! Every section is optional; missing keys fall back to defaults.
//!
//! ```toml
//! seed = 7
//!
//! [world]
//! authors = 6
//! audio_probability = 0.5
//!
//! [playback]
//! story_duration_ms = 1500
//!
//! [log]
//! default_level = "debug"
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use storyline_logging::{ConsoleConfig, LogConfig};
use storyline_playback::PlaybackConfig;
use storyline_store::PlatformConfig;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed; a random one is picked and printed when absent
    pub seed: Option<u64>,
    pub world: WorldConfig,
    pub playback: PlaybackConfig,
    pub platform: PlatformConfig,
    pub chaos: ChaosConfig,
    pub log: LogConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            world: WorldConfig::default(),
            playback: PlaybackConfig::default(),
            platform: PlatformConfig::default(),
            chaos: ChaosConfig::default(),
            log: LogConfig {
                console: ConsoleConfig {
                    enabled: true,
                    pretty: true,
                    ansi: true,
                },
                default_level: "warn".to_string(),
                ..LogConfig::default()
            },
        }
    }
}

impl SimulationConfig {
    /// Read a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Shape of the seeded world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Authors other than the viewer
    pub authors: usize,
    pub max_stories_per_author: usize,
    /// Chance a story has a soundtrack
    pub audio_probability: f64,
    /// Chance a story is a video rather than an image
    pub video_probability: f64,
    /// Chance a story was posted more than a day ago
    pub expired_probability: f64,
    /// Whether the viewer posts a story of their own
    pub viewer_posts: bool,
    /// Logical width of the simulated screen
    pub viewport_width: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            authors: 5,
            max_stories_per_author: 3,
            audio_probability: 0.4,
            video_probability: 0.25,
            expired_probability: 0.15,
            viewer_posts: true,
            viewport_width: 390.0,
        }
    }
}

/// Randomized input run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    pub steps: usize,
    /// Longest simulated pause between inputs
    pub max_gap_ms: u64,
    /// Chance any given soundtrack fails to load
    pub audio_failure_probability: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            steps: 500,
            max_gap_ms: 7_000,
            audio_failure_probability: 0.2,
        }
    }
}
