//! Log settings, loadable as a section of a TOML or JSON config
//!
//! Three presets cover the usual cases: [`LogConfig::development`] while
//! working on the viewer, [`LogConfig::production`] for a long-running host
//! and [`LogConfig::testing`] for test binaries.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where logs go and how much of them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for targets without an override; `RUST_LOG` wins when set
    pub default_level: String,
    pub console: ConsoleConfig,
    /// Disabled unless present
    pub file: Option<FileConfig>,
    pub jsonl: JsonlConfig,

    /// Per-target level overrides, e.g. `storyline_playback = "debug"`
    pub targets: HashMap<String, String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
            targets: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Pretty console output, with every timer and cursor change visible
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig {
                enabled: true,
                pretty: true,
                ansi: true,
            },
            ..Default::default()
        }
        .with_target("storyline_playback", "trace")
    }

    /// Daily-rotated JSONL files in `log_dir`, nothing on the console
    ///
    /// Per-frame playback logging is capped at `info`.
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig {
                enabled: false,
                ..ConsoleConfig::default()
            },
            file: Some(FileConfig {
                directory: log_dir,
                ..FileConfig::default()
            }),
            ..Default::default()
        }
        .with_target("storyline_playback", "info")
    }

    /// Warnings only, plain JSONL
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            ..Default::default()
        }
    }

    /// Override the level of one target
    pub fn with_target(mut self, target: impl Into<String>, level: impl Into<String>) -> Self {
        self.targets.insert(target.into(), level.into());
        self
    }

    /// Filter directives in `EnvFilter` syntax
    pub fn directives(&self) -> String {
        let mut directives = vec![self.default_level.clone()];
        let mut targets: Vec<_> = self.targets.iter().collect();
        targets.sort();
        directives.extend(targets.into_iter().map(|(target, level)| format!("{}={}", target, level)));
        directives.join(",")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable lines instead of JSONL
    pub pretty: bool,
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: false,
            ansi: false,
        }
    }
}

/// Log files written through a non-blocking appender
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name stem; rotated files get a date suffix
    pub prefix: String,
    pub rotation: RotationStrategy,
    /// Rotated files to keep; older ones are deleted
    pub max_files: Option<usize>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "storyline".to_string(),
            rotation: RotationStrategy::Daily,
            max_files: Some(7),
        }
    }
}

/// When to start a new log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// Single file, truncated on start
    Never,
}

/// Shape of each JSON line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Put event fields next to `message` instead of under `fields`
    pub flatten_events: bool,
    /// Include the list of entered spans
    pub include_spans: bool,
    pub include_thread_info: bool,
    /// Include file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_thread_info: false,
            include_location: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_jsonl_console_only() {
        let config = LogConfig::default();
        assert_eq!(config.directives(), "info");
        assert!(config.console.enabled && !config.console.pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_development_traces_playback() {
        let config = LogConfig::development();
        assert!(config.console.pretty);
        assert_eq!(config.directives(), "debug,storyline_playback=trace");
    }

    #[test]
    fn test_production_writes_rotated_files() {
        let config = LogConfig::production(PathBuf::from("/var/log/storyline"));
        assert!(!config.console.enabled);
        assert_eq!(config.directives(), "info,storyline_playback=info");
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/storyline"));
        assert_eq!(file.rotation, RotationStrategy::Daily);
        assert_eq!(file.max_files, Some(7));
    }

    #[test]
    fn test_directives() {
        let config = LogConfig::testing()
            .with_target("storyline_store", "info")
            .with_target("storyline_playback", "debug");
        assert_eq!(
            config.directives(),
            "warn,storyline_playback=debug,storyline_store=info"
        );
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: LogConfig =
            serde_json::from_str(r#"{"default_level": "trace", "file": {"rotation": "never"}}"#).unwrap();
        assert_eq!(config.default_level, "trace");
        let file = config.file.unwrap();
        assert_eq!(file.rotation, RotationStrategy::Never);
        assert_eq!(file.prefix, "storyline");
    }
}
