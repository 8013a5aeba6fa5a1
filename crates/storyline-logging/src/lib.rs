//! Structured logging for Storyline
//!
//! # Features
//!
//! - **JSONL Output**: structured JSON lines for log aggregation (default)
//! - **Pretty Console**: human-readable output for development
//! - **Viewer Context**: spans record which viewer and session they belong to
//! - **File Rotation**: daily/hourly rotation via tracing-appender
//!
//! # Quick Start
//!
//! ```ignore
//! use storyline_logging::{LogConfig, StorylineSubscriberBuilder};
//!
//! // JSONL to console
//! StorylineSubscriberBuilder::new().init()?;
//!
//! // Pretty output while developing
//! let _guard = StorylineSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init()?;
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{ViewerContextData, ViewerContextGuard};
pub use layers::{ViewerContextExtension, ViewerContextLayer, jsonl_layer};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to create rolling log appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Builder for configuring and installing the Storyline subscriber
///
/// Console output is JSONL unless the config asks for pretty output.
/// `RUST_LOG`, when set, wins over the configured levels.
#[derive(Debug, Default)]
pub struct StorylineSubscriberBuilder {
    config: LogConfig,
}

impl StorylineSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.console.pretty = pretty;
        self
    }

    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// When file output is configured the returned guard must be kept alive
    /// for as long as logs should be flushed to disk.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.directives())?,
        };

        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            if self.config.console.pretty {
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(self.config.console.ansi)
                        .with_target(true)
                        .boxed(),
                );
            } else {
                layers.push(jsonl_layer(std::io::stdout, &self.config.jsonl));
            }
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            layers.push(jsonl_layer(writer, &self.config.jsonl));
            guard = Some(file_guard);
        }

        Registry::default()
            .with(layers)
            .with(ViewerContextLayer::new())
            .with(env_filter)
            .try_init()?;

        Ok(guard)
    }
}

/// Non-blocking writer for the configured log file
///
/// `Never` truncates a single file; the rotating strategies append.
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&config.directory)?;

    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("log");
    if let Some(max_files) = config.max_files {
        builder = builder.max_log_files(max_files);
    }
    let appender = builder.build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// JSONL to console; ignores an already-installed subscriber
pub fn init_default() {
    let _ = StorylineSubscriberBuilder::new().init();
}

/// Verbose pretty console output
pub fn init_development() {
    let _ = StorylineSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Warnings only; safe to call from every test
pub fn init_testing() {
    let _ = StorylineSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}
