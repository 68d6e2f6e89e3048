//! # Logger
//!
//! Installs the global `tracing` subscriber for typebus applications from a
//! deserializable [`LogConfig`]: a compact console layer, an optional
//! non-blocking rolling file layer (plain or JSON), and an `EnvFilter`
//! honouring `RUST_LOG` on top of the configured default level.
//!
//! ## Example
//!
//! ```rust
//! use typebus_logger::{LogConfig, Logger};
//!
//! let config = LogConfig { name: "my-app".into(), level: "debug".into(), ..LogConfig::default() };
//! let _logger = Logger::init(&config).unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// Logging settings, usually loaded as the `[log]` table of an application
/// config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Identifier of the application; also the prefix of rolling log files.
    pub name: String,
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`, `off`).
    pub level: String,
    /// Extra module directives, e.g. `typebus=trace,my_app=debug`.
    pub filter: Option<String>,
    pub console: bool,
    /// Directory for rolling log files; file output is off when unset.
    pub directory: Option<PathBuf>,
    pub rotation: LogRotation,
    pub max_files: usize,
    /// Write file output as JSON lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            level: "info".to_owned(),
            filter: None,
            console: true,
            directory: None,
            rotation: LogRotation::default(),
            max_files: DEFAULT_MAX_FILES,
            json: false,
        }
    }
}

impl LogConfig {
    /// Parses [`LogConfig::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LevelFilter::from_str(self.level.trim()).map_err(|e| LoggerError::InvalidConfiguration {
            message: format!("Invalid level '{}': {e}", self.level).into(),
            context: None,
        })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if self.directory.is_some() && self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        if !self.console && self.directory.is_none() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level_filter()?.into());
        self.filter.as_ref().map_or_else(
            || Ok(builder.from_env_lossy()),
            |filter| {
                builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                    message: format!("Invalid env filter '{filter}': {e}").into(),
                    context: None,
                })
            },
        )
    }
}

/// A handle to the initialized logging system.
///
/// Holds the background writer guard when file output is enabled. Keep it
/// alive until shutdown so buffered records are flushed.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Validates `config` and installs the global tracing subscriber.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for invalid settings,
    /// [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory
    /// cannot be prepared, and [`LoggerError::Subscriber`] if a global
    /// subscriber is already installed.
    pub fn init(config: &LogConfig) -> Result<Self, LoggerError> {
        config.validate()?;
        let filter = config.env_filter()?;

        let mut layers = Vec::new();
        if config.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = if let Some(directory) = &config.directory {
            fs::create_dir_all(directory)
                .context(format!("Failed to create log directory: {}", directory.display()))?;

            let appender = RollingFileAppender::builder()
                .rotation(config.rotation.into())
                .filename_prefix(&config.name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(config.max_files)
                .build(directory)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = layer().with_writer(writer).with_ansi(false);
            layers.push(if config.json { file_layer.json().boxed() } else { file_layer.boxed() });
            Some(guard)
        } else {
            None
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(name = %config.name, file = guard.is_some(), "Logger initialized");

        Ok(Self { guard })
    }

    /// Whether file output (and thus a background writer) is active.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}
