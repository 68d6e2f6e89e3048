use crate::error::{RelayError, RelayErrorExt};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use typebus::BusConfig;
use typebus_logger::LogConfig;

const ENV_PREFIX: &str = "TYPEBUS";

/// Top-level configuration of the relay demo.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bus: BusConfig,
    pub log: LogConfig,
    pub sensor: SensorConfig,
    pub alarm: AlarmConfig,
    pub journal: JournalConfig,
}

/// Synthetic temperature source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub name: String,
    pub readings: u64,
    pub start_celsius: f64,
    pub step_celsius: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub threshold_celsius: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Entries the journal accepts before its handlers start failing.
    pub capacity: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { name: "greenhouse".to_owned(), readings: 5, start_celsius: 20.0, step_celsius: 1.5 }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self { threshold_celsius: 24.0 }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Loads [`RelayConfig`] from an optional file, overlaid with environment
/// variables prefixed with `TYPEBUS__`.
///
/// Nested keys use double underscores: `TYPEBUS__BUS__POLICY=isolate` maps to
/// `bus.policy`. Without a file, defaults plus environment overrides are used.
///
/// # Errors
/// Returns [`RelayError::Config`] if the file is missing or malformed, or the
/// merged values do not match [`RelayConfig`].
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, RelayError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<RelayConfig>()
        .context("Failed to deserialize config")
}
