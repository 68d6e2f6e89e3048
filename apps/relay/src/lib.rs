//! # Relay
//!
//! Demo application for `typebus`. A [`Sensor`](components::Sensor) publishes
//! temperature readings, an [`AlarmPanel`](components::AlarmPanel) reacts to
//! them by publishing alarms from inside its handler, and a
//! [`Journal`](components::Journal) records every message. None of the
//! components reference each other; the bus is the only thing they share.

pub mod components;
pub mod config;
pub mod error;
pub mod messages;

pub use crate::config::{RelayConfig, load_config};
pub use crate::error::{RelayError, RelayErrorExt};

use crate::components::{AlarmPanel, Journal, Sensor};
use std::fmt;
use tracing::info;
use typebus::Bus;

/// Outcome of one [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub readings: u64,
    pub alarms: u64,
    pub journal_entries: usize,
    /// Handler invocations completed by the sensor's own publishes.
    pub delivered: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "readings={} alarms={} journal_entries={} delivered={}",
            self.readings, self.alarms, self.journal_entries, self.delivered
        )
    }
}

/// Wires the components onto a fresh bus and runs the sensor to completion.
///
/// # Errors
/// Returns [`RelayError::Bus`] if any publish fails under the configured
/// dispatch policy.
pub fn run(config: &RelayConfig) -> Result<RunSummary, RelayError> {
    let bus = Bus::with_config(config.bus.clone());
    let journal = Journal::attach(&bus, &config.journal);
    let alarms = AlarmPanel::attach(&bus, &config.alarm);
    info!(policy = ?bus.config().policy, readings = config.sensor.readings, "Relay started");

    let delivered = Sensor::new(bus.clone(), config.sensor.clone())
        .run()
        .context("Publishing sensor readings")?;

    let summary = RunSummary {
        readings: config.sensor.readings,
        alarms: alarms.raised(),
        journal_entries: journal.len(),
        delivered,
    };
    info!(%summary, "Relay finished");
    Ok(summary)
}
