//! Relay components. Each one only knows the [`Bus`] handle it was given and
//! the message types in [`crate::messages`].

use crate::config::{AlarmConfig, JournalConfig, SensorConfig};
use crate::messages::{SensorStopped, TemperatureReading, ThresholdExceeded};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use typebus::{Bus, BusError, HandlerError, SubscriptionGuard};

/// Publishes a fixed series of synthetic readings.
#[derive(Debug)]
pub struct Sensor {
    bus: Bus,
    config: SensorConfig,
}

impl Sensor {
    #[must_use]
    pub const fn new(bus: Bus, config: SensorConfig) -> Self {
        Self { bus, config }
    }

    /// Publishes every reading, then a [`SensorStopped`] notice.
    ///
    /// Returns the total number of handler invocations that completed.
    ///
    /// # Errors
    /// Propagates the first [`BusError`] reported by `publish`.
    pub fn run(&self) -> Result<usize, BusError> {
        let mut delivered = 0;
        for sequence in 1..=self.config.readings {
            let reading = TemperatureReading {
                sensor: self.config.name.clone(),
                sequence,
                celsius: self.celsius_at(sequence),
            };
            delivered += self.bus.publish(&reading)?;
        }

        let stopped =
            SensorStopped { sensor: self.config.name.clone(), readings: self.config.readings };
        delivered += self.bus.publish(&stopped)?;

        debug!(sensor = %self.config.name, delivered, "Sensor finished");
        Ok(delivered)
    }

    #[allow(clippy::cast_precision_loss)]
    fn celsius_at(&self, sequence: u64) -> f64 {
        ((sequence - 1) as f64).mul_add(self.config.step_celsius, self.config.start_celsius)
    }
}

/// Counts readings above a threshold and announces each one as a
/// [`ThresholdExceeded`] message, published from inside the reading handler.
#[derive(Debug)]
pub struct AlarmPanel {
    raised: Arc<AtomicU64>,
    _subscription: SubscriptionGuard,
}

impl AlarmPanel {
    #[must_use]
    pub fn attach(bus: &Bus, config: &AlarmConfig) -> Self {
        let raised = Arc::new(AtomicU64::new(0));
        let threshold = config.threshold_celsius;

        let counter = Arc::clone(&raised);
        let publisher = bus.clone();
        let subscription = bus.try_subscribe_scoped(
            move |reading: &TemperatureReading| -> Result<(), HandlerError> {
                if reading.celsius <= threshold {
                    return Ok(());
                }

                counter.fetch_add(1, Ordering::Relaxed);
                warn!(
                    sensor = %reading.sensor,
                    sequence = reading.sequence,
                    celsius = reading.celsius,
                    threshold,
                    "Temperature above threshold"
                );
                publisher.publish(&ThresholdExceeded {
                    sequence: reading.sequence,
                    celsius: reading.celsius,
                    threshold,
                })?;
                Ok(())
            },
        );

        Self { raised, _subscription: subscription }
    }

    #[must_use]
    pub fn raised(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }
}

/// Bounded, in-memory log of everything that crossed the bus. Its handlers
/// fail once `capacity` entries are stored.
#[derive(Debug)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
    _subscriptions: Vec<SubscriptionGuard>,
}

impl Journal {
    #[must_use]
    pub fn attach(bus: &Bus, config: &JournalConfig) -> Self {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let capacity = config.capacity;

        let subscriptions = vec![
            bus.try_subscribe_scoped(recorder(&entries, capacity, |r: &TemperatureReading| {
                format!("reading {}#{} {:.1}C", r.sensor, r.sequence, r.celsius)
            })),
            bus.try_subscribe_scoped(recorder(&entries, capacity, |a: &ThresholdExceeded| {
                format!("alarm #{} {:.1}C > {:.1}C", a.sequence, a.celsius, a.threshold)
            })),
            bus.try_subscribe_scoped(recorder(&entries, capacity, |s: &SensorStopped| {
                format!("stopped {} after {} readings", s.sensor, s.readings)
            })),
        ];

        Self { entries, _subscriptions: subscriptions }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn recorder<T, F>(
    entries: &Arc<Mutex<Vec<String>>>,
    capacity: usize,
    describe: F,
) -> impl Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static
where
    T: 'static,
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    let entries = Arc::clone(entries);
    move |message: &T| {
        let mut entries = entries.lock();
        if entries.len() >= capacity {
            return Err(format!("journal is full ({capacity} entries)").into());
        }
        entries.push(describe(message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(readings: u64) -> SensorConfig {
        SensorConfig { readings, ..SensorConfig::default() }
    }

    #[test]
    fn test_sensor_without_consumers_delivers_nothing() {
        let bus = Bus::new();
        assert_eq!(Sensor::new(bus, sensor(3)).run().unwrap(), 0);
    }

    #[test]
    fn test_sensor_readings_follow_configured_ramp() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _guard = bus.subscribe_scoped(move |r: &TemperatureReading| {
            sink.lock().push((r.sequence, r.celsius));
        });

        Sensor::new(bus, sensor(3)).run().unwrap();

        assert_eq!(*seen.lock(), vec![(1, 20.0), (2, 21.5), (3, 23.0)]);
    }

    #[test]
    fn test_alarm_publishes_from_inside_reading_handler() {
        let bus = Bus::new();
        let journal = Journal::attach(&bus, &JournalConfig::default());
        let alarms = AlarmPanel::attach(&bus, &AlarmConfig { threshold_celsius: 22.0 });

        Sensor::new(bus, sensor(3)).run().unwrap();

        assert_eq!(alarms.raised(), 1);
        assert_eq!(
            journal.entries(),
            vec![
                "reading greenhouse#1 20.0C",
                "reading greenhouse#2 21.5C",
                "reading greenhouse#3 23.0C",
                "alarm #3 23.0C > 22.0C",
                "stopped greenhouse after 3 readings",
            ]
        );
    }

    #[test]
    fn test_detached_components_stop_receiving() {
        let bus = Bus::new();
        let journal = Journal::attach(&bus, &JournalConfig::default());
        let alarms = AlarmPanel::attach(&bus, &AlarmConfig { threshold_celsius: 0.0 });
        drop(alarms);

        assert_eq!(bus.subscriber_count::<TemperatureReading>(), Some(1));
        Sensor::new(bus.clone(), sensor(2)).run().unwrap();
        assert_eq!(journal.len(), 3);

        drop(journal);
        assert_eq!(bus.subscriber_count::<TemperatureReading>(), Some(0));
        assert_eq!(bus.subscriber_count::<SensorStopped>(), Some(0));
    }

    #[test]
    fn test_full_journal_fails_the_publish() {
        let bus = Bus::new();
        let _journal = Journal::attach(&bus, &JournalConfig { capacity: 1 });

        let err = Sensor::new(bus, sensor(2)).run().unwrap_err();
        assert!(matches!(err, BusError::Handler { position: 0, .. }), "{err}");
    }
}
