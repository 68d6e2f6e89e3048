//! Message types exchanged by the relay components.

/// One sample published by a [`Sensor`](crate::components::Sensor).
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReading {
    pub sensor: String,
    pub sequence: u64,
    pub celsius: f64,
}

/// Raised by the [`AlarmPanel`](crate::components::AlarmPanel) while a
/// reading is being delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdExceeded {
    pub sequence: u64,
    pub celsius: f64,
    pub threshold: f64,
}

/// Published once after the sensor's last reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorStopped {
    pub sensor: String,
    pub readings: u64,
}
