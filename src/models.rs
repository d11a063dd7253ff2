use std::collections::HashMap;

use crate::error::TelemetryStepError;

/// A device observed during one scan window.
///
/// Ephemeral: only valid for the scan cycle that produced it.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: Option<String>,
    pub address: String,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

/// Decoded sensor characteristic payload (temperature and humidity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Degrees Celsius with two implied decimal digits
    pub temperature: f32,
    /// Relative humidity percent (0-100)
    pub humidity: u8,
}

/// Complete reading for one telemetry session, composed once both read
/// steps have succeeded. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: u8,
    /// Battery charge percent (0-100)
    pub battery: u8,
}

/// Time and timezone written to the device clock. Write-only, never read
/// back from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSyncPayload {
    pub epoch_seconds: u32,
    pub tz_offset_hours: i8,
}

/// Per-step outcome of one telemetry session.
///
/// Each step is fault-isolated, so the report keeps every step's result
/// instead of collapsing the session into a single pass/fail.
#[derive(Debug)]
pub struct TelemetryReport {
    pub climate: Result<ClimateReading, TelemetryStepError>,
    pub battery: Result<u8, TelemetryStepError>,
    pub time_sync: Result<TimeSyncPayload, TelemetryStepError>,
}

impl TelemetryReport {
    /// The full sensor reading, present only when both read steps succeeded.
    pub fn reading(&self) -> Option<SensorReading> {
        match (&self.climate, &self.battery) {
            (Ok(climate), Ok(battery)) => Some(SensorReading {
                temperature: climate.temperature,
                humidity: climate.humidity,
                battery: *battery,
            }),
            _ => None,
        }
    }

    pub fn failed_steps(&self) -> usize {
        [
            self.climate.is_err(),
            self.battery.is_err(),
            self.time_sync.is_err(),
        ]
        .iter()
        .filter(|failed| **failed)
        .count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_steps() == 0
    }
}
