/// Telemetry sequence performed over one established session
///
/// Strict order: sensor read, battery read, time-sync write. Each step is
/// fault-isolated; a failing step is recorded in the report and the
/// remaining steps still run.
use log::{info, warn};
use std::time::Duration;
use tokio::time::sleep;

use crate::bluetooth::connection::Session;
use crate::bluetooth::transport::{
    BleTransport, BATTERY_CHARACTERISTIC, SENSOR_DATA_CHARACTERISTIC, TIME_CHARACTERISTIC,
};
use crate::codec;
use crate::error::TelemetryStepError;
use crate::models::{ClimateReading, TelemetryReport, TimeSyncPayload};
use crate::utils;

/// Run the telemetry sequence and collect per-step outcomes.
///
/// The device needs settling time after connect before the sensor
/// characteristic returns data, so the session waits `data_ready_delay`
/// before the first read. A zero delay skips the wait.
pub async fn run<T: BleTransport>(
    session: &Session<'_, T>,
    data_ready_delay: Duration,
) -> TelemetryReport {
    if !data_ready_delay.is_zero() {
        info!(
            "Waiting {}s for the device to prepare data",
            data_ready_delay.as_secs()
        );
        sleep(data_ready_delay).await;
    }

    let climate = read_climate(session).await;
    if let Err(e) = &climate {
        warn!("Sensor read step failed: {}", e);
    }

    let battery = read_battery(session).await;
    if let Err(e) = &battery {
        warn!("Battery read step failed: {}", e);
    }

    let time_sync = sync_time(session).await;
    if let Err(e) = &time_sync {
        warn!("Time sync step failed: {}", e);
    }

    TelemetryReport {
        climate,
        battery,
        time_sync,
    }
}

async fn read_climate<T: BleTransport>(
    session: &Session<'_, T>,
) -> Result<ClimateReading, TelemetryStepError> {
    let raw = session
        .read(SENSOR_DATA_CHARACTERISTIC)
        .await
        .map_err(TelemetryStepError::ReadFailed)?;
    Ok(codec::decode_sensor_data(&raw)?)
}

async fn read_battery<T: BleTransport>(session: &Session<'_, T>) -> Result<u8, TelemetryStepError> {
    let raw = session
        .read(BATTERY_CHARACTERISTIC)
        .await
        .map_err(TelemetryStepError::ReadFailed)?;
    Ok(codec::decode_battery(&raw)?)
}

/// Write the current wall-clock time and local UTC offset to the clock
/// characteristic, acknowledged by the device.
async fn sync_time<T: BleTransport>(
    session: &Session<'_, T>,
) -> Result<TimeSyncPayload, TelemetryStepError> {
    let payload = TimeSyncPayload {
        epoch_seconds: utils::current_epoch_seconds(),
        tz_offset_hours: utils::local_utc_offset_hours(),
    };
    let encoded = codec::encode_time_sync(payload.epoch_seconds, payload.tz_offset_hours);

    session
        .write(TIME_CHARACTERISTIC, &encoded, true)
        .await
        .map_err(TelemetryStepError::WriteFailed)?;

    Ok(payload)
}
