/// Composition of discovery, connection and telemetry under one deadline
use log::{info, warn};
use tokio::time::timeout;

use crate::bluetooth::connection;
use crate::bluetooth::scanner::{self, DiscoveryOptions};
use crate::bluetooth::telemetry;
use crate::bluetooth::transport::BleTransport;
use crate::config::Config;
use crate::error::{DiscoveryError, OrchestratorError};
use crate::models::{DiscoveredDevice, TelemetryReport};

/// Run one full discovery + telemetry cycle.
///
/// Discovery runs under its own scan deadline; connect and telemetry share
/// the outer `overall_timeout`. A `NotFound` discovery outcome ends the
/// cycle with `DeviceNotFound` and no connection attempt. When the outer
/// deadline fires mid-flight the cancelled future can no longer release
/// the connection itself, so cleanup is issued here before reporting
/// `OperationTimedOut`.
pub async fn run_cycle<T: BleTransport>(
    transport: &T,
    config: &Config,
) -> Result<TelemetryReport, OrchestratorError> {
    let options = DiscoveryOptions {
        target_name: config.target_name.clone(),
        scan_window: config.scan_window,
        scan_deadline: config.scan_deadline,
        repeat: config.repeat_scan,
    };

    let device = scanner::discover_sensor(transport, &options)
        .await
        .map_err(|e| match e {
            DiscoveryError::NotFound => OrchestratorError::DeviceNotFound,
            other => OrchestratorError::Discovery(other),
        })?;

    info!(
        "Target device found: {} ({})",
        device.name.as_deref().unwrap_or("unnamed"),
        device.address
    );

    match timeout(
        config.overall_timeout,
        connect_and_read(transport, &device, config),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_elapsed) => {
            if let Err(e) = transport.disconnect(&device.address).await {
                warn!("Cleanup after timed-out cycle failed: {}", e);
            }
            Err(OrchestratorError::OperationTimedOut)
        }
    }
}

async fn connect_and_read<T: BleTransport>(
    transport: &T,
    device: &DiscoveredDevice,
    config: &Config,
) -> Result<TelemetryReport, OrchestratorError> {
    let session = connection::connect(transport, &device.address, config.connect_timeout).await?;

    let report = telemetry::run(&session, config.data_ready_delay).await;
    session.close().await;

    Ok(report)
}
