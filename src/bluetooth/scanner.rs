/// Bluetooth Low Energy discovery of the target sensor by advertised name
use log::{debug, info};
use std::time::{Duration, Instant};

use crate::bluetooth::transport::BleTransport;
use crate::error::DiscoveryError;
use crate::models::DiscoveredDevice;

/// Window length of each pass of the repeated-scan strategy
const REPEAT_WINDOW: Duration = Duration::from_secs(2);

/// Parameters controlling one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Case-sensitive substring the advertised name must contain
    pub target_name: String,
    /// Window length of the single-pass strategy
    pub scan_window: Duration,
    /// Total time budget of the repeated-scan strategy
    pub scan_deadline: Duration,
    /// Select repeated short windows instead of one long window
    pub repeat: bool,
}

/// Find the first advertised device whose name contains the target substring.
///
/// Two strategies are supported. The single-pass strategy performs one scan
/// of up to `scan_window` and inspects whatever it observed. The repeated
/// strategy issues short windows until a match appears or `scan_deadline`
/// has elapsed since the run began; at least one window is always issued.
///
/// Observing no devices is a normal outcome that simply contributes no
/// match; both strategies report `NotFound` only after their budget is
/// spent. Ties between simultaneously observed devices are broken by
/// encounter order in the scan result list.
///
/// # Arguments
/// * `transport` - BLE adapter capability to scan with
/// * `options` - Target name and time budgets
///
/// # Returns
/// The first matching device, `NotFound` when the budget is exhausted, or
/// a transport error when scanning could not run at all.
pub async fn discover_sensor<T: BleTransport>(
    transport: &T,
    options: &DiscoveryOptions,
) -> Result<DiscoveredDevice, DiscoveryError> {
    if options.repeat {
        repeated_scan(transport, options).await
    } else {
        single_pass_scan(transport, options).await
    }
}

async fn single_pass_scan<T: BleTransport>(
    transport: &T,
    options: &DiscoveryOptions,
) -> Result<DiscoveredDevice, DiscoveryError> {
    info!(
        "Scanning for '{}' ({}s window)",
        options.target_name,
        options.scan_window.as_secs()
    );

    let devices = transport.scan(options.scan_window).await?;
    log_observed(&devices);

    first_match(devices, &options.target_name).ok_or(DiscoveryError::NotFound)
}

async fn repeated_scan<T: BleTransport>(
    transport: &T,
    options: &DiscoveryOptions,
) -> Result<DiscoveredDevice, DiscoveryError> {
    info!(
        "Scanning for '{}' (up to {}s in {}s windows)",
        options.target_name,
        options.scan_deadline.as_secs(),
        REPEAT_WINDOW.as_secs()
    );

    let started = Instant::now();
    loop {
        let devices = transport.scan(REPEAT_WINDOW).await?;
        log_observed(&devices);

        if let Some(device) = first_match(devices, &options.target_name) {
            return Ok(device);
        }

        if started.elapsed() >= options.scan_deadline {
            return Err(DiscoveryError::NotFound);
        }
    }
}

/// First substring match in encounter order. Unnamed devices never match.
fn first_match(devices: Vec<DiscoveredDevice>, target: &str) -> Option<DiscoveredDevice> {
    devices.into_iter().find(|device| {
        device
            .name
            .as_deref()
            .map_or(false, |name| name.contains(target))
    })
}

fn log_observed(devices: &[DiscoveredDevice]) {
    for device in devices {
        debug!(
            "Observed {} ({}, {} manufacturer record(s))",
            device.name.as_deref().unwrap_or("unnamed"),
            device.address,
            device.manufacturer_data.len()
        );
    }
}
