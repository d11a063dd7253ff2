mod bluetooth;
mod codec;
mod config;
mod error;
mod models;
mod orchestrator;
mod utils;

use log::{error, info, warn};
use time::OffsetDateTime;

use bluetooth::BluerTransport;
use config::Config;
use error::OrchestratorError;
use models::TelemetryReport;
use utils::format_datetime;

/// Log the per-step outcome of one telemetry cycle
fn report_outcome(report: &TelemetryReport) {
    match &report.climate {
        Ok(climate) => {
            info!("Temperature: {:.2}°C", climate.temperature);
            info!("Humidity: {}%", climate.humidity);
        }
        Err(e) => warn!("No sensor reading: {}", e),
    }

    match &report.battery {
        Ok(battery) => info!("Battery: {}%", battery),
        Err(e) => warn!("No battery reading: {}", e),
    }

    match &report.time_sync {
        Ok(payload) => {
            let synced_at = OffsetDateTime::from_unix_timestamp(i64::from(payload.epoch_seconds))
                .map(|dt| format_datetime(&dt))
                .unwrap_or_else(|_| payload.epoch_seconds.to_string());
            info!(
                "Time synchronized: {} (UTC{:+})",
                synced_at, payload.tz_offset_hours
            );
        }
        Err(e) => warn!("Time sync failed: {}", e),
    }

    if report.is_complete() {
        info!("Telemetry cycle completed successfully");
    } else {
        warn!(
            "Telemetry cycle completed with {} failed step(s)",
            report.failed_steps()
        );
    }
}

async fn run_once(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let transport = BluerTransport::new().await?;

    match orchestrator::run_cycle(&transport, &config).await {
        Ok(report) => report_outcome(&report),
        Err(OrchestratorError::DeviceNotFound) => {
            warn!("Device '{}' not found", config.target_name)
        }
        Err(OrchestratorError::OperationTimedOut) => {
            warn!(
                "Operation timed out after {}s",
                config.overall_timeout.as_secs()
            )
        }
        Err(e) => error!("Cycle failed: {}", e),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        let _ = tx.send(());
    });

    // Run one cycle or wait for the shutdown signal
    tokio::select! {
        result = run_once(config) => {
            match result {
                Ok(_) => info!("Run completed"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Run terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
