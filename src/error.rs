/// Error types for the codec, transport, discovery, connection and telemetry layers
use thiserror::Error;
use uuid::Uuid;

/// Failure to decode a fixed-layout characteristic payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The payload is shorter than the fixed layout requires
    #[error("insufficient data: needed {needed} bytes, got {got}")]
    InsufficientData { needed: usize, got: usize },
}

/// Failure reported by the underlying BLE transport.
///
/// Produced both by the BlueZ-backed transport and by the simulated
/// transport used in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("bluetooth adapter unavailable: {0}")]
    Adapter(String),
    #[error("scan failed: {0}")]
    Scan(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),
    #[error("read of characteristic {characteristic} failed: {reason}")]
    Read { characteristic: Uuid, reason: String },
    #[error("write of characteristic {characteristic} failed: {reason}")]
    Write { characteristic: Uuid, reason: String },
    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// Outcome of a discovery run that produced no usable device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// No advertised name contained the target substring before the scan
    /// deadline. A normal outcome, not a transport fault.
    #[error("no matching device found")]
    NotFound,
    /// The scan itself could not run
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure to establish a usable connection to the target device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transport reported success but the link is not active
    #[error("connection established but not active")]
    ConnectNotActive,
    #[error("connect attempt timed out")]
    Timeout,
}

/// Failure of a single telemetry step. Never fatal to sibling steps; the
/// session records it and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryStepError {
    #[error("characteristic read failed: {0}")]
    ReadFailed(#[source] TransportError),
    #[error("characteristic write failed: {0}")]
    WriteFailed(#[source] TransportError),
    #[error("payload decode failed: {0}")]
    Decode(#[from] CodecError),
}

/// Terminal outcome of a full discovery + telemetry cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("target device not found")]
    DeviceNotFound,
    #[error("operation timed out")]
    OperationTimedOut,
    #[error("discovery failed: {0}")]
    Discovery(#[source] DiscoveryError),
    #[error("connection failed: {0}")]
    Connection(#[from] ConnectionError),
}

/// Failure to load configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
