/// BLE transport abstraction and the BlueZ-backed production implementation
use futures_util::StreamExt;
use log::{debug, warn};
use std::time::Duration;
use tokio::time::sleep;
use uuid::Uuid;

use crate::error::TransportError;
use crate::models::DiscoveredDevice;

// LYWSD02 GATT characteristics. These identifiers are the wire contract
// with the physical device and must not change.
pub const SENSOR_DATA_CHARACTERISTIC: Uuid =
    Uuid::from_u128(0xEBE0CCC1_7A0A_4B0C_8A1A_6FF2997DA3A6);
pub const BATTERY_CHARACTERISTIC: Uuid = Uuid::from_u128(0xEBE0CCC4_7A0A_4B0C_8A1A_6FF2997DA3A6);
pub const TIME_CHARACTERISTIC: Uuid = Uuid::from_u128(0xEBE0CCB7_7A0A_4B0C_8A1A_6FF2997DA3A6);

/// Poll interval while waiting for BlueZ to resolve the remote GATT database
const SERVICES_RESOLVED_POLL: Duration = Duration::from_millis(200);

/// Capability surface of a BLE adapter.
///
/// The discovery, connection and telemetry layers are written against this
/// trait so they can be exercised with a simulated transport in tests. The
/// production implementation is [`BluerTransport`].
#[allow(async_fn_in_trait)]
pub trait BleTransport {
    /// Handle to one established device connection
    type Handle;

    /// Collect advertisements for the duration of one scan window.
    ///
    /// Observing no devices is a normal outcome and yields an empty list.
    async fn scan(&self, window: Duration) -> Result<Vec<DiscoveredDevice>, TransportError>;

    /// Establish a transport-level connection to the given address.
    async fn connect(&self, address: &str) -> Result<Self::Handle, TransportError>;

    /// Whether the link behind the handle is actually active.
    async fn is_connected(&self, handle: &Self::Handle) -> Result<bool, TransportError>;

    async fn read_characteristic(
        &self,
        handle: &Self::Handle,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, TransportError>;

    async fn write_characteristic(
        &self,
        handle: &Self::Handle,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError>;

    /// Release whatever the transport holds for the given address.
    ///
    /// Keyed by address rather than handle so that a connect attempt whose
    /// future was cancelled mid-flight can still be cleaned up.
    async fn disconnect(&self, address: &str) -> Result<(), TransportError>;
}

/// Production transport backed by BlueZ through `bluer`.
pub struct BluerTransport {
    _session: bluer::Session,
    adapter: bluer::Adapter,
}

/// One connected `bluer` device.
pub struct BluerHandle {
    device: bluer::Device,
}

impl BluerTransport {
    /// Open the default Bluetooth adapter and power it on.
    pub async fn new() -> Result<Self, TransportError> {
        let session = bluer::Session::new()
            .await
            .map_err(|e| TransportError::Adapter(e.to_string()))?;

        let adapter = session
            .default_adapter()
            .await
            .map_err(|e| TransportError::Adapter(e.to_string()))?;

        adapter
            .set_powered(true)
            .await
            .map_err(|e| TransportError::Adapter(e.to_string()))?;

        Ok(BluerTransport {
            _session: session,
            adapter,
        })
    }

    fn parse_address(address: &str) -> Result<bluer::Address, TransportError> {
        address
            .parse()
            .map_err(|_| TransportError::Connect(format!("invalid device address {address}")))
    }
}

impl BleTransport for BluerTransport {
    type Handle = BluerHandle;

    async fn scan(&self, window: Duration) -> Result<Vec<DiscoveredDevice>, TransportError> {
        // Configure discovery for Low Energy devices only
        let filter = bluer::DiscoveryFilter {
            transport: bluer::DiscoveryTransport::Le,
            duplicate_data: false,
            ..Default::default()
        };

        // Apply the discovery filter (warn if it fails, but continue)
        if let Err(e) = self.adapter.set_discovery_filter(filter).await {
            warn!("Failed to set discovery filter: {}", e);
        }

        // Keep the discovery stream alive in the background for the window
        let discovery_stream = self
            .adapter
            .discover_devices()
            .await
            .map_err(|e| TransportError::Scan(e.to_string()))?;
        let discovery_handle = tokio::spawn(async move {
            let mut stream = discovery_stream;
            while let Some(event) = stream.next().await {
                debug!("Discovery event: {:?}", event);
            }
        });

        sleep(window).await;

        // Stop discovery
        discovery_handle.abort();

        let addresses = self
            .adapter
            .device_addresses()
            .await
            .map_err(|e| TransportError::Scan(e.to_string()))?;

        let mut devices = Vec::with_capacity(addresses.len());
        for addr in addresses {
            let device = match self.adapter.device(addr) {
                Ok(device) => device,
                Err(_) => continue,
            };

            let name = device.name().await.ok().flatten();
            let manufacturer_data = device
                .manufacturer_data()
                .await
                .ok()
                .flatten()
                .unwrap_or_default();

            devices.push(DiscoveredDevice {
                name,
                address: addr.to_string(),
                manufacturer_data,
            });
        }

        Ok(devices)
    }

    async fn connect(&self, address: &str) -> Result<BluerHandle, TransportError> {
        let addr = Self::parse_address(address)?;
        let device = self
            .adapter
            .device(addr)
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let already_connected = device
            .is_connected()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        if !already_connected {
            device
                .connect()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
        }

        // Wait until BlueZ has resolved the remote GATT database. The
        // caller's connect timeout bounds this wait.
        loop {
            let resolved = device
                .is_services_resolved()
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            if resolved {
                break;
            }
            sleep(SERVICES_RESOLVED_POLL).await;
        }

        Ok(BluerHandle { device })
    }

    async fn is_connected(&self, handle: &BluerHandle) -> Result<bool, TransportError> {
        handle
            .device
            .is_connected()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))
    }

    async fn read_characteristic(
        &self,
        handle: &BluerHandle,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, TransportError> {
        let gatt_char = find_characteristic(&handle.device, characteristic)
            .await
            .map_err(|e| TransportError::Read {
                characteristic,
                reason: e.to_string(),
            })?
            .ok_or(TransportError::CharacteristicNotFound(characteristic))?;

        gatt_char.read().await.map_err(|e| TransportError::Read {
            characteristic,
            reason: e.to_string(),
        })
    }

    async fn write_characteristic(
        &self,
        handle: &BluerHandle,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let gatt_char = find_characteristic(&handle.device, characteristic)
            .await
            .map_err(|e| TransportError::Write {
                characteristic,
                reason: e.to_string(),
            })?
            .ok_or(TransportError::CharacteristicNotFound(characteristic))?;

        let op_type = if with_response {
            bluer::gatt::WriteOp::Request
        } else {
            bluer::gatt::WriteOp::Command
        };
        let request = bluer::gatt::remote::CharacteristicWriteRequest {
            op_type,
            ..Default::default()
        };

        gatt_char
            .write_ext(payload, &request)
            .await
            .map_err(|e| TransportError::Write {
                characteristic,
                reason: e.to_string(),
            })
    }

    async fn disconnect(&self, address: &str) -> Result<(), TransportError> {
        let addr = Self::parse_address(address)?;
        let device = self
            .adapter
            .device(addr)
            .map_err(|e| TransportError::Disconnect(e.to_string()))?;

        device
            .disconnect()
            .await
            .map_err(|e| TransportError::Disconnect(e.to_string()))
    }
}

/// Locate a GATT characteristic by UUID on a connected device.
async fn find_characteristic(
    device: &bluer::Device,
    uuid: Uuid,
) -> bluer::Result<Option<bluer::gatt::remote::Characteristic>> {
    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            if characteristic.uuid().await? == uuid {
                return Ok(Some(characteristic));
            }
        }
    }
    Ok(None)
}
