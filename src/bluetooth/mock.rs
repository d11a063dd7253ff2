/// Simulated transport for exercising discovery, connection and telemetry
/// logic without a Bluetooth adapter
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::bluetooth::transport::BleTransport;
use crate::error::TransportError;
use crate::models::DiscoveredDevice;

/// Behavior of the simulated connect call
pub enum ConnectBehavior {
    Succeed,
    Fail(TransportError),
    /// Never resolves, for exercising connect timeouts
    Hang,
}

pub struct MockTransport {
    scan_batches: Mutex<VecDeque<Vec<DiscoveredDevice>>>,
    scan_failure: Option<TransportError>,
    connect_behavior: ConnectBehavior,
    link_active: bool,
    reads: Mutex<HashMap<Uuid, Result<Vec<u8>, TransportError>>>,
    write_failures: Mutex<HashMap<Uuid, TransportError>>,
    /// Writes that reached the device: (characteristic, payload, with_response)
    pub writes: Mutex<Vec<(Uuid, Vec<u8>, bool)>>,
    pub scan_calls: AtomicUsize,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            scan_batches: Mutex::new(VecDeque::new()),
            scan_failure: None,
            connect_behavior: ConnectBehavior::Succeed,
            link_active: true,
            reads: Mutex::new(HashMap::new()),
            write_failures: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            scan_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    /// Queue the device lists returned by successive scan windows; once the
    /// queue is drained, further scans observe nothing.
    pub fn with_scan_batches(self, batches: Vec<Vec<DiscoveredDevice>>) -> Self {
        *self.scan_batches.lock().unwrap() = batches.into();
        self
    }

    pub fn with_scan_failure(mut self, failure: TransportError) -> Self {
        self.scan_failure = Some(failure);
        self
    }

    pub fn with_connect(mut self, behavior: ConnectBehavior) -> Self {
        self.connect_behavior = behavior;
        self
    }

    pub fn with_link_active(mut self, active: bool) -> Self {
        self.link_active = active;
        self
    }

    pub fn with_read(self, characteristic: Uuid, result: Result<Vec<u8>, TransportError>) -> Self {
        self.reads.lock().unwrap().insert(characteristic, result);
        self
    }

    pub fn with_write_failure(self, characteristic: Uuid, failure: TransportError) -> Self {
        self.write_failures
            .lock()
            .unwrap()
            .insert(characteristic, failure);
        self
    }

    pub fn device(name: &str, address: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            name: Some(name.to_string()),
            address: address.to_string(),
            manufacturer_data: HashMap::new(),
        }
    }
}

impl BleTransport for MockTransport {
    type Handle = String;

    async fn scan(&self, _window: Duration) -> Result<Vec<DiscoveredDevice>, TransportError> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.scan_failure {
            return Err(failure.clone());
        }
        Ok(self
            .scan_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn connect(&self, address: &str) -> Result<String, TransportError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        match &self.connect_behavior {
            ConnectBehavior::Succeed => Ok(address.to_string()),
            ConnectBehavior::Fail(failure) => Err(failure.clone()),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn is_connected(&self, _handle: &String) -> Result<bool, TransportError> {
        Ok(self.link_active)
    }

    async fn read_characteristic(
        &self,
        _handle: &String,
        characteristic: Uuid,
    ) -> Result<Vec<u8>, TransportError> {
        self.reads
            .lock()
            .unwrap()
            .get(&characteristic)
            .cloned()
            .unwrap_or(Err(TransportError::CharacteristicNotFound(characteristic)))
    }

    async fn write_characteristic(
        &self,
        _handle: &String,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        if let Some(failure) = self.write_failures.lock().unwrap().get(&characteristic) {
            return Err(failure.clone());
        }
        self.writes
            .lock()
            .unwrap()
            .push((characteristic, payload.to_vec(), with_response));
        Ok(())
    }

    async fn disconnect(&self, _address: &str) -> Result<(), TransportError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
