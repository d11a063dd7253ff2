/// Connection lifecycle for a single sensor device
///
/// One connect attempt per invocation: transport connect, then a
/// post-connect liveness check. Whatever the outcome, the transport
/// resource is released exactly once, either on the failure edge here or
/// later through [`Session::close`].
use log::{info, warn};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use crate::bluetooth::transport::BleTransport;
use crate::error::{ConnectionError, TransportError};

/// One live connection to one device.
///
/// Owns the transport handle for its lifetime. At most one session per
/// address is open at a time; the caller releases it with [`Session::close`]
/// on every completion path.
pub struct Session<'a, T: BleTransport> {
    transport: &'a T,
    handle: T::Handle,
    address: String,
}

impl<'a, T: BleTransport> Session<'a, T> {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        self.transport
            .read_characteristic(&self.handle, characteristic)
            .await
    }

    pub async fn write(
        &self,
        characteristic: Uuid,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        self.transport
            .write_characteristic(&self.handle, characteristic, payload, with_response)
            .await
    }

    /// Release the underlying transport connection.
    pub async fn close(self) {
        if let Err(e) = self.transport.disconnect(&self.address).await {
            warn!("Failed to disconnect from {}: {}", self.address, e);
        }
    }
}

/// Establish a connection to `address` within `connect_timeout`.
///
/// Exactly one attempt; retry policy, if any, belongs to the caller via
/// re-invocation. A connection that the transport reports as established
/// but not active fails with `ConnectNotActive` before any telemetry is
/// attempted. Timeout or failure releases the transport before returning.
pub async fn connect<'a, T: BleTransport>(
    transport: &'a T,
    address: &str,
    connect_timeout: Duration,
) -> Result<Session<'a, T>, ConnectionError> {
    let failure = match timeout(connect_timeout, establish(transport, address)).await {
        Ok(Ok(handle)) => {
            info!("Connected to {}", address);
            return Ok(Session {
                transport,
                handle,
                address: address.to_string(),
            });
        }
        Ok(Err(e)) => e,
        Err(_elapsed) => ConnectionError::Timeout,
    };

    // Failed or timed out mid-attempt: release whatever the transport
    // may still hold for this address
    if let Err(e) = transport.disconnect(address).await {
        warn!("Cleanup after failed connect to {} failed: {}", address, e);
    }

    Err(failure)
}

/// Transport connect followed by the post-connect liveness check.
async fn establish<T: BleTransport>(
    transport: &T,
    address: &str,
) -> Result<T::Handle, ConnectionError> {
    let handle = transport.connect(address).await?;

    if !transport.is_connected(&handle).await? {
        return Err(ConnectionError::ConnectNotActive);
    }

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bluetooth::mock::{ConnectBehavior, MockTransport};
    use std::sync::atomic::Ordering;

    const ADDRESS: &str = "A4:C1:38:00:00:01";

    #[tokio::test]
    async fn successful_connect_releases_once_on_close() {
        let transport = MockTransport::new();

        let session = connect(&transport, ADDRESS, Duration::from_secs(1))
            .await
            .expect("connect should succeed");
        assert_eq!(session.address(), ADDRESS);
        assert_eq!(transport.disconnect_calls.load(Ordering::SeqCst), 0);

        session.close().await;
        assert_eq!(transport.disconnect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hanging_connect_times_out_and_releases_transport() {
        let transport = MockTransport::new().with_connect(ConnectBehavior::Hang);

        match connect(&transport, ADDRESS, Duration::from_millis(20)).await {
            Err(e) => assert_eq!(e, ConnectionError::Timeout),
            Ok(_) => panic!("connect should have timed out"),
        }
        assert_eq!(transport.disconnect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inactive_link_fails_liveness_check() {
        let transport = MockTransport::new().with_link_active(false);

        match connect(&transport, ADDRESS, Duration::from_secs(1)).await {
            Err(e) => assert_eq!(e, ConnectionError::ConnectNotActive),
            Ok(_) => panic!("connect should have failed the liveness check"),
        }
        assert_eq!(transport.disconnect_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_released() {
        let transport = MockTransport::new().with_connect(ConnectBehavior::Fail(
            TransportError::Connect("le-connection-abort-by-local".into()),
        ));

        match connect(&transport, ADDRESS, Duration::from_secs(1)).await {
            Err(ConnectionError::Transport(TransportError::Connect(_))) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
            Ok(_) => panic!("connect should have failed"),
        }
        assert_eq!(transport.disconnect_calls.load(Ordering::SeqCst), 1);
    }
}
