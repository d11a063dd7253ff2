pub mod connection;
pub mod scanner;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use connection::{connect, Session};
pub use scanner::{discover_sensor, DiscoveryOptions};
pub use transport::{BleTransport, BluerTransport};
