// Bluetooth LE: discovery, GATT sessions, and the robot transport.

pub mod platform;
pub mod scanner;
pub mod transport;
pub mod uuids;

pub use platform::{BlePlatform, BtleplugPlatform, GattSession};
pub use scanner::{DiscoveryScanner, ScanHandle, ScanOptions};
pub use transport::{BleState, BleTimeouts, BleTransport};
