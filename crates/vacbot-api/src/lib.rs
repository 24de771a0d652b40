// vacbot-api: transports for VacBot floor cleaners.
//
// Two structurally different channels to the same robot, local-network
// HTTP and Bluetooth LE GATT, behind one `RobotTransport` trait, plus the
// time-boxed BLE discovery scanner and an explicit simulation mode.

pub mod ble;
pub mod codec;
pub mod error;
pub mod models;
pub mod simulated;
pub mod transport;
pub mod wifi;

pub use ble::{
    BlePlatform, BleState, BleTimeouts, BleTransport, BtleplugPlatform, DiscoveryScanner,
    GattSession, ScanHandle, ScanOptions,
};
pub use error::Error;
pub use models::{
    CommandRequest, ConnectivityState, DiscoveredDevice, MapSnapshot, RobotCommand, RobotStatus,
    ScheduleEntry, Validate,
};
pub use simulated::{SimulatedPlatform, SimulatedTransport};
pub use transport::{RobotTransport, TransportConfig, TransportKind};
pub use wifi::WifiTransport;
