// ── Runtime client configuration ──
//
// How the core builds and bounds its transports. Never touches disk: the
// host (CLI, app shell) constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use vacbot_api::simulated::DEFAULT_LATENCY;
use vacbot_api::transport::DEFAULT_HTTP_TIMEOUT;

pub use vacbot_api::ble::scanner::ScanOptions;
pub use vacbot_api::ble::transport::BleTimeouts;

/// Longest a command waits for a previous command to finish.
pub const DEFAULT_COMMAND_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request deadline of the local HTTP transport.
    pub http_timeout: Duration,
    /// When false, BLE preferences and scans fail `TransportUnavailable`.
    pub ble_enabled: bool,
    pub ble_timeouts: BleTimeouts,
    pub scan: ScanOptions,
    /// Serve every preference from an in-memory robot.
    pub simulate: bool,
    pub simulation_latency: Duration,
    pub command_wait: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            ble_enabled: true,
            ble_timeouts: BleTimeouts::default(),
            scan: ScanOptions::default(),
            simulate: false,
            simulation_latency: DEFAULT_LATENCY,
            command_wait: DEFAULT_COMMAND_WAIT,
        }
    }
}
