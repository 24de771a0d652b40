//! Connectivity core between `vacbot-api` and host applications.
//!
//! - **[`RobotClient`]** — Façade owning the single live transport.
//!   [`restore()`](RobotClient::restore) reopens the persisted preference
//!   once at start-up; [`switch_transport()`](RobotClient::switch_transport)
//!   moves to a new target and rolls back on failure.
//!   [`status()`](RobotClient::status) never fails: it falls back to the
//!   last cached or synthetic status marked offline.
//!
//! - **[`ConnectionPreferenceStore`]** — The user's transport choice,
//!   persisted as one record through a host [`KeyValueStorage`].
//!
//! - **[`StatusCache`]** — Last successful status, swapped lock-free.
//!
//! - **[`TransportConnector`]** — Builds Wi-Fi, BLE or simulated
//!   transports from a preference; [`DefaultConnector`] is the production
//!   implementation.

pub mod config;
pub mod connector;
pub mod controller;
pub mod error;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{BleTimeouts, ClientConfig, ScanOptions};
pub use connector::{DefaultConnector, TransportConnector};
pub use controller::{ConnectionState, RobotClient};
pub use error::CoreError;
pub use store::{
    ConnectionPreference, ConnectionPreferenceStore, KeyValueStorage, MemoryStorage,
    PREFERENCE_KEY, StatusCache,
};

// Wire types hosts need alongside the façade.
pub use vacbot_api::{
    ConnectivityState, DiscoveredDevice, MapSnapshot, RobotCommand, RobotStatus, ScanHandle,
    ScheduleEntry,
};
