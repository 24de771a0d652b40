// Transport strategy and shared HTTP client configuration.
//
// Every concrete channel to the robot (local HTTP, BLE, simulation)
// implements `RobotTransport`; the core only ever talks to this trait.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{MapSnapshot, RobotCommand, RobotStatus, ScheduleEntry};

/// Default per-request deadline for the local HTTP transport.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(7);

/// Which concrete channel a transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Wifi,
    Ble,
    Simulated,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wifi => "wifi",
            Self::Ble => "ble",
            Self::Simulated => "simulated",
        })
    }
}

/// Uniform status / command / schedule / map surface over one live channel.
///
/// Implementations never retry: each call is one bounded exchange with
/// the device, and retry policy belongs to the caller.
#[async_trait]
pub trait RobotTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Human-readable target (address or peripheral id) for logs.
    fn target(&self) -> String;

    async fn status(&self) -> Result<RobotStatus, Error>;

    async fn send_command(&self, command: RobotCommand) -> Result<(), Error>;

    async fn get_schedule(&self) -> Result<Vec<ScheduleEntry>, Error>;

    async fn set_schedule(&self, entry: &ScheduleEntry) -> Result<(), Error>;

    async fn get_map(&self) -> Result<MapSnapshot, Error>;

    /// Release the underlying channel. Idempotent.
    async fn disconnect(&self);
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: concat!("vacbot/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// Robots sit on the local network, so proxies are bypassed and the
    /// connect phase shares the request deadline.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .no_proxy()
            .build()
            .map_err(Error::Http)
    }
}
