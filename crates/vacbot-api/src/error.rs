use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `vacbot-api` crate.
///
/// Covers every failure mode across both transports and discovery.
/// `vacbot-core` maps these into user-facing diagnostics without
/// collapsing the category.
#[derive(Debug, Error)]
pub enum Error {
    // ── Capability ──────────────────────────────────────────────────
    /// The radio or platform capability is missing (no adapter, sandboxed
    /// host, BLE disabled in config). Not retryable in this runtime.
    #[error("Transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    /// The OS refused access; the user must grant it before retrying.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Reachability ────────────────────────────────────────────────
    /// Bounded wait exceeded.
    #[error("Timed out after {}ms waiting for {operation}", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// Target not responding (connection refused, link dropped, etc.)
    #[error("Device at {target} is unreachable: {reason}")]
    Unreachable { target: String, reason: String },

    /// Target not found among known peripherals.
    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    /// The address could not be turned into a request URL.
    #[error("Invalid device address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The device answered with a non-success HTTP status.
    #[error("Device rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Payload did not match the expected shape, with the raw body for debugging.
    #[error("Malformed {what} payload: {message}")]
    Decode {
        what: &'static str,
        message: String,
        body: String,
    },

    // ── Lifecycle ───────────────────────────────────────────────────
    /// Operation attempted before the transport is connected.
    #[error("Transport is not connected")]
    NotConnected,

    /// Another exchange holds the channel.
    #[error("Transport is busy with another operation")]
    TransportBusy,

    // ── Platform ────────────────────────────────────────────────────
    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Http(#[source] reqwest::Error),

    /// Unclassified BLE stack failure.
    #[error("Bluetooth error: {0}")]
    Bluetooth(String),
}

impl Error {
    /// Returns `true` if the caller may reasonably retry the same call.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Unreachable { .. } | Self::TransportBusy
        )
    }

    /// Returns `true` if the error reflects the transport lifecycle rather
    /// than the device's answer.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::NotConnected | Self::TransportBusy)
    }

    pub(crate) fn decode(what: &'static str, err: impl std::fmt::Display, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        Self::Decode {
            what,
            message: err.to_string(),
            body,
        }
    }
}

// ── Conversion from the BLE stack ────────────────────────────────────

impl From<btleplug::Error> for Error {
    fn from(err: btleplug::Error) -> Self {
        match err {
            btleplug::Error::PermissionDenied => Self::PermissionDenied {
                message: "Bluetooth access was refused by the operating system".into(),
            },
            btleplug::Error::DeviceNotFound => Self::DeviceNotFound {
                id: "<unknown>".into(),
            },
            btleplug::Error::NotConnected => Self::NotConnected,
            btleplug::Error::TimedOut(timeout) => Self::Timeout {
                operation: "bluetooth operation",
                timeout,
            },
            btleplug::Error::NotSupported(what) => Self::TransportUnavailable { reason: what },
            other => Self::Bluetooth(other.to_string()),
        }
    }
}
