// ── Core error types ──
//
// Errors surfaced by the connectivity core. The `From<vacbot_api::Error>`
// impl keeps the transport category intact (timeout stays timeout,
// unreachable stays unreachable) so hosts can pick the right message and
// retry affordance without inspecting transport internals.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Capability ───────────────────────────────────────────────────
    #[error("Transport unavailable: {reason}")]
    TransportUnavailable { reason: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // ── Reachability ─────────────────────────────────────────────────
    #[error("Robot did not answer {operation} within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Cannot reach robot at {target}: {reason}")]
    Unreachable { target: String, reason: String },

    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("Invalid robot address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Robot rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Robot sent a malformed {what} payload: {message}")]
    Decode { what: String, message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("No robot connection configured")]
    NoTransport,

    #[error("Robot is not connected")]
    NotConnected,

    #[error("Robot connection is busy with another operation")]
    TransportBusy,

    // ── Host ─────────────────────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether repeating the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Unreachable { .. }
                | Self::TransportBusy
                | Self::NotConnected
        )
    }

    /// Whether the failure means the link itself is gone (as opposed to
    /// the robot answering badly).
    pub(crate) fn is_link_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Unreachable { .. } | Self::NotConnected
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vacbot_api::Error> for CoreError {
    fn from(err: vacbot_api::Error) -> Self {
        use vacbot_api::Error as Api;

        match err {
            Api::TransportUnavailable { reason } => Self::TransportUnavailable { reason },
            Api::PermissionDenied { message } => Self::PermissionDenied { message },
            Api::Timeout { operation, timeout } => Self::Timeout {
                operation: operation.to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            Api::Unreachable { target, reason } => Self::Unreachable { target, reason },
            Api::DeviceNotFound { id } => Self::DeviceNotFound { id },
            Api::InvalidAddress { address, reason } => Self::InvalidAddress { address, reason },
            Api::Rejected { status, message } => Self::Rejected { status, message },
            Api::Decode {
                what,
                message,
                body: _,
            } => Self::Decode {
                what: what.to_owned(),
                message,
            },
            Api::NotConnected => Self::NotConnected,
            Api::TransportBusy => Self::TransportBusy,
            Api::Http(e) => Self::Config {
                message: format!("HTTP client setup failed: {e}"),
            },
            Api::Bluetooth(reason) => Self::Internal(format!("Bluetooth stack error: {reason}")),
        }
    }
}
