//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code per category.

use miette::Diagnostic;
use thiserror::Error;

use vacbot_config::ConfigError;
use vacbot_core::CoreError;

/// Process exit codes, one per failure category.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_CONFIGURED: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const BUSY: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const UNAVAILABLE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection choice ────────────────────────────────────────────

    #[error("No robot connection configured")]
    #[diagnostic(
        code(vacbot::no_connection),
        help(
            "Run: vacbot connect wifi <ADDRESS>\n\
             Or:  vacbot scan, then vacbot connect ble <DEVICE_ID>"
        )
    )]
    NoConnection,

    #[error("Invalid robot address '{address}': {reason}")]
    #[diagnostic(
        code(vacbot::invalid_address),
        help("Use host or host:port, e.g. 192.168.1.40 or vacbot.local:8080")
    )]
    InvalidAddress { address: String, reason: String },

    #[error("Device '{id}' not found")]
    #[diagnostic(
        code(vacbot::not_found),
        help("Run: vacbot scan to see robots in range")
    )]
    DeviceNotFound { id: String },

    // ── Capability ───────────────────────────────────────────────────

    #[error("Transport unavailable: {reason}")]
    #[diagnostic(
        code(vacbot::unavailable),
        help(
            "Turn Bluetooth on, or connect over Wi-Fi instead.\n\
             Try the CLI without hardware: vacbot --simulate status"
        )
    )]
    Unavailable { reason: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(vacbot::permission_denied),
        help("Grant this terminal Bluetooth access in your system settings.")
    )]
    PermissionDenied { message: String },

    // ── Reachability ─────────────────────────────────────────────────

    #[error("Cannot reach robot at {target}")]
    #[diagnostic(
        code(vacbot::unreachable),
        help(
            "{reason}\n\
             Check that the robot is powered on and on the same network."
        )
    )]
    Unreachable { target: String, reason: String },

    #[error("Robot is not connected")]
    #[diagnostic(
        code(vacbot::not_connected),
        help("Move closer to the robot and try again.")
    )]
    NotConnected,

    #[error("Robot did not answer {operation} within {millis}ms")]
    #[diagnostic(
        code(vacbot::timeout),
        help("Increase the deadline with --timeout or check that the robot is in range.")
    )]
    Timeout { operation: String, millis: u64 },

    #[error("Robot connection is busy with another operation")]
    #[diagnostic(code(vacbot::busy), help("Wait for the running command to finish."))]
    Busy,

    // ── Robot replies ────────────────────────────────────────────────

    #[error("Robot rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(vacbot::rejected))]
    Rejected { status: u16, message: String },

    #[error("Robot sent a malformed {what}: {message}")]
    #[diagnostic(
        code(vacbot::bad_payload),
        help("The robot firmware may not match this client version.")
    )]
    BadPayload { what: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vacbot::validation))]
    Validation { field: String, reason: String },

    // ── Configuration & storage ──────────────────────────────────────

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(vacbot::config),
        help(
            "Fix the file at {path}\n\
             Or regenerate it with: vacbot config init --yes"
        )
    )]
    Config { message: String, path: String },

    #[error("Could not persist client state: {message}")]
    #[diagnostic(code(vacbot::storage))]
    Storage { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vacbot::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(vacbot::output))]
    Output(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(vacbot::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConnection => exit_code::NOT_CONFIGURED,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Unavailable { .. } => exit_code::UNAVAILABLE,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Unreachable { .. } | Self::NotConnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Busy => exit_code::BUSY,
            Self::InvalidAddress { .. }
            | Self::Validation { .. }
            | Self::Config { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TransportUnavailable { reason } => CliError::Unavailable { reason },
            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },
            CoreError::Timeout {
                operation,
                timeout_ms,
            } => CliError::Timeout {
                operation,
                millis: timeout_ms,
            },
            CoreError::Unreachable { target, reason } => CliError::Unreachable { target, reason },
            CoreError::DeviceNotFound { id } => CliError::DeviceNotFound { id },
            CoreError::InvalidAddress { address, reason } => {
                CliError::InvalidAddress { address, reason }
            }
            CoreError::Rejected { status, message } => CliError::Rejected { status, message },
            CoreError::Decode { what, message } => CliError::BadPayload { what, message },
            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::NoTransport => CliError::NoConnection,
            CoreError::NotConnected => CliError::NotConnected,
            CoreError::TransportBusy => CliError::Busy,
            CoreError::Storage { message } => CliError::Storage { message },
            CoreError::Config { message } => CliError::Config {
                message,
                path: vacbot_config::config_path().display().to_string(),
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: vacbot_config::config_path().display().to_string(),
            },
        }
    }
}
