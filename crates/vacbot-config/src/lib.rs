//! Shared configuration for VacBot hosts.
//!
//! TOML settings, environment overrides, platform paths, and translation
//! to `vacbot_core::ClientConfig`. Also provides the file-backed storage
//! primitive the core persists its connection preference through.

mod storage;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vacbot_core::{BleTimeouts, ClientConfig, ScanOptions};

pub use storage::FileStorage;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub wifi: WifiSettings,

    #[serde(default)]
    pub ble: BleSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Directory for persisted client state. Defaults to the platform
    /// data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WifiSettings {
    /// Per-request deadline.
    #[serde(default = "default_wifi_timeout")]
    pub timeout_secs: u64,
}

impl Default for WifiSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_wifi_timeout(),
        }
    }
}

fn default_wifi_timeout() -> u64 {
    7
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_op_timeout")]
    pub op_timeout_secs: u64,

    /// Time budget of one discovery session.
    #[serde(default = "default_scan_secs")]
    pub scan_secs: u64,

    /// Advertised-name fragments of the product family.
    #[serde(default = "default_name_patterns")]
    pub name_patterns: Vec<String>,
}

impl Default for BleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            connect_timeout_secs: default_connect_timeout(),
            op_timeout_secs: default_op_timeout(),
            scan_secs: default_scan_secs(),
            name_patterns: default_name_patterns(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_connect_timeout() -> u64 {
    15
}
fn default_op_timeout() -> u64 {
    8
}
fn default_scan_secs() -> u64 {
    10
}
fn default_name_patterns() -> Vec<String> {
    ScanOptions::default().name_patterns
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_latency")]
    pub latency_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            latency_ms: default_latency(),
        }
    }
}

fn default_latency() -> u64 {
    400
}

impl Config {
    /// Check the values that cannot be expressed in the types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("wifi.timeout_secs", self.wifi.timeout_secs),
            ("ble.connect_timeout_secs", self.ble.connect_timeout_secs),
            ("ble.op_timeout_secs", self.ble.op_timeout_secs),
            ("ble.scan_secs", self.ble.scan_secs),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.ble.name_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: "ble.name_patterns".into(),
                reason: "patterns must not be blank".into(),
            });
        }
        Ok(())
    }

    /// Translate into the core's runtime configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            http_timeout: Duration::from_secs(self.wifi.timeout_secs),
            ble_enabled: self.ble.enabled,
            ble_timeouts: BleTimeouts {
                connect: Duration::from_secs(self.ble.connect_timeout_secs),
                operation: Duration::from_secs(self.ble.op_timeout_secs),
            },
            scan: ScanOptions {
                duration: Duration::from_secs(self.ble.scan_secs),
                name_patterns: self.ble.name_patterns.clone(),
                ..ScanOptions::default()
            },
            simulate: self.simulation.enabled,
            simulation_latency: Duration::from_millis(self.simulation.latency_ms),
            ..defaults
        }
    }

    /// Where persisted client state lives.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_path.clone().unwrap_or_else(data_dir)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "vacbot", "vacbot")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for persisted client state.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("vacbot");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layering: defaults, then the TOML file, then `VACBOT_*` variables
/// (`__` separates sections, e.g. `VACBOT_BLE__SCAN_SECS`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VACBOT_").split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let client = Config::default().to_client_config();
        assert_eq!(client.http_timeout, Duration::from_secs(7));
        assert_eq!(client.ble_timeouts.connect, Duration::from_secs(15));
        assert_eq!(client.ble_timeouts.operation, Duration::from_secs(8));
        assert_eq!(client.scan.duration, Duration::from_secs(10));
        assert_eq!(client.scan.name_patterns, vec!["VacBot", "RoboClean"]);
        assert!(!client.simulate);
        assert!(client.ble_enabled);
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    [wifi]
                    timeout_secs = 3

                    [ble]
                    scan_secs = 20
                    name_patterns = ["Dustmaster"]
                "#,
            )?;
            jail.set_env("VACBOT_BLE__SCAN_SECS", "4");
            jail.set_env("VACBOT_SIMULATION__ENABLED", "true");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.wifi.timeout_secs, 3);
            assert_eq!(config.ble.scan_secs, 4);
            assert_eq!(config.ble.name_patterns, vec!["Dustmaster".to_owned()]);
            assert!(config.simulation.enabled);
            assert_eq!(config.simulation.latency_ms, 400);
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[wifi]\ntimeout_secs = 0\n")?;
            let err = load_config_from(Path::new("config.toml")).unwrap_err();
            assert!(err.to_string().contains("wifi.timeout_secs"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn save_then_load_preserves_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.ble.enabled = false;
        cfg.simulation.latency_ms = 50;
        save_config_to(&cfg, &path).unwrap();

        let loaded: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!loaded.ble.enabled);
        assert_eq!(loaded.simulation.latency_ms, 50);
        assert_eq!(loaded.defaults.output, "table");
    }
}
