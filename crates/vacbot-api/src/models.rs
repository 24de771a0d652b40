// Wire types shared by every transport.
//
// Field names follow the device's JSON (camelCase). Each payload that
// crosses a transport boundary implements `Validate` so a decoded value
// is either fully well-formed or rejected.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape checks applied after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.validate().map_err(|e| format!("[{i}]: {e}")))
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Whether a status reflects a live answer from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectivityState {
    #[default]
    Online,
    Offline,
}

/// Robot status as reported by the device (or substituted by the core).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotStatus {
    pub battery_level: u8,
    pub is_cleaning: bool,
    #[serde(default)]
    pub last_cleaned: Option<DateTime<Utc>>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub connectivity_state: ConnectivityState,
}

impl RobotStatus {
    /// Placeholder used when nothing has ever been read from the device.
    pub fn synthetic() -> Self {
        Self {
            battery_level: 0,
            is_cleaning: false,
            last_cleaned: None,
            errors: Vec::new(),
            connectivity_state: ConnectivityState::Offline,
        }
    }

    /// Same status, marked offline.
    pub fn offline(mut self) -> Self {
        self.connectivity_state = ConnectivityState::Offline;
        self
    }

    pub fn is_online(&self) -> bool {
        self.connectivity_state == ConnectivityState::Online
    }
}

impl Validate for RobotStatus {
    fn validate(&self) -> Result<(), String> {
        if self.battery_level > 100 {
            return Err(format!(
                "batteryLevel {} outside 0..=100",
                self.battery_level
            ));
        }
        Ok(())
    }
}

// ── Commands ─────────────────────────────────────────────────────────

/// Motion commands accepted by the robot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RobotCommand {
    Start,
    Stop,
    Dock,
}

/// Body of `POST /command` and of the BLE command characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: RobotCommand,
}

impl From<RobotCommand> for CommandRequest {
    fn from(command: RobotCommand) -> Self {
        Self { command }
    }
}

// ── Schedule ─────────────────────────────────────────────────────────

/// One scheduled cleaning slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Weekday name, full or abbreviated ("Monday", "mon").
    pub day: String,
    /// 24-hour `HH:MM`.
    pub time: String,
}

impl ScheduleEntry {
    pub fn new(day: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            time: time.into(),
        }
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.day.trim().parse().ok()
    }
}

impl Validate for ScheduleEntry {
    fn validate(&self) -> Result<(), String> {
        if self.weekday().is_none() {
            return Err(format!("unknown day '{}'", self.day));
        }
        chrono::NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| format!("time '{}' is not HH:MM", self.time))?;
        Ok(())
    }
}

// ── Map ──────────────────────────────────────────────────────────────

/// Floor map (zones, obstacles, path). Opaque to the core beyond being
/// a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapSnapshot(pub serde_json::Value);

impl MapSnapshot {
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl Validate for MapSnapshot {
    fn validate(&self) -> Result<(), String> {
        if self.0.is_object() {
            Ok(())
        } else {
            Err("map must be a JSON object".into())
        }
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// A peripheral seen during a scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Platform-specific peripheral handle, opaque to callers.
    pub id: String,
    pub name: Option<String>,
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    #[test]
    fn status_accepts_device_json_without_optional_fields() {
        let status: RobotStatus =
            serde_json::from_value(json!({ "batteryLevel": 80, "isCleaning": true })).unwrap();
        assert_eq!(status.battery_level, 80);
        assert!(status.is_online());
        assert!(status.errors.is_empty());
        assert!(status.last_cleaned.is_none());
    }

    #[test]
    fn status_rejects_battery_over_100() {
        let status: RobotStatus =
            serde_json::from_value(json!({ "batteryLevel": 140, "isCleaning": false })).unwrap();
        assert!(status.validate().is_err());
    }

    #[test]
    fn schedule_entry_validation() {
        assert!(ScheduleEntry::new("Monday", "09:30").validate().is_ok());
        assert!(ScheduleEntry::new("sat", "23:05").validate().is_ok());
        assert!(ScheduleEntry::new("Someday", "09:30").validate().is_err());
        assert!(ScheduleEntry::new("Monday", "9.30am").validate().is_err());
    }

    #[test]
    fn schedule_list_reports_offending_index() {
        let list = vec![
            ScheduleEntry::new("Mon", "08:00"),
            ScheduleEntry::new("Tue", "25:00"),
        ];
        let err = list.validate().unwrap_err();
        assert!(err.starts_with("[1]"), "{err}");
    }

    #[test]
    fn command_wire_form_is_lowercase() {
        let body = serde_json::to_value(CommandRequest::from(RobotCommand::Dock)).unwrap();
        assert_eq!(body, json!({ "command": "dock" }));
        assert_eq!("START".parse::<RobotCommand>().unwrap(), RobotCommand::Start);
    }

    #[test]
    fn map_must_be_object() {
        assert!(MapSnapshot(json!({ "zones": [] })).validate().is_ok());
        assert!(MapSnapshot(json!([1, 2])).validate().is_err());
    }
}
