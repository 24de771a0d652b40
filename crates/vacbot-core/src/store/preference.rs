// ── Persisted connection preference ──
//
// Which transport and target the user chose. Stored as one JSON record
// under a single key so a save is never observed half-written.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

/// Storage key of the preference record.
pub const PREFERENCE_KEY: &str = "robotConnection";

// ── Storage primitive ────────────────────────────────────────────────

/// Host key-value storage. `set` must replace the value atomically.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Process-local storage for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| io::Error::other("memory storage lock poisoned"))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.values()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}

// ── Preference ───────────────────────────────────────────────────────

/// The transport the user selected. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionPreference {
    #[default]
    None,
    Wifi {
        address: String,
    },
    Ble {
        device_id: String,
    },
}

impl ConnectionPreference {
    pub fn wifi(address: impl Into<String>) -> Self {
        Self::Wifi {
            address: address.into(),
        }
    }

    pub fn ble(device_id: impl Into<String>) -> Self {
        Self::Ble {
            device_id: device_id.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Wire name of the kind: `wifi`, `ble` or `none`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Wifi { .. } => "wifi",
            Self::Ble { .. } => "ble",
        }
    }

    /// Address or device id, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Wifi { address } => Some(address),
            Self::Ble { device_id } => Some(device_id),
        }
    }
}

impl fmt::Display for ConnectionPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{} {target}", self.kind()),
            None => f.write_str("none"),
        }
    }
}

/// Persisted form.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferenceRecord {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wifi_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ble_device_id: Option<String>,
}

impl From<&ConnectionPreference> for PreferenceRecord {
    fn from(pref: &ConnectionPreference) -> Self {
        let mut record = Self {
            kind: pref.kind().to_owned(),
            wifi_address: None,
            ble_device_id: None,
        };
        match pref {
            ConnectionPreference::None => {}
            ConnectionPreference::Wifi { address } => record.wifi_address = Some(address.clone()),
            ConnectionPreference::Ble { device_id } => {
                record.ble_device_id = Some(device_id.clone());
            }
        }
        record
    }
}

impl TryFrom<PreferenceRecord> for ConnectionPreference {
    type Error = String;

    fn try_from(record: PreferenceRecord) -> Result<Self, Self::Error> {
        let non_empty = |v: Option<String>, field: &str| {
            v.filter(|s| !s.trim().is_empty())
                .ok_or_else(|| format!("kind '{}' without {field}", record.kind))
        };
        match record.kind.as_str() {
            "none" => Ok(Self::None),
            "wifi" => Ok(Self::Wifi {
                address: non_empty(record.wifi_address.clone(), "wifiAddress")?,
            }),
            "ble" => Ok(Self::Ble {
                device_id: non_empty(record.ble_device_id.clone(), "bleDeviceId")?,
            }),
            other => Err(format!("unknown kind '{other}'")),
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────

/// Durable home of the `ConnectionPreference`. No network I/O.
#[derive(Clone)]
pub struct ConnectionPreferenceStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl ConnectionPreferenceStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read the stored preference. Missing, unreadable or malformed
    /// records all read as `None`.
    pub fn load(&self) -> ConnectionPreference {
        let raw = match self.storage.get(PREFERENCE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ConnectionPreference::None,
            Err(e) => {
                warn!(error = %e, "preference storage unreadable, treating as none");
                return ConnectionPreference::None;
            }
        };

        let parsed = serde_json::from_str::<PreferenceRecord>(&raw)
            .map_err(|e| e.to_string())
            .and_then(ConnectionPreference::try_from);
        match parsed {
            Ok(pref) => {
                debug!(preference = %pref, "loaded connection preference");
                pref
            }
            Err(reason) => {
                warn!(%reason, "malformed connection preference ignored");
                ConnectionPreference::None
            }
        }
    }

    /// Replace the stored preference with `pref` in one write.
    pub fn save(&self, pref: &ConnectionPreference) -> Result<(), CoreError> {
        let record = PreferenceRecord::from(pref);
        let raw = serde_json::to_string(&record).map_err(|e| CoreError::Storage {
            message: format!("failed to serialize preference: {e}"),
        })?;
        self.storage
            .set(PREFERENCE_KEY, &raw)
            .map_err(|e| CoreError::Storage {
                message: format!("failed to persist preference: {e}"),
            })?;
        debug!(preference = %pref, "saved connection preference");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CoreError> {
        self.storage
            .remove(PREFERENCE_KEY)
            .map_err(|e| CoreError::Storage {
                message: format!("failed to clear preference: {e}"),
            })?;
        debug!("cleared connection preference");
        Ok(())
    }

    /// Persist `pref`, removing the record entirely for `None`.
    pub(crate) fn store(&self, pref: &ConnectionPreference) -> Result<(), CoreError> {
        if pref.is_none() {
            self.clear()
        } else {
            self.save(pref)
        }
    }
}
