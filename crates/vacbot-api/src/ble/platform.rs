// Platform seam for Bluetooth LE.
//
// `BlePlatform` and `GattSession` are the only primitives the scanner and
// the BLE transport consume. The production implementation sits on
// btleplug; capability detection is an explicit constructor that fails
// with a typed `TransportUnavailable` instead of yielding a half-working
// adapter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::uuids::ROBOT_SERVICE_UUID;
use crate::error::Error;
use crate::models::DiscoveredDevice;

/// Scan control and connection primitives of the host's BLE stack.
#[async_trait]
pub trait BlePlatform: Send + Sync {
    /// Begin an unfiltered scan. Filtering happens in the scanner.
    async fn start_scan(&self) -> Result<(), Error>;

    async fn stop_scan(&self) -> Result<(), Error>;

    /// Everything the adapter has seen so far in the current scan.
    async fn peripherals(&self) -> Result<Vec<DiscoveredDevice>, Error>;

    /// Connect, discover services, and verify the robot service exists.
    async fn open(&self, device_id: &str) -> Result<Arc<dyn GattSession>, Error>;
}

/// A connected GATT peripheral exposing the robot service.
#[async_trait]
pub trait GattSession: Send + Sync {
    fn device_id(&self) -> &str;

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, Error>;

    /// Write with response; returns once the peripheral acknowledged.
    async fn write(&self, characteristic: Uuid, value: &[u8]) -> Result<(), Error>;

    async fn is_connected(&self) -> bool;

    async fn disconnect(&self) -> Result<(), Error>;
}

// ── btleplug implementation ──────────────────────────────────────────

/// The host adapter, owned by whoever detected it.
pub struct BtleplugPlatform {
    // Dropping the manager tears down the platform event loop.
    _manager: Manager,
    adapter: Adapter,
}

/// Bound on acquiring the adapter; a wedged stack counts as no stack.
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(5);

impl BtleplugPlatform {
    /// Probe the host for a usable Bluetooth adapter.
    pub async fn detect() -> Result<Self, Error> {
        bounded_detect(DETECT_TIMEOUT, Self::probe()).await
    }

    async fn probe() -> Result<Self, Error> {
        let manager = Manager::new()
            .await
            .map_err(|e| capability_error("Bluetooth manager init failed", e))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| capability_error("failed to list Bluetooth adapters", e))?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| Error::TransportUnavailable {
                reason: "no Bluetooth adapter found".into(),
            })?;

        match adapter.adapter_info().await {
            Ok(info_str) => info!(adapter = %info_str, "bluetooth adapter ready"),
            Err(e) => debug!(error = %e, "adapter info unavailable"),
        }

        Ok(Self {
            _manager: manager,
            adapter,
        })
    }

    async fn find(&self, device_id: &str) -> Result<Peripheral, Error> {
        self.adapter
            .peripherals()
            .await
            .map_err(Error::from)?
            .into_iter()
            .find(|p| p.id().to_string() == device_id)
            .ok_or_else(|| Error::DeviceNotFound {
                id: device_id.to_owned(),
            })
    }
}

#[async_trait]
impl BlePlatform for BtleplugPlatform {
    async fn start_scan(&self) -> Result<(), Error> {
        // Unfiltered: some stacks do not match 128-bit UUIDs in scan
        // responses reliably, so the scanner filters by name instead.
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| capability_error("failed to start scan", e))
    }

    async fn stop_scan(&self) -> Result<(), Error> {
        self.adapter.stop_scan().await.map_err(Error::from)
    }

    async fn peripherals(&self) -> Result<Vec<DiscoveredDevice>, Error> {
        let peripherals = self.adapter.peripherals().await.map_err(Error::from)?;
        let mut found = Vec::with_capacity(peripherals.len());
        for peripheral in peripherals {
            let props = peripheral.properties().await.ok().flatten();
            found.push(DiscoveredDevice {
                id: peripheral.id().to_string(),
                name: props.as_ref().and_then(|p| p.local_name.clone()),
                rssi: props.and_then(|p| p.rssi),
            });
        }
        Ok(found)
    }

    async fn open(&self, device_id: &str) -> Result<Arc<dyn GattSession>, Error> {
        let peripheral = self.find(device_id).await?;

        debug!(device_id, "connecting");
        peripheral
            .connect()
            .await
            .map_err(|e| target_error(device_id, e))?;

        if let Err(e) = peripheral.discover_services().await {
            let _ = peripheral.disconnect().await;
            return Err(target_error(device_id, e));
        }

        let characteristics: HashMap<Uuid, Characteristic> = peripheral
            .characteristics()
            .into_iter()
            .filter(|c| c.service_uuid == ROBOT_SERVICE_UUID)
            .map(|c| (c.uuid, c))
            .collect();

        if characteristics.is_empty() {
            let _ = peripheral.disconnect().await;
            return Err(Error::Unreachable {
                target: device_id.to_owned(),
                reason: "peripheral does not expose the robot control service".into(),
            });
        }

        info!(device_id, characteristics = characteristics.len(), "gatt session open");
        Ok(Arc::new(BtleplugSession {
            id: device_id.to_owned(),
            peripheral,
            characteristics,
        }))
    }
}

struct BtleplugSession {
    id: String,
    peripheral: Peripheral,
    characteristics: HashMap<Uuid, Characteristic>,
}

impl BtleplugSession {
    fn characteristic(&self, uuid: Uuid, needs: CharPropFlags) -> Result<&Characteristic, Error> {
        let characteristic = self
            .characteristics
            .get(&uuid)
            .ok_or_else(|| Error::Bluetooth(format!("characteristic {uuid} not exposed")))?;
        if !characteristic.properties.contains(needs) {
            return Err(Error::Bluetooth(format!(
                "characteristic {uuid} lacks {needs:?}"
            )));
        }
        Ok(characteristic)
    }
}

#[async_trait]
impl GattSession for BtleplugSession {
    fn device_id(&self) -> &str {
        &self.id
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, Error> {
        let ch = self.characteristic(characteristic, CharPropFlags::READ)?;
        self.peripheral
            .read(ch)
            .await
            .map_err(|e| target_error(&self.id, e))
    }

    async fn write(&self, characteristic: Uuid, value: &[u8]) -> Result<(), Error> {
        let ch = self.characteristic(characteristic, CharPropFlags::WRITE)?;
        self.peripheral
            .write(ch, value, WriteType::WithResponse)
            .await
            .map_err(|e| target_error(&self.id, e))
    }

    async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<(), Error> {
        self.peripheral
            .disconnect()
            .await
            .map_err(|e| target_error(&self.id, e))
    }
}

async fn bounded_detect<T>(
    limit: Duration,
    probe: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    tokio::time::timeout(limit, probe).await.unwrap_or_else(|_| {
        warn!(timeout_ms = limit.as_millis(), "bluetooth adapter detection timed out");
        Err(Error::TransportUnavailable {
            reason: format!(
                "Bluetooth stack did not answer within {}s",
                limit.as_secs()
            ),
        })
    })
}

/// Failures while acquiring the radio are capability failures unless the
/// OS said no.
fn capability_error(context: &str, err: btleplug::Error) -> Error {
    match err {
        btleplug::Error::PermissionDenied => Error::PermissionDenied {
            message: context.to_owned(),
        },
        other => {
            warn!(error = %other, "{context}");
            Error::TransportUnavailable {
                reason: format!("{context}: {other}"),
            }
        }
    }
}

fn target_error(device_id: &str, err: btleplug::Error) -> Error {
    match Error::from(err) {
        Error::DeviceNotFound { .. } => Error::DeviceNotFound {
            id: device_id.to_owned(),
        },
        Error::Bluetooth(reason) => Error::Unreachable {
            target: device_id.to_owned(),
            reason,
        },
        other => other,
    }
}
