#![allow(dead_code, clippy::unwrap_used)]
// Scriptable BLE platform and GATT session for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use vacbot_api::{BlePlatform, DiscoveredDevice, Error, GattSession};

pub fn device(id: &str, name: Option<&str>) -> DiscoveredDevice {
    DiscoveredDevice {
        id: id.to_owned(),
        name: name.map(str::to_owned),
        rssi: Some(-55),
    }
}

// ── Platform ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPlatform {
    /// Successive `peripherals()` answers; the last frame repeats.
    frames: Mutex<Vec<Vec<DiscoveredDevice>>>,
    sessions: Mutex<HashMap<String, Arc<MockSession>>>,
    pub unavailable: AtomicBool,
    /// Radio calls that never answer.
    pub stall_listing: AtomicBool,
    pub stall_start: AtomicBool,
    pub stall_stop: AtomicBool,
    pub open_delay: Mutex<Option<Duration>>,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_frames(frames: Vec<Vec<DiscoveredDevice>>) -> Arc<Self> {
        let platform = Self::default();
        *platform.frames.lock().unwrap() = frames;
        Arc::new(platform)
    }

    pub fn add_session(&self, session: Arc<MockSession>) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }

    pub fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlePlatform for MockPlatform {
    async fn start_scan(&self) -> Result<(), Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::TransportUnavailable {
                reason: "no adapter".into(),
            });
        }
        if self.stall_start.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), Error> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_stop.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn peripherals(&self) -> Result<Vec<DiscoveredDevice>, Error> {
        if self.stall_listing.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut frames = self.frames.lock().unwrap();
        let frame = if frames.len() > 1 {
            frames.remove(0)
        } else {
            frames.first().cloned().unwrap_or_default()
        };
        Ok(frame)
    }

    async fn open(&self, device_id: &str) -> Result<Arc<dyn GattSession>, Error> {
        let delay = *self.open_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let session = self
            .sessions
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound {
                id: device_id.to_owned(),
            })?;
        session.connected.store(true, Ordering::SeqCst);
        Ok(session as Arc<dyn GattSession>)
    }
}

// ── Session ─────────────────────────────────────────────────────────

pub struct MockSession {
    pub id: String,
    values: Mutex<HashMap<Uuid, Vec<u8>>>,
    pub writes: Mutex<Vec<(Uuid, Vec<u8>)>>,
    pub write_delay: Duration,
    pub connected: AtomicBool,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl MockSession {
    pub fn new(id: &str) -> Arc<Self> {
        Self::with_write_delay(id, Duration::ZERO)
    }

    pub fn with_write_delay(id: &str, write_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            values: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            write_delay,
            connected: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        })
    }

    pub fn set_value(&self, characteristic: Uuid, value: &[u8]) {
        self.values
            .lock()
            .unwrap()
            .insert(characteristic, value.to_vec());
    }

    /// Simulate the peripheral walking out of range.
    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn link_check(&self) -> Result<(), Error> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unreachable {
                target: self.id.clone(),
                reason: "link lost".into(),
            })
        }
    }
}

#[async_trait]
impl GattSession for MockSession {
    fn device_id(&self) -> &str {
        &self.id
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, Error> {
        self.link_check()?;
        self.values
            .lock()
            .unwrap()
            .get(&characteristic)
            .cloned()
            .ok_or_else(|| Error::Bluetooth(format!("characteristic {characteristic} not exposed")))
    }

    async fn write(&self, characteristic: Uuid, value: &[u8]) -> Result<(), Error> {
        self.link_check()?;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Deliver the value in two halves so overlapping writers would
        // interleave in the log.
        let mid = value.len() / 2;
        let mut delivered = value[..mid].to_vec();
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        delivered.extend_from_slice(&value[mid..]);
        self.writes.lock().unwrap().push((characteristic, delivered));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<(), Error> {
        self.connected.store(false, Ordering::SeqCst);
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
