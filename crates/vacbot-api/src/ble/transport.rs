// Bluetooth LE transport
//
// Connection lifecycle over a `BlePlatform`, plus characteristic-level
// encoding of the robot payloads. Reads decode a characteristic value;
// writes always go out with response so delivery is acknowledged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::platform::{BlePlatform, GattSession};
use crate::ble::uuids::{COMMAND_CHAR_UUID, MAP_CHAR_UUID, SCHEDULE_CHAR_UUID, STATUS_CHAR_UUID};
use crate::codec;
use crate::error::Error;
use crate::models::{CommandRequest, MapSnapshot, RobotCommand, RobotStatus, ScheduleEntry, Validate};
use crate::transport::{RobotTransport, TransportKind};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(8);

/// Lifecycle of the BLE link.
///
/// `Error` ends the current GATT session; only `disconnect()` or a fresh
/// `connect()` leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

#[derive(Debug, Clone, Copy)]
pub struct BleTimeouts {
    /// Connection plus service discovery.
    pub connect: Duration,
    /// One characteristic read or write, and the wait for the write slot.
    pub operation: Duration,
}

impl Default for BleTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            operation: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// GATT-backed robot transport. Holds at most one session.
pub struct BleTransport {
    platform: Arc<dyn BlePlatform>,
    timeouts: BleTimeouts,
    state: watch::Sender<BleState>,
    session: Mutex<Option<Arc<dyn GattSession>>>,
    /// Serializes connect / disconnect.
    lifecycle: Mutex<()>,
    /// Serializes writes so command bytes never interleave on the channel.
    exchange: Mutex<()>,
}

impl BleTransport {
    pub fn new(platform: Arc<dyn BlePlatform>, timeouts: BleTimeouts) -> Self {
        let (state, _) = watch::channel(BleState::Disconnected);
        Self {
            platform,
            timeouts,
            state,
            session: Mutex::new(None),
            lifecycle: Mutex::new(()),
            exchange: Mutex::new(()),
        }
    }

    pub fn state(&self) -> BleState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BleState> {
        self.state.subscribe()
    }

    /// Peripheral id of the current session, if any.
    pub async fn device_id(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| s.device_id().to_owned())
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to `device_id` and discover the robot service.
    ///
    /// One attempt, bounded by the connect timeout. A connect issued while
    /// another is in flight fails with `TransportBusy`.
    pub async fn connect(&self, device_id: &str) -> Result<(), Error> {
        let Ok(_guard) = self.lifecycle.try_lock() else {
            return Err(Error::TransportBusy);
        };

        if self.state() == BleState::Connected
            && self.device_id().await.as_deref() == Some(device_id)
        {
            debug!(device_id, "already connected");
            return Ok(());
        }
        // A failed teardown is logged and the stale session dropped anyway.
        let _ = self.teardown().await;

        self.state.send_replace(BleState::Connecting);
        debug!(device_id, "ble connecting");

        let opened = tokio::time::timeout(self.timeouts.connect, self.platform.open(device_id)).await;
        match opened {
            Ok(Ok(session)) => {
                *self.session.lock().await = Some(session);
                self.state.send_replace(BleState::Connected);
                info!(device_id, "ble connected");
                Ok(())
            }
            Ok(Err(e)) => {
                self.state.send_replace(BleState::Disconnected);
                warn!(device_id, error = %e, "ble connect failed");
                Err(e)
            }
            Err(_) => {
                self.state.send_replace(BleState::Disconnected);
                warn!(device_id, "ble connect timed out");
                Err(Error::Timeout {
                    operation: "connect",
                    timeout: self.timeouts.connect,
                })
            }
        }
    }

    /// Drop the session and return to `Disconnected`.
    pub async fn disconnect(&self) -> Result<(), Error> {
        let _guard = self.lifecycle.lock().await;
        let result = self.teardown().await;
        self.state.send_replace(BleState::Disconnected);
        result
    }

    async fn teardown(&self) -> Result<(), Error> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };
        let id = session.device_id().to_owned();
        let result = match tokio::time::timeout(self.timeouts.operation, session.disconnect()).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout {
                operation: "disconnect",
                timeout: self.timeouts.operation,
            }),
        };
        match &result {
            Ok(()) => info!(device_id = %id, "ble disconnected"),
            Err(e) => warn!(device_id = %id, error = %e, "ble disconnect failed (session dropped)"),
        }
        result
    }

    // ── Characteristic exchange ──────────────────────────────────

    async fn live_session(&self) -> Result<Arc<dyn GattSession>, Error> {
        if self.state() != BleState::Connected {
            return Err(Error::NotConnected);
        }
        self.session.lock().await.clone().ok_or(Error::NotConnected)
    }

    async fn read<T>(&self, characteristic: Uuid, what: &'static str) -> Result<T, Error>
    where
        T: DeserializeOwned + Validate,
    {
        let session = self.live_session().await?;
        let raw = self
            .bounded(&session, what, session.read(characteristic))
            .await?;
        codec::decode(what, &raw)
    }

    async fn write<T>(&self, characteristic: Uuid, what: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize + Sync,
    {
        let payload = codec::encode(what, value)?;
        let session = self.live_session().await?;

        let _turn = tokio::time::timeout(self.timeouts.operation, self.exchange.lock())
            .await
            .map_err(|_| Error::TransportBusy)?;

        // The link may have changed while queued.
        if self.state() != BleState::Connected {
            return Err(Error::NotConnected);
        }

        self.bounded(&session, what, session.write(characteristic, &payload))
            .await?;
        debug!(what, bytes = payload.len(), "ble write acknowledged");
        Ok(())
    }

    /// Apply the operation deadline and move to `Error` when the link is
    /// gone.
    async fn bounded<T: Send>(
        &self,
        session: &Arc<dyn GattSession>,
        operation: &'static str,
        fut: impl std::future::Future<Output = Result<T, Error>> + Send,
    ) -> Result<T, Error> {
        let result = match tokio::time::timeout(self.timeouts.operation, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout {
                operation,
                timeout: self.timeouts.operation,
            }),
        };

        if let Err(e) = &result {
            if !session.is_connected().await {
                warn!(operation, error = %e, "ble link lost");
                self.state
                    .send_replace(BleState::Error(format!("link lost during {operation}: {e}")));
            }
        }
        result
    }
}

#[async_trait]
impl RobotTransport for BleTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Ble
    }

    fn target(&self) -> String {
        self.session
            .try_lock()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.device_id().to_owned()))
            .unwrap_or_else(|| "<not connected>".into())
    }

    async fn status(&self) -> Result<RobotStatus, Error> {
        self.read(STATUS_CHAR_UUID, "status").await
    }

    async fn send_command(&self, command: RobotCommand) -> Result<(), Error> {
        self.write(COMMAND_CHAR_UUID, "command", &CommandRequest::from(command))
            .await
    }

    async fn get_schedule(&self) -> Result<Vec<ScheduleEntry>, Error> {
        self.read(SCHEDULE_CHAR_UUID, "schedule").await
    }

    async fn set_schedule(&self, entry: &ScheduleEntry) -> Result<(), Error> {
        self.write(SCHEDULE_CHAR_UUID, "schedule", entry).await
    }

    async fn get_map(&self) -> Result<MapSnapshot, Error> {
        self.read(MAP_CHAR_UUID, "map").await
    }

    async fn disconnect(&self) {
        if let Err(e) = BleTransport::disconnect(self).await {
            debug!(error = %e, "ble disconnect reported an error");
        }
    }
}
