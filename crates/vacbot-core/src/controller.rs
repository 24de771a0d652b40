// ── Robot client façade ──
//
// One uniform status / command / schedule / map surface over whichever
// transport the persisted preference selects. Owns the single live
// transport, the status cache and the discovery scanner.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info, warn};
use vacbot_api::{
    DiscoveredDevice, DiscoveryScanner, MapSnapshot, RobotCommand, RobotStatus, RobotTransport,
    ScanHandle, ScheduleEntry, Validate,
};

use crate::config::ClientConfig;
use crate::connector::{DefaultConnector, TransportConnector};
use crate::error::CoreError;
use crate::store::{ConnectionPreference, ConnectionPreferenceStore, KeyValueStorage, StatusCache};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No preference configured.
    NoConnection,
    /// Establishing and verifying a transport.
    Testing,
    Connected,
    /// A preference exists but its transport is not live.
    Disconnected,
}

// ── RobotClient ──────────────────────────────────────────────────

/// The live transport together with the preference it was opened for.
struct Slot {
    preference: ConnectionPreference,
    transport: Option<Arc<dyn RobotTransport>>,
}

/// The entry point for hosts.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Construct it, call
/// [`restore()`](Self::restore) once at start-up, and
/// [`shutdown()`](Self::shutdown) when done.
#[derive(Clone)]
pub struct RobotClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    preferences: ConnectionPreferenceStore,
    cache: StatusCache,
    connector: Arc<dyn TransportConnector>,
    /// Held for writing for the whole of a switch.
    slot: RwLock<Slot>,
    /// Serializes commands against the live transport.
    command_lock: Mutex<()>,
    connection_state: watch::Sender<ConnectionState>,
    scanner: Mutex<Option<Arc<DiscoveryScanner>>>,
}

impl RobotClient {
    /// Create a client using the production connector. Does NOT connect.
    pub fn new(config: ClientConfig, storage: Arc<dyn KeyValueStorage>) -> Self {
        let connector = Arc::new(DefaultConnector::new(config.clone()));
        Self::with_connector(config, storage, connector)
    }

    pub fn with_connector(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStorage>,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::NoConnection);
        Self {
            inner: Arc::new(ClientInner {
                config,
                preferences: ConnectionPreferenceStore::new(storage),
                cache: StatusCache::new(),
                connector,
                slot: RwLock::new(Slot {
                    preference: ConnectionPreference::None,
                    transport: None,
                }),
                command_lock: Mutex::new(()),
                connection_state,
                scanner: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// The preference currently in effect.
    pub async fn preference(&self) -> ConnectionPreference {
        self.inner.slot.read().await.preference.clone()
    }

    /// The preference as persisted. Differs from
    /// [`preference()`](Self::preference) until `restore()` has run.
    pub fn saved_preference(&self) -> ConnectionPreference {
        self.inner.preferences.load()
    }

    pub fn cached_status(&self) -> Option<RobotStatus> {
        self.inner.cache.get()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.inner.connection_state.send_replace(state);
        if previous != state {
            debug!(?previous, current = ?state, "connection state changed");
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Load the persisted preference and make one attempt to open it.
    ///
    /// Never alters the stored preference. On failure the client stays
    /// `Disconnected` and the error is returned for the host to show.
    pub async fn restore(&self) -> Result<(), CoreError> {
        let preference = self.inner.preferences.load();
        let mut slot = self.inner.slot.write().await;

        if slot.transport.is_some()
            && slot.preference == preference
            && self.connection_state() == ConnectionState::Connected
        {
            debug!(%preference, "transport already live");
            return Ok(());
        }
        Self::release(&mut slot).await;
        slot.preference = preference.clone();

        if preference.is_none() {
            self.set_state(ConnectionState::NoConnection);
            return Ok(());
        }

        match self.attach(&mut slot, &preference).await {
            Ok(()) => {
                info!(%preference, "restored robot connection");
                Ok(())
            }
            Err(e) => {
                warn!(%preference, error = %e, "could not restore robot connection");
                Err(e)
            }
        }
    }

    /// Retry the current preference once. Caller-driven; nothing retries
    /// on its own.
    pub async fn reconnect(&self) -> Result<(), CoreError> {
        let mut slot = self.inner.slot.write().await;
        let preference = slot.preference.clone();
        if preference.is_none() {
            return Err(CoreError::NoTransport);
        }

        Self::release(&mut slot).await;
        self.attach(&mut slot, &preference).await
    }

    /// Tear down the live transport, persist `next`, and open it.
    ///
    /// On failure the previous preference is persisted again and one
    /// best-effort attempt is made to reopen its transport; the error of
    /// the new transport is returned either way.
    pub async fn switch_transport(&self, next: ConnectionPreference) -> Result<(), CoreError> {
        let mut slot = self.inner.slot.write().await;
        // Roll back to what is on disk, which may predate `restore()`.
        let previous = self.inner.preferences.load();
        info!(from = %previous, to = %next, "switching transport");

        Self::release(&mut slot).await;

        if next.is_none() {
            self.inner.preferences.clear()?;
            slot.preference = ConnectionPreference::None;
            self.set_state(ConnectionState::NoConnection);
            return Ok(());
        }

        self.set_state(ConnectionState::Testing);
        let result = match self.inner.preferences.save(&next) {
            Ok(()) => self.establish(&next).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(transport) => {
                slot.preference = next;
                slot.transport = Some(transport);
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                warn!(preference = %next, error = %e, "switch failed, restoring previous preference");
                if let Err(store_err) = self.inner.preferences.store(&previous) {
                    warn!(error = %store_err, "failed to restore previous preference");
                }
                self.reopen(&mut slot, previous).await;
                Err(e)
            }
        }
    }

    /// Switch to `None`.
    pub async fn forget(&self) -> Result<(), CoreError> {
        self.switch_transport(ConnectionPreference::None).await
    }

    /// Dispose: stop any scan and release the transport. The stored
    /// preference is kept for the next `restore()`.
    pub async fn shutdown(&self) {
        if let Some(scanner) = self.inner.scanner.lock().await.take() {
            scanner.shutdown().await;
        }
        let mut slot = self.inner.slot.write().await;
        Self::release(&mut slot).await;
        self.set_state(if slot.preference.is_none() {
            ConnectionState::NoConnection
        } else {
            ConnectionState::Disconnected
        });
        debug!("robot client shut down");
    }

    /// Best-effort reopen of `previous` after a failed switch.
    async fn reopen(&self, slot: &mut Slot, previous: ConnectionPreference) {
        slot.preference = previous.clone();
        if previous.is_none() {
            self.set_state(ConnectionState::NoConnection);
            return;
        }
        match self.attach(slot, &previous).await {
            Ok(()) => info!(preference = %previous, "previous transport reopened"),
            Err(e) => {
                warn!(preference = %previous, error = %e, "previous transport could not be reopened");
            }
        }
    }

    /// Open a transport and verify it with one status read.
    async fn establish(
        &self,
        preference: &ConnectionPreference,
    ) -> Result<Arc<dyn RobotTransport>, CoreError> {
        let transport = self.inner.connector.open(preference).await?;
        match self.verify(transport.as_ref()).await {
            Ok(()) => Ok(transport),
            Err(e) => {
                transport.disconnect().await;
                Err(e)
            }
        }
    }

    /// Open `preference` into `slot` and publish the outcome.
    ///
    /// A Wi-Fi transport whose verification read failed stays in the slot
    /// as `Disconnected` and later calls go through it. A BLE link that
    /// failed verification is released.
    async fn attach(
        &self,
        slot: &mut Slot,
        preference: &ConnectionPreference,
    ) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Testing);
        let transport = match self.inner.connector.open(preference).await {
            Ok(transport) => transport,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        match self.verify(transport.as_ref()).await {
            Ok(()) => {
                slot.transport = Some(transport);
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Err(e) => {
                if matches!(preference, ConnectionPreference::Wifi { .. }) {
                    debug!(%preference, "keeping unverified wifi transport for later calls");
                    slot.transport = Some(transport);
                } else {
                    transport.disconnect().await;
                }
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn verify(&self, transport: &dyn RobotTransport) -> Result<(), CoreError> {
        let status = transport.status().await?;
        self.inner.cache.update(status);
        debug!(kind = %transport.kind(), target = %transport.target(), "transport verified");
        Ok(())
    }

    async fn release(slot: &mut Slot) {
        if let Some(transport) = slot.transport.take() {
            debug!(kind = %transport.kind(), target = %transport.target(), "releasing transport");
            transport.disconnect().await;
        }
    }

    // ── Robot operations ─────────────────────────────────────────

    /// Current status. Never fails: without a live transport, or when the
    /// read fails, the last cached (or synthetic) status is returned
    /// marked offline.
    pub async fn status(&self) -> RobotStatus {
        let slot = self.inner.slot.read().await;
        let Some(transport) = slot.transport.clone() else {
            return self.inner.cache.fallback();
        };

        match transport.status().await {
            Ok(status) => {
                self.inner.cache.update(status.clone());
                self.set_state(ConnectionState::Connected);
                status
            }
            Err(e) => {
                let e = CoreError::from(e);
                warn!(error = %e, "status read failed, serving cached status");
                if e.is_link_failure() {
                    self.set_state(ConnectionState::Disconnected);
                }
                self.inner.cache.fallback()
            }
        }
    }

    pub async fn start(&self) -> Result<(), CoreError> {
        self.command(RobotCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        self.command(RobotCommand::Stop).await
    }

    pub async fn dock(&self) -> Result<(), CoreError> {
        self.command(RobotCommand::Dock).await
    }

    pub async fn command(&self, command: RobotCommand) -> Result<(), CoreError> {
        self.exchange("command", |t| async move { t.send_command(command).await })
            .await?;
        info!(%command, "command accepted");
        Ok(())
    }

    pub async fn get_schedule(&self) -> Result<Vec<ScheduleEntry>, CoreError> {
        self.exchange("get_schedule", |t| async move { t.get_schedule().await })
            .await
    }

    pub async fn set_schedule(&self, entry: ScheduleEntry) -> Result<(), CoreError> {
        entry
            .validate()
            .map_err(|message| CoreError::Validation { message })?;
        self.exchange("set_schedule", |t| async move { t.set_schedule(&entry).await })
            .await
    }

    pub async fn get_map(&self) -> Result<MapSnapshot, CoreError> {
        self.exchange("get_map", |t| async move { t.get_map().await })
            .await
    }

    /// Run one call against the live transport under the command lock.
    async fn exchange<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, CoreError>
    where
        F: FnOnce(Arc<dyn RobotTransport>) -> Fut + Send,
        Fut: Future<Output = Result<T, vacbot_api::Error>> + Send,
        T: Send,
    {
        let slot = self.inner.slot.read().await;
        let transport = match (&slot.preference, &slot.transport) {
            (ConnectionPreference::None, _) => return Err(CoreError::NoTransport),
            (_, None) => return Err(CoreError::NotConnected),
            (_, Some(transport)) => Arc::clone(transport),
        };

        let _turn = tokio::time::timeout(self.inner.config.command_wait, self.inner.command_lock.lock())
            .await
            .map_err(|_| CoreError::TransportBusy)?;

        debug!(operation, kind = %transport.kind(), "robot call");
        call(transport).await.map_err(|e| {
            let e = CoreError::from(e);
            if e.is_link_failure() {
                self.set_state(ConnectionState::Disconnected);
            }
            e
        })
    }

    // ── Discovery ────────────────────────────────────────────────

    async fn scanner(&self) -> Result<Arc<DiscoveryScanner>, CoreError> {
        let mut scanner = self.inner.scanner.lock().await;
        if let Some(existing) = scanner.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let platform = self.inner.connector.scan_platform().await?;
        let created = Arc::new(DiscoveryScanner::new(platform, self.inner.config.scan.clone()));
        *scanner = Some(Arc::clone(&created));
        Ok(created)
    }

    /// Start a discovery session, superseding any running one.
    pub async fn start_scan<F>(&self, on_found: F) -> Result<ScanHandle, CoreError>
    where
        F: Fn(DiscoveredDevice) + Send + Sync + 'static,
    {
        let scanner = self.scanner().await?;
        Ok(scanner.start(on_found).await?)
    }

    pub async fn stop_scan(&self, handle: &ScanHandle) {
        let scanner = self.inner.scanner.lock().await.clone();
        if let Some(scanner) = scanner {
            scanner.stop(handle).await;
        }
    }

    /// Run one full session and return the candidates found.
    pub async fn discover(&self) -> Result<Vec<DiscoveredDevice>, CoreError> {
        let scanner = self.scanner().await?;
        Ok(scanner.collect().await?)
    }
}
