// Time-boxed BLE discovery.
//
// One session at a time. A session polls the adapter's peripheral list,
// filters by product-family name, de-duplicates by id, and reports each
// new candidate through the caller's callback. Whatever ends the session
// (timeout, `stop`, a newer `start`, scanner teardown), the platform scan
// is stopped before the session reports itself finished.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ble::platform::BlePlatform;
use crate::error::Error;
use crate::models::DiscoveredDevice;

pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_RADIO_TIMEOUT: Duration = Duration::from_secs(5);

/// Name fragments identifying the product family.
pub const DEFAULT_NAME_PATTERNS: &[&str] = &["VacBot", "RoboClean"];

/// Scan tuning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Fixed time budget of one session.
    pub duration: Duration,
    pub poll_interval: Duration,
    /// Bound on starting and stopping the platform scan.
    pub radio_timeout: Duration,
    /// Case-insensitive name fragments; empty accepts every named device.
    pub name_patterns: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SCAN_DURATION,
            poll_interval: DEFAULT_POLL_INTERVAL,
            radio_timeout: DEFAULT_RADIO_TIMEOUT,
            name_patterns: DEFAULT_NAME_PATTERNS.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

impl ScanOptions {
    /// Whether an advertised device belongs to the product family.
    pub fn matches(&self, device: &DiscoveredDevice) -> bool {
        let Some(name) = device.name.as_deref() else {
            return false;
        };
        if self.name_patterns.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.name_patterns
            .iter()
            .any(|p| name.contains(&p.to_lowercase()))
    }
}

/// Caller's reference to one scan session.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    id: u64,
    done: watch::Receiver<bool>,
}

impl ScanHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Resolve once the session has ended and the radio is released.
    pub async fn finished(&self) {
        let mut done = self.done.clone();
        // Sender dropping also means the session is over.
        let _ = done.wait_for(|finished| *finished).await;
    }
}

struct ActiveScan {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ActiveScan {
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(scan = self.id, error = %e, "scan task ended abnormally");
        }
    }
}

/// Owns the single BLE discovery session.
pub struct DiscoveryScanner {
    platform: Arc<dyn BlePlatform>,
    options: ScanOptions,
    active: Mutex<Option<ActiveScan>>,
    next_id: AtomicU64,
}

impl DiscoveryScanner {
    pub fn new(platform: Arc<dyn BlePlatform>, options: ScanOptions) -> Self {
        Self {
            platform,
            options,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Start a session, stopping any session already running.
    ///
    /// Fails immediately if the platform cannot scan at all, so callers can
    /// tell "found nothing" from "cannot scan".
    pub async fn start<F>(&self, on_found: F) -> Result<ScanHandle, Error>
    where
        F: Fn(DiscoveredDevice) + Send + Sync + 'static,
    {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(scan = previous.id, "superseding previous scan");
            previous.shutdown().await;
        }

        tokio::time::timeout(self.options.radio_timeout, self.platform.start_scan())
            .await
            .map_err(|_| Error::Timeout {
                operation: "scan start",
                timeout: self.options.radio_timeout,
            })??;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);

        info!(scan = id, duration_ms = self.options.duration.as_millis(), "scan started");
        let task = tokio::spawn(run_session(
            id,
            Arc::clone(&self.platform),
            self.options.clone(),
            cancel.clone(),
            on_found,
            done_tx,
        ));

        *active = Some(ActiveScan { id, cancel, task });
        Ok(ScanHandle { id, done: done_rx })
    }

    /// Stop the given session if it is still the active one. Returns after
    /// the radio has been released.
    pub async fn stop(&self, handle: &ScanHandle) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| a.id == handle.id) {
            if let Some(scan) = active.take() {
                scan.shutdown().await;
            }
        }
    }

    /// Stop whatever session is running.
    pub async fn shutdown(&self) {
        if let Some(scan) = self.active.lock().await.take() {
            scan.shutdown().await;
        }
    }

    pub async fn is_scanning(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|a| !a.task.is_finished())
    }

    /// Run one full session and return the de-duplicated candidate list in
    /// discovery order.
    pub async fn collect(&self) -> Result<Vec<DiscoveredDevice>, Error> {
        let found = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&found);
        let handle = self
            .start(move |device| {
                if let Ok(mut list) = sink.lock() {
                    list.push(device);
                }
            })
            .await?;
        handle.finished().await;

        let list = found.lock().map(|l| l.clone()).unwrap_or_default();
        Ok(list)
    }
}

impl Drop for DiscoveryScanner {
    fn drop(&mut self) {
        // The session task stops the platform scan on its way out.
        if let Ok(mut active) = self.active.try_lock() {
            if let Some(scan) = active.take() {
                scan.cancel.cancel();
            }
        }
    }
}

async fn run_session<F>(
    id: u64,
    platform: Arc<dyn BlePlatform>,
    options: ScanOptions,
    cancel: CancellationToken,
    on_found: F,
    done: watch::Sender<bool>,
) where
    F: Fn(DiscoveredDevice) + Send + Sync + 'static,
{
    let deadline = Instant::now() + options.duration;
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep_until(deadline) => break,
            () = tokio::time::sleep(options.poll_interval) => {}
        }

        let peripherals = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep_until(deadline) => {
                debug!(scan = id, "peripheral listing outlived the scan budget");
                break;
            }
            res = platform.peripherals() => res,
        };

        // A slow listing must not leak results past the budget.
        if cancel.is_cancelled() || Instant::now() >= deadline {
            break;
        }

        match peripherals {
            Ok(list) => {
                for device in list {
                    if !options.matches(&device) || seen.contains(&device.id) {
                        continue;
                    }
                    seen.insert(device.id.clone());
                    debug!(scan = id, id = %device.id, name = ?device.name, rssi = ?device.rssi, "device matched");
                    on_found(device);
                }
            }
            Err(e) => {
                warn!(scan = id, error = %e, "peripheral listing failed, ending scan");
                break;
            }
        }
    }

    match tokio::time::timeout(options.radio_timeout, platform.stop_scan()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(scan = id, error = %e, "failed to stop platform scan"),
        Err(_) => warn!(
            scan = id,
            timeout_ms = options.radio_timeout.as_millis(),
            "platform scan stop timed out"
        ),
    }
    info!(scan = id, found = seen.len(), "scan finished");
    done.send_replace(true);
}
