// Simulation mode
//
// An in-memory robot behind the same seams as the real transports, for
// demos and hosts without hardware. Enabled only by explicit config; the
// connector never mixes it with real device calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::debug;

use crate::ble::platform::{BlePlatform, GattSession};
use crate::error::Error;
use crate::models::{
    ConnectivityState, DiscoveredDevice, MapSnapshot, RobotCommand, RobotStatus, ScheduleEntry,
    Validate,
};
use crate::transport::{RobotTransport, TransportKind};

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(400);

/// Battery percentage lost per status read while cleaning.
const DRAIN_PER_READ: u8 = 3;

#[derive(Debug, Clone)]
struct SimState {
    battery_level: u8,
    is_cleaning: bool,
    docked: bool,
    last_cleaned: Option<chrono::DateTime<Utc>>,
    schedule: Vec<ScheduleEntry>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            battery_level: 87,
            is_cleaning: false,
            docked: true,
            last_cleaned: None,
            schedule: vec![ScheduleEntry::new("Monday", "09:00")],
        }
    }
}

/// A fake robot answering after a fixed latency.
pub struct SimulatedTransport {
    target: String,
    latency: Duration,
    state: Mutex<SimState>,
}

impl SimulatedTransport {
    pub fn new(target: impl Into<String>, latency: Duration) -> Self {
        Self {
            target: target.into(),
            latency,
            state: Mutex::new(SimState::default()),
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> Result<R, Error> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Bluetooth("simulated robot state poisoned".into()))?;
        Ok(f(&mut state))
    }
}

#[async_trait]
impl RobotTransport for SimulatedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Simulated
    }

    fn target(&self) -> String {
        self.target.clone()
    }

    async fn status(&self) -> Result<RobotStatus, Error> {
        self.delay().await;
        self.with_state(|s| {
            if s.is_cleaning {
                s.battery_level = s.battery_level.saturating_sub(DRAIN_PER_READ);
                if s.battery_level == 0 {
                    s.is_cleaning = false;
                    s.last_cleaned = Some(Utc::now());
                }
            } else if s.docked {
                s.battery_level = s.battery_level.saturating_add(DRAIN_PER_READ).min(100);
            }

            let mut errors = Vec::new();
            if s.battery_level < 10 {
                errors.push("battery low".to_owned());
            }
            RobotStatus {
                battery_level: s.battery_level,
                is_cleaning: s.is_cleaning,
                last_cleaned: s.last_cleaned,
                errors,
                connectivity_state: ConnectivityState::Online,
            }
        })
    }

    async fn send_command(&self, command: RobotCommand) -> Result<(), Error> {
        self.delay().await;
        self.with_state(|s| match command {
            RobotCommand::Start => {
                s.is_cleaning = true;
                s.docked = false;
            }
            RobotCommand::Stop => {
                if s.is_cleaning {
                    s.last_cleaned = Some(Utc::now());
                }
                s.is_cleaning = false;
            }
            RobotCommand::Dock => {
                if s.is_cleaning {
                    s.last_cleaned = Some(Utc::now());
                }
                s.is_cleaning = false;
                s.docked = true;
            }
        })?;
        debug!(target = %self.target, %command, "simulated command applied");
        Ok(())
    }

    async fn get_schedule(&self) -> Result<Vec<ScheduleEntry>, Error> {
        self.delay().await;
        self.with_state(|s| s.schedule.clone())
    }

    async fn set_schedule(&self, entry: &ScheduleEntry) -> Result<(), Error> {
        entry.validate().map_err(|message| Error::Rejected {
            status: 400,
            message,
        })?;
        self.delay().await;
        self.with_state(|s| s.schedule.push(entry.clone()))
    }

    async fn get_map(&self) -> Result<MapSnapshot, Error> {
        self.delay().await;
        Ok(canned_map())
    }

    async fn disconnect(&self) {
        debug!(target = %self.target, "simulated transport released");
    }
}

fn canned_map() -> MapSnapshot {
    MapSnapshot(json!({
        "zones": [
            { "name": "Kitchen", "area": 12.5 },
            { "name": "Living room", "area": 24.0 },
            { "name": "Hallway", "area": 6.0 }
        ],
        "obstacles": [ { "x": 3.2, "y": 1.1, "kind": "chair" } ],
        "path": [[0.0, 0.0], [3.0, 0.0], [3.0, 2.5], [0.0, 2.5]]
    }))
}

// ── Simulated radio ──────────────────────────────────────────────────

/// Peripherals advertised by `SimulatedPlatform`.
pub fn simulated_peripherals() -> Vec<DiscoveredDevice> {
    vec![
        DiscoveredDevice {
            id: "sim-vacbot-01".into(),
            name: Some("VacBot S7".into()),
            rssi: Some(-48),
        },
        DiscoveredDevice {
            id: "sim-headphones".into(),
            name: Some("Studio Buds".into()),
            rssi: Some(-60),
        },
        DiscoveredDevice {
            id: "sim-roboclean-02".into(),
            name: Some("RoboClean Mini".into()),
            rssi: Some(-71),
        },
    ]
}

/// A BLE platform that "sees" a fixed set of peripherals.
pub struct SimulatedPlatform {
    devices: Vec<DiscoveredDevice>,
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        Self {
            devices: simulated_peripherals(),
        }
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlePlatform for SimulatedPlatform {
    async fn start_scan(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn peripherals(&self) -> Result<Vec<DiscoveredDevice>, Error> {
        Ok(self.devices.clone())
    }

    async fn open(&self, device_id: &str) -> Result<Arc<dyn GattSession>, Error> {
        // Sessions are never needed: simulation hands out a
        // `SimulatedTransport` instead of a GATT-backed one.
        Err(Error::TransportUnavailable {
            reason: format!("simulated radio cannot open GATT session to {device_id}"),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn robot() -> SimulatedTransport {
        SimulatedTransport::new("sim", Duration::ZERO)
    }

    #[tokio::test]
    async fn cleaning_drains_battery_and_dock_stops() {
        let sim = robot();
        let before = sim.status().await.unwrap().battery_level;
        sim.send_command(RobotCommand::Start).await.unwrap();
        let cleaning = sim.status().await.unwrap();
        assert!(cleaning.is_cleaning);
        assert!(cleaning.battery_level < before);

        sim.send_command(RobotCommand::Dock).await.unwrap();
        let docked = sim.status().await.unwrap();
        assert!(!docked.is_cleaning);
        assert!(docked.last_cleaned.is_some());
    }

    #[tokio::test]
    async fn schedule_append_and_reject_invalid() {
        let sim = robot();
        sim.set_schedule(&ScheduleEntry::new("Fri", "18:30"))
            .await
            .unwrap();
        assert_eq!(sim.get_schedule().await.unwrap().len(), 2);

        let err = sim
            .set_schedule(&ScheduleEntry::new("Fri", "noon"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rejected { status: 400, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn responses_wait_for_latency() {
        let sim = SimulatedTransport::new("sim", Duration::from_millis(400));
        let started = tokio::time::Instant::now();
        sim.get_map().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(400));
    }
}
