// ── Transport construction ──
//
// Turns a `ConnectionPreference` into a live `RobotTransport`, and owns
// capability detection for the host's Bluetooth radio. Simulation is
// decided here, once, so no code path mixes simulated and real calls.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use vacbot_api::{
    BlePlatform, BleTransport, BtleplugPlatform, RobotTransport, SimulatedPlatform,
    SimulatedTransport, TransportConfig, WifiTransport,
};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::store::ConnectionPreference;

/// Builds transports and provides the radio for discovery.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open a transport for `preference`. One attempt, bounded by the
    /// transport's own timeouts. Never called with `None`.
    async fn open(
        &self,
        preference: &ConnectionPreference,
    ) -> Result<Arc<dyn RobotTransport>, CoreError>;

    /// The radio used by the discovery scanner.
    async fn scan_platform(&self) -> Result<Arc<dyn BlePlatform>, CoreError>;
}

/// Production connector: HTTP, btleplug, or simulation per `ClientConfig`.
pub struct DefaultConnector {
    config: ClientConfig,
    radio: OnceCell<Arc<dyn BlePlatform>>,
}

impl DefaultConnector {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            radio: OnceCell::new(),
        }
    }

    /// Detect the Bluetooth radio once; later calls reuse it.
    async fn radio(&self) -> Result<Arc<dyn BlePlatform>, CoreError> {
        if !self.config.ble_enabled {
            return Err(CoreError::TransportUnavailable {
                reason: "Bluetooth is disabled in configuration".into(),
            });
        }

        let radio = self
            .radio
            .get_or_try_init(|| async {
                if self.config.simulate {
                    debug!("using simulated Bluetooth radio");
                    let platform: Arc<dyn BlePlatform> = Arc::new(SimulatedPlatform::new());
                    return Ok::<_, CoreError>(platform);
                }
                let platform = BtleplugPlatform::detect().await?;
                Ok::<_, CoreError>(Arc::new(platform) as Arc<dyn BlePlatform>)
            })
            .await?;
        Ok(Arc::clone(radio))
    }
}

#[async_trait]
impl TransportConnector for DefaultConnector {
    async fn open(
        &self,
        preference: &ConnectionPreference,
    ) -> Result<Arc<dyn RobotTransport>, CoreError> {
        if self.config.simulate {
            let target = preference.target().ok_or(CoreError::NoTransport)?;
            if matches!(preference, ConnectionPreference::Ble { .. }) && !self.config.ble_enabled {
                return Err(CoreError::TransportUnavailable {
                    reason: "Bluetooth is disabled in configuration".into(),
                });
            }
            info!(%preference, "opening simulated robot");
            return Ok(Arc::new(SimulatedTransport::new(
                target,
                self.config.simulation_latency,
            )));
        }

        match preference {
            ConnectionPreference::None => Err(CoreError::NoTransport),
            ConnectionPreference::Wifi { address } => {
                let transport_config =
                    TransportConfig::default().with_timeout(self.config.http_timeout);
                let wifi = WifiTransport::new(address, &transport_config)?;
                debug!(address = %wifi.address(), "wifi transport ready");
                Ok(Arc::new(wifi))
            }
            ConnectionPreference::Ble { device_id } => {
                let radio = self.radio().await?;
                let ble = BleTransport::new(radio, self.config.ble_timeouts);
                ble.connect(device_id).await?;
                Ok(Arc::new(ble))
            }
        }
    }

    async fn scan_platform(&self) -> Result<Arc<dyn BlePlatform>, CoreError> {
        self.radio().await
    }
}
