// Local-network HTTP transport
//
// Wraps `reqwest::Client` with robot-specific URL construction, a hard
// per-request deadline, and payload validation. One call is one request;
// nothing here retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::codec;
use crate::error::Error;
use crate::models::{CommandRequest, MapSnapshot, RobotCommand, RobotStatus, ScheduleEntry, Validate};
use crate::transport::{RobotTransport, TransportConfig, TransportKind};

/// HTTP client for a robot reachable at `http://{address}/`.
pub struct WifiTransport {
    http: reqwest::Client,
    base_url: Url,
    address: String,
    timeout: Duration,
}

impl WifiTransport {
    /// Create a transport from a `TransportConfig`.
    ///
    /// `address` is a host or `host:port`; a leading `http://` and a
    /// trailing slash are tolerated.
    pub fn new(address: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, address, transport.timeout)
    }

    /// Create a transport around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        address: &str,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let (address, base_url) = normalize_address(address)?;
        Ok(Self {
            http,
            base_url,
            address,
            timeout,
        })
    }

    /// The normalized `host[:port]` this transport targets.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidAddress {
                address: self.address.clone(),
                reason: e.to_string(),
            })
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode a validated JSON body.
    async fn get<T>(&self, path: &str, what: &'static str) -> Result<T, Error>
    where
        T: DeserializeOwned + Validate,
    {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let resp = self.send(self.http.get(url), what).await?;
        let body = resp.bytes().await.map_err(|e| self.classify(&e, what))?;
        trace!(bytes = body.len(), what, "response body received");

        codec::decode(what, &body)
    }

    /// Send a POST request with JSON body; any 2xx counts as accepted.
    async fn post(
        &self,
        path: &str,
        what: &'static str,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        self.send(self.http.post(url).json(body), what).await?;
        Ok(())
    }

    /// Issue the request under the transport deadline and reject non-2xx.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        let resp = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| Error::Timeout {
                operation,
                timeout: self.timeout,
            })?
            .map_err(|e| self.classify(&e, operation))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Rejected {
                status: status.as_u16(),
                message: preview,
            });
        }

        Ok(resp)
    }

    fn classify(&self, err: &reqwest::Error, operation: &'static str) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                operation,
                timeout: self.timeout,
            }
        } else {
            Error::Unreachable {
                target: self.address.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl RobotTransport for WifiTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Wifi
    }

    fn target(&self) -> String {
        self.address.clone()
    }

    async fn status(&self) -> Result<RobotStatus, Error> {
        self.get("status", "status").await
    }

    async fn send_command(&self, command: RobotCommand) -> Result<(), Error> {
        self.post("command", "command", &CommandRequest::from(command))
            .await
    }

    async fn get_schedule(&self) -> Result<Vec<ScheduleEntry>, Error> {
        self.get("schedule", "schedule").await
    }

    async fn set_schedule(&self, entry: &ScheduleEntry) -> Result<(), Error> {
        self.post("schedule", "schedule", entry).await
    }

    async fn get_map(&self) -> Result<MapSnapshot, Error> {
        self.get("map", "map").await
    }

    async fn disconnect(&self) {
        // Stateless: pooled connections close when the client drops.
        debug!(address = %self.address, "wifi transport released");
    }
}

/// Turn user input into `(host[:port], http://host[:port]/)`.
fn normalize_address(raw: &str) -> Result<(String, Url), Error> {
    let invalid = |reason: &str| Error::InvalidAddress {
        address: raw.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = raw.trim();
    let without_scheme = trimmed.strip_prefix("http://").unwrap_or(trimmed);
    let address = without_scheme.trim_end_matches('/');

    if address.is_empty() {
        return Err(invalid("address is empty"));
    }
    if address.contains('/') || address.contains(char::is_whitespace) {
        return Err(invalid("expected host or host:port"));
    }

    let url = Url::parse(&format!("http://{address}/")).map_err(|e| invalid(&e.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    Ok((address.to_owned(), url))
}
