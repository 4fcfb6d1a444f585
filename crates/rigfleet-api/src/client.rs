// Device API HTTP client
//
// Wraps `reqwest::Client` with per-device URL construction, per-request
// deadlines, and response classification. Endpoint methods live in
// `system.rs` to keep this module focused on transport mechanics.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, PushAck};
use crate::transport::TransportConfig;

/// HTTP client for the rig firmware API.
///
/// One instance talks to any number of devices; the target address is
/// supplied per call. Cloning is cheap (the inner `reqwest::Client` is
/// reference counted), so a clone can be moved into every worker task.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    port: u16,
    probe_timeout: Duration,
    push_timeout: Duration,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, transport))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, transport: &TransportConfig) -> Self {
        Self {
            http,
            port: transport.port,
            probe_timeout: transport.probe_timeout,
            push_timeout: transport.push_timeout,
        }
    }

    /// The device API port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn push_timeout(&self) -> Duration {
        self.push_timeout
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `http://{address}:{port}/{path}`.
    pub(crate) fn device_url(&self, address: Ipv4Addr, path: &str) -> Result<Url, Error> {
        let full = format!(
            "http://{address}:{}/{}",
            self.port,
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET with the probe deadline and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let timeout_ms = millis(self.probe_timeout);

        let resp = self
            .http
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout_ms))?;

        let body = Self::read_success(resp, timeout_ms).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Send a PATCH with a JSON body and the push deadline.
    ///
    /// Returns `None` for an empty 2xx body.
    pub(crate) async fn patch(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<Option<PushAck>, Error> {
        debug!("PATCH {}", url);
        let timeout_ms = millis(self.push_timeout);

        let resp = self
            .http
            .patch(url)
            .timeout(self.push_timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout_ms))?;

        let text = Self::read_success(resp, timeout_ms).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_str(&text).map_or(PushAck::Text(text), PushAck::Json),
        ))
    }

    /// Read the full body, turning non-2xx statuses into `Error::Status`.
    async fn read_success(resp: reqwest::Response, timeout_ms: u64) -> Result<String, Error> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_reqwest(e, timeout_ms))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::message)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_owned()
            });

        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
