// Shared transport configuration for building the device reqwest::Client.
//
// Probes and pushes share one connection pool; their different deadlines
// are applied per request rather than on the client.

use std::time::Duration;

/// Port the rig firmware serves its HTTP API on.
pub const DEFAULT_DEVICE_PORT: u16 = 80;

/// Shared transport configuration for the device HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP port of the device API (plain HTTP).
    pub port: u16,
    /// Deadline for a read-only `GET /api/system/info`.
    pub probe_timeout: Duration,
    /// Deadline for a `PATCH /api/system` config push.
    pub push_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DEVICE_PORT,
            probe_timeout: Duration::from_secs(2),
            push_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// No client-wide timeout is set; every request carries its own.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("rigfleet/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(self.probe_timeout)
            .build()
            .map_err(|e| crate::error::Error::Client(e.to_string()))
    }
}
