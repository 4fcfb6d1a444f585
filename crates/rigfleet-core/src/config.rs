// ── Runtime fleet configuration ──
//
// Describes how to reach devices and how hard to fan out.
// Built by the CLI/server from the config file; core never reads files.

use std::path::PathBuf;
use std::time::Duration;

use rigfleet_api::TransportConfig;
use rigfleet_api::transport::DEFAULT_DEVICE_PORT;

/// Upper bound on hosts a single scan may expand to (a /16).
pub const DEFAULT_MAX_SCAN_HOSTS: usize = 65_536;

/// Per-operation bounds on in-flight device requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    /// Registry refresh (`list`).
    pub probe: usize,
    /// Subnet discovery.
    pub scan: usize,
    /// Config broadcast.
    pub push: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            probe: 50,
            scan: 100,
            push: 16,
        }
    }
}

/// Everything the [`Fleet`](crate::Fleet) needs at runtime.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub device_port: u16,
    pub probe_timeout: Duration,
    pub push_timeout: Duration,
    pub limits: ConcurrencyLimits,
    pub max_scan_hosts: usize,
    /// Directory holding the registry file.
    pub data_dir: PathBuf,
}

impl Default for FleetConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            device_port: DEFAULT_DEVICE_PORT,
            probe_timeout: transport.probe_timeout,
            push_timeout: transport.push_timeout,
            limits: ConcurrencyLimits::default(),
            max_scan_hosts: DEFAULT_MAX_SCAN_HOSTS,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl FleetConfig {
    /// Transport settings for the device HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            port: self.device_port,
            probe_timeout: self.probe_timeout,
            push_timeout: self.push_timeout,
        }
    }
}
