//! Shared configuration for the rigfleet CLI and server.
//!
//! TOML file + `RIGFLEET_*` environment layering via figment, validation,
//! and translation to `rigfleet_core::FleetConfig`. The binary adds
//! flag-aware overrides on top.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rigfleet_core::{ConcurrencyLimits, FleetConfig};

/// Environment prefix; nested keys are separated by `__`
/// (e.g. `RIGFLEET_DEVICES__PROBE_TIMEOUT_MS`).
pub const ENV_PREFIX: &str = "RIGFLEET_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub devices: DeviceSettings,
}

/// CLI presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// `rigfleet serve` settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `0.0.0.0:5000`.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory of static UI assets served at `/`.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: None,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}

/// Registry storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Directory holding `devices.json`; created on first use.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Device transport and fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSettings {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,

    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,

    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,

    #[serde(default = "default_push_concurrency")]
    pub push_concurrency: usize,

    #[serde(default = "default_max_scan_hosts")]
    pub max_scan_hosts: usize,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            probe_timeout_ms: default_probe_timeout_ms(),
            push_timeout_ms: default_push_timeout_ms(),
            probe_concurrency: default_probe_concurrency(),
            scan_concurrency: default_scan_concurrency(),
            push_concurrency: default_push_concurrency(),
            max_scan_hosts: default_max_scan_hosts(),
        }
    }
}

fn default_port() -> u16 {
    rigfleet_core::FleetConfig::default().device_port
}
fn default_probe_timeout_ms() -> u64 {
    2_000
}
fn default_push_timeout_ms() -> u64 {
    5_000
}
fn default_probe_concurrency() -> usize {
    ConcurrencyLimits::default().probe
}
fn default_scan_concurrency() -> usize {
    ConcurrencyLimits::default().scan
}
fn default_push_concurrency() -> usize {
    ConcurrencyLimits::default().push
}
fn default_max_scan_hosts() -> usize {
    rigfleet_core::config::DEFAULT_MAX_SCAN_HOSTS
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Check every value the runtime depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        let d = &self.devices;
        if d.port == 0 {
            return Err(invalid("devices.port", "must be between 1 and 65535"));
        }
        for (field, ms) in [
            ("devices.probe_timeout_ms", d.probe_timeout_ms),
            ("devices.push_timeout_ms", d.push_timeout_ms),
        ] {
            if ms == 0 {
                return Err(invalid(field, "must be at least 1 millisecond"));
            }
        }
        for (field, n) in [
            ("devices.probe_concurrency", d.probe_concurrency),
            ("devices.scan_concurrency", d.scan_concurrency),
            ("devices.push_concurrency", d.push_concurrency),
            ("devices.max_scan_hosts", d.max_scan_hosts),
        ] {
            if n == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(invalid("storage.data_dir", "must not be empty"));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen.trim().parse().map_err(|_| {
            invalid(
                "server.listen",
                format!("expected host:port, got '{}'", self.server.listen),
            )
        })
    }

    /// Validate and build the runtime fleet configuration.
    pub fn fleet_config(&self) -> Result<FleetConfig, ConfigError> {
        self.validate()?;
        let d = &self.devices;
        Ok(FleetConfig {
            device_port: d.port,
            probe_timeout: Duration::from_millis(d.probe_timeout_ms),
            push_timeout: Duration::from_millis(d.push_timeout_ms),
            limits: ConcurrencyLimits {
                probe: d.probe_concurrency,
                scan: d.scan_concurrency,
                push: d.push_concurrency,
            },
            max_scan_hosts: d.max_scan_hosts,
            data_dir: self.storage.data_dir.clone(),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "rigfleet", "rigfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("rigfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered provider: defaults, then the TOML file, then environment.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load config from `path` (missing file = defaults) plus environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::result_large_err)]

    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();

        let fleet = config.fleet_config().unwrap();
        assert_eq!(fleet.device_port, 80);
        assert_eq!(fleet.probe_timeout, Duration::from_secs(2));
        assert_eq!(fleet.push_timeout, Duration::from_secs(5));
        assert_eq!(fleet.limits, ConcurrencyLimits::default());
        assert_eq!(fleet.max_scan_hosts, 65_536);
        assert_eq!(config.listen_addr().unwrap().port(), 5000);
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [devices]
                port = 8080
                scan_concurrency = 32

                [storage]
                data_dir = "/var/lib/rigfleet"
                "#,
            )?;
            jail.set_env("RIGFLEET_DEVICES__SCAN_CONCURRENCY", "12");
            jail.set_env("RIGFLEET_SERVER__LISTEN", "127.0.0.1:8000");

            let config = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.devices.port, 8080);
            assert_eq!(config.devices.scan_concurrency, 12);
            assert_eq!(config.devices.probe_concurrency, 50);
            assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/rigfleet"));
            assert_eq!(config.server.listen, "127.0.0.1:8000");
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config =
                load_config_from(Path::new("does-not-exist.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = Config::default();
        config.devices.push_concurrency = 0;
        let err = config.fleet_config().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "devices.push_concurrency")
        );
    }

    #[test]
    fn rejects_zero_timeout_and_bad_listen() {
        let mut config = Config::default();
        config.devices.probe_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.listen = "not-an-address".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("invalid server.listen"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.devices.port = 8081;
        config.server.static_dir = Some(PathBuf::from("/srv/ui"));
        save_config_to(&config, &path).unwrap();

        let loaded: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&path))
            .extract()
            .unwrap();
        assert_eq!(loaded, config);
    }
}
