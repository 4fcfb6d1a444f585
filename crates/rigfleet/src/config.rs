//! Flag-aware configuration resolution.
//!
//! `rigfleet-config` handles file + environment layering; this module adds
//! the global CLI overrides and builds the runtime fleet.

use std::path::PathBuf;
use std::sync::Arc;

use rigfleet_api::DeviceClient;
use rigfleet_config::Config;
use rigfleet_core::{FileRegistry, Fleet, Registry};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` / `RIGFLEET_CONFIG`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(rigfleet_config::config_path)
}

/// Load the layered config and apply `--data-dir` / `--device-port`.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = rigfleet_config::load_config_from(&config_file(global))?;

    if let Some(ref dir) = global.data_dir {
        cfg.storage.data_dir.clone_from(dir);
    }
    if let Some(port) = global.device_port {
        cfg.devices.port = port;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Open the registry and build a fleet over the real device client.
pub fn open_fleet(cfg: &Config) -> Result<Fleet<DeviceClient>, CliError> {
    let fleet_config = cfg.fleet_config()?;
    let client = DeviceClient::new(&fleet_config.transport())
        .map_err(|e| CliError::Internal(e.to_string()))?;

    let registry: Arc<dyn Registry> = Arc::new(FileRegistry::open(&fleet_config.data_dir)?);
    tracing::debug!(data_dir = %fleet_config.data_dir.display(), "registry opened");

    Ok(Fleet::new(&fleet_config, client, registry))
}
