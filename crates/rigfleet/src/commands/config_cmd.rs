//! Config subcommand handlers.

use std::io::IsTerminal;
use std::path::PathBuf;

use dialoguer::Input;
use rigfleet_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let as_toml =
                toml::to_string_pretty(&cfg).map_err(|e| CliError::Render(e.to_string()))?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| as_toml.trim_end().to_owned(),
                |_| as_toml.trim_end().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_file(global).display().to_string(), false);
            Ok(())
        }
    }
}

// ── Init: guided setup ──────────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);
    if path.exists()
        && !util::confirm(
            &format!("Overwrite {}?", path.display()),
            "config init",
            global.yes,
        )?
    {
        return Ok(());
    }

    let mut cfg = Config::default();
    if !global.yes && std::io::stdin().is_terminal() {
        eprintln!("rigfleet configuration wizard");
        eprintln!("   Config path: {}\n", path.display());
        prompt(&mut cfg)?;
    }
    cfg.validate()?;

    rigfleet_config::save_config_to(&cfg, &path)?;
    let color = output::should_color(&global.color);
    output::print_status(
        &output::success_line(&format!("Config written to {}", path.display()), color),
        global.quiet,
    );
    Ok(())
}

fn prompt(cfg: &mut Config) -> Result<(), CliError> {
    cfg.server.listen = Input::new()
        .with_prompt("Server listen address")
        .default(cfg.server.listen.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let data_dir: String = Input::new()
        .with_prompt("Registry data directory")
        .default(cfg.storage.data_dir.display().to_string())
        .interact_text()
        .map_err(prompt_err)?;
    cfg.storage.data_dir = PathBuf::from(data_dir);

    cfg.devices.port = Input::new()
        .with_prompt("Device API port")
        .default(cfg.devices.port)
        .interact_text()
        .map_err(prompt_err)?;

    cfg.devices.scan_concurrency = Input::new()
        .with_prompt("Parallel probes during a scan")
        .default(cfg.devices.scan_concurrency)
        .interact_text()
        .map_err(prompt_err)?;

    Ok(())
}
