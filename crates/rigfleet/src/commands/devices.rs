//! Device command handlers.

use rigfleet_api::DeviceClient;
use rigfleet_core::{DeviceRecord, DeviceState, DeviceView, Fleet, PoolSettings};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct DeviceRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Hashrate")]
    hashrate: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&DeviceView> for DeviceRow {
    fn from(v: &DeviceView) -> Self {
        Self {
            address: v.address.to_string(),
            hostname: v.hostname.clone(),
            status: if v.online { "online" } else { "offline" }.into(),
            pool: v
                .settings
                .as_ref()
                .map_or_else(|| "-".into(), |s| pool_label(&s.primary)),
            hashrate: v
                .telemetry
                .as_ref()
                .and_then(|t| t.hash_rate)
                .map_or_else(|| "-".into(), |h| format!("{h:.1} GH/s")),
            error: v.error.clone().unwrap_or_default(),
        }
    }
}

fn pool_label(pool: &PoolSettings) -> String {
    if pool.url.is_empty() {
        "-".into()
    } else {
        format!("{}:{}", pool.url, pool.port)
    }
}

fn detail(r: &DeviceRecord) -> String {
    let mut lines = vec![
        format!("Address:   {}", r.address),
        format!("Hostname:  {}", r.hostname),
        format!("Last seen: {}", r.last_seen.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("State:     {}", r.last_known_state.label()),
    ];
    match &r.last_known_state {
        DeviceState::Online {
            settings,
            telemetry,
        } => {
            lines.push(format!("Pool:      {}", pool_label(&settings.primary)));
            if !settings.primary.user.is_empty() {
                lines.push(format!("User:      {}", settings.primary.user));
            }
            lines.push(format!("Fallback:  {}", pool_label(&settings.fallback)));
            if let Some(h) = telemetry.hash_rate {
                lines.push(format!("Hashrate:  {h:.1} GH/s"));
            }
            if let Some(t) = telemetry.temp {
                lines.push(format!("Temp:      {t:.1} °C"));
            }
            if let Some(p) = telemetry.power {
                lines.push(format!("Power:     {p:.1} W"));
            }
            if let Some(ref v) = telemetry.version {
                lines.push(format!("Firmware:  {v}"));
            }
            if let Some(up) = telemetry.uptime_seconds {
                lines.push(format!("Uptime:    {up}s"));
            }
        }
        DeviceState::Offline { error } => {
            lines.push(format!("Error:     {} ({})", error.message, error.kind));
        }
        DeviceState::Unknown => {}
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fleet: &Fleet<DeviceClient>,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = fleet.list_devices().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.address.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Add { address } => {
            let added = fleet.add_device(&address).await?;
            let out = output::render_list(
                &global.output,
                std::slice::from_ref(&added.device),
                |d| DeviceRow::from(d),
                |d| d.address.to_string(),
            )?;
            output::print_output(&out, global.quiet);

            if added.is_online() {
                Ok(())
            } else {
                Err(CliError::DeviceOffline {
                    address: added.record.address.to_string(),
                    reason: added.device.error.unwrap_or_default(),
                })
            }
        }

        DevicesCommand::Remove { address } => {
            let removed = fleet.remove_device(&address).await?;
            let color = output::should_color(&global.color);
            let line = if removed {
                output::success_line(&format!("Device {address} removed"), color)
            } else {
                format!("Device {address} was not tracked")
            };
            output::print_status(&line, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { address } => {
            let record = fleet
                .device(&address)?
                .ok_or_else(|| CliError::NotTracked { address })?;
            let out =
                output::render_single(&global.output, &record, detail, |r| r.address.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rigfleet_core::{DeviceError, DeviceErrorKind};
    use std::net::Ipv4Addr;

    fn record(state: DeviceState) -> DeviceRecord {
        DeviceRecord {
            address: Ipv4Addr::new(10, 0, 0, 6),
            hostname: "bitaxe-6".into(),
            last_seen: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap_or_default(),
            last_known_state: state,
        }
    }

    #[test]
    fn detail_of_offline_record_keeps_hostname_and_error() {
        let text = detail(&record(DeviceState::Offline {
            error: DeviceError::new(DeviceErrorKind::Timeout, "no answer within 2000ms"),
        }));
        assert!(text.contains("Hostname:  bitaxe-6"));
        assert!(text.contains("State:     offline"));
        assert!(text.contains("no answer within 2000ms (timeout)"));
        assert!(text.contains("2026-03-01 12:00:00 UTC"));
    }

    #[test]
    fn pool_label_hides_empty_url() {
        let mut pool = PoolSettings::default();
        assert_eq!(pool_label(&pool), "-");
        pool.url = "pool.example.com".into();
        pool.port = 3333;
        assert_eq!(pool_label(&pool), "pool.example.com:3333");
    }
}
