//! Subnet scan handler.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use rigfleet_api::DeviceClient;
use rigfleet_core::Fleet;

use crate::cli::{GlobalOpts, ScanArgs};
use crate::error::CliError;
use crate::output;

use super::devices::DeviceRow;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn handle(
    fleet: &Fleet<DeviceClient>,
    args: ScanArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let progress = (!global.quiet && std::io::stderr().is_terminal())
        .then(|| spinner(format!("Scanning {}", args.subnet)));

    let result = fleet.scan(&args.subnet).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result?;

    let out = output::render_list(
        &global.output,
        &report.online,
        |d| DeviceRow::from(d),
        |d| d.address.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    let color = output::should_color(&global.color);
    output::print_status(
        &output::success_line(
            &format!(
                "{} of {} hosts in {} answered",
                report.online.len(),
                report.probed,
                report.subnet
            ),
            color,
        ),
        global.quiet,
    );
    Ok(())
}
