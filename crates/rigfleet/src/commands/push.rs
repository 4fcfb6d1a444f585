//! Fleet-wide settings push handler.

use rigfleet_api::{DeviceClient, PushAck};
use rigfleet_core::{ConfigPatch, Fleet, PushOutcome};
use tabled::Tabled;

use crate::cli::{GlobalOpts, PushArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PushRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&PushOutcome> for PushRow {
    fn from(o: &PushOutcome) -> Self {
        let (result, detail) = match &o.result {
            Ok(Some(PushAck::Text(text))) => ("ok", text.clone()),
            Ok(Some(PushAck::Json(_))) => ("ok", "acknowledged".to_owned()),
            Ok(None) => ("ok", String::new()),
            Err(e) => ("failed", format!("{} ({})", e.message, e.kind)),
        };
        Self {
            address: o.address.to_string(),
            result: result.into(),
            detail,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fleet: &Fleet<DeviceClient>,
    args: PushArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload = match args.from_file {
        Some(ref path) => util::read_json_file(path)?,
        None => util::parse_set_pairs(&args.set)?,
    };

    // Reject bad input before asking anything.
    let patch = ConfigPatch::from_value(&payload)?;
    let tracked = fleet.registry().list_tracked()?.len();
    let fields: Vec<&str> = patch.field_names().collect();
    let prompt = format!("Push {} to {tracked} device(s)?", fields.join(", "));
    if !util::confirm(&prompt, "push", global.yes)? {
        return Ok(());
    }

    let report = fleet.push(&payload).await?;
    let (succeeded, failed, total) = (report.succeeded.len(), report.failed.len(), report.len());
    let entries = report.into_entries();

    let out = output::render_list(
        &global.output,
        &entries,
        |o| PushRow::from(o),
        |o| o.address.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    let color = output::should_color(&global.color);
    output::print_status(
        &output::success_line(&format!("{succeeded} of {total} devices updated"), color),
        global.quiet,
    );
    if failed > 0 {
        output::print_status(
            &output::failure_line(&format!("{failed} of {total} devices failed"), color),
            global.quiet,
        );
        return Err(CliError::PushIncomplete { failed, total });
    }
    Ok(())
}
