//! Command dispatch: bridges CLI args -> fleet operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod push;
pub mod scan;
pub mod util;

use rigfleet_api::DeviceClient;
use rigfleet_core::Fleet;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a registry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    fleet: &Fleet<DeviceClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(fleet, args, global).await,
        Command::Scan(args) => scan::handle(fleet, args, global).await,
        Command::Push(args) => push::handle(fleet, args, global).await,
        // Serve, Config and Completions are handled before dispatch
        Command::Serve(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
