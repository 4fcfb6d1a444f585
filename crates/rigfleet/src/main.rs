mod cli;
mod commands;
mod config;
mod error;
mod output;
mod server;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The server is a long-running process; it logs requests by default.
    let (serving, json_logs) = match &cli.command {
        Command::Serve(args) => (true, args.log_format == LogFormat::Json),
        _ => (false, false),
    };
    init_tracing(cli.global.verbose, serving, json_logs);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, serving: bool, json: bool) {
    let filter = match verbosity {
        0 if serving => "info",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let fmt = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        fmt.json().init();
    } else {
        fmt.init();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands work without a registry
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "rigfleet", &mut std::io::stdout());
            Ok(())
        }

        Command::Serve(args) => {
            let cfg = config::load(&cli.global)?;
            server::serve(&cfg, args).await
        }

        cmd => {
            let cfg = config::load(&cli.global)?;
            let fleet = config::open_fleet(&cfg)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &fleet, &cli.global).await
        }
    }
}
