//! Clap derive structures for the `rigfleet` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rigfleet -- discover, monitor and configure mining rig fleets
#[derive(Debug, Parser)]
#[command(
    name = "rigfleet",
    version,
    about = "Discover, monitor and configure fleets of networked mining rigs",
    long_about = "Tracks networked mining rigs that expose the AxeOS-style HTTP\n\
        system API.\n\n\
        Probe the whole fleet concurrently, scan a subnet for new rigs,\n\
        push pool settings to every rig at once, or run the HTTP API\n\
        that backs the web dashboard.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path (defaults to the platform config directory)
    #[arg(long, env = "RIGFLEET_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Registry data directory (overrides storage.data_dir)
    #[arg(long, env = "RIGFLEET_DATA_DIR", global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Device API port (overrides devices.port)
    #[arg(long, env = "RIGFLEET_DEVICE_PORT", global = true)]
    pub device_port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "RIGFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tracked devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Probe every host in a subnet and track the ones that answer
    Scan(ScanArgs),

    /// Push pool settings to every tracked device
    Push(PushArgs),

    /// Run the HTTP API (and optional static dashboard)
    Serve(ServeArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// Probe every tracked device and show its current state
    #[command(alias = "ls")]
    List,

    /// Track a device by IPv4 address and probe it once
    Add {
        /// Device IPv4 address
        address: String,
    },

    /// Stop tracking a device
    #[command(alias = "rm")]
    Remove {
        /// Device IPv4 address
        address: String,
    },

    /// Show the stored record for a device (no probe)
    Show {
        /// Device IPv4 address
        address: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SCAN / PUSH / SERVE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Subnet to scan: CIDR (192.168.1.0/24), shorthand (192.168.1.) or a single address
    pub subnet: String,
}

#[derive(Debug, Args)]
pub struct PushArgs {
    /// JSON file with settings fields
    #[arg(long, short = 'F', value_name = "FILE", conflicts_with = "set")]
    pub from_file: Option<PathBuf>,

    /// Settings field to push, e.g. --set stratumPort=3333 (repeatable)
    #[arg(long, short = 's', value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.listen)
    #[arg(long, short = 'l', env = "RIGFLEET_LISTEN", value_name = "ADDR")]
    pub listen: Option<String>,

    /// Directory of static dashboard assets (overrides server.static_dir)
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Log line format
    #[arg(long, env = "RIGFLEET_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line (log shippers)
    Json,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
