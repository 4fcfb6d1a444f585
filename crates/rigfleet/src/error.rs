//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use rigfleet_config::ConfigError;
use rigfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid device address: {input:?}")]
    #[diagnostic(
        code(rigfleet::invalid_address),
        help("Use a dotted IPv4 address such as 192.168.1.50")
    )]
    InvalidAddress { input: String },

    #[error("Invalid subnet {input:?}: {reason}")]
    #[diagnostic(
        code(rigfleet::invalid_subnet),
        help(
            "Use CIDR notation (192.168.1.0/24), the shorthand 192.168.1.\n\
             or a single address. Raise devices.max_scan_hosts for larger ranges."
        )
    )]
    InvalidSubnet { input: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(rigfleet::validation))]
    Validation { field: String, reason: String },

    #[error("No settings fields to push")]
    #[diagnostic(
        code(rigfleet::empty_push),
        help(
            "Pass --set KEY=VALUE or --from-file with any of: stratumURL, stratumPort,\n\
             stratumUser, stratumPassword, stratumSuggestedDifficulty,\n\
             stratumEnonceSubscribe (and their fallbackStratum* twins)"
        )
    )]
    EmptyPush,

    // ── Devices ──────────────────────────────────────────────────────
    #[error("Device {address} is not tracked")]
    #[diagnostic(
        code(rigfleet::not_found),
        help("Run: rigfleet devices list to see tracked devices")
    )]
    NotTracked { address: String },

    #[error("Device {address} was added but did not answer: {reason}")]
    #[diagnostic(
        code(rigfleet::device_offline),
        help("The device stays tracked and is probed again by: rigfleet devices list")
    )]
    DeviceOffline { address: String, reason: String },

    #[error("Push failed on {failed} of {total} devices")]
    #[diagnostic(code(rigfleet::push_incomplete))]
    PushIncomplete { failed: usize, total: usize },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Registry error: {message}")]
    #[diagnostic(
        code(rigfleet::registry),
        help("Check that the data directory is writable (--data-dir / RIGFLEET_DATA_DIR)")
    )]
    Registry { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(rigfleet::config), help("Check the file shown by: rigfleet config path"))]
    Config(Box<figment::Error>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(rigfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Server ───────────────────────────────────────────────────────
    #[error("Could not start server on {listen}")]
    #[diagnostic(code(rigfleet::server))]
    Server {
        listen: String,
        #[source]
        source: std::io::Error,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(rigfleet::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(rigfleet::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(rigfleet::internal))]
    Internal(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidAddress { .. }
            | Self::InvalidSubnet { .. }
            | Self::Validation { .. }
            | Self::EmptyPush
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::NotTracked { .. } => exit_code::NOT_FOUND,
            Self::DeviceOffline { .. } => exit_code::CONNECTION,
            Self::PushIncomplete { .. } => exit_code::PARTIAL,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAddress { input } => CliError::InvalidAddress { input },
            CoreError::InvalidSubnet { input, reason } => CliError::InvalidSubnet { input, reason },
            CoreError::InvalidConfigValue { field, reason } => {
                CliError::Validation { field, reason }
            }
            CoreError::EmptyConfigPatch => CliError::EmptyPush,
            e @ CoreError::RegistryIo { .. } => CliError::Registry {
                message: e.to_string(),
            },
            // Device-level errors are reported per device, never raised.
            other => CliError::Internal(other.to_string()),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Render(e.to_string()),
        }
    }
}
