// rigfleet-core: Fleet engine between rigfleet-api and consumers (CLI/server).
//
// Expands address sets, probes devices with bounded concurrency, keeps the
// registry in step with what answered, and broadcasts settings patches.

pub mod address;
pub mod batch;
pub mod config;
pub mod error;
pub mod fleet;
pub mod model;
pub mod probe;
pub mod registry;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use address::{Subnet, expand_subnet, parse_address};
pub use batch::{BatchEntry, BatchRunner, TaskFailure};
pub use config::{ConcurrencyLimits, FleetConfig};
pub use error::CoreError;
pub use fleet::{AddOutcome, Fleet, ScanReport};
pub use registry::{FileRegistry, Reconcile, Registry, reconcile};
pub use transport::DeviceTransport;

pub use model::{
    CanonicalSettings, ConfigPatch, DeviceError, DeviceErrorKind, DeviceRecord, DeviceState,
    DeviceView, PoolSettings, ProbeResult, PushOutcome, PushReport, Telemetry,
};
