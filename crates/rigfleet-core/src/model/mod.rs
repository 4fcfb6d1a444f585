// ── Domain model ──
//
// Typed views of device state shared by the prober, registry and push
// coordinator, and serialized as-is by the CLI and HTTP server.

pub mod device;
pub mod push;
pub mod settings;

pub use device::{
    DeviceError, DeviceErrorKind, DeviceRecord, DeviceState, DeviceView, OnlineState,
    ProbeOutcome, ProbeResult,
};
pub use push::{PushOutcome, PushReport};
pub use settings::{
    CanonicalSettings, ConfigPatch, FieldKind, PoolSettings, SETTINGS_FIELDS, SettingValue,
    Telemetry,
};
