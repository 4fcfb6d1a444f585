// ── Device records and probe results ──

use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::{CanonicalSettings, Telemetry};
use crate::error::CoreError;

// ── Per-device errors ────────────────────────────────────────────────

/// Why a device request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceErrorKind {
    /// No answer within the deadline.
    Timeout,
    /// Connection refused, host unreachable, or another network failure.
    Unreachable,
    /// The device answered with a body that is not an info object.
    MalformedPayload,
    /// The device answered with a non-2xx status.
    HttpStatus,
    /// The worker handling this device failed.
    TaskFailed,
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::MalformedPayload => "malformed-payload",
            Self::HttpStatus => "http-status",
            Self::TaskFailed => "task-failed",
        })
    }
}

/// A classified per-device failure, kept as data rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<CoreError> for DeviceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceTimeout { .. } => Self::new(DeviceErrorKind::Timeout, err.to_string()),
            CoreError::DeviceUnreachable { .. } => {
                Self::new(DeviceErrorKind::Unreachable, err.to_string())
            }
            CoreError::DeviceMalformedResponse { .. } => {
                Self::new(DeviceErrorKind::MalformedPayload, err.to_string())
            }
            // Keep the device's own wording; callers match on it.
            CoreError::DeviceRejected { status, message } => Self {
                kind: DeviceErrorKind::HttpStatus,
                message,
                status: Some(status),
            },
            other => Self::new(DeviceErrorKind::TaskFailed, other.to_string()),
        }
    }
}

// ── Probe results ────────────────────────────────────────────────────

/// What a responsive device reported.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineState {
    pub hostname: String,
    pub settings: CanonicalSettings,
    pub telemetry: Telemetry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Online(OnlineState),
    Offline(DeviceError),
}

/// Outcome of probing one address.
///
/// Online results always carry a hostname and settings; offline results
/// always carry an error. The enum makes the two disjoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub address: Ipv4Addr,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn online(address: Ipv4Addr, state: OnlineState) -> Self {
        Self {
            address,
            outcome: ProbeOutcome::Online(state),
        }
    }

    pub fn offline(address: Ipv4Addr, error: DeviceError) -> Self {
        Self {
            address,
            outcome: ProbeOutcome::Offline(error),
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Online(_))
    }

    pub fn hostname(&self) -> Option<&str> {
        match &self.outcome {
            ProbeOutcome::Online(state) => Some(&state.hostname),
            ProbeOutcome::Offline(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DeviceError> {
        match &self.outcome {
            ProbeOutcome::Online(_) => None,
            ProbeOutcome::Offline(err) => Some(err),
        }
    }
}

// ── Registry records ─────────────────────────────────────────────────

/// Last observed state of a tracked device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DeviceState {
    /// Tracked but never successfully probed.
    #[default]
    Unknown,
    Online {
        settings: CanonicalSettings,
        #[serde(default)]
        telemetry: Telemetry,
    },
    Offline {
        error: DeviceError,
    },
}

impl DeviceState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Online { .. } => "online",
            Self::Offline { .. } => "offline",
        }
    }
}

/// One tracked device in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub address: Ipv4Addr,
    pub hostname: String,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub last_known_state: DeviceState,
}

impl DeviceRecord {
    /// A freshly tracked device whose hostname is not yet known.
    pub fn placeholder(address: Ipv4Addr, seen_at: DateTime<Utc>) -> Self {
        Self {
            address,
            hostname: address.to_string(),
            last_seen: seen_at,
            last_known_state: DeviceState::Unknown,
        }
    }
}

// ── Views ────────────────────────────────────────────────────────────

/// A probe result joined with what the registry knows, as returned to
/// CLI and HTTP callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceView {
    pub address: Ipv4Addr,
    pub hostname: String,
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<CanonicalSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Telemetry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<DeviceErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceView {
    /// Offline devices keep the hostname the registry last recorded.
    pub fn from_probe(result: ProbeResult, record: Option<&DeviceRecord>) -> Self {
        let last_seen = record.map(|r| r.last_seen);
        match result.outcome {
            ProbeOutcome::Online(state) => Self {
                address: result.address,
                hostname: state.hostname,
                online: true,
                settings: Some(state.settings),
                telemetry: Some(state.telemetry),
                error: None,
                error_kind: None,
                last_seen,
            },
            ProbeOutcome::Offline(err) => Self {
                address: result.address,
                hostname: record.map_or_else(|| result.address.to_string(), |r| r.hostname.clone()),
                online: false,
                settings: None,
                telemetry: None,
                error: Some(err.message),
                error_kind: Some(err.kind),
                last_seen,
            },
        }
    }
}
