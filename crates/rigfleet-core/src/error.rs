// ── Core error types ──
//
// Errors surfaced by rigfleet-core. Device transport failures arrive as
// `rigfleet_api::Error` and are translated at the transport seam, so the
// prober and push coordinator only ever match on these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid device address: {input:?}")]
    InvalidAddress { input: String },

    #[error("Invalid subnet {input:?}: {reason}")]
    InvalidSubnet { input: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidConfigValue { field: String, reason: String },

    #[error("Config payload contains no recognised settings fields")]
    EmptyConfigPatch,

    // ── Device errors ────────────────────────────────────────────────
    // Captured per device as data; never returned from a fleet operation.
    #[error("Cannot connect to {address}: {reason}")]
    DeviceUnreachable { address: String, reason: String },

    #[error("Device did not answer within {timeout_ms}ms")]
    DeviceTimeout { timeout_ms: u64 },

    #[error("Malformed device response: {message}")]
    DeviceMalformedResponse { message: String },

    #[error("Device rejected the request (HTTP {status}): {message}")]
    DeviceRejected { status: u16, message: String },

    // ── Storage errors ───────────────────────────────────────────────
    #[error("Registry I/O error ({context}): {source}")]
    RegistryIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for errors caused by caller input, raised before any I/O.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. }
                | Self::InvalidSubnet { .. }
                | Self::InvalidConfigValue { .. }
                | Self::EmptyConfigPatch
        )
    }

    pub(crate) fn registry_io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::RegistryIo {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<rigfleet_api::Error> for CoreError {
    fn from(err: rigfleet_api::Error) -> Self {
        match err {
            rigfleet_api::Error::Timeout { timeout_ms } => CoreError::DeviceTimeout { timeout_ms },
            rigfleet_api::Error::Connect { address, reason } => {
                CoreError::DeviceUnreachable { address, reason }
            }
            rigfleet_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::DeviceTimeout { timeout_ms: 0 }
                } else {
                    CoreError::DeviceUnreachable {
                        address: e
                            .url()
                            .and_then(|u| u.host_str().map(str::to_owned))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            rigfleet_api::Error::Status { status, message } => {
                CoreError::DeviceRejected { status, message }
            }
            rigfleet_api::Error::Deserialization { message, body: _ } => {
                CoreError::DeviceMalformedResponse { message }
            }
            rigfleet_api::Error::InvalidUrl(e) => CoreError::Internal(format!("Invalid URL: {e}")),
            rigfleet_api::Error::Client(msg) => CoreError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_flagged() {
        assert!(CoreError::InvalidAddress { input: "x".into() }.is_client_error());
        assert!(CoreError::EmptyConfigPatch.is_client_error());
        assert!(!CoreError::DeviceTimeout { timeout_ms: 1 }.is_client_error());
        assert!(
            !CoreError::registry_io("write", std::io::Error::other("disk full")).is_client_error()
        );
    }

    #[test]
    fn api_status_maps_to_rejected() {
        let err: CoreError = rigfleet_api::Error::Status {
            status: 422,
            message: "rejected".into(),
        }
        .into();
        assert!(
            matches!(err, CoreError::DeviceRejected { status: 422, ref message } if message == "rejected")
        );
    }

    #[test]
    fn api_timeout_keeps_deadline() {
        let err: CoreError = rigfleet_api::Error::Timeout { timeout_ms: 2000 }.into();
        assert_eq!(err.to_string(), "Device did not answer within 2000ms");
    }
}
