use thiserror::Error;

/// Top-level error type for the `rigfleet-api` crate.
///
/// Covers every failure mode of a single device request: transport,
/// HTTP status, and payload decoding. `rigfleet-core` classifies these
/// into per-device offline states.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The request did not complete within its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// TCP connect failed (refused, host unreachable, no route).
    #[error("Cannot connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// Any other HTTP transport error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Device responses ────────────────────────────────────────────
    /// Non-2xx response. `message` is the device's `{error}` field when
    /// present, otherwise the raw body or the status reason.
    #[error("Device returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Malformed device payload: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the request hit its deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the device could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Connect { .. } => true,
            Self::Transport(e) => e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status code, if the device answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Map a `reqwest` send/read failure into the transport taxonomy.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_connect() {
            Self::Connect {
                address: err
                    .url()
                    .and_then(|u| u.host_str().map(str::to_owned))
                    .unwrap_or_else(|| "<unknown>".into()),
                reason: root_cause(&err),
            }
        } else {
            Self::Transport(err)
        }
    }
}

/// Innermost `source()` message; reqwest's own `Display` only says
/// "error sending request".
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}
