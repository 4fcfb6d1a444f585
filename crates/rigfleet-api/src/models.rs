// Wire models for the rig firmware API.
//
// The info payload differs between firmware builds, so it is kept as an
// open JSON object and normalized in `rigfleet-core`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw `GET /api/system/info` payload: any JSON object.
///
/// Deserializing into a map rejects arrays, scalars and `null`, so a
/// successful parse already guarantees an object-shaped payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemInfo(pub Map<String, Value>);

impl SystemInfo {
    /// Look up a raw field by its firmware name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The device-reported hostname, if present and a non-empty string.
    pub fn hostname(&self) -> Option<&str> {
        self.get("hostname")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for SystemInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Body of a 2xx `PATCH /api/system` response.
///
/// Firmware builds answer with nothing, a JSON document, or plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushAck {
    Json(Value),
    Text(String),
}

/// `{ "error": "..." }` body returned on rejection.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<Value>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message from the body.
    pub(crate) fn message(self) -> Option<String> {
        match self.error {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::String(_) | Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        }
    }
}
