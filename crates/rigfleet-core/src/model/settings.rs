// ── Canonical device settings ──
//
// Firmware builds disagree on value types: ports arrive as numbers or
// strings, flags as booleans, 0/1 or "on"/"off". Everything is coerced
// into one typed shape here, in both directions.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use rigfleet_api::SystemInfo;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CoreError;

// ── Field table ──────────────────────────────────────────────────────

/// Value type of a settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Integer with an inclusive valid range (enforced on push).
    Integer { min: i64, max: i64 },
    Flag,
}

/// Port range accepted on push.
const PORT: FieldKind = FieldKind::Integer {
    min: 1,
    max: 65_535,
};
const DIFFICULTY: FieldKind = FieldKind::Integer {
    min: 0,
    max: i64::MAX,
};

/// The settings fields the engine reads and pushes, by firmware name.
pub static SETTINGS_FIELDS: [(&str, FieldKind); 12] = [
    ("stratumURL", FieldKind::Text),
    ("stratumPort", PORT),
    ("stratumUser", FieldKind::Text),
    ("stratumPassword", FieldKind::Text),
    ("stratumSuggestedDifficulty", DIFFICULTY),
    ("stratumEnonceSubscribe", FieldKind::Flag),
    ("fallbackStratumURL", FieldKind::Text),
    ("fallbackStratumPort", PORT),
    ("fallbackStratumUser", FieldKind::Text),
    ("fallbackStratumPassword", FieldKind::Text),
    ("fallbackStratumSuggestedDifficulty", DIFFICULTY),
    ("fallbackStratumEnonceSubscribe", FieldKind::Flag),
];

/// Look up a canonical field by firmware name.
pub fn field_kind(name: &str) -> Option<FieldKind> {
    SETTINGS_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

// ── Canonical settings ───────────────────────────────────────────────

/// Pool settings for one stratum endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSettings {
    pub url: String,
    pub port: i64,
    pub user: String,
    pub password: String,
    pub suggested_difficulty: i64,
    pub enonce_subscribe: bool,
}

/// Total, typed view of a device's pool configuration.
///
/// Every field is always present; values the device omitted or sent in
/// an unusable shape fall back to `""`, `0` or `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSettings {
    pub primary: PoolSettings,
    pub fallback: PoolSettings,
}

impl CanonicalSettings {
    /// Normalize a raw info payload. Never fails.
    pub fn from_info(info: &SystemInfo) -> Self {
        Self {
            primary: PoolSettings::read(info, ""),
            fallback: PoolSettings::read(info, "fallback"),
        }
    }
}

impl PoolSettings {
    /// Read one endpoint's fields. `prefix` is `""` for the primary pool
    /// and `"fallback"` for the secondary one.
    fn read(info: &SystemInfo, prefix: &str) -> Self {
        let name = |suffix: &str| {
            if prefix.is_empty() {
                format!("stratum{suffix}")
            } else {
                format!("{prefix}Stratum{suffix}")
            }
        };
        let raw = |suffix: &str| info.get(&name(suffix)).filter(|v| !v.is_null());

        Self {
            url: raw("URL").and_then(coerce_text).unwrap_or_default(),
            port: raw("Port").and_then(coerce_integer).unwrap_or_default(),
            user: raw("User").and_then(coerce_text).unwrap_or_default(),
            password: raw("Password").and_then(coerce_text).unwrap_or_default(),
            suggested_difficulty: raw("SuggestedDifficulty")
                .and_then(coerce_integer)
                .unwrap_or_default(),
            enonce_subscribe: raw("EnonceSubscribe")
                .and_then(coerce_flag)
                .unwrap_or_default(),
        }
    }
}

// ── Telemetry ────────────────────────────────────────────────────────

/// Status readings captured alongside settings when a device answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

impl Telemetry {
    pub fn from_info(info: &SystemInfo) -> Self {
        Self {
            hash_rate: info.get("hashRate").and_then(coerce_float),
            temp: info.get("temp").and_then(coerce_float),
            power: info.get("power").and_then(coerce_float),
            version: info.get("version").and_then(coerce_text),
            uptime_seconds: info
                .get("uptimeSeconds")
                .and_then(coerce_integer)
                .and_then(|v| u64::try_from(v).ok()),
        }
    }
}

/// Device hostname, or the address itself when the device reports none.
pub fn hostname_or_placeholder(info: &SystemInfo, address: Ipv4Addr) -> String {
    info.hostname()
        .map_or_else(|| address.to_string(), str::to_owned)
}

// ── Config patch ─────────────────────────────────────────────────────

/// A typed settings value ready to send to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

impl Serialize for SettingValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            // Firmware expects flags as 0/1.
            Self::Flag(b) => serializer.serialize_u8(u8::from(*b)),
        }
    }
}

/// Partial settings update, validated before any device is contacted.
///
/// Only canonical fields are kept. Unknown keys are dropped and `null`
/// values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    fields: BTreeMap<&'static str, SettingValue>,
}

impl ConfigPatch {
    /// Validate and coerce a raw JSON payload.
    ///
    /// Fails with `InvalidConfigValue` naming the first offending field,
    /// or `EmptyConfigPatch` if no canonical field remains.
    pub fn from_value(payload: &Value) -> Result<Self, CoreError> {
        let Value::Object(map) = payload else {
            return Err(CoreError::invalid_value("payload", "expected a JSON object"));
        };
        Self::from_map(map)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, CoreError> {
        let mut fields = BTreeMap::new();
        for (key, raw) in map {
            let Some((name, kind)) = SETTINGS_FIELDS
                .iter()
                .find(|(field, _)| *field == key.as_str())
            else {
                debug!(field = %key, "ignoring unknown settings field");
                continue;
            };
            if raw.is_null() {
                continue;
            }
            fields.insert(*name, coerce_strict(name, *kind, raw)?);
        }
        if fields.is_empty() {
            return Err(CoreError::EmptyConfigPatch);
        }
        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<&SettingValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}

impl Serialize for ConfigPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn coerce_strict(field: &str, kind: FieldKind, raw: &Value) -> Result<SettingValue, CoreError> {
    match kind {
        FieldKind::Text => coerce_text(raw)
            .map(SettingValue::Text)
            .ok_or_else(|| CoreError::invalid_value(field, "must be a string")),
        FieldKind::Integer { min, max } => {
            let n = coerce_integer(raw)
                .ok_or_else(|| CoreError::invalid_value(field, "must be a number"))?;
            if (min..=max).contains(&n) {
                Ok(SettingValue::Integer(n))
            } else if max == i64::MAX {
                Err(CoreError::invalid_value(field, format!("must be at least {min}")))
            } else {
                Err(CoreError::invalid_value(
                    field,
                    format!("must be between {min} and {max}"),
                ))
            }
        }
        FieldKind::Flag => coerce_flag(raw)
            .map(SettingValue::Flag)
            .ok_or_else(|| CoreError::invalid_value(field, "must be a boolean or on/off")),
    }
}

// ── Coercion ─────────────────────────────────────────────────────────

fn coerce_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract().abs() < f64::EPSILON)
                .and_then(|f| format!("{f:.0}").parse().ok())
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_flag(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "on" | "true" | "1" | "yes" => Some(true),
            "off" | "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
