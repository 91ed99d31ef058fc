//! Self-describing values carried by the command relay.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A value that can cross the live-view boundary.
///
/// The JSON transport form is externally tagged, e.g. `{"floatingPoint": 3.0}`
/// or `{"dictionary": {"Command": {"string": "penUp"}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    String(String),
    Integer(i64),
    FloatingPoint(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Data(#[serde(with = "base64_bytes")] Vec<u8>),
    Array(Vec<WireValue>),
    Dictionary(BTreeMap<String, WireValue>),
}

impl WireValue {
    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, WireValue>> {
        match self {
            WireValue::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric payload; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Integer(n) => Some(*n as f64),
            WireValue::FloatingPoint(n) => Some(*n),
            _ => None,
        }
    }

    /// Untagged JSON form used for typed decoding.
    ///
    /// Dates become RFC 3339 strings and binary data becomes base64.
    /// Non-finite floats have no JSON form and map to `null`.
    pub fn to_json(&self) -> Value {
        match self {
            WireValue::String(text) => Value::String(text.clone()),
            WireValue::Integer(n) => Value::Number(Number::from(*n)),
            WireValue::FloatingPoint(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            WireValue::Boolean(flag) => Value::Bool(*flag),
            WireValue::Date(date) => {
                Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            WireValue::Data(bytes) => Value::String(STANDARD.encode(bytes)),
            WireValue::Array(items) => Value::Array(items.iter().map(WireValue::to_json).collect()),
            WireValue::Dictionary(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Build a value from untagged JSON. `null` has no counterpart and yields
    /// `None`; null entries inside arrays and objects are dropped.
    pub fn from_json(value: &Value) -> Option<WireValue> {
        match value {
            Value::Null => None,
            Value::Bool(flag) => Some(WireValue::Boolean(*flag)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => WireValue::Integer(i),
                None => WireValue::FloatingPoint(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(text) => Some(WireValue::String(text.clone())),
            Value::Array(items) => Some(WireValue::Array(
                items.iter().filter_map(WireValue::from_json).collect(),
            )),
            Value::Object(entries) => Some(WireValue::Dictionary(
                entries
                    .iter()
                    .filter_map(|(key, value)| {
                        WireValue::from_json(value).map(|value| (key.clone(), value))
                    })
                    .collect(),
            )),
        }
    }
}

impl From<&str> for WireValue {
    fn from(text: &str) -> Self {
        WireValue::String(text.to_string())
    }
}

impl From<String> for WireValue {
    fn from(text: String) -> Self {
        WireValue::String(text)
    }
}

impl From<f64> for WireValue {
    fn from(n: f64) -> Self {
        WireValue::FloatingPoint(n)
    }
}

impl From<i64> for WireValue {
    fn from(n: i64) -> Self {
        WireValue::Integer(n)
    }
}

impl From<bool> for WireValue {
    fn from(flag: bool) -> Self {
        WireValue::Boolean(flag)
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
