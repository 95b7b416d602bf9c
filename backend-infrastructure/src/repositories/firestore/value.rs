use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Decoded Firestore field value. Maps and arrays are kept only as far as the
/// check-in flow reads them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Other,
}

impl FieldValue {
    pub fn decode(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return FieldValue::Other;
        };
        if object.contains_key("nullValue") {
            return FieldValue::Null;
        }
        if let Some(flag) = object.get("booleanValue").and_then(Value::as_bool) {
            return FieldValue::Bool(flag);
        }
        if let Some(raw) = object.get("integerValue") {
            // Int64 travels as a JSON string.
            let parsed = raw
                .as_str()
                .and_then(|text| text.parse().ok())
                .or_else(|| raw.as_i64());
            return parsed.map(FieldValue::Integer).unwrap_or(FieldValue::Other);
        }
        if let Some(number) = object.get("doubleValue").and_then(Value::as_f64) {
            return FieldValue::Double(number);
        }
        if let Some(text) = object.get("stringValue").and_then(Value::as_str) {
            return FieldValue::String(text.to_string());
        }
        if let Some(text) = object.get("timestampValue").and_then(Value::as_str) {
            return DateTime::parse_from_rfc3339(text)
                .map(|at| FieldValue::Timestamp(at.with_timezone(&Utc)))
                .unwrap_or(FieldValue::Other);
        }
        if let Some(array) = object.get("arrayValue") {
            let values = array
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(FieldValue::decode).collect())
                .unwrap_or_default();
            return FieldValue::Array(values);
        }
        FieldValue::Other
    }

    pub fn encode(&self) -> Value {
        match self {
            FieldValue::Null | FieldValue::Other => json!({ "nullValue": null }),
            FieldValue::Bool(flag) => json!({ "booleanValue": flag }),
            FieldValue::Integer(number) => json!({ "integerValue": number.to_string() }),
            FieldValue::Double(number) => json!({ "doubleValue": number }),
            FieldValue::String(text) => json!({ "stringValue": text }),
            FieldValue::Timestamp(at) => json!({ "timestampValue": at.to_rfc3339() }),
            FieldValue::Array(values) => {
                json!({ "arrayValue": { "values": values.iter().map(FieldValue::encode).collect::<Vec<_>>() } })
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Flag fields are read the way the web clients coerce them: zero, NaN,
    /// the empty string and null are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(flag) => *flag,
            FieldValue::Integer(number) => *number != 0,
            FieldValue::Double(number) => *number != 0.0 && !number.is_nan(),
            FieldValue::String(text) => !text.is_empty(),
            FieldValue::Timestamp(_) | FieldValue::Array(_) | FieldValue::Other => true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// Last path segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).map(FieldValue::decode)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.field(key)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|value| !value.trim().is_empty())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.field(key).is_some_and(|value| value.is_truthy())
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.field(key)? {
            FieldValue::Integer(number) => Some(number),
            FieldValue::Double(number) => Some(number as i64),
            _ => None,
        }
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.field(key)? {
            FieldValue::Timestamp(at) => Some(at),
            _ => None,
        }
    }

    /// String-valued fields only, for display name derivation.
    pub fn string_fields(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(key, value)| match FieldValue::decode(value) {
                FieldValue::String(text) => Some((key.clone(), text)),
                _ => None,
            })
            .collect()
    }
}
