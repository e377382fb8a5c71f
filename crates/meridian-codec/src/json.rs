use crate::error::DecodeError;
use std::collections::BTreeMap;

/// Library-independent JSON ADT. Bridges this codec layer to whatever JSON
/// library an embedding host prefers; `serde_json::Value` is used only as
/// the wire format at the crate boundary (`to_serde` / `from_serde`).
#[derive(Clone, Debug, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<JsonValue>),
    Object(BTreeMap<String, JsonValue>),
}

impl JsonValue {
    pub fn to_serde(&self) -> serde_json::Value {
        match self {
            JsonValue::Null => serde_json::Value::Null,
            JsonValue::Bool(b) => serde_json::Value::Bool(*b),
            JsonValue::Number(n) => serde_json::json!(n),
            JsonValue::String(s) => serde_json::Value::String(s.clone()),
            JsonValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(JsonValue::to_serde).collect())
            }
            JsonValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_serde()))
                    .collect(),
            ),
        }
    }

    pub fn from_serde(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => JsonValue::Null,
            serde_json::Value::Bool(b) => JsonValue::Bool(*b),
            serde_json::Value::Number(n) => JsonValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => JsonValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                JsonValue::Array(items.iter().map(JsonValue::from_serde).collect())
            }
            serde_json::Value::Object(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), JsonValue::from_serde(v)))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Result<&str, DecodeError> {
        match self {
            JsonValue::String(s) => Ok(s),
            other => Err(DecodeError::new(format!("expected JSON string, got {other:?}"))),
        }
    }

    pub fn as_object(&self) -> Result<&BTreeMap<String, JsonValue>, DecodeError> {
        match self {
            JsonValue::Object(fields) => Ok(fields),
            other => Err(DecodeError::new(format!("expected JSON object, got {other:?}"))),
        }
    }

    pub fn as_array(&self) -> Result<&[JsonValue], DecodeError> {
        match self {
            JsonValue::Array(items) => Ok(items),
            other => Err(DecodeError::new(format!("expected JSON array, got {other:?}"))),
        }
    }

    pub fn field<'a>(
        fields: &'a BTreeMap<String, JsonValue>,
        name: &str,
    ) -> Result<&'a JsonValue, DecodeError> {
        fields
            .get(name)
            .ok_or_else(|| DecodeError::new(format!("missing JSON field '{name}'")))
    }
}

/// JSON encode/decode, independent of the byte codec. Product derivation is
/// field-by-field; sum derivation uses the wrapped-by-type-key form
/// `{"VariantName": {...}}`.
pub trait JsonCodec: Sized {
    fn to_json(&self) -> JsonValue;
    fn from_json(value: &JsonValue) -> Result<Self, DecodeError>;
}

impl JsonCodec for bool {
    fn to_json(&self) -> JsonValue {
        JsonValue::Bool(*self)
    }

    fn from_json(value: &JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Bool(b) => Ok(*b),
            other => Err(DecodeError::new(format!("expected JSON bool, got {other:?}"))),
        }
    }
}

impl JsonCodec for u64 {
    fn to_json(&self) -> JsonValue {
        JsonValue::Number(*self as f64)
    }

    fn from_json(value: &JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Number(n) if *n >= 0.0 => Ok(*n as u64),
            other => Err(DecodeError::new(format!("expected non-negative JSON number, got {other:?}"))),
        }
    }
}

impl JsonCodec for String {
    fn to_json(&self) -> JsonValue {
        JsonValue::String(self.clone())
    }

    fn from_json(value: &JsonValue) -> Result<Self, DecodeError> {
        value.as_str().map(|s| s.to_string())
    }
}

impl<T: JsonCodec> JsonCodec for Option<T> {
    fn to_json(&self) -> JsonValue {
        match self {
            None => JsonValue::Null,
            Some(t) => t.to_json(),
        }
    }

    fn from_json(value: &JsonValue) -> Result<Self, DecodeError> {
        match value {
            JsonValue::Null => Ok(None),
            other => Ok(Some(T::from_json(other)?)),
        }
    }
}

impl<T: JsonCodec> JsonCodec for Vec<T> {
    fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(JsonCodec::to_json).collect())
    }

    fn from_json(value: &JsonValue) -> Result<Self, DecodeError> {
        value
            .as_array()?
            .iter()
            .map(T::from_json)
            .collect::<Result<Vec<_>, _>>()
    }
}
