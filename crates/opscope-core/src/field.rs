//! Structured fields attached to an emitted event.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::value::RawValue;
use serde_json::{Map, Value as JsonValue};

/// Bytes that are already serialized and must not be encoded again.
#[derive(Clone, PartialEq, Eq)]
pub struct RawPayload(Vec<u8>);

impl RawPayload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bytes as an unparsed JSON value, or `None` when they are not a
    /// single valid JSON document.
    pub fn to_raw_value(&self) -> Option<Box<RawValue>> {
        let text = String::from_utf8(self.0.clone()).ok()?;
        RawValue::from_string(text).ok()
    }

    /// Parsed view of the payload, for inspection.
    ///
    /// Parsing normalizes numbers and collapses repeated keys. Output goes
    /// through [`Serialize`], which splices the bytes in untouched.
    pub fn to_json(&self) -> JsonValue {
        match serde_json::from_slice::<JsonValue>(&self.0) {
            Ok(value) => value,
            Err(_) => JsonValue::String(self.lossy_text()),
        }
    }

    fn lossy_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

/// Valid JSON is written verbatim; anything else degrades to a string so the
/// surrounding document stays well-formed.
impl Serialize for RawPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_raw_value() {
            Some(raw) => raw.serialize(serializer),
            None => serializer.serialize_str(&self.lossy_text()),
        }
    }
}

impl fmt::Debug for RawPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPayload({})", String::from_utf8_lossy(&self.0))
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for RawPayload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Typed value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Duration(Duration),
    /// Display text of an error.
    Error(String),
    Json(JsonValue),
    Raw(RawPayload),
}

impl FieldValue {
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Str(s) | FieldValue::Error(s) => JsonValue::String(s.clone()),
            FieldValue::I64(v) => JsonValue::from(*v),
            FieldValue::U64(v) => JsonValue::from(*v),
            FieldValue::F64(v) => JsonValue::from(*v),
            FieldValue::Bool(v) => JsonValue::Bool(*v),
            FieldValue::Duration(d) => JsonValue::String(format!("{:?}", d)),
            FieldValue::Json(v) => v.clone(),
            FieldValue::Raw(raw) => raw.to_json(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(s) | FieldValue::Error(s) => serializer.serialize_str(s),
            FieldValue::I64(v) => serializer.serialize_i64(*v),
            FieldValue::U64(v) => serializer.serialize_u64(*v),
            FieldValue::F64(v) => JsonValue::from(*v).serialize(serializer),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Duration(d) => serializer.collect_str(&format_args!("{:?}", d)),
            FieldValue::Json(v) => v.serialize(serializer),
            FieldValue::Raw(raw) => raw.serialize(serializer),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) | FieldValue::Error(s) => f.write_str(s),
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Json(v) => write!(f, "{}", v),
            FieldValue::Raw(raw) => f.write_str(&String::from_utf8_lossy(raw.as_bytes())),
        }
    }
}

macro_rules! field_value_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v as $target)
                }
            }
        )*
    };
}

field_value_from!(
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    usize => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

impl From<JsonValue> for FieldValue {
    fn from(v: JsonValue) -> Self {
        FieldValue::Json(v)
    }
}

impl From<RawPayload> for FieldValue {
    fn from(v: RawPayload) -> Self {
        FieldValue::Raw(v)
    }
}

/// One key/value pair of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: FieldValue,
}

impl Field {
    /// Generic key + value field.
    pub fn any(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Error field, always under the key `error`.
    pub fn err(error: &(dyn std::error::Error + '_)) -> Self {
        Self {
            key: Cow::Borrowed("error"),
            value: FieldValue::Error(error.to_string()),
        }
    }

    /// Already-serialized bytes, passed through without re-encoding.
    pub fn raw(key: impl Into<Cow<'static, str>>, bytes: impl Into<RawPayload>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Raw(bytes.into()),
        }
    }

    /// Formatted string field: `Field::str("user", format_args!("{}-{}", a, b))`.
    pub fn str(key: impl Into<Cow<'static, str>>, args: fmt::Arguments<'_>) -> Self {
        Self {
            key: key.into(),
            value: FieldValue::Str(fmt::format(args)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

/// Render fields as one JSON object, keeping insertion order.
///
/// A repeated key keeps its first position and takes the last value.
pub fn fields_to_json(fields: &[Field]) -> JsonValue {
    let mut map = Map::with_capacity(fields.len());
    for field in fields {
        map.insert(field.key.to_string(), field.value.to_json());
    }
    JsonValue::Object(map)
}

/// Serializable view of a field list as one JSON object.
///
/// Same key rules as [`fields_to_json`], but raw payloads keep their exact
/// bytes.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a>(pub &'a [Field]);

impl Serialize for Fields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (i, field) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|f| f.key == field.key) {
                continue;
            }
            let last = self.0.iter().rev().find(|f| f.key == field.key).unwrap_or(field);
            map.serialize_entry(field.key(), &last.value)?;
        }
        map.end()
    }
}

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
