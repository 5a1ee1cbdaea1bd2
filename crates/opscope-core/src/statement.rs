//! Statement rendering for logs.
//!
//! Turns a `?`-templated statement plus its bound values back into readable
//! text. The output is for humans reading logs, never for replaying against
//! a database.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone};

/// Placeholder token recognised in statement templates.
pub const PLACEHOLDER: char = '?';

/// Display format of timestamps in rendered statements.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value bound to a statement placeholder.
///
/// This is the bound value itself; only [`Value::to_literal`] applies the
/// display rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Timestamp(NaiveDateTime),
    Text(String),
    Null,
}

impl Value {
    /// Literal text used when the value is substituted into a statement.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Integer(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => format!("'{}'", v),
            Value::Timestamp(ts) => format!("'{}'", ts.format(TIMESTAMP_FORMAT)),
            Value::Text(s) => format!("'{}'", s),
            Value::Null => "NULL".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Values past `i64::MAX` keep their digits as text.
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Text(v.to_string()),
        }
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::from(v as u64)
    }
}

impl From<isize> for Value {
    fn from(v: isize) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

/// Zoned timestamps keep the wall-clock time of their own offset.
impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::Timestamp(v.naive_local())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Substitute `values` into the `?` placeholders of `template`, left to right.
///
/// Substituted text is never rescanned. Surplus placeholders or surplus
/// values are tolerated: rendering stops at whichever runs out first and the
/// rest of the template is kept as is.
pub fn render(template: &str, values: &[Value]) -> String {
    let mut out = String::with_capacity(template.len() + values.len() * 8);
    let mut rest = template;
    let mut values = values.iter();

    while let Some(pos) = rest.find(PLACEHOLDER) {
        let Some(value) = values.next() else {
            break;
        };
        out.push_str(&rest[..pos]);
        out.push_str(&value.to_literal());
        rest = &rest[pos + PLACEHOLDER.len_utf8()..];
    }

    out.push_str(rest);
    out
}
