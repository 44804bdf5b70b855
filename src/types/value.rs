//! [`PgValue`]: the tagged value kind at the public boundary (`spec.md`
//! §4.5, Design Notes — a single untyped value kind is explicitly rejected
//! in favour of this enum).

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// A bound parameter or decoded column value.
///
/// Each variant corresponds to one or more OIDs in [`crate::types::oid`];
/// [`crate::types::codec`] maps between a variant and its wire bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    /// Arbitrary-precision decimal, carried as its canonical textual form
    /// (see `io::numeric`) rather than a lossy `f64`.
    Numeric(String),
    Text(String),
    Bytea(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
    Jsonb(JsonValue),
    /// A one-dimensional array of homogeneously-typed elements.
    Array(Vec<PgValue>),
}

impl PgValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PgValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PgValue::Int2(v) => Some(*v as i64),
            PgValue::Int4(v) => Some(*v as i64),
            PgValue::Int8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PgValue::Float4(v) => Some(*v as f64),
            PgValue::Float8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PgValue::Text(v) => Some(v),
            PgValue::Numeric(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PgValue {
    fn from(v: bool) -> Self {
        PgValue::Bool(v)
    }
}

impl From<i16> for PgValue {
    fn from(v: i16) -> Self {
        PgValue::Int2(v)
    }
}

impl From<i32> for PgValue {
    fn from(v: i32) -> Self {
        PgValue::Int4(v)
    }
}

impl From<i64> for PgValue {
    fn from(v: i64) -> Self {
        PgValue::Int8(v)
    }
}

impl From<f32> for PgValue {
    fn from(v: f32) -> Self {
        PgValue::Float4(v)
    }
}

impl From<f64> for PgValue {
    fn from(v: f64) -> Self {
        PgValue::Float8(v)
    }
}

impl From<String> for PgValue {
    fn from(v: String) -> Self {
        PgValue::Text(v)
    }
}

impl From<&str> for PgValue {
    fn from(v: &str) -> Self {
        PgValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for PgValue {
    fn from(v: Vec<u8>) -> Self {
        PgValue::Bytea(v)
    }
}

impl From<DateTime<Utc>> for PgValue {
    fn from(v: DateTime<Utc>) -> Self {
        PgValue::Timestamp(v)
    }
}

impl From<JsonValue> for PgValue {
    fn from(v: JsonValue) -> Self {
        PgValue::Jsonb(v)
    }
}

impl<T: Into<PgValue>> From<Option<T>> for PgValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => PgValue::Null,
        }
    }
}

impl<T: Into<PgValue>> From<Vec<T>> for PgValue {
    fn from(v: Vec<T>) -> Self {
        PgValue::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_accessors() {
        let v: PgValue = 42i32.into();
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_bool(), None);
    }

    #[test]
    fn option_none_becomes_null() {
        let v: PgValue = None::<i32>.into();
        assert!(v.is_null());
    }

    #[test]
    fn vec_becomes_array() {
        let v: PgValue = vec![1i32, 2, 3].into();
        assert!(matches!(v, PgValue::Array(ref a) if a.len() == 3));
    }
}
