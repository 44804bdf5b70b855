//! Binary encode/decode between [`PgValue`] and wire bytes, keyed by
//! [`Oid`] (`spec.md` §4.5).
//!
//! Decoding an unrecognised OID falls back to a raw `Bytea` with a logged
//! warning, rather than failing the whole row (`spec.md` §4.5 edge cases).
//! Encoding (binding a parameter) has no such fallback: a [`PgValue`]
//! variant with no wire mapping for the requested OID is always a fatal
//! [`Error::UnsupportedType`], per the Design Notes' instruction to fail
//! loudly rather than silently mis-bind a parameter.

use bytes::{Buf, BufMut, Bytes};
use chrono::{DateTime, Utc};

use crate::error::{err_protocol, Error};
use crate::io::buf_ext::BufExt;
use crate::io::{array, float, numeric, timestamp};
use crate::types::oid::{self, Oid};
use crate::types::value::PgValue;

/// Decode a column's binary-format payload into a [`PgValue`].
///
/// `None` input (SQL NULL) always decodes to [`PgValue::Null`] regardless
/// of `oid`.
pub fn decode(oid: Oid, bytes: Option<Bytes>) -> Result<PgValue, Error> {
    let Some(bytes) = bytes else {
        return Ok(PgValue::Null);
    };

    if let Some(elem_oid) = oid::array_element(oid) {
        let (_, elements) = array::decode_elements(bytes)?;
        let mut out = Vec::with_capacity(elements.len());
        for elem in elements {
            out.push(decode(elem_oid, elem)?);
        }
        return Ok(PgValue::Array(out));
    }

    Ok(match oid {
        oid::BOOL => PgValue::Bool(decode_bool(bytes)?),
        oid::INT2 => PgValue::Int2(decode_i16(bytes)?),
        oid::INT4 | oid::OID => PgValue::Int4(decode_i32(bytes)?),
        oid::INT8 => PgValue::Int8(decode_i64(bytes)?),
        oid::FLOAT4 => PgValue::Float4(float::decode_f32(to_array(bytes)?)),
        oid::FLOAT8 => PgValue::Float8(float::decode_f64(to_array(bytes)?)),
        oid::NUMERIC => PgValue::Numeric(numeric::decode(bytes)?),
        oid::TEXT | oid::VARCHAR | oid::BPCHAR | oid::NAME | oid::CSTRING | oid::UNKNOWN | oid::CHAR => {
            PgValue::Text(decode_text(bytes)?)
        }
        oid::BYTEA => PgValue::Bytea(bytes.to_vec()),
        oid::TIMESTAMP | oid::TIMESTAMPTZ => PgValue::Timestamp(decode_timestamp(bytes)?),
        oid::JSON => PgValue::Json(decode_json(bytes)?),
        oid::JSONB => PgValue::Jsonb(decode_jsonb(bytes)?),
        other => {
            tracing::warn!(oid = other.0, "decoding unknown type OID as raw bytes");
            PgValue::Bytea(bytes.to_vec())
        }
    })
}

fn decode_bool(mut bytes: Bytes) -> Result<bool, Error> {
    if bytes.remaining() < 1 {
        return Err(err_protocol!("bool: expected 1 byte"));
    }
    Ok(bytes.get_u8() != 0)
}

fn decode_i16(mut bytes: Bytes) -> Result<i16, Error> {
    bytes.get_i16_be()
}

fn decode_i32(mut bytes: Bytes) -> Result<i32, Error> {
    bytes.get_i32_be()
}

fn decode_i64(mut bytes: Bytes) -> Result<i64, Error> {
    bytes.get_i64_be()
}

fn decode_text(bytes: Bytes) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec()).map_err(|e| err_protocol!("invalid utf-8 text: {e}"))
}

fn decode_timestamp(mut bytes: Bytes) -> Result<DateTime<Utc>, Error> {
    let micros = bytes.get_i64_be()?;
    Ok(timestamp::decode(micros))
}

fn decode_json(bytes: Bytes) -> Result<serde_json::Value, Error> {
    serde_json::from_slice(&bytes).map_err(|e| err_protocol!("invalid json: {e}"))
}

fn decode_jsonb(mut bytes: Bytes) -> Result<serde_json::Value, Error> {
    if bytes.remaining() < 1 {
        return Err(err_protocol!("jsonb: missing version byte"));
    }
    let version = bytes.get_u8();
    if version != 1 {
        return Err(err_protocol!("jsonb: unsupported version byte {version}"));
    }
    serde_json::from_slice(&bytes).map_err(|e| err_protocol!("invalid jsonb: {e}"))
}

fn to_array<const N: usize>(bytes: Bytes) -> Result<[u8; N], Error> {
    bytes
        .as_ref()
        .try_into()
        .map_err(|_| err_protocol!("expected {N} bytes, got {}", bytes.len()))
}

/// Encode a [`PgValue`] as the binary payload for the given parameter
/// `oid`, the inverse of [`decode`].
///
/// Returns `None` for [`PgValue::Null`] (the caller writes the `-1` length
/// prefix itself, matching [`crate::message::bind`]'s framing).
pub fn encode(oid: Oid, value: &PgValue) -> Result<Option<Vec<u8>>, Error> {
    if let PgValue::Null = value {
        return Ok(None);
    }

    if let Some(elem_oid) = oid::array_element(oid) {
        let PgValue::Array(elements) = value else {
            return Err(Error::unsupported_type(format!(
                "cannot bind {value:?} as array OID {oid}"
            )));
        };
        let mut encoded = Vec::with_capacity(elements.len());
        for elem in elements {
            match encode(elem_oid, elem)? {
                Some(bytes) => encoded.push(bytes),
                None => {
                    return Err(Error::unsupported_type(
                        "array elements must be non-null (spec.md §4.1)",
                    ))
                }
            }
        }
        let mut buf = Vec::new();
        array::encode_elements(elem_oid, &encoded, &mut buf);
        return Ok(Some(buf));
    }

    let bytes = match (oid, value) {
        (oid::BOOL, PgValue::Bool(v)) => vec![*v as u8],
        (oid::INT2, PgValue::Int2(v)) => v.to_be_bytes().to_vec(),
        (oid::INT4, PgValue::Int4(v)) | (oid::OID, PgValue::Int4(v)) => v.to_be_bytes().to_vec(),
        (oid::INT8, PgValue::Int8(v)) => v.to_be_bytes().to_vec(),
        (oid::FLOAT4, PgValue::Float4(v)) => float::encode_f32(*v).to_vec(),
        (oid::FLOAT8, PgValue::Float8(v)) => float::encode_f64(*v).to_vec(),
        (oid::NUMERIC, PgValue::Numeric(v)) => {
            let mut buf = Vec::new();
            numeric::encode(v, &mut buf)?;
            buf
        }
        (oid::TEXT, PgValue::Text(v))
        | (oid::VARCHAR, PgValue::Text(v))
        | (oid::BPCHAR, PgValue::Text(v))
        | (oid::NAME, PgValue::Text(v))
        | (oid::CHAR, PgValue::Text(v)) => v.as_bytes().to_vec(),
        (oid::BYTEA, PgValue::Bytea(v)) => v.clone(),
        (oid::TIMESTAMP, PgValue::Timestamp(v)) | (oid::TIMESTAMPTZ, PgValue::Timestamp(v)) => {
            let mut buf = Vec::with_capacity(8);
            buf.put_i64(timestamp::encode(*v));
            buf
        }
        (oid::JSON, PgValue::Json(v)) => serde_json::to_vec(v)
            .map_err(|e| Error::unsupported_type(format!("cannot encode json: {e}")))?,
        (oid::JSONB, PgValue::Jsonb(v)) => {
            let mut buf = vec![1u8];
            buf.extend(
                serde_json::to_vec(v)
                    .map_err(|e| Error::unsupported_type(format!("cannot encode jsonb: {e}")))?,
            );
            buf
        }
        // Input coercion: a bare Rust integer/string bound against a
        // differently-sized or textual OID still encodes correctly.
        (oid::INT8, PgValue::Int2(v)) => (*v as i64).to_be_bytes().to_vec(),
        (oid::INT8, PgValue::Int4(v)) => (*v as i64).to_be_bytes().to_vec(),
        (oid::INT4, PgValue::Int2(v)) => (*v as i32).to_be_bytes().to_vec(),
        (oid::FLOAT8, PgValue::Float4(v)) => float::encode_f64(*v as f64).to_vec(),
        _ => {
            return Err(Error::unsupported_type(format!(
                "cannot bind {value:?} as OID {oid} ({:?})",
                oid::name(oid)
            )))
        }
    };

    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_int4() {
        let value = PgValue::Int4(42);
        let bytes = encode(oid::INT4, &value).unwrap().unwrap();
        let decoded = decode(oid::INT4, Some(Bytes::from(bytes))).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn null_encodes_to_none() {
        assert_eq!(encode(oid::INT4, &PgValue::Null).unwrap(), None);
    }

    #[test]
    fn null_bytes_decode_to_null_regardless_of_oid() {
        assert_eq!(decode(oid::INT4, None).unwrap(), PgValue::Null);
    }

    #[test]
    fn unknown_oid_falls_back_to_bytea() {
        let decoded = decode(Oid(999_999), Some(Bytes::from_static(b"\x01\x02"))).unwrap();
        assert_eq!(decoded, PgValue::Bytea(vec![1, 2]));
    }

    #[test]
    fn mismatched_bind_is_unsupported_type() {
        let err = encode(oid::INT4, &PgValue::Text("nope".into())).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }

    #[test]
    fn array_of_int4_round_trips() {
        let value = PgValue::Array(vec![PgValue::Int4(1), PgValue::Int4(2)]);
        let bytes = encode(oid::INT4_ARRAY, &value).unwrap().unwrap();
        let decoded = decode(oid::INT4_ARRAY, Some(Bytes::from(bytes))).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn jsonb_round_trips_with_version_byte() {
        let value = PgValue::Jsonb(serde_json::json!({"a": 1}));
        let bytes = encode(oid::JSONB, &value).unwrap().unwrap();
        assert_eq!(bytes[0], 1);
        let decoded = decode(oid::JSONB, Some(Bytes::from(bytes))).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn int2_widens_to_int8() {
        let value = PgValue::Int2(7);
        let bytes = encode(oid::INT8, &value).unwrap().unwrap();
        let decoded = decode(oid::INT8, Some(Bytes::from(bytes))).unwrap();
        assert_eq!(decoded, PgValue::Int8(7));
    }
}
