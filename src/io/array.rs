//! One-dimensional typed array wire codec (`spec.md` §4.1).
//!
//! Wire layout: a 20-byte header (`dimensions: i32 = 1`, `has_nulls: i32 =
//! 0`, `elem_type: i32`, `dim0_size: i32`, `dim0_lower: i32 = 1`), then per
//! element an `i32` length followed by the element's own binary payload.
//! Only one-dimensional, non-null arrays are supported; anything else is a
//! protocol error rather than silently corrupted data.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{err_protocol, Error};
use crate::io::buf_ext::BufExt;
use crate::types::oid::Oid;

/// Decode a one-dimensional array header and return the element payloads
/// (each already sliced to its own `Bytes`, `None` for SQL NULL elements —
/// though `spec.md` restricts this crate to non-nullable-element arrays, so
/// a `None` here is itself a protocol error at the call site).
pub fn decode_elements(mut buf: Bytes) -> Result<(Oid, Vec<Option<Bytes>>), Error> {
    let dimensions = buf.get_i32_be()?;
    let has_nulls = buf.get_i32_be()?;
    let elem_oid = buf.get_u32_be()?;

    if dimensions == 0 {
        return Ok((Oid(elem_oid), Vec::new()));
    }
    if dimensions != 1 {
        return Err(err_protocol!(
            "array: only one-dimensional arrays are supported, got {dimensions} dimensions"
        ));
    }

    let len = buf.get_i32_be()?;
    let lower_bound = buf.get_i32_be()?;
    if lower_bound != 1 {
        return Err(err_protocol!(
            "array: only a lower bound of 1 is supported, got {lower_bound}"
        ));
    }

    let mut elements = Vec::with_capacity(len.max(0) as usize);
    for _ in 0..len {
        let elem_len = buf.get_i32_be()?;
        if elem_len < 0 {
            if has_nulls == 0 {
                return Err(err_protocol!(
                    "array: element is NULL but has_nulls flag was not set"
                ));
            }
            elements.push(None);
            continue;
        }
        if (buf.remaining() as i64) < elem_len as i64 {
            return Err(err_protocol!("array: element length exceeds buffer"));
        }
        elements.push(Some(buf.copy_to_bytes(elem_len as usize)));
    }

    Ok((Oid(elem_oid), elements))
}

/// Encode a one-dimensional, non-null array given the already-encoded
/// element payloads.
pub fn encode_elements(elem_oid: Oid, elements: &[Vec<u8>], buf: &mut Vec<u8>) {
    buf.put_i32(1); // dimensions
    buf.put_i32(0); // has_nulls
    buf.put_u32(elem_oid.0);
    buf.put_i32(elements.len() as i32);
    buf.put_i32(1); // lower bound
    for elem in elements {
        buf.put_i32(elem.len() as i32);
        buf.put_slice(elem);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_int4_array() {
        let elements: Vec<Vec<u8>> = vec![1i32, 2, 3]
            .into_iter()
            .map(|v| v.to_be_bytes().to_vec())
            .collect();

        let mut buf = Vec::new();
        encode_elements(Oid(23), &elements, &mut buf);

        let (oid, decoded) = decode_elements(Bytes::from(buf)).unwrap();
        assert_eq!(oid, Oid(23));
        let values: Vec<i32> = decoded
            .into_iter()
            .map(|e| i32::from_be_bytes(e.unwrap()[..].try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn empty_array() {
        let mut buf = Vec::new();
        encode_elements(Oid(23), &[], &mut buf);
        let (_, decoded) = decode_elements(Bytes::from(buf)).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn rejects_multidimensional_arrays() {
        let mut buf = Vec::new();
        buf.put_i32(2); // dimensions
        buf.put_i32(0);
        buf.put_u32(23);
        let err = decode_elements(Bytes::from(buf)).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn rejects_null_elements_without_flag() {
        let mut buf = Vec::new();
        buf.put_i32(1);
        buf.put_i32(0); // has_nulls = false, but we'll write a NULL anyway
        buf.put_u32(23);
        buf.put_i32(1); // len
        buf.put_i32(1); // lower bound
        buf.put_i32(-1); // NULL element
        let err = decode_elements(Bytes::from(buf)).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
