//! `ErrorResponse`/`NoticeResponse` (`spec.md` §4.3/§4.6): both share the
//! same field-tagged body — a sequence of `(tag: u8, value: CString)`
//! pairs terminated by a zero byte — and differ only in which backend tag
//! they arrive under and what the driver does with the result.

use std::collections::BTreeMap;

use bytes::{Buf, Bytes};

use crate::error::{Error, PostgresError};
use crate::message::{BackendMessage, BackendMessageFormat};

fn parse_fields(mut buf: Bytes) -> Result<PostgresError, Error> {
    let mut fields = BTreeMap::new();
    loop {
        if !buf.has_remaining() {
            break;
        }
        let tag = buf.get_u8();
        if tag == 0 {
            break;
        }
        let mut value = Vec::new();
        while buf.has_remaining() {
            let b = buf.get_u8();
            if b == 0 {
                break;
            }
            value.push(b);
        }
        if let Ok(value) = String::from_utf8(value) {
            fields.insert(tag, value);
        }
    }
    Ok(PostgresError::parse(&fields))
}

/// A fatal error from the server (`spec.md` §4.6): always terminates the
/// current protocol phase.
#[derive(Debug, Clone)]
pub struct ErrorResponse(pub PostgresError);

impl BackendMessage for ErrorResponse {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::ErrorResponse;

    fn decode_body(buf: Bytes) -> Result<Self, Error> {
        Ok(ErrorResponse(parse_fields(buf)?))
    }
}

/// A non-fatal notice (`spec.md` §4.3/§7): collected on the result's notice
/// list and forwarded to the logging facade, never failing the phase.
#[derive(Debug, Clone)]
pub struct Notice(pub PostgresError);

impl BackendMessage for Notice {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::NoticeResponse;

    fn decode_body(buf: Bytes) -> Result<Self, Error> {
        Ok(Notice(parse_fields(buf)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_fields(fields: &[(u8, &str)]) -> Bytes {
        let mut buf = Vec::new();
        for (tag, value) in fields {
            buf.push(*tag);
            buf.extend_from_slice(value.as_bytes());
            buf.push(0);
        }
        buf.push(0);
        Bytes::from(buf)
    }

    #[test]
    fn decodes_error_response() {
        let body = encode_fields(&[(b'S', "ERROR"), (b'C', "42601"), (b'M', "syntax error")]);
        let ErrorResponse(err) = ErrorResponse::decode_body(body).unwrap();
        assert_eq!(err.code, "42601");
        assert_eq!(err.message, "syntax error");
    }

    #[test]
    fn decodes_notice_response() {
        let body = encode_fields(&[(b'S', "NOTICE"), (b'C', "00000"), (b'M', "hello")]);
        let Notice(err) = Notice::decode_body(body).unwrap();
        assert_eq!(err.severity, "NOTICE");
    }
}
