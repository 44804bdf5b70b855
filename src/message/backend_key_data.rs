//! `BackendKeyData` (`spec.md` §4.3/§4.6): the cancel key, kept for the
//! connection's lifetime to support out-of-band `CancelRequest`.

use bytes::Bytes;

use crate::error::Error;
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug, Clone, Copy)]
pub struct BackendKeyData {
    pub process_id: i32,
    pub secret_key: i32,
}

impl BackendMessage for BackendKeyData {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::BackendKeyData;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        Ok(BackendKeyData {
            process_id: buf.get_i32_be()?,
            secret_key: buf.get_i32_be()?,
        })
    }
}
