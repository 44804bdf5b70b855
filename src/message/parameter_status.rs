//! `ParameterStatus` (`spec.md` §4.3): the server's push notifications for
//! run-time parameters such as `server_version`, `TimeZone`, and
//! `client_encoding`.

use bytes::Bytes;

use crate::error::Error;
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug, Clone)]
pub struct ParameterStatus {
    pub name: String,
    pub value: String,
}

impl BackendMessage for ParameterStatus {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::ParameterStatus;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        Ok(ParameterStatus {
            name: buf.get_cstr()?,
            value: buf.get_cstr()?,
        })
    }
}
