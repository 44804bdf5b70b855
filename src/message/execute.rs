//! `Execute` (`spec.md` §4.4): runs a bound portal, optionally stopping
//! after `max_rows` rows (`0` means unlimited, the only mode this crate
//! uses).

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone)]
pub struct Execute<'a> {
    pub portal_name: &'a str,
    pub max_rows: i32,
}

impl FrontendMessage for Execute<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Execute;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_cstr(self.portal_name);
        buf.extend_from_slice(&self.max_rows.to_be_bytes());
        Ok(())
    }
}
