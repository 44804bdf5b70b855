//! `Query` (`spec.md` §4.3): the simple query protocol's sole frontend
//! message, a single SQL string that may contain several `;`-separated
//! statements.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone)]
pub struct Query<'a>(pub &'a str);

impl FrontendMessage for Query<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Query;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_cstr(self.0);
        Ok(())
    }
}
