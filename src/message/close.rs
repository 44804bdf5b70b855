//! `Close` (`spec.md` §4.4): evicts a prepared statement or portal from
//! the server, used when the statement cache evicts a `QueryId`.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::describe::DescribeTarget;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone)]
pub struct Close<'a> {
    pub target: DescribeTarget,
    pub name: &'a str,
}

impl FrontendMessage for Close<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Close;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(self.target.tag());
        buf.put_cstr(self.name);
        Ok(())
    }
}
