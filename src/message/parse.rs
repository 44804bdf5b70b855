//! `Parse` (`spec.md` §4.4 extended query protocol): names and prepares a
//! statement, optionally pre-declaring its parameter types.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};
use crate::types::Oid;

#[derive(Debug, Clone)]
pub struct Parse<'a> {
    pub statement_name: &'a str,
    pub sql: &'a str,
    pub param_types: &'a [Oid],
}

impl FrontendMessage for Parse<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Parse;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_cstr(self.statement_name);
        buf.put_cstr(self.sql);
        buf.extend_from_slice(&(self.param_types.len() as i16).to_be_bytes());
        for oid in self.param_types {
            buf.extend_from_slice(&oid.0.to_be_bytes());
        }
        Ok(())
    }
}
