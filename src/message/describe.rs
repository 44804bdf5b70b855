//! `Describe` (`spec.md` §4.4): asks the server for a prepared statement's
//! or portal's parameter/row metadata.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescribeTarget {
    Statement,
    Portal,
}

impl DescribeTarget {
    pub(crate) fn tag(self) -> u8 {
        match self {
            DescribeTarget::Statement => b'S',
            DescribeTarget::Portal => b'P',
        }
    }
}

#[derive(Debug, Clone)]
pub struct Describe<'a> {
    pub target: DescribeTarget,
    pub name: &'a str,
}

impl FrontendMessage for Describe<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Describe;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(self.target.tag());
        buf.put_cstr(self.name);
        Ok(())
    }
}
