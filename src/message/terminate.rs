//! `Terminate` (`spec.md` §4.3): a graceful close, sent before dropping
//! the socket.

use crate::error::Error;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone, Copy, Default)]
pub struct Terminate;

impl FrontendMessage for Terminate {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Terminate;

    fn encode_body(&self, _buf: &mut Vec<u8>) -> Result<(), Error> {
        Ok(())
    }
}
