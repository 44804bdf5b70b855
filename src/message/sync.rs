//! `Sync` (`spec.md` §4.4): closes out an extended-query pipeline and asks
//! the server for a fresh `ReadyForQuery`.

use crate::error::Error;
use crate::message::{FrontendMessage, FrontendMessageFormat};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sync;

impl FrontendMessage for Sync {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Sync;

    fn encode_body(&self, _buf: &mut Vec<u8>) -> Result<(), Error> {
        Ok(())
    }
}
