//! SASL response wrappers (`spec.md` §4.3): both reuse the frontend
//! `PasswordPolymorphic` tag, only the body content differs from a plain
//! `PasswordMessage`.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};

/// The client's first SASL message: mechanism name plus its
/// `client-first-message`.
#[derive(Debug, Clone)]
pub struct SaslInitialResponse<'a> {
    pub mechanism: &'a str,
    pub data: &'a str,
}

impl FrontendMessage for SaslInitialResponse<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::PasswordPolymorphic;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_cstr(self.mechanism);
        buf.extend_from_slice(&(self.data.len() as i32).to_be_bytes());
        buf.extend_from_slice(self.data.as_bytes());
        Ok(())
    }
}

/// The client's second SASL message: raw `client-final-message`, with no
/// mechanism name or length prefix (`spec.md` §4.3).
#[derive(Debug, Clone)]
pub struct SaslResponse<'a>(pub &'a str);

impl FrontendMessage for SaslResponse<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::PasswordPolymorphic;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.extend_from_slice(self.0.as_bytes());
        Ok(())
    }
}
