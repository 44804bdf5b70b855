//! `SSLRequest` (`spec.md` §4.3): a fixed 8-byte untagged message the
//! client may send before `StartupMessage` to negotiate TLS.

use crate::error::Error;

const SSL_REQUEST_CODE: i32 = 80_877_103;

#[derive(Debug, Clone, Copy, Default)]
pub struct SslRequest;

impl SslRequest {
    pub fn encode_msg(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.extend_from_slice(&8i32.to_be_bytes());
        buf.extend_from_slice(&SSL_REQUEST_CODE.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fixed_eight_bytes() {
        let mut buf = Vec::new();
        SslRequest.encode_msg(&mut buf).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(i32::from_be_bytes(buf[0..4].try_into().unwrap()), 8);
        assert_eq!(
            i32::from_be_bytes(buf[4..8].try_into().unwrap()),
            SSL_REQUEST_CODE
        );
    }
}
