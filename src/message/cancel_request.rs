//! `CancelRequest` (`spec.md` §4.3/§4.6): sent on a fresh, unauthenticated
//! connection to ask the server to cancel whatever statement is running
//! under the given cancel key.

use crate::error::Error;

const CANCEL_REQUEST_CODE: i32 = 80_877_102;

#[derive(Debug, Clone, Copy)]
pub struct CancelRequest {
    pub process_id: i32,
    pub secret_key: i32,
}

impl CancelRequest {
    pub fn encode_msg(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.extend_from_slice(&16i32.to_be_bytes());
        buf.extend_from_slice(&CANCEL_REQUEST_CODE.to_be_bytes());
        buf.extend_from_slice(&self.process_id.to_be_bytes());
        buf.extend_from_slice(&self.secret_key.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_sixteen_bytes() {
        let msg = CancelRequest {
            process_id: 123,
            secret_key: 456,
        };
        let mut buf = Vec::new();
        msg.encode_msg(&mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(i32::from_be_bytes(buf[8..12].try_into().unwrap()), 123);
        assert_eq!(i32::from_be_bytes(buf[12..16].try_into().unwrap()), 456);
    }
}
