//! `StartupMessage` (`spec.md` §4.3): untagged, its own length prefix, a
//! fixed protocol version, then `name\0value\0` pairs terminated by a
//! final NUL.

use crate::error::Error;
use crate::io::VecExt;

/// `196608` = `3 << 16 | 0`, protocol version 3.0.
const PROTOCOL_VERSION_3_0: i32 = 196_608;

#[derive(Debug, Clone)]
pub struct Startup {
    pub params: Vec<(String, String)>,
}

impl Startup {
    /// Encode the whole message (it has no format byte, unlike every other
    /// frontend message).
    pub fn encode_msg(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_length_prefixed(|buf| {
            buf.extend_from_slice(&PROTOCOL_VERSION_3_0.to_be_bytes());
            for (k, v) in &self.params {
                buf.extend_from_slice(k.as_bytes());
                buf.push(0);
                buf.extend_from_slice(v.as_bytes());
                buf.push(0);
            }
            buf.push(0);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::BufExt;
    use bytes::Bytes;

    #[test]
    fn encodes_params_in_order() {
        let msg = Startup {
            params: vec![
                ("user".into(), "alice".into()),
                ("database".into(), "postgres".into()),
            ],
        };
        let mut buf = Vec::new();
        msg.encode_msg(&mut buf).unwrap();

        let mut cursor = Bytes::from(buf);
        let len = cursor.get_i32_be().unwrap();
        assert_eq!(len as usize, cursor.len() + 4);
        let version = cursor.get_i32_be().unwrap();
        assert_eq!(version, PROTOCOL_VERSION_3_0);
        assert_eq!(cursor.get_cstr().unwrap(), "user");
        assert_eq!(cursor.get_cstr().unwrap(), "alice");
        assert_eq!(cursor.get_cstr().unwrap(), "database");
        assert_eq!(cursor.get_cstr().unwrap(), "postgres");
    }
}
