//! `Bind` (`spec.md` §4.4): attaches parameter values to a prepared
//! statement and names the resulting portal. This crate always binds
//! every parameter and result column in the binary format (format code
//! `1`), never text.

use crate::error::Error;
use crate::io::BufMutExt;
use crate::message::{FrontendMessage, FrontendMessageFormat};

/// Format code meaning "binary" when used as the lone entry in a format
/// code array (`spec.md` §4.4: a single `1` applies to every column).
const BINARY_FORMAT: i16 = 1;

#[derive(Debug, Clone)]
pub struct Bind<'a> {
    pub portal_name: &'a str,
    pub statement_name: &'a str,
    /// Each parameter's already-encoded binary payload, `None` for SQL
    /// NULL.
    pub params: &'a [Option<Vec<u8>>],
}

impl FrontendMessage for Bind<'_> {
    const FORMAT: FrontendMessageFormat = FrontendMessageFormat::Bind;

    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.put_cstr(self.portal_name);
        buf.put_cstr(self.statement_name);

        // One format code applying to all parameters.
        buf.extend_from_slice(&1i16.to_be_bytes());
        buf.extend_from_slice(&BINARY_FORMAT.to_be_bytes());

        buf.extend_from_slice(&(self.params.len() as i16).to_be_bytes());
        for param in self.params {
            match param {
                Some(bytes) => {
                    buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                    buf.extend_from_slice(bytes);
                }
                None => buf.extend_from_slice(&(-1i32).to_be_bytes()),
            }
        }

        // One format code applying to all result columns.
        buf.extend_from_slice(&1i16.to_be_bytes());
        buf.extend_from_slice(&BINARY_FORMAT.to_be_bytes());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_null_and_present_params() {
        let msg = Bind {
            portal_name: "",
            statement_name: "s1",
            params: &[Some(vec![0, 0, 0, 1]), None],
        };
        let mut buf = Vec::new();
        msg.encode_body(&mut buf).unwrap();
        // portal\0 + stmt\0 + fmt-count(2) + fmt(2) + param-count(2)
        // + len(4)+payload(4) + len(4, -1)
        assert!(buf.len() > 0);
        assert!(buf.ends_with(&[0, 1])); // trailing result-format code
    }
}
