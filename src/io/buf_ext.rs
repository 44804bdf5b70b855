//! Primitive readers/writers for the wire formats `spec.md` §4.1 names:
//! fixed-width big-endian integers, length-prefixed and NUL-terminated
//! strings. Floats, `NUMERIC` and arrays get their own modules since each
//! has non-trivial framing of its own.

use bytes::{Buf, BufMut};

use crate::error::{err_protocol, Error};

/// Read helpers over a `Bytes`/`&[u8]`-like cursor. Blanket-implemented for
/// any `bytes::Buf` so message bodies (`bytes::Bytes`) and test fixtures
/// (`&[u8]`) share one call surface.
pub trait BufExt: Buf {
    fn get_i16_be(&mut self) -> Result<i16, Error> {
        if self.remaining() < 2 {
            return Err(err_protocol!("expected 2 bytes, got {}", self.remaining()));
        }
        Ok(self.get_i16())
    }

    fn get_i32_be(&mut self) -> Result<i32, Error> {
        if self.remaining() < 4 {
            return Err(err_protocol!("expected 4 bytes, got {}", self.remaining()));
        }
        Ok(self.get_i32())
    }

    fn get_u32_be(&mut self) -> Result<u32, Error> {
        if self.remaining() < 4 {
            return Err(err_protocol!("expected 4 bytes, got {}", self.remaining()));
        }
        Ok(self.get_u32())
    }

    fn get_i64_be(&mut self) -> Result<i64, Error> {
        if self.remaining() < 8 {
            return Err(err_protocol!("expected 8 bytes, got {}", self.remaining()));
        }
        Ok(self.get_i64())
    }

    fn get_u16_be(&mut self) -> Result<u16, Error> {
        if self.remaining() < 2 {
            return Err(err_protocol!("expected 2 bytes, got {}", self.remaining()));
        }
        Ok(self.get_u16())
    }

    /// Read a NUL-terminated, 7-bit ASCII string (a Postgres "CString").
    fn get_cstr(&mut self) -> Result<String, Error> {
        let mut out = Vec::new();
        loop {
            if !self.has_remaining() {
                return Err(err_protocol!("unterminated cstring"));
            }
            let byte = self.get_u8();
            if byte == 0 {
                break;
            }
            out.push(byte);
        }
        String::from_utf8(out).map_err(|e| err_protocol!("cstring was not valid utf-8: {e}"))
    }

    /// Read the remainder of the buffer as UTF-8.
    fn get_str_to_end(&mut self) -> Result<String, Error> {
        let mut out = vec![0u8; self.remaining()];
        self.copy_to_slice(&mut out);
        String::from_utf8(out).map_err(|e| err_protocol!("expected utf-8: {e}"))
    }
}

impl<T: Buf> BufExt for T {}

/// Write helpers mirroring [`BufExt`], for building frontend message
/// bodies into a `Vec<u8>`.
pub trait BufMutExt: BufMut {
    fn put_cstr(&mut self, s: &str) {
        self.put_slice(s.as_bytes());
        self.put_u8(0);
    }
}

impl<T: BufMut> BufMutExt for T {}

/// `Vec<u8>`-specific helper that needs random access to splice a length
/// prefix back in after encoding the payload — Postgres's universal framing
/// for whole messages and length-prefixed message fields such as array
/// elements. `Vec<u8>` grows on demand with no pre-sizing or restart
/// needed, the idiomatic replacement for `spec.md`'s "grow buffer and
/// restart encoding" algorithm (SPEC_FULL.md §4.2).
pub trait VecExt {
    fn put_length_prefixed<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), Error>;
}

impl VecExt for Vec<u8> {
    fn put_length_prefixed<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), Error>,
    {
        let len_offset = self.len();
        self.extend_from_slice(&[0; 4]);

        f(self)?;

        let len = (self.len() - len_offset) as i32;
        self[len_offset..len_offset + 4].copy_from_slice(&len.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn reads_cstr() {
        let mut buf = Bytes::from_static(b"hello\0trailing");
        assert_eq!(buf.get_cstr().unwrap(), "hello");
        assert_eq!(buf.get_str_to_end().unwrap(), "trailing");
    }

    #[test]
    fn length_prefix_matches_payload() {
        let mut buf = Vec::new();
        buf.put_length_prefixed(|b| {
            b.put_cstr("abc");
            Ok(())
        })
        .unwrap();

        let mut cursor = Bytes::from(buf);
        let len = cursor.get_i32_be().unwrap();
        assert_eq!(len as usize, 4 + 4); // length prefix + "abc\0"
        assert_eq!(cursor.get_cstr().unwrap(), "abc");
    }
}
