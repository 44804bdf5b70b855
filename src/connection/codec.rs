//! The backend frame reassembler (`spec.md` §4.2): turns a raw byte stream
//! into `(type, payload)` units, coalescing partial reads and retaining a
//! leftover fragment across calls.

use bytes::{Buf, BytesMut};

use crate::error::{err_protocol, Error};
use crate::message::{BackendMessageFormat, ReceivedMessage};

/// Every backend message needs at least a 1-byte tag and a 4-byte length.
const HEADER_LEN: usize = 5;

/// Attempt to decode one complete message from the front of `buf`.
///
/// Returns `Ok(None)` when fewer than a full frame is available; the
/// caller reads more bytes into `buf` and calls again. Never consumes a
/// partial frame — `buf` is left untouched until a whole message can be
/// taken off the front.
pub fn decode_frame(buf: &mut BytesMut) -> Result<Option<ReceivedMessage>, Error> {
    let Some(mut header) = buf.get(..HEADER_LEN) else {
        return Ok(None);
    };

    let format = BackendMessageFormat::try_from_u8(header.get_u8())?;
    let message_len = header.get_u32() as usize;

    let expected_len = message_len
        .checked_add(1)
        .ok_or_else(|| err_protocol!("message length {message_len} overflows usize"))?;

    if buf.len() < expected_len {
        return Ok(None);
    }

    // `buf` must not be mutated above this point: a short read must leave
    // it exactly as the caller passed it in.
    buf.advance(1); // format byte, not counted in `message_len`

    let mut contents = buf.split_to(message_len).freeze();
    contents.advance(4); // the length prefix itself

    Ok(Some(ReceivedMessage { format, contents }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_u8(tag);
        buf.put_i32((payload.len() + 4) as i32);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn waits_for_full_header() {
        let mut buf = BytesMut::from(&[b'Z', 0, 0][..]);
        assert!(decode_frame(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3); // nothing consumed
    }

    #[test]
    fn waits_for_full_body() {
        let mut bytes = frame(b'Z', &[1, 2, 3]);
        bytes.truncate(bytes.len() - 1);
        let mut buf = BytesMut::from(&bytes[..]);
        assert!(decode_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decodes_one_frame_and_leaves_trailing_bytes() {
        let mut bytes = frame(b'Z', &[b'I']);
        bytes.extend_from_slice(&frame(b'Z', &[b'I']));
        let mut buf = BytesMut::from(&bytes[..]);

        let msg = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(msg.format, BackendMessageFormat::ReadyForQuery);
        assert_eq!(&msg.contents[..], &[b'I']);
        assert_eq!(buf.len(), 9); // the second frame, untouched
    }

    #[test]
    fn coalesces_a_frame_split_across_two_reads() {
        let bytes = frame(b'Z', &[b'I']);
        let mut buf = BytesMut::from(&bytes[..3]);
        assert!(decode_frame(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&bytes[3..]);
        assert!(decode_frame(&mut buf).unwrap().is_some());
    }
}
