//! `ParameterDescription` (`spec.md` §4.3 extended preparation): the
//! inferred parameter OIDs for a prepared statement, in positional order.

use bytes::Bytes;

use crate::error::Error;
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};
use crate::types::Oid;

#[derive(Debug, Clone)]
pub struct ParameterDescription(pub Vec<Oid>);

impl BackendMessage for ParameterDescription {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::ParameterDescription;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        let count = buf.get_i16_be()?;
        let mut oids = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            oids.push(Oid(buf.get_u32_be()?));
        }
        Ok(ParameterDescription(oids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn decodes_oids_in_order() {
        let mut buf = Vec::new();
        buf.put_i16(2);
        buf.put_u32(23);
        buf.put_u32(25);
        let ParameterDescription(oids) = ParameterDescription::decode_body(Bytes::from(buf)).unwrap();
        assert_eq!(oids, vec![Oid(23), Oid(25)]);
    }
}
