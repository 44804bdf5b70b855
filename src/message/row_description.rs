//! `RowDescription` (`spec.md` §4.3 extended preparation / data model
//! `QueryMetadata.columns`): the server's column catalogue for a prepared
//! statement's result set.

use bytes::Bytes;

use crate::error::Error;
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};
use crate::types::Oid;

#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: String,
    /// OID of the table this column belongs to, `0` if not a table column.
    pub table_oid: u32,
    /// Position within that table's columns (1-based), `0` if not a table
    /// column.
    pub column_id: i16,
    pub type_oid: Oid,
    pub type_size: i16,
    pub type_modifier: i32,
    /// Always `1` (binary) in this crate (`spec.md` §6).
    pub format_code: i16,
}

#[derive(Debug, Clone)]
pub struct RowDescription(pub Vec<FieldDescription>);

impl BackendMessage for RowDescription {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::RowDescription;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        let count = buf.get_i16_be()?;
        let mut fields = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            fields.push(FieldDescription {
                name: buf.get_cstr()?,
                table_oid: buf.get_u32_be()?,
                column_id: buf.get_i16_be()?,
                type_oid: Oid(buf.get_u32_be()?),
                type_size: buf.get_i16_be()?,
                type_modifier: buf.get_i32_be()?,
                format_code: buf.get_i16_be()?,
            });
        }
        Ok(RowDescription(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn decodes_one_field() {
        let mut buf = Vec::new();
        buf.put_i16(1);
        buf.extend_from_slice(b"a\0");
        buf.put_u32(0);
        buf.put_i16(0);
        buf.put_u32(23);
        buf.put_i16(4);
        buf.put_i32(-1);
        buf.put_i16(1);

        let RowDescription(fields) = RowDescription::decode_body(Bytes::from(buf)).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "a");
        assert_eq!(fields[0].type_oid, Oid(23));
    }
}
