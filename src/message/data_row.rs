//! `DataRow` (`spec.md` §4.3 extended execution / data model `Row`): one
//! row of results, as an ordered list of column payloads. A column length
//! of `-1` means SQL NULL (`spec.md` §3: "Null is a distinguished value,
//! not an absent key").

use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Error};
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug, Clone)]
pub struct DataRow(pub Vec<Option<Bytes>>);

impl BackendMessage for DataRow {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::DataRow;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        let count = buf.get_i16_be()?;
        let mut columns = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let len = buf.get_i32_be()?;
            if len < 0 {
                columns.push(None);
                continue;
            }
            if (buf.remaining() as i64) < len as i64 {
                return Err(err_protocol!("DataRow: column length exceeds buffer"));
            }
            columns.push(Some(buf.copy_to_bytes(len as usize)));
        }
        Ok(DataRow(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn decodes_null_and_present_columns() {
        let mut buf = Vec::new();
        buf.put_i16(2);
        buf.put_i32(4);
        buf.extend_from_slice(&42i32.to_be_bytes());
        buf.put_i32(-1);

        let DataRow(columns) = DataRow::decode_body(Bytes::from(buf)).unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].as_deref(), Some(&42i32.to_be_bytes()[..]));
        assert!(columns[1].is_none());
    }
}
