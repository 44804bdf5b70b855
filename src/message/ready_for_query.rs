//! `ReadyForQuery` (`spec.md` §4.3): the terminal message of every protocol
//! phase, carrying the connection's current transaction status.

use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Error};
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Idle,
    Transaction,
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct ReadyForQuery {
    pub transaction_status: TransactionStatus,
}

impl BackendMessage for ReadyForQuery {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::ReadyForQuery;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        if !buf.has_remaining() {
            return Err(err_protocol!("ReadyForQuery: missing status byte"));
        }
        let status = match buf.get_u8() {
            b'I' => TransactionStatus::Idle,
            b'T' => TransactionStatus::Transaction,
            b'E' => TransactionStatus::Error,
            other => return Err(err_protocol!("ReadyForQuery: unknown status {:?}", other as char)),
        };
        Ok(ReadyForQuery {
            transaction_status: status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_each_status() {
        for (byte, expected) in [
            (b'I', TransactionStatus::Idle),
            (b'T', TransactionStatus::Transaction),
            (b'E', TransactionStatus::Error),
        ] {
            let msg = ReadyForQuery::decode_body(Bytes::from(vec![byte])).unwrap();
            assert_eq!(msg.transaction_status, expected);
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(ReadyForQuery::decode_body(Bytes::from(vec![b'?'])).is_err());
    }
}
