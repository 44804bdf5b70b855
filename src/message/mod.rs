//! Frontend/backend message framing (`spec.md` §4.2), grounded directly on
//! the wire's own message-format byte tags
//! (<https://www.postgresql.org/docs/current/protocol-message-formats.html>).
//!
//! Frontend and backend messages can't share one format enum: several byte
//! tags are reused in opposite directions (`'C'` is `Close` outbound but
//! `CommandComplete` inbound), so there are two enums plus a trait each for
//! encoding/decoding a message body around its format byte and length
//! prefix.

use bytes::Bytes;

use crate::error::{err_protocol, Error};
use crate::io::VecExt;

mod authentication;
mod backend_key_data;
mod bind;
mod cancel_request;
mod close;
mod command_complete;
mod data_row;
mod describe;
mod execute;
mod notice;
mod parameter_description;
mod parameter_status;
mod parse;
mod password;
mod query;
mod ready_for_query;
mod row_description;
mod sasl;
mod ssl_request;
mod startup;
mod sync;
mod terminate;

pub use authentication::Authentication;
pub use backend_key_data::BackendKeyData;
pub use bind::Bind;
pub use cancel_request::CancelRequest;
pub use close::Close;
pub use command_complete::CommandComplete;
pub use data_row::DataRow;
pub use describe::{Describe, DescribeTarget};
pub use execute::Execute;
pub use notice::{ErrorResponse, Notice};
pub use parameter_description::ParameterDescription;
pub use parameter_status::ParameterStatus;
pub use parse::Parse;
pub use password::{md5_password, Password};
pub use query::Query;
pub use ready_for_query::{ReadyForQuery, TransactionStatus};
pub use row_description::{FieldDescription, RowDescription};
pub use sasl::{SaslInitialResponse, SaslResponse};
pub use ssl_request::SslRequest;
pub use startup::Startup;
pub use sync::Sync;
pub use terminate::Terminate;

/// Byte tags for messages the client sends.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum FrontendMessageFormat {
    Bind = b'B',
    Close = b'C',
    Describe = b'D',
    Execute = b'E',
    Parse = b'P',
    /// Polymorphic: plain/MD5 password responses and SASL responses all
    /// share this tag.
    PasswordPolymorphic = b'p',
    Query = b'Q',
    Sync = b'S',
    Terminate = b'X',
}

/// Byte tags for messages the server sends. `CancelRequest`/`SslRequest`/
/// `Startup` have no backend counterpart and thus no tag here; they're the
/// untagged messages that only ever open a connection.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BackendMessageFormat {
    Authentication,
    BackendKeyData,
    BindComplete,
    CloseComplete,
    CommandComplete,
    DataRow,
    EmptyQueryResponse,
    ErrorResponse,
    NoData,
    NoticeResponse,
    ParameterDescription,
    ParameterStatus,
    ParseComplete,
    PortalSuspended,
    ReadyForQuery,
    RowDescription,
}

impl BackendMessageFormat {
    pub fn try_from_u8(v: u8) -> Result<Self, Error> {
        Ok(match v {
            b'1' => BackendMessageFormat::ParseComplete,
            b'2' => BackendMessageFormat::BindComplete,
            b'3' => BackendMessageFormat::CloseComplete,
            b'C' => BackendMessageFormat::CommandComplete,
            b'D' => BackendMessageFormat::DataRow,
            b'E' => BackendMessageFormat::ErrorResponse,
            b'I' => BackendMessageFormat::EmptyQueryResponse,
            b'K' => BackendMessageFormat::BackendKeyData,
            b'N' => BackendMessageFormat::NoticeResponse,
            b'R' => BackendMessageFormat::Authentication,
            b'S' => BackendMessageFormat::ParameterStatus,
            b'T' => BackendMessageFormat::RowDescription,
            b'Z' => BackendMessageFormat::ReadyForQuery,
            b'n' => BackendMessageFormat::NoData,
            b's' => BackendMessageFormat::PortalSuspended,
            b't' => BackendMessageFormat::ParameterDescription,
            other => return Err(err_protocol!("unknown backend message tag {:?}", other as char)),
        })
    }
}

/// A framed backend message: tag plus its already-length-delimited body.
#[derive(Debug)]
pub struct ReceivedMessage {
    pub format: BackendMessageFormat,
    pub contents: Bytes,
}

impl ReceivedMessage {
    pub fn decode<T: BackendMessage>(self) -> Result<T, Error> {
        if T::FORMAT != self.format {
            return Err(err_protocol!("expected {:?}, got {:?}", T::FORMAT, self.format));
        }
        T::decode_body(self.contents)
    }
}

/// A message the client can send.
pub trait FrontendMessage: Sized {
    const FORMAT: FrontendMessageFormat;

    /// Encode the body; the caller supplies the format byte and length
    /// prefix (see [`encode_msg`]).
    fn encode_body(&self, buf: &mut Vec<u8>) -> Result<(), Error>;

    /// Encode the whole message — tag, length prefix, body — into `buf`.
    fn encode_msg(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        buf.push(Self::FORMAT as u8);
        buf.put_length_prefixed(|buf| self.encode_body(buf))
    }
}

/// A message the server can send.
pub trait BackendMessage: Sized {
    const FORMAT: BackendMessageFormat;

    /// Decode the body; the format tag and length prefix have already been
    /// consumed by the connection's frame reassembler.
    fn decode_body(buf: Bytes) -> Result<Self, Error>;
}
