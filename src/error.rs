//! The crate's error hierarchy.
//!
//! `spec.md` §7 names six error kinds; all of them are variants of a single
//! [`Error`] enum so callers can match on `.kind()`-style classification
//! without juggling several `dyn Error` boundaries.

use std::collections::BTreeMap;
use std::fmt;

/// Every fallible operation in this crate returns `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The unified error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP/TLS/auth failure before a connection became usable.
    #[error("connect error: {0}")]
    Connect(String),

    /// The server rejected the statement with `ErrorResponse`.
    #[error(transparent)]
    Postgres(#[from] PostgresError),

    /// A backend message arrived out of the order the protocol defines.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The query was cancelled, either explicitly or by `queryTimeout`.
    #[error("query cancelled: {0}")]
    QueryCancelled(String),

    /// Binding or decoding a value against an OID outside the catalogue.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A connect or query attempt ran past its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The pool has been destroyed.
    #[error("pool destroyed")]
    PoolClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "tls")]
    #[error("tls error: {0}")]
    Tls(String),
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub(crate) fn connect(msg: impl Into<String>) -> Self {
        Error::Connect(msg.into())
    }

    pub(crate) fn unsupported_type(msg: impl Into<String>) -> Self {
        Error::UnsupportedType(msg.into())
    }

    pub(crate) fn query_cancelled(msg: impl Into<String>) -> Self {
        Error::QueryCancelled(msg.into())
    }

    /// `true` for errors that leave the connection itself still usable
    /// (the server observed `ReadyForQuery` after the failing statement).
    pub fn is_connection_reusable(&self) -> bool {
        matches!(
            self,
            Error::Postgres(_) | Error::QueryCancelled(_) | Error::UnsupportedType(_)
        )
    }

    /// The SQLSTATE class-based category, when this error carries one.
    pub fn sqlstate_class(&self) -> Option<&str> {
        match self {
            Error::Postgres(e) => Some(&e.code[..2]),
            _ => None,
        }
    }
}

/// `macro_rules!` helper matching the teacher's `err_protocol!` convention:
/// build a formatted [`Error::Protocol`] without repeating `.to_string()`
/// at every call site.
macro_rules! err_protocol {
    ($($fmt:tt)*) => {
        $crate::error::Error::protocol(format!($($fmt)*))
    };
}
pub(crate) use err_protocol;

/// A typed `ErrorResponse`/`NoticeResponse` body: SQLSTATE plus every
/// optional field the wire format allows.
///
/// Field letters are documented at
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>.
#[derive(Debug, Clone, Default)]
pub struct PostgresError {
    pub severity: String,
    /// Localized severity (`S` in PG < 9.6 servers, `V` is the
    /// non-localized one used for `severity` above).
    pub severity_localized: Option<String>,
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    pub position: Option<u32>,
    pub internal_position: Option<u32>,
    pub internal_query: Option<String>,
    pub where_: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
    pub data_type_name: Option<String>,
    pub constraint_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub routine: Option<String>,
}

impl fmt::Display for PostgresError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.severity, self.code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\nDETAIL: {detail}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\nHINT: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PostgresError {}

impl PostgresError {
    /// Parse the field-tagged body of an `ErrorResponse`/`NoticeResponse`.
    ///
    /// Each field is a one-byte tag followed by a NUL-terminated string;
    /// the body itself ends with a zero byte.
    pub(crate) fn parse(fields: &BTreeMap<u8, String>) -> Self {
        let get = |tag: u8| fields.get(&tag).cloned();
        let get_u32 = |tag: u8| fields.get(&tag).and_then(|s| s.parse().ok());

        PostgresError {
            severity: get(b'V').or_else(|| get(b'S')).unwrap_or_default(),
            severity_localized: get(b'S'),
            code: get(b'C').unwrap_or_default(),
            message: get(b'M').unwrap_or_default(),
            detail: get(b'D'),
            hint: get(b'H'),
            position: get_u32(b'P'),
            internal_position: get_u32(b'p'),
            internal_query: get(b'q'),
            where_: get(b'W'),
            schema_name: get(b's'),
            table_name: get(b't'),
            column_name: get(b'c'),
            data_type_name: get(b'd'),
            constraint_name: get(b'n'),
            file: get(b'F'),
            line: get_u32(b'L'),
            routine: get(b'R'),
        }
    }

    /// The class (first two characters) of the SQLSTATE code, used by
    /// callers to classify errors (`08` connection, `22` data exception,
    /// `23` constraint, `40` serialization, `42` syntax/access, etc).
    pub fn class(&self) -> &str {
        self.code.get(..2).unwrap_or("")
    }

    pub fn is_query_canceled(&self) -> bool {
        self.code == "57014"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields() {
        let mut fields = BTreeMap::new();
        fields.insert(b'S', "ERROR".to_string());
        fields.insert(b'V', "ERROR".to_string());
        fields.insert(b'C', "42601".to_string());
        fields.insert(b'M', "syntax error".to_string());
        fields.insert(b'P', "5".to_string());

        let err = PostgresError::parse(&fields);
        assert_eq!(err.code, "42601");
        assert_eq!(err.class(), "42");
        assert_eq!(err.position, Some(5));
        assert!(!err.is_query_canceled());
    }

    #[test]
    fn recognizes_query_canceled() {
        let mut fields = BTreeMap::new();
        fields.insert(b'C', "57014".to_string());
        let err = PostgresError::parse(&fields);
        assert!(err.is_query_canceled());
    }
}
