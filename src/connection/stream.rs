//! The physical socket plus the leftover-bytes buffer around it
//! (`spec.md` §4.2/§6): one TCP stream, optionally TLS-upgraded after
//! `SSLRequest`, shared by every protocol phase that runs on a connection.

use std::collections::BTreeMap;
use std::str::FromStr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::connection::codec::decode_frame;
use crate::error::{err_protocol, Error};
use crate::message::{
    ErrorResponse, FrontendMessage, Notice, ParameterStatus, ReceivedMessage, SslRequest, Startup,
};
use crate::options::PoolOptions;

/// Any duplex byte stream a [`PgStream`] can drive — a plain TCP socket, or
/// (with the `tls` feature) one upgraded to TLS after `SSLRequest`. A trait
/// object is fine here: the buffering this type does amortizes the
/// dynamic-dispatch overhead the same way it amortizes the syscall.
trait Socket: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send> Socket for T {}

/// The wire-level connection to one backend: the raw socket, a read buffer
/// that survives across partial frames, and the parameter/notice side
/// channel every phase shares (`spec.md` §4.3's universal `NoticeResponse`/
/// `ParameterStatus` handling).
pub struct PgStream {
    socket: Box<dyn Socket>,
    read_buf: BytesMut,
    write_buf: Vec<u8>,

    pub(crate) parameter_statuses: BTreeMap<String, String>,
    pub(crate) server_version_num: Option<u32>,
    /// Notices collected since the caller last drained them, in arrival
    /// order (`spec.md` §4.3: "append to a notice list carried with the
    /// result, never fail").
    pub(crate) notices: Vec<Notice>,
}

impl PgStream {
    pub(crate) async fn connect(options: &PoolOptions) -> Result<Self, Error> {
        let connect = TcpStream::connect((options.host.as_str(), options.port));
        let tcp = tokio::time::timeout(options.connect_timeout, connect)
            .await
            .map_err(|_| Error::connect("connect timed out"))?
            .map_err(|e| Error::connect(e.to_string()))?;
        tcp.set_nodelay(true).ok();

        let mut stream = PgStream {
            socket: Box::new(tcp),
            read_buf: BytesMut::with_capacity(8 * 1024),
            write_buf: Vec::with_capacity(1024),
            parameter_statuses: BTreeMap::new(),
            server_version_num: None,
            notices: Vec::new(),
        };

        if options.ssl {
            stream = stream.upgrade_tls(options).await?;
        }

        Ok(stream)
    }

    #[cfg(feature = "tls")]
    async fn upgrade_tls(mut self, options: &PoolOptions) -> Result<Self, Error> {
        self.write_buf.clear();
        SslRequest.encode_msg(&mut self.write_buf)?;
        self.socket.write_all(&self.write_buf).await?;
        self.write_buf.clear();

        let mut response = [0u8; 1];
        self.socket.read_exact(&mut response).await?;
        if response[0] != b'S' {
            return Err(Error::connect(
                "server does not support TLS (SSLRequest was rejected)",
            ));
        }

        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        let connector = tokio_rustls::TlsConnector::from(std::sync::Arc::new(config));
        let server_name = rustls::pki_types::ServerName::try_from(options.host.clone())
            .map_err(|e| Error::connect(format!("invalid TLS server name: {e}")))?;

        // `Box<dyn Socket>` already satisfies `AsyncRead + AsyncWrite +
        // Unpin` via tokio's blanket impls for boxed trait objects, so it
        // can be handed to the connector directly.
        let tls_stream = connector
            .connect(server_name, self.socket)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;

        Ok(PgStream {
            socket: Box::new(tls_stream),
            ..self
        })
    }

    #[cfg(not(feature = "tls"))]
    async fn upgrade_tls(self, _options: &PoolOptions) -> Result<Self, Error> {
        Err(Error::connect(
            "ssl requested but this build was compiled without the `tls` feature",
        ))
    }

    pub(crate) async fn send_startup(&mut self, startup: &Startup) -> Result<(), Error> {
        self.write_buf.clear();
        startup.encode_msg(&mut self.write_buf)?;
        self.flush_write_buf().await
    }

    /// Queue a frontend message into the write buffer without flushing —
    /// callers batch several messages (e.g. `Parse`+`Describe`+`Sync`) into
    /// one `write(2)` call.
    pub(crate) fn queue<M: FrontendMessage>(&mut self, msg: &M) -> Result<(), Error> {
        msg.encode_msg(&mut self.write_buf)
    }

    pub(crate) async fn flush(&mut self) -> Result<(), Error> {
        self.flush_write_buf().await
    }

    async fn flush_write_buf(&mut self) -> Result<(), Error> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        self.socket.write_all(&self.write_buf).await?;
        self.write_buf.clear();
        Ok(())
    }

    /// Receive the next message, transparently handling the two universal
    /// responses every phase shares (`spec.md` §4.3): notices are logged
    /// and appended to `self.notices`, `ParameterStatus` updates the cached
    /// server parameters. `ErrorResponse` is returned to the caller, not
    /// swallowed here, since its handling differs per phase.
    pub(crate) async fn recv(&mut self) -> Result<ReceivedMessage, Error> {
        use crate::message::BackendMessageFormat;

        loop {
            let message = self.recv_raw().await?;

            match message.format {
                BackendMessageFormat::ParameterStatus => {
                    let ParameterStatus { name, value } = message.decode()?;
                    if name == "server_version" {
                        self.server_version_num = parse_server_version(&value);
                    }
                    self.parameter_statuses.insert(name, value);
                    continue;
                }
                BackendMessageFormat::NoticeResponse => {
                    let notice: Notice = message.decode()?;
                    log_notice(&notice);
                    self.notices.push(notice);
                    continue;
                }
                _ => return Ok(message),
            }
        }
    }

    async fn recv_raw(&mut self) -> Result<ReceivedMessage, Error> {
        loop {
            if let Some(message) = decode_frame(&mut self.read_buf)? {
                return Ok(message);
            }

            let n = self.socket.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(err_protocol!(
                    "server closed the connection while a message was expected"
                ));
            }
        }
    }

    /// Translate an `ErrorResponse` already received into a crate
    /// [`Error`], the one piece of `recv`'s universal handling that's
    /// still the caller's job (`spec.md` §4.3: `ErrorResponse` fails the
    /// *phase*, not the stream itself).
    pub(crate) fn to_postgres_error(msg: ReceivedMessage) -> Result<Error, Error> {
        let ErrorResponse(err) = msg.decode()?;
        Ok(Error::Postgres(err))
    }

    pub(crate) fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

fn log_notice(notice: &Notice) {
    let severity = notice.0.severity.as_str();
    match severity {
        "WARNING" => tracing::warn!(target: "pgharbor::notice", "{}", notice.0.message),
        "DEBUG" => tracing::debug!(target: "pgharbor::notice", "{}", notice.0.message),
        "LOG" | "INFO" => tracing::trace!(target: "pgharbor::notice", "{}", notice.0.message),
        _ => tracing::info!(target: "pgharbor::notice", "{}", notice.0.message),
    }
}

// reference:
// https://github.com/postgres/postgres/blob/master/src/interfaces/libpq/fe-exec.c
fn parse_server_version(s: &str) -> Option<u32> {
    let mut parts = Vec::<u32>::with_capacity(3);

    let mut from = 0;
    let mut chs = s.char_indices().peekable();
    while let Some((i, ch)) = chs.next() {
        match ch {
            '.' => {
                if let Ok(num) = u32::from_str(&s[from..i]) {
                    parts.push(num);
                    from = i + 1;
                } else {
                    break;
                }
            }
            _ if ch.is_ascii_digit() => {
                if chs.peek().is_none() {
                    if let Ok(num) = u32::from_str(&s[from..]) {
                        parts.push(num);
                    }
                    break;
                }
            }
            _ => {
                if let Ok(num) = u32::from_str(&s[from..i]) {
                    parts.push(num);
                }
                break;
            }
        };
    }

    let version_num = match parts.as_slice() {
        [major, minor, rev] => (100 * major + minor) * 100 + rev,
        [major, minor] if *major >= 10 => 100 * 100 * major + minor,
        [major, minor] => (100 * major + minor) * 100,
        [major] => 100 * 100 * major,
        _ => return None,
    };

    Some(version_num)
}

#[cfg(test)]
mod tests {
    use super::parse_server_version;

    #[test]
    fn test_parse_server_version_num() {
        assert_eq!(parse_server_version("9.6.1"), Some(90601));
        assert_eq!(parse_server_version("10.1"), Some(100001));
        assert_eq!(parse_server_version("9.6devel"), Some(90600));
        assert_eq!(parse_server_version("10devel"), Some(100000));
        assert_eq!(parse_server_version("13devel87"), Some(130000));
        assert_eq!(parse_server_version("unknown"), None);
    }
}
