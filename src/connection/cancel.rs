//! Out-of-band query cancellation (`spec.md` §4.6): a fresh, unauthenticated
//! TCP connection carrying nothing but a `CancelRequest` for the backend
//! key data an earlier, unrelated connection captured at startup.

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::Error;
use crate::message::CancelRequest;
use crate::options::PoolOptions;

/// A connection's cancel key, captured once from `BackendKeyData` at
/// startup and carried for the connection's whole lifetime so a later
/// `cancel()` doesn't need the connection itself to still be reachable.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CancelToken {
    pub(crate) process_id: i32,
    pub(crate) secret_key: i32,
}

impl CancelToken {
    /// Open a new connection to `options.host`/`options.port` and send
    /// `CancelRequest`, then close it — per `spec.md` §4.6, the server's
    /// response (if any) is never read, and the request is best-effort: the
    /// target statement may already have finished.
    pub(crate) async fn send(&self, options: &PoolOptions) -> Result<(), Error> {
        let connect = TcpStream::connect((options.host.as_str(), options.port));
        let mut socket = tokio::time::timeout(options.connect_timeout, connect)
            .await
            .map_err(|_| Error::connect("cancel connection timed out"))?
            .map_err(|e| Error::connect(e.to_string()))?;

        let mut buf = Vec::with_capacity(16);
        CancelRequest { process_id: self.process_id, secret_key: self.secret_key }.encode_msg(&mut buf)?;
        socket.write_all(&buf).await?;
        socket.shutdown().await.ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_copy() {
        let token = CancelToken { process_id: 1, secret_key: 2 };
        let copy = token;
        assert_eq!(token.process_id, copy.process_id);
    }
}
