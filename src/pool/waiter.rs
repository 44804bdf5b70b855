//! The FIFO side of lease acquisition (`spec.md` §4.4): a caller that finds
//! no available connection and no room to open a new one waits here for
//! whichever connection becomes free first.

use tokio::sync::oneshot;

use crate::connection::Connection;
use crate::error::Error;

/// One end of a promise that a connection (or the error that kept one from
/// ever existing) will eventually arrive.
pub(super) struct Waiter {
    sender: oneshot::Sender<Result<Connection, Error>>,
}

impl Waiter {
    pub(super) fn new() -> (Waiter, oneshot::Receiver<Result<Connection, Error>>) {
        let (sender, receiver) = oneshot::channel();
        (Waiter { sender }, receiver)
    }

    /// Hand `conn` to this waiter. Returns it back on failure — the other
    /// end was dropped, meaning the caller cancelled while it waited
    /// (`spec.md` §4.4: "the waiter is skipped but the connection ... must
    /// return to the available pool").
    pub(super) fn satisfy(self, conn: Connection) -> Result<(), Connection> {
        self.sender.send(Ok(conn)).map_err(|result| {
            // `Ok(result)` is unreachable since we just sent `Ok(conn)`
            // ourselves; only the value we sent can come back.
            result.unwrap_or_else(|_| unreachable!())
        })
    }

    /// Fail this waiter outright, e.g. because the connection attempt made
    /// on its behalf gave up for good. Unlike [`Waiter::satisfy`] there is
    /// nothing to recover if the receiver is already gone.
    pub(super) fn fail(self, err: Error) {
        let _ = self.sender.send(Err(err));
    }
}
