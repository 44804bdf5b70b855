//! The pool's shared, mutex-guarded state and the machinery that keeps it
//! consistent: lease acquisition/return, connection opening with retry, and
//! the idle reaper (`spec.md` §4.4, SPEC_FULL.md §5).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::connection::Connection;
use crate::error::Error;
use crate::options::PoolOptions;
use crate::pool::waiter::Waiter;
use crate::query::Query;
use crate::row::QueryMetadata;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(16);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(4096);

struct ManagedConnection {
    id: u64,
    conn: Connection,
}

#[derive(Default)]
struct PoolState {
    available: Vec<ManagedConnection>,
    waiters: VecDeque<Waiter>,
    /// Connections that exist, whether idle, leased, or still being opened.
    open: usize,
    /// Connection attempts in flight, counted separately from `open` so a
    /// second `acquire()` arriving mid-connect doesn't also try to open.
    opening: usize,
    next_id: u64,
    closed: bool,
}

/// The pool's shared guts behind `Pool`'s `Arc`. Split out so `Lease` (which
/// every leased connection holds for its `Drop` impl) doesn't need to know
/// about `Pool` itself.
pub(crate) struct PoolInner {
    options: PoolOptions,
    state: Mutex<PoolState>,
}

impl PoolInner {
    pub(crate) fn new(options: PoolOptions) -> Arc<PoolInner> {
        Arc::new(PoolInner {
            options,
            state: Mutex::new(PoolState::default()),
        })
    }

    pub(crate) fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Lease acquisition (`spec.md` §4.4): pop an available connection
    /// (LIFO), otherwise start opening a new one if there's room and queue
    /// a waiter (FIFO) for whichever connection becomes free first.
    pub(crate) async fn acquire(self: &Arc<Self>) -> Result<Lease, Error> {
        let (need_open, receiver) = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(Error::PoolClosed);
            }
            if let Some(managed) = state.available.pop() {
                return Ok(self.clone().lease(managed.conn));
            }

            let need_open = state.open + state.opening < self.options.max_connections;
            if need_open {
                state.opening += 1;
            }
            let (waiter, receiver) = Waiter::new();
            state.waiters.push_back(waiter);
            (need_open, receiver)
        };

        if need_open {
            tokio::spawn(self.clone().open_with_retry());
        }

        match receiver.await {
            Ok(result) => result.map(|conn| self.clone().lease(conn)),
            // The sending half was dropped without ever calling `satisfy`
            // or `fail`, which only happens if the pool itself is torn
            // down mid-wait.
            Err(_) => Err(Error::PoolClosed),
        }
    }

    fn lease(self: Arc<Self>, conn: Connection) -> Lease {
        Lease {
            pool: self,
            connection: Some(conn),
        }
    }

    /// Connection, prepared-statement-cache eviction count, etc. aside,
    /// this is the only place a connection is handed to either a waiting
    /// caller or the available stack — used both when `open_with_retry`
    /// succeeds and when a leased connection is returned.
    async fn place(self: Arc<Self>, conn: Connection) {
        let mut state = self.state.lock().await;
        if state.closed {
            drop(state);
            conn.close().await;
            return;
        }

        let mut conn = conn;
        let stored_id;
        loop {
            match state.waiters.pop_front() {
                Some(waiter) => match waiter.satisfy(conn) {
                    Ok(()) => return,
                    Err(returned) => {
                        conn = returned;
                        continue;
                    }
                },
                None => {
                    let id = state.next_id;
                    state.next_id += 1;
                    state.available.push(ManagedConnection { id, conn });
                    stored_id = id;
                    break;
                }
            }
        }
        drop(state);
        self.schedule_idle_reap(stored_id);
    }

    fn schedule_idle_reap(self: Arc<Self>, id: u64) {
        let idle_timeout = self.options.idle_timeout;
        tokio::spawn(async move {
            tokio::time::sleep(idle_timeout).await;
            let reaped = {
                let mut state = self.state.lock().await;
                if state.closed || state.open <= self.options.min_connections {
                    None
                } else if let Some(pos) = state.available.iter().position(|m| m.id == id) {
                    state.open -= 1;
                    Some(state.available.remove(pos).conn)
                } else {
                    None
                }
            };
            if let Some(conn) = reaped {
                tracing::debug!(target: "pgharbor::pool", "idle reaper closing connection {id}");
                conn.close().await;
            }
        });
    }

    /// `openConnection` (`spec.md` §4.4): TCP connect, optional TLS, the
    /// startup phase, then retry with exponential backoff while `open`
    /// hasn't reached `min_connections` yet.
    async fn open_with_retry(self: Arc<Self>) {
        let mut delay = INITIAL_RETRY_DELAY;
        loop {
            match Connection::connect(&self.options).await {
                Ok(conn) => {
                    {
                        let mut state = self.state.lock().await;
                        state.opening -= 1;
                        state.open += 1;
                    }
                    tracing::debug!(target: "pgharbor::pool", "opened a new connection");
                    self.place(conn).await;
                    return;
                }
                Err(err) => {
                    let retry = {
                        let mut state = self.state.lock().await;
                        state.opening -= 1;
                        let should_retry = !state.closed && state.open < self.options.min_connections;
                        if should_retry {
                            state.opening += 1;
                        }
                        should_retry
                    };

                    if !retry {
                        tracing::warn!(target: "pgharbor::pool", error = %err, "connect attempt failed, giving up");
                        self.fail_one_waiter(err).await;
                        return;
                    }

                    tracing::warn!(
                        target: "pgharbor::pool", error = %err,
                        "connect attempt failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY).min(self.options.connect_timeout);
                }
            }
        }
    }

    async fn fail_one_waiter(&self, err: Error) {
        let waiter = {
            let mut state = self.state.lock().await;
            state.waiters.pop_front()
        };
        if let Some(waiter) = waiter {
            waiter.fail(err);
        }
    }

    async fn connection_discarded(&self) {
        let mut state = self.state.lock().await;
        state.open = state.open.saturating_sub(1);
    }

    /// `destroy()` (`spec.md` §4.4): close every known socket, clear the
    /// pool's bookkeeping, and fail every queued waiter.
    pub(crate) async fn destroy(self: &Arc<Self>) {
        let (available, waiters) = {
            let mut state = self.state.lock().await;
            state.closed = true;
            (
                std::mem::take(&mut state.available),
                std::mem::take(&mut state.waiters),
            )
        };
        for waiter in waiters {
            waiter.fail(Error::PoolClosed);
        }
        for managed in available {
            managed.conn.close().await;
        }
    }
}

/// One connection on exclusive loan to a caller. Returned automatically on
/// drop (`spec.md` §4.4: "Lease return ... happens exactly once per
/// lease"); call [`Lease::discard`] instead when the connection came back
/// from a non-reusable error and shouldn't be handed to anyone else.
pub(crate) struct Lease {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Lease {
    fn conn(&self) -> &Connection {
        self.connection.as_ref().expect("Lease used after being discarded")
    }

    fn conn_mut(&mut self) -> &mut Connection {
        self.connection.as_mut().expect("Lease used after being discarded")
    }

    pub(crate) fn cancel_token(&self) -> crate::connection::CancelToken {
        self.conn().cancel_token()
    }

    pub(crate) async fn prepare(&mut self, query: &Query) -> Result<Arc<QueryMetadata>, Error> {
        self.conn_mut().prepare(query).await
    }

    pub(crate) async fn execute(
        &mut self,
        query: &Query,
        metadata: &Arc<QueryMetadata>,
    ) -> Result<crate::row::QueryResult, Error> {
        self.conn_mut().execute(query, metadata).await
    }

    pub(crate) async fn run(&mut self, query: &Query) -> Result<crate::row::QueryResult, Error> {
        self.conn_mut().run(query).await
    }

    pub(crate) async fn simple_query(&mut self, sql: &str) -> Result<(), Error> {
        self.conn_mut().simple_query(sql).await
    }

    pub(crate) fn in_transaction(&self) -> bool {
        self.conn().in_transaction()
    }

    pub(crate) fn transaction_is_aborted(&self) -> bool {
        self.conn().transaction_is_aborted()
    }

    /// Close the underlying socket instead of returning it to the pool —
    /// for connections left in a state a fresh lease shouldn't inherit
    /// (e.g. a protocol error mid-pipeline).
    pub(crate) async fn discard(mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close().await;
        }
        self.pool.connection_discarded().await;
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            let pool = self.pool.clone();
            tokio::spawn(async move { pool.place(conn).await });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_and_caps() {
        let mut delay = INITIAL_RETRY_DELAY;
        for _ in 0..12 {
            delay = (delay * 2).min(MAX_RETRY_DELAY);
        }
        assert_eq!(delay, MAX_RETRY_DELAY);
    }
}
