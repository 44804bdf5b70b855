//! The bounded connection pool (`spec.md` §4.4/§5): the only thing
//! application code talks to. Owns lease acquisition/return, per-query
//! cancellation and `query_timeout`, and the exclusive lease a
//! [`crate::transaction::Transaction`] runs under.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

mod inner;
mod waiter;

pub(crate) use inner::{Lease, PoolInner};

use crate::error::Error;
use crate::options::PoolOptions;
use crate::query::Query;
use crate::row::QueryMetadata;
use crate::row::QueryResult;
use crate::transaction::{self, Transaction};

/// A pool of connections to one database, sized and reused per
/// `spec.md` §4.4.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Build a pool. No connections are opened until the first `run`,
    /// `get_query_metadata`, or `transaction` call needs one.
    pub fn new(options: PoolOptions) -> Pool {
        Pool {
            inner: PoolInner::new(options),
        }
    }

    /// Run `query`, returning a cancellable future (`spec.md` §4.4
    /// "prepareAndRunQuery"): acquiring a lease, preparing the statement if
    /// this is the first time the pool has seen its
    /// [`crate::query::QueryId`], and executing it all race against
    /// `query_timeout` and [`PendingQuery::cancel`].
    pub fn run(&self, query: Query) -> PendingQuery {
        let pool = self.inner.clone();
        let cancel = Arc::new(Notify::new());
        let timeout = pool.options().query_timeout;

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move { run_query(pool, query, task_cancel, timeout).await });

        PendingQuery {
            handle: Some(handle),
            cancel,
        }
    }

    /// Prepare `sql` (if necessary) and return its parameter/result-column
    /// shape without running it (`spec.md` §4.4 `getQueryMetadata`).
    pub async fn get_query_metadata(&self, sql: impl Into<std::borrow::Cow<'static, str>>) -> Result<Arc<QueryMetadata>, Error> {
        let query = Query::plain(sql);
        let mut lease = self.inner.acquire().await?;
        match lease.prepare(&query).await {
            Ok(metadata) => Ok(metadata),
            Err(err) => {
                if !err.is_connection_reusable() {
                    lease.discard().await;
                }
                Err(err)
            }
        }
    }

    /// Lease one connection exclusively for `body`'s duration, wrapping it
    /// in `BEGIN`/`COMMIT`, or `ROLLBACK` on error (`spec.md` §4.4).
    pub async fn transaction<F, Fut, T>(&self, body: F) -> Result<T, Error>
    where
        F: FnOnce(Transaction<'_>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        transaction::run(&self.inner, body).await
    }

    /// Close every connection the pool currently knows about and fail any
    /// caller still waiting for a lease (`spec.md` §4.4 `destroy`).
    pub async fn destroy(&self) {
        self.inner.destroy().await;
    }
}

async fn run_query(
    pool: Arc<PoolInner>,
    query: Query,
    cancel: Arc<Notify>,
    query_timeout: Duration,
) -> Result<QueryResult, Error> {
    let mut lease = tokio::select! {
        biased;
        _ = cancel.notified() => return Err(Error::query_cancelled("cancelled while waiting for a connection")),
        result = pool.acquire() => result?,
    };

    let cancel_token = lease.cancel_token();
    let options = pool.options();
    let mut abandoned = false;

    let result = tokio::select! {
        biased;
        _ = cancel.notified() => {
            let _ = cancel_token.send(options).await;
            abandoned = true;
            Err(Error::query_cancelled("cancelled"))
        }
        _ = tokio::time::sleep(query_timeout) => {
            let _ = cancel_token.send(options).await;
            abandoned = true;
            Err(Error::query_cancelled("query_timeout elapsed"))
        }
        result = lease.run(&query) => result,
    };

    // A client-initiated cancel/timeout abandons `lease.run` mid-read: the
    // socket may still have the rest of that query's response sitting in
    // it, so the connection can't be trusted back into the pool even
    // though `QueryCancelled` is otherwise a reusable-connection error (the
    // server-side cancel path in `connection::query` always drains to
    // `ReadyForQuery` before returning it).
    match &result {
        _ if abandoned => lease.discard().await,
        Err(err) if !err.is_connection_reusable() => lease.discard().await,
        _ => drop(lease),
    }
    result
}

/// A running [`Pool::run`] call. Polling it drives the query to completion;
/// dropping it without ever polling leaves the query running to completion
/// on its own task (the lease is still returned/discarded normally) without
/// sending an out-of-band cancel — call [`PendingQuery::cancel`] first if
/// that's what's wanted.
pub struct PendingQuery {
    handle: Option<JoinHandle<Result<QueryResult, Error>>>,
    cancel: Arc<Notify>,
}

impl PendingQuery {
    /// Cancel the query (`spec.md` §4.4): idempotent, safe to call more
    /// than once or after the query has already finished.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

impl Future for PendingQuery {
    type Output = Result<QueryResult, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let handle = self
            .handle
            .as_mut()
            .expect("PendingQuery polled again after completing");

        match Pin::new(handle).poll(cx) {
            Poll::Ready(result) => {
                self.handle = None;
                Poll::Ready(result.unwrap_or_else(|join_err| {
                    Err(Error::protocol(format!("query task panicked: {join_err}")))
                }))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
