//! `Pool::transaction` (`spec.md` §4.4): an exclusive lease wrapped in
//! `BEGIN`/`COMMIT`/`ROLLBACK`, sent over the simple query protocol the way
//! every other piece of connection housekeeping is.

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::pool::{Lease, PoolInner};
use crate::query::Query;
use crate::row::QueryResult;

/// The restricted client view a [`crate::pool::Pool::transaction`] body
/// runs with: every statement goes through the one connection that holds
/// the open `BEGIN`, never a fresh lease (`spec.md` §4.4: "a restricted
/// client view that reuses that connection").
pub struct Transaction<'a> {
    lease: &'a mut Lease,
}

impl<'a> Transaction<'a> {
    /// Run a parameterised query on this transaction's connection
    /// (`spec.md` §4.4/§3).
    pub async fn run(&mut self, query: &Query) -> Result<QueryResult, Error> {
        self.lease.run(query).await
    }

    /// Run `sql` through the simple query protocol, e.g. a `SAVEPOINT` or
    /// `RELEASE` the body manages itself (`spec.md` §4.4: "the body may use
    /// savepoints via plain `run` for that purpose").
    pub async fn simple_query(&mut self, sql: &str) -> Result<(), Error> {
        self.lease.simple_query(sql).await
    }
}

pub(crate) async fn run<F, Fut, T>(pool: &Arc<PoolInner>, body: F) -> Result<T, Error>
where
    F: FnOnce(Transaction<'_>) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut lease = pool.acquire().await?;
    lease.simple_query("BEGIN").await?;

    let outcome = body(Transaction { lease: &mut lease }).await;

    match outcome {
        Ok(value) => match lease.simple_query("COMMIT").await {
            Ok(()) => Ok(value),
            Err(err) => {
                if !err.is_connection_reusable() {
                    lease.discard().await;
                }
                Err(err)
            }
        },
        Err(err) => {
            // The cancel-during-transaction race (`spec.md` §5) is resolved
            // deterministically in the server's favor: if it already
            // reports the transaction open or aborted, send `ROLLBACK`
            // regardless of which statement actually failed. Best-effort —
            // the connection is headed for `discard` either way if the
            // error wasn't one that leaves it reusable.
            if lease.in_transaction() || lease.transaction_is_aborted() {
                let _ = lease.simple_query("ROLLBACK").await;
            }
            if !err.is_connection_reusable() {
                lease.discard().await;
            }
            Err(err)
        }
    }
}

