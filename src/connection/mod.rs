//! A single connection to one PostgreSQL backend (`spec.md` §4): owns the
//! socket, the per-connection prepared-statement cache, and the cancel key
//! `CancelRequest` needs. The pool is the only thing that creates or holds
//! these directly; application code only ever reaches one through a
//! [`crate::Pool::run`]/[`crate::Pool::transaction`] call.

use std::sync::Arc;

use crate::error::Error;
use crate::message::{Notice, TransactionStatus};
use crate::options::PoolOptions;
use crate::query::Query;
use crate::row::{QueryMetadata, QueryResult};

mod cancel;
mod codec;
mod query;
mod scram;
mod startup;
mod stmt_cache;
mod stream;

pub(crate) use cancel::CancelToken;
pub(crate) use stream::PgStream;

use stmt_cache::StatementCache;

/// One established, authenticated connection.
pub struct Connection {
    stream: PgStream,
    cancel_token: CancelToken,
    statements: StatementCache,
    transaction_status: TransactionStatus,
}

impl Connection {
    /// Connect, run the full `spec.md` §4.3 startup/authentication
    /// exchange, and return a connection ready to run statements.
    pub(crate) async fn connect(options: &PoolOptions) -> Result<Self, Error> {
        let mut stream = PgStream::connect(options).await?;
        let (process_id, secret_key) = startup::run(&mut stream, options).await?;

        Ok(Connection {
            stream,
            cancel_token: CancelToken { process_id, secret_key },
            statements: StatementCache::new(options.statement_cache_capacity),
            transaction_status: TransactionStatus::Idle,
        })
    }

    /// Run `sql` through the simple query protocol, e.g. `BEGIN`/`COMMIT`/
    /// `ROLLBACK` (`spec.md` §4.3). No parameters, no caching.
    pub(crate) async fn simple_query(&mut self, sql: &str) -> Result<(), Error> {
        query::simple_query(&mut self.stream, sql, &mut self.transaction_status).await
    }

    /// Run a [`Query`] through the extended protocol, preparing it first if
    /// this connection hasn't seen its [`crate::query::QueryId`] before
    /// (`spec.md` §3/§4.4).
    pub(crate) async fn run(&mut self, query: &Query) -> Result<QueryResult, Error> {
        let metadata = self.prepare(query).await?;
        self.execute(query, &metadata).await
    }

    /// The preparation half of [`Connection::run`], split out so the pool's
    /// query future (`spec.md` §4.4 "prepareAndRunQuery") can race each
    /// phase against cancellation/`query_timeout` separately.
    pub(crate) async fn prepare(&mut self, query: &Query) -> Result<Arc<QueryMetadata>, Error> {
        if let Some(metadata) = query.cached_metadata() {
            return Ok(metadata);
        }
        if let Some(metadata) = self.statements.get(query.id) {
            query.set_cached_metadata(metadata.clone());
            return Ok(metadata);
        }

        let metadata = Arc::new(
            self::query::prepare(&mut self.stream, query.id, &query.sql, &mut self.transaction_status).await?,
        );
        query.set_cached_metadata(metadata.clone());

        if let Some((evicted_id, _)) = self.statements.insert(query.id, metadata.clone()) {
            self::query::close_statement(&mut self.stream, evicted_id, &mut self.transaction_status).await?;
        }
        Ok(metadata)
    }

    /// The execution half of [`Connection::run`]: Bind+Execute+Sync against
    /// an already-prepared statement.
    pub(crate) async fn execute(
        &mut self,
        query: &Query,
        metadata: &Arc<QueryMetadata>,
    ) -> Result<QueryResult, Error> {
        self::query::execute(&mut self.stream, query.id, metadata, &query.params, &mut self.transaction_status)
            .await
    }

    /// `true` when an explicit transaction is open, i.e. the last
    /// `ReadyForQuery` reported `'T'` (`spec.md` §4.6).
    pub(crate) fn in_transaction(&self) -> bool {
        matches!(self.transaction_status, TransactionStatus::Transaction)
    }

    /// `true` when the last `ReadyForQuery` reported `'E'`: the server has
    /// aborted the current transaction and every statement will be
    /// rejected until a `ROLLBACK` (`spec.md` §4.6).
    pub(crate) fn transaction_is_aborted(&self) -> bool {
        matches!(self.transaction_status, TransactionStatus::Error)
    }

    /// The cancel key this connection captured from `BackendKeyData` at
    /// startup, cheap to copy out so a lease can issue a cancel without
    /// holding the connection itself.
    pub(crate) fn cancel_token(&self) -> CancelToken {
        self.cancel_token
    }

    /// Notices accumulated since the last drain (`spec.md` §4.3/§7).
    pub(crate) fn take_notices(&mut self) -> Vec<Notice> {
        self.stream.take_notices()
    }

    pub(crate) fn server_version_num(&self) -> Option<u32> {
        self.stream.server_version_num
    }

    /// Send `Terminate` and let the socket drop (`spec.md` §4.3). Errors
    /// writing the goodbye are not worth surfacing — the connection is
    /// going away either way.
    pub(crate) async fn close(mut self) {
        use crate::message::Terminate;
        let _ = self.stream.queue(&Terminate);
        let _ = self.stream.flush().await;
    }
}
