//! The two protocol cycles every statement runs through on an
//! authenticated connection (`spec.md` §4.3/§4.4): the simple query
//! protocol for commands the caller never binds parameters to, and the
//! extended protocol's Parse/Describe/Bind/Execute/Sync pipeline for
//! everything that goes through [`crate::query::Query`].

use std::sync::Arc;

use crate::connection::stream::PgStream;
use crate::error::{err_protocol, Error};
use crate::message::{
    self, Bind, BackendMessageFormat, Close, CommandComplete, DataRow, Describe, DescribeTarget,
    Execute, Parse, ParameterDescription, Query as SimpleQuery, ReadyForQuery, ReceivedMessage,
    RowDescription, TransactionStatus,
};
use crate::query::QueryId;
use crate::row::{ColumnMetadata, QueryMetadata, QueryResult, Row};
use crate::types::{codec, PgValue};

/// The name a prepared statement is registered under on the wire — derived
/// from the [`QueryId`] so the same `Query` always reuses the same server
/// side name across `prepare` calls on a connection.
pub(crate) fn statement_name(id: QueryId) -> String {
    format!("s{:016x}", id.0)
}

/// Run a statement through the simple query protocol (`spec.md` §4.3): no
/// parameters, no prepared-statement caching, used for connection
/// housekeeping like `BEGIN`/`COMMIT`/`ROLLBACK`.
pub(crate) async fn simple_query(
    stream: &mut PgStream,
    sql: &str,
    status: &mut TransactionStatus,
) -> Result<(), Error> {
    stream.queue(&SimpleQuery(sql))?;
    stream.flush().await?;

    let mut completed = false;
    loop {
        let msg = stream.recv().await?;
        match msg.format {
            BackendMessageFormat::CommandComplete | BackendMessageFormat::EmptyQueryResponse => {
                completed = true;
            }
            BackendMessageFormat::RowDescription | BackendMessageFormat::DataRow => {
                // Simple query results (e.g. from a stray `SELECT`) are
                // decoded by neither phase this crate uses it for; ignore.
            }
            BackendMessageFormat::ErrorResponse => {
                let err = PgStream::to_postgres_error(msg)?;
                *status = drain_to_ready(stream).await?;
                return Err(err);
            }
            BackendMessageFormat::ReadyForQuery => {
                let ReadyForQuery { transaction_status } = msg.decode()?;
                *status = transaction_status;
                return if completed {
                    Ok(())
                } else {
                    Err(err_protocol!("simple query completed with no CommandComplete"))
                };
            }
            other => return Err(err_protocol!("simple query: unexpected message {other:?}")),
        }
    }
}

/// Parse + Describe + Sync (`spec.md` §4.4): registers `sql` as a named
/// statement and returns its parameter/result-column shape.
pub(crate) async fn prepare(
    stream: &mut PgStream,
    id: QueryId,
    sql: &str,
    status: &mut TransactionStatus,
) -> Result<QueryMetadata, Error> {
    let name = statement_name(id);

    stream.queue(&Parse { statement_name: &name, sql, param_types: &[] })?;
    stream.queue(&Describe { target: DescribeTarget::Statement, name: &name })?;
    stream.queue(&message::Sync)?;
    stream.flush().await?;

    let mut parsed = false;
    let mut param_types = None;
    let mut columns = None;

    loop {
        let msg = stream.recv().await?;
        match msg.format {
            BackendMessageFormat::ParseComplete => parsed = true,
            BackendMessageFormat::ParameterDescription => {
                let ParameterDescription(oids) = msg.decode()?;
                param_types = Some(oids);
            }
            BackendMessageFormat::RowDescription => {
                let RowDescription(fields) = msg.decode()?;
                columns = Some(fields.into_iter().map(column_from_field).collect());
            }
            BackendMessageFormat::NoData => columns = Some(Vec::new()),
            BackendMessageFormat::ErrorResponse => {
                let err = PgStream::to_postgres_error(msg)?;
                *status = drain_to_ready(stream).await?;
                return Err(err);
            }
            BackendMessageFormat::ReadyForQuery => {
                let ReadyForQuery { transaction_status } = msg.decode()?;
                *status = transaction_status;
                return match (parsed, param_types, columns) {
                    (true, Some(param_types), Some(columns)) => Ok(QueryMetadata { param_types, columns }),
                    _ => Err(err_protocol!("prepare: incomplete response before ReadyForQuery")),
                };
            }
            other => return Err(err_protocol!("prepare: unexpected message {other:?}")),
        }
    }
}

fn column_from_field(field: crate::message::FieldDescription) -> ColumnMetadata {
    ColumnMetadata {
        name: field.name,
        type_oid: field.type_oid,
        table_oid: (field.table_oid != 0).then_some(field.table_oid),
        position_in_table: (field.column_id != 0).then_some(field.column_id),
    }
}

/// Bind + Execute + Sync (`spec.md` §4.4) against an already-prepared
/// statement: binds `params` (positionally matched against
/// `metadata.param_types`), runs the unnamed portal to completion, and
/// decodes every row the server sends back.
pub(crate) async fn execute(
    stream: &mut PgStream,
    id: QueryId,
    metadata: &Arc<QueryMetadata>,
    params: &[PgValue],
    status: &mut TransactionStatus,
) -> Result<QueryResult, Error> {
    let name = statement_name(id);

    if params.len() != metadata.param_types.len() {
        return Err(err_protocol!(
            "query has {} parameter(s) but the prepared statement expects {}",
            params.len(),
            metadata.param_types.len()
        ));
    }

    let mut encoded_params = Vec::with_capacity(params.len());
    for (oid, value) in metadata.param_types.iter().zip(params) {
        encoded_params.push(codec::encode(*oid, value)?);
    }

    stream.queue(&Bind { portal_name: "", statement_name: &name, params: &encoded_params })?;
    stream.queue(&Execute { portal_name: "", max_rows: 0 })?;
    stream.queue(&message::Sync)?;
    stream.flush().await?;

    let mut bound = false;
    let mut rows_affected = 0u64;
    let mut command_completed = false;
    let mut rows = Vec::new();

    loop {
        let msg = stream.recv().await?;
        match msg.format {
            BackendMessageFormat::BindComplete => bound = true,
            BackendMessageFormat::DataRow => {
                let DataRow(values) = msg.decode()?;
                rows.push(decode_row(metadata, values)?);
            }
            BackendMessageFormat::CommandComplete => {
                let complete: CommandComplete = msg.decode()?;
                rows_affected = complete.rows_affected();
                command_completed = true;
            }
            BackendMessageFormat::EmptyQueryResponse => command_completed = true,
            BackendMessageFormat::ErrorResponse => {
                let err = PgStream::to_postgres_error(msg)?;
                *status = drain_to_ready(stream).await?;
                return Err(err);
            }
            BackendMessageFormat::ReadyForQuery => {
                let ReadyForQuery { transaction_status } = msg.decode()?;
                *status = transaction_status;
                return if bound && command_completed {
                    Ok(QueryResult { rows, rows_affected })
                } else {
                    Err(err_protocol!("execute: incomplete response before ReadyForQuery"))
                };
            }
            other => return Err(err_protocol!("execute: unexpected message {other:?}")),
        }
    }
}

fn decode_row(metadata: &Arc<QueryMetadata>, values: Vec<Option<bytes::Bytes>>) -> Result<Row, Error> {
    if values.len() != metadata.columns.len() {
        return Err(err_protocol!(
            "DataRow has {} column(s) but RowDescription declared {}",
            values.len(),
            metadata.columns.len()
        ));
    }
    let mut decoded = Vec::with_capacity(values.len());
    for (column, value) in metadata.columns.iter().zip(values) {
        decoded.push(codec::decode(column.type_oid, value)?);
    }
    Ok(Row::new(metadata.clone(), decoded))
}

/// `Close` + `Sync` for a statement the cache is evicting (`spec.md` §3):
/// keeps the server's prepared-statement table in sync with the client's
/// cache so a capacity eviction never leaves a stale name dangling.
pub(crate) async fn close_statement(
    stream: &mut PgStream,
    id: QueryId,
    status: &mut TransactionStatus,
) -> Result<(), Error> {
    let name = statement_name(id);
    stream.queue(&Close { target: DescribeTarget::Statement, name: &name })?;
    stream.queue(&message::Sync)?;
    stream.flush().await?;

    loop {
        let msg: ReceivedMessage = stream.recv().await?;
        match msg.format {
            BackendMessageFormat::CloseComplete => {}
            BackendMessageFormat::ErrorResponse => {
                let err = PgStream::to_postgres_error(msg)?;
                *status = drain_to_ready(stream).await?;
                return Err(err);
            }
            BackendMessageFormat::ReadyForQuery => {
                let ReadyForQuery { transaction_status } = msg.decode()?;
                *status = transaction_status;
                return Ok(());
            }
            other => return Err(err_protocol!("close: unexpected message {other:?}")),
        }
    }
}

/// After an `ErrorResponse` aborts an extended-query pipeline mid-`Sync`,
/// the server still owes one `ReadyForQuery` (`spec.md` §4.3: `Sync` is
/// always answered, error or not) before the connection can be reused.
async fn drain_to_ready(stream: &mut PgStream) -> Result<TransactionStatus, Error> {
    loop {
        let msg = stream.recv().await?;
        if msg.format == BackendMessageFormat::ReadyForQuery {
            let ReadyForQuery { transaction_status } = msg.decode()?;
            return Ok(transaction_status);
        }
    }
}
