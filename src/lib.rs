//! `pgharbor` is a from-scratch async client for the PostgreSQL wire
//! protocol v3.0: connection pooling, prepared-statement caching, and
//! binary-format row decoding, with no dependency on `libpq`.
//!
//! ```no_run
//! use pgharbor::{Pool, PoolOptions, Query};
//!
//! # async fn run() -> Result<(), pgharbor::Error> {
//! let pool = Pool::new(PoolOptions::new().host("localhost").database("app"));
//!
//! let result = pool.run(Query::new("select $1::int4 + $2::int4", vec![1i32.into(), 2i32.into()])).await?;
//! assert_eq!(result.rows[0].get(0), Some(&pgharbor::PgValue::Int4(3)));
//! # Ok(())
//! # }
//! ```
//!
//! The crate is organized the way the statements it runs are: [`options`]
//! resolves configuration, `message` frames each frontend/backend message,
//! [`connection`] owns one authenticated socket and the two protocol
//! cycles (simple and extended query) built on top of it, [`pool`] leases
//! those connections out with cancellation and retry, [`query`] and [`row`]
//! are the public data model, and [`types`]/[`io`] are the wire codec
//! underneath all of it.

mod connection;
pub mod error;
pub mod io;
mod message;
pub mod options;
mod pool;
pub mod query;
pub mod row;
mod transaction;
pub mod types;

pub use error::Error;
pub use options::PoolOptions;
pub use pool::{PendingQuery, Pool};
pub use query::{param, Param, Query, QueryId, TemplateBuilder};
pub use row::{QueryResult, Row};
pub use transaction::Transaction;
pub use types::{Oid, PgValue};
