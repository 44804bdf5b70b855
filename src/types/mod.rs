//! The type system (`spec.md` §4.5): the OID catalogue, the public
//! [`value::PgValue`] kind, and the binary codec bridging the two.

pub mod codec;
pub mod oid;
pub mod value;

pub use oid::Oid;
pub use value::PgValue;
