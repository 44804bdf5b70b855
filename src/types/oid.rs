//! The catalogue of PostgreSQL type OIDs this crate understands, sourced
//! from the server's `pg_type` system catalog (`spec.md` §4.5).

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// A PostgreSQL type OID (`spec.md` Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(pub u32);

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! oid_catalogue {
    ($($name:ident = $value:expr => $pg_name:literal),+ $(,)?) => {
        $(pub const $name: Oid = Oid($value);)+

        /// Maps an OID back to its `pg_type.typname`, for error messages
        /// and the static analyser collaborator's type descriptions.
        pub fn name(oid: Oid) -> Option<&'static str> {
            match oid {
                $($name => Some($pg_name),)+
                _ => None,
            }
        }

        static BY_NAME: Lazy<HashMap<&'static str, Oid>> = Lazy::new(|| {
            let mut m = HashMap::new();
            $(m.insert($pg_name, $name);)+
            m
        });

        /// Looks up an OID by its `pg_type.typname`.
        pub fn by_name(name: &str) -> Option<Oid> {
            BY_NAME.get(name).copied()
        }
    };
}

oid_catalogue! {
    BOOL = 16 => "bool",
    BYTEA = 17 => "bytea",
    CHAR = 18 => "char",
    NAME = 19 => "name",
    INT8 = 20 => "int8",
    INT2 = 21 => "int2",
    INT2VECTOR = 22 => "int2vector",
    INT4 = 23 => "int4",
    REGPROC = 24 => "regproc",
    TEXT = 25 => "text",
    OID = 26 => "oid",
    TID = 27 => "tid",
    XID = 28 => "xid",
    CID = 29 => "cid",
    JSON = 114 => "json",
    XML = 142 => "xml",
    POINT = 600 => "point",
    FLOAT4 = 700 => "float4",
    FLOAT8 = 701 => "float8",
    UNKNOWN = 705 => "unknown",
    CIRCLE = 718 => "circle",
    MACADDR8 = 774 => "macaddr8",
    MONEY = 790 => "money",
    MACADDR = 829 => "macaddr",
    INET = 869 => "inet",
    BOOL_ARRAY = 1000 => "_bool",
    BYTEA_ARRAY = 1001 => "_bytea",
    CHAR_ARRAY = 1002 => "_char",
    NAME_ARRAY = 1003 => "_name",
    INT2_ARRAY = 1005 => "_int2",
    INT4_ARRAY = 1007 => "_int4",
    TEXT_ARRAY = 1009 => "_text",
    VARCHAR_ARRAY = 1015 => "_varchar",
    INT8_ARRAY = 1016 => "_int8",
    FLOAT4_ARRAY = 1021 => "_float4",
    FLOAT8_ARRAY = 1022 => "_float8",
    OID_ARRAY = 1028 => "_oid",
    BPCHAR = 1042 => "bpchar",
    VARCHAR = 1043 => "varchar",
    DATE = 1082 => "date",
    TIME = 1083 => "time",
    TIMESTAMP = 1114 => "timestamp",
    TIMESTAMP_ARRAY = 1115 => "_timestamp",
    TIMESTAMPTZ = 1184 => "timestamptz",
    TIMESTAMPTZ_ARRAY = 1185 => "_timestamptz",
    INTERVAL = 1186 => "interval",
    NUMERIC_ARRAY = 1231 => "_numeric",
    TIMETZ = 1266 => "timetz",
    BIT = 1560 => "bit",
    VARBIT = 1562 => "varbit",
    NUMERIC = 1700 => "numeric",
    UUID = 2950 => "uuid",
    JSONB = 3802 => "jsonb",
    JSONB_ARRAY = 3807 => "_jsonb",
    REGTYPE = 2206 => "regtype",
    REGCLASS = 2205 => "regclass",
    BOX = 603 => "box",
    LINE = 628 => "line",
    LSEG = 601 => "lseg",
    PATH = 602 => "path",
    POLYGON = 604 => "polygon",
    CIDR = 650 => "cidr",
    CSTRING = 2275 => "cstring",
    VOID = 2278 => "void",
    RECORD = 2249 => "record",
    ANYARRAY = 2277 => "anyarray",
    ANYELEMENT = 2283 => "anyelement",
    REGCONFIG = 3734 => "regconfig",
    REGDICTIONARY = 3769 => "regdictionary",
    REGROLE = 4096 => "regrole",
    REGNAMESPACE = 4089 => "regnamespace",
    PG_LSN = 3220 => "pg_lsn",
    TSVECTOR = 3614 => "tsvector",
    TSQUERY = 3615 => "tsquery",
    INT4RANGE = 3904 => "int4range",
    NUMRANGE = 3906 => "numrange",
    TSRANGE = 3908 => "tsrange",
    TSTZRANGE = 3910 => "tstzrange",
    DATERANGE = 3912 => "daterange",
    INT8RANGE = 3926 => "int8range",
}

/// The array element OID for a given array OID, when this crate knows it.
/// Used by the binary encoder to resolve which element codec applies when
/// binding a `Vec<PgValue>` parameter.
pub fn array_element(oid: Oid) -> Option<Oid> {
    Some(match oid {
        BOOL_ARRAY => BOOL,
        BYTEA_ARRAY => BYTEA,
        CHAR_ARRAY => CHAR,
        NAME_ARRAY => NAME,
        INT2_ARRAY => INT2,
        INT4_ARRAY => INT4,
        TEXT_ARRAY => TEXT,
        VARCHAR_ARRAY => VARCHAR,
        INT8_ARRAY => INT8,
        FLOAT4_ARRAY => FLOAT4,
        FLOAT8_ARRAY => FLOAT8,
        OID_ARRAY => OID,
        TIMESTAMP_ARRAY => TIMESTAMP,
        TIMESTAMPTZ_ARRAY => TIMESTAMPTZ,
        NUMERIC_ARRAY => NUMERIC,
        JSONB_ARRAY => JSONB,
        _ => return None,
    })
}

/// The array OID that holds elements of the given scalar OID, when this
/// crate knows it. Used when binding a `Vec<PgValue>` parameter to pick the
/// parameter's own OID to advertise to the server.
pub fn array_of(elem: Oid) -> Option<Oid> {
    Some(match elem {
        BOOL => BOOL_ARRAY,
        BYTEA => BYTEA_ARRAY,
        CHAR => CHAR_ARRAY,
        NAME => NAME_ARRAY,
        INT2 => INT2_ARRAY,
        INT4 => INT4_ARRAY,
        TEXT => TEXT_ARRAY,
        VARCHAR => VARCHAR_ARRAY,
        INT8 => INT8_ARRAY,
        FLOAT4 => FLOAT4_ARRAY,
        FLOAT8 => FLOAT8_ARRAY,
        OID => OID_ARRAY,
        TIMESTAMP => TIMESTAMP_ARRAY,
        TIMESTAMPTZ => TIMESTAMPTZ_ARRAY,
        NUMERIC => NUMERIC_ARRAY,
        JSONB => JSONB_ARRAY,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_names() {
        assert_eq!(by_name("int4"), Some(INT4));
        assert_eq!(name(INT4), Some("int4"));
        assert_eq!(by_name("nonexistent_type"), None);
    }

    #[test]
    fn array_mapping_is_symmetric() {
        assert_eq!(array_element(INT4_ARRAY), Some(INT4));
        assert_eq!(array_of(INT4), Some(INT4_ARRAY));
    }
}
