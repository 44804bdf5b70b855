//! `QueryMetadata`, `Row` and `QueryResult` (`spec.md` §3 Data Model).

use std::sync::Arc;

use crate::types::{Oid, PgValue};

/// A prepared statement's parameter and result-column shape, obtained once
/// from `Describe` and immutable thereafter (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadata {
    pub param_types: Vec<Oid>,
    pub columns: Vec<ColumnMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_oid: Oid,
    pub table_oid: Option<u32>,
    pub position_in_table: Option<i16>,
}

/// One row of a result set: an ordered mapping from column name to decoded
/// value, in `RowDescription` order (`spec.md` §3). NULL is a distinguished
/// value, not an absent key — every declared column always has an entry.
#[derive(Debug, Clone)]
pub struct Row {
    metadata: Arc<QueryMetadata>,
    values: Vec<PgValue>,
}

impl Row {
    pub(crate) fn new(metadata: Arc<QueryMetadata>, values: Vec<PgValue>) -> Self {
        Row { metadata, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.metadata.columns
    }

    /// Look up a value by 0-based position.
    pub fn get(&self, index: usize) -> Option<&PgValue> {
        self.values.get(index)
    }

    /// Look up a value by column name; the *first* matching column wins if
    /// the result set has duplicate names, matching `RowDescription` order.
    pub fn get_by_name(&self, name: &str) -> Option<&PgValue> {
        let index = self.metadata.columns.iter().position(|c| c.name == name)?;
        self.values.get(index)
    }

    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_some_and(PgValue::is_null)
    }
}

/// The outcome of running one query (`spec.md` §3).
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub rows_affected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> Arc<QueryMetadata> {
        Arc::new(QueryMetadata {
            param_types: vec![],
            columns: vec![
                ColumnMetadata {
                    name: "a".into(),
                    type_oid: Oid(23),
                    table_oid: None,
                    position_in_table: None,
                },
                ColumnMetadata {
                    name: "b".into(),
                    type_oid: Oid(23),
                    table_oid: None,
                    position_in_table: None,
                },
            ],
        })
    }

    #[test]
    fn looks_up_by_index_and_name() {
        let row = Row::new(metadata(), vec![PgValue::Int4(1), PgValue::Null]);
        assert_eq!(row.get(0), Some(&PgValue::Int4(1)));
        assert_eq!(row.get_by_name("b"), Some(&PgValue::Null));
        assert!(row.is_null(1));
        assert!(!row.is_null(0));
    }

    #[test]
    fn missing_column_name_is_none() {
        let row = Row::new(metadata(), vec![PgValue::Int4(1), PgValue::Null]);
        assert_eq!(row.get_by_name("nope"), None);
    }
}
