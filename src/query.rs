//! The query descriptor and the template-literal convenience builder
//! (`spec.md` §3/§6).
//!
//! Rust has no tagged-template syntax, so the builder sugar is realized as
//! [`TemplateBuilder`] plus a small macro, [`pg_query!`]: push alternating
//! literal text and [`param`]-wrapped values, and the builder dedups equal
//! parameters into one positional placeholder the way `spec.md`'s
//! `${value}` sugar does.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use crate::row::QueryMetadata;
use crate::types::PgValue;

/// A stable identifier for a query's final SQL text (`spec.md` §3: "a
/// deterministic digest of the final SQL text so that two renderings of
/// the same template share a prepared statement"). FNV-1a needs no extra
/// dependency and is deterministic across processes, unlike `HashMap`'s
/// default hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(pub u64);

impl QueryId {
    pub fn of(sql: &str) -> QueryId {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = OFFSET_BASIS;
        for byte in sql.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(PRIME);
        }
        QueryId(hash)
    }
}

/// A parameterised SQL statement, with a stable [`QueryId`] and (once
/// obtained) cached [`QueryMetadata`] (`spec.md` §3).
pub struct Query {
    pub sql: Cow<'static, str>,
    pub params: Vec<PgValue>,
    pub id: QueryId,
    cached_metadata: OnceLock<Arc<QueryMetadata>>,
}

impl Query {
    pub fn new(sql: impl Into<Cow<'static, str>>, params: Vec<PgValue>) -> Self {
        let sql = sql.into();
        let id = QueryId::of(&sql);
        Query {
            sql,
            params,
            id,
            cached_metadata: OnceLock::new(),
        }
    }

    /// A query with no parameters.
    pub fn plain(sql: impl Into<Cow<'static, str>>) -> Self {
        Query::new(sql, Vec::new())
    }

    pub fn cached_metadata(&self) -> Option<Arc<QueryMetadata>> {
        self.cached_metadata.get().cloned()
    }

    pub(crate) fn set_cached_metadata(&self, metadata: Arc<QueryMetadata>) {
        // Best-effort: if another lease already cached metadata for an
        // equivalent `Query` built independently, either value is correct
        // since both come from the same SQL text and thus the same
        // `Describe` response shape.
        let _ = self.cached_metadata.set(metadata);
    }
}

impl Clone for Query {
    fn clone(&self) -> Self {
        Query {
            sql: self.sql.clone(),
            params: self.params.clone(),
            id: self.id,
            cached_metadata: self
                .cached_metadata
                .get()
                .cloned()
                .map(|m| OnceLock::from(m))
                .unwrap_or_default(),
        }
    }
}

/// One piece of a template being assembled by [`TemplateBuilder`]: either
/// literal SQL text or a parameter value to dedup and bind.
pub enum Fragment {
    Text(&'static str),
    Param(PgValue),
}

impl From<&'static str> for Fragment {
    fn from(s: &'static str) -> Self {
        Fragment::Text(s)
    }
}

/// Marker produced by [`param`] so `TemplateBuilder::push` can tell a bound
/// value apart from a literal `&'static str` fragment.
pub struct Param(PgValue);

impl From<Param> for Fragment {
    fn from(p: Param) -> Self {
        Fragment::Param(p.0)
    }
}

/// Wrap a value for interpolation into a [`pg_query!`] template.
pub fn param(value: impl Into<PgValue>) -> Param {
    Param(value.into())
}

/// Assembles a [`Query`] from alternating literal text and [`param`]-
/// wrapped values, deduplicating equal parameters into one positional
/// placeholder (`spec.md` §3, §8 Invariant 5).
#[derive(Default)]
pub struct TemplateBuilder {
    sql: String,
    unique_params: Vec<PgValue>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        TemplateBuilder::default()
    }

    pub fn push(&mut self, fragment: impl Into<Fragment>) -> &mut Self {
        match fragment.into() {
            Fragment::Text(text) => self.sql.push_str(text),
            Fragment::Param(value) => {
                let position = self
                    .unique_params
                    .iter()
                    .position(|existing| existing == &value)
                    .unwrap_or_else(|| {
                        self.unique_params.push(value);
                        self.unique_params.len() - 1
                    });
                self.sql.push_str(&format!("${}", position + 1));
            }
        }
        self
    }

    pub fn build(self) -> Query {
        Query::new(self.sql, self.unique_params)
    }
}

/// Build a [`Query`] from a sequence of literal text and [`param`]-wrapped
/// values, the template-literal convenience sugar `spec.md` §3/§6 names:
///
/// ```ignore
/// let q = pg_query!("select * from t where id = ", param(id), " or owner = ", param(id));
/// assert_eq!(q.sql, "select * from t where id = $1 or owner = $1");
/// assert_eq!(q.params.len(), 1);
/// ```
#[macro_export]
macro_rules! pg_query {
    ($($fragment:expr),+ $(,)?) => {{
        let mut builder = $crate::query::TemplateBuilder::new();
        $(builder.push($fragment);)+
        builder.build()
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_sql_yields_same_id() {
        let a = Query::plain("select 1");
        let b = Query::plain("select 1".to_string());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_sql_yields_different_id() {
        let a = Query::plain("select 1");
        let b = Query::plain("select 2");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn duplicate_parameter_positions_share_one_placeholder() {
        let q = pg_query!(
            "select * from t where id = ",
            param(5i32),
            " or owner = ",
            param(5i32)
        );
        assert_eq!(q.sql, "select * from t where id = $1 or owner = $1");
        assert_eq!(q.params, vec![PgValue::Int4(5)]);
    }

    #[test]
    fn distinct_parameters_each_get_their_own_placeholder() {
        let q = pg_query!("a = ", param(1i32), ", b = ", param(2i32));
        assert_eq!(q.sql, "a = $1, b = $2");
        assert_eq!(q.params.len(), 2);
    }
}
