//! [`QueryReader`]: a backend plus configuration, and the single-subject
//! reads built on the pattern builders.

use crate::backend::Backend;
use crate::config::ReaderConfig;
use crate::convert::{
    attribute_map, to_nested, type_map, value_map, AttributeMap, ConvertError, Nested, Table,
    TypeMap, ValueMap,
};
use crate::error::{ReaderError, ReaderResult};
use attrql_query::patterns::{query_ask, query_concept, query_p_s, query_s, query_sp};
use attrql_query::{AttributeEdge, Direction, Query, Term};
use std::collections::BTreeMap;

pub struct QueryReader<B> {
    backend: B,
    config: ReaderConfig,
}

impl<B: Backend> QueryReader<B> {
    pub fn new(backend: B, config: ReaderConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Run `query` on the backend.
    pub fn execute(&self, query: &Query) -> ReaderResult<B::Output> {
        tracing::debug!(query = %query, "executing query");
        Ok(self.backend.execute(query)?)
    }

    pub(crate) fn table(&self, query: &Query) -> ReaderResult<Table> {
        let output = self.execute(query)?;
        Ok(self.backend.to_table(output)?)
    }

    /// [`to_nested`], degraded to an empty result when configured lenient.
    pub fn convert(&self, table: &Table, keys: &[&str]) -> ReaderResult<Nested> {
        match to_nested(table, keys) {
            Ok(nested) => Ok(nested),
            Err(error) => self.degrade(error, keys).map(|()| Nested::empty(keys.len())),
        }
    }

    fn shaped<T, F>(&self, table: &Table, keys: &[&str], view: F) -> ReaderResult<T>
    where
        T: Default,
        F: FnOnce(Nested) -> Result<T, ConvertError>,
    {
        match to_nested(table, keys).and_then(view) {
            Ok(value) => Ok(value),
            Err(error) => self.degrade(error, keys).map(|()| T::default()),
        }
    }

    fn degrade(&self, error: ConvertError, keys: &[&str]) -> ReaderResult<()> {
        if !self.config.lenient_conversion {
            return Err(ReaderError::Convert(error));
        }
        tracing::warn!(error = %error, keys = ?keys, "row conversion failed, returning empty result");
        Ok(())
    }

    /// Values of one attribute of `subject`: value -> context -> types.
    pub fn get(
        &self,
        subject: &Term,
        attribute: &Term,
        direction: Direction,
        contexts: &[Term],
    ) -> ReaderResult<ValueMap> {
        let table = self.table(&query_sp(subject, attribute, direction, contexts))?;
        self.shaped(&table, &["v", "g", "c"], value_map)
    }

    /// Every attribute of `subject` in one direction.
    pub fn load(
        &self,
        subject: &Term,
        direction: Direction,
        contexts: &[Term],
    ) -> ReaderResult<AttributeMap> {
        let table = self.table(&query_s(subject, direction, contexts))?;
        self.shaped(&table, &["p", "v", "g", "c"], attribute_map)
    }

    pub fn is_present(&self, subject: &Term, contexts: &[Term]) -> ReaderResult<bool> {
        let output = self.execute(&query_ask(subject, contexts))?;
        Ok(self.backend.ask(output)?)
    }

    /// Types of `subject`.
    pub fn concept(&self, subject: &Term) -> ReaderResult<Vec<Term>> {
        let table = self.table(&query_concept(subject))?;
        self.shaped(&table, &["c"], |nested| match nested {
            Nested::Values(values) => Ok(values),
            Nested::Map(_) => Err(ConvertError::Shape {
                expected: "a list of types",
            }),
        })
    }

    /// Subjects carrying every attribute: subject -> context -> types.
    pub fn instances_by_attribute(
        &self,
        attributes: &[AttributeEdge],
        context: Option<&Term>,
    ) -> ReaderResult<BTreeMap<Term, TypeMap>> {
        let table = self.table(&query_p_s(attributes, context))?;
        self.shaped(&table, &["s", "g", "c"], |nested| {
            let Nested::Map(subjects) = nested else {
                return Err(ConvertError::Shape {
                    expected: "subject -> context -> types",
                });
            };
            let mut out = BTreeMap::new();
            for (subject, contexts) in subjects {
                let contexts = type_map(contexts)?;
                if let Some(subject) = subject {
                    out.insert(subject, contexts);
                }
            }
            Ok(out)
        })
    }
}

impl<B> std::fmt::Debug for QueryReader<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryReader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
