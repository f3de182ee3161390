//! Fetching "subjects matching a parameter bag" in one of three strategies.
//!
//! | strategy   | when                          | round trips             |
//! |------------|-------------------------------|-------------------------|
//! | Minimal    | not eager                     | 1                       |
//! | NQueries   | eager, subqueries disabled    | `1 + 2N` (`1 + N` direct only) |
//! | Subquery   | eager, subqueries enabled     | 1                       |
//!
//! All three page over the same [`subject_query`], so they agree on which
//! subjects come back and in which order. Every strategy keeps the subject
//! order the store returned; a subject seen again in a later row is merged
//! into its first entry.

use crate::backend::Backend;
use crate::config::ReaderConfig;
use crate::convert::{AttributeMap, Row};
use crate::error::ReaderResult;
use crate::params::{OrderBy, QueryParams};
use crate::reader::QueryReader;
use attrql_query::patterns::{VAR_CONCEPT, VAR_GRAPH, VAR_PREDICATE, VAR_SUBJECT, VAR_VALUE};
use attrql_query::{
    named_group, triple, walk_path, Connection, Direction, GraphPattern, PatternTerm, Query, Term,
    VarCounter, Variable,
};
use std::collections::HashMap;

/// Attribute data of one subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceData {
    pub direct: AttributeMap,
    /// Present only when inverse attributes were requested.
    pub inverse: Option<AttributeMap>,
}

pub type ResultRow = (Term, InstanceData);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Minimal,
    NQueries,
    Subquery,
}

impl Strategy {
    pub fn select(params: &QueryParams, config: &ReaderConfig) -> Self {
        match (params.full, config.use_subqueries) {
            (false, _) => Strategy::Minimal,
            (true, false) => Strategy::NQueries,
            (true, true) => Strategy::Subquery,
        }
    }
}

/// Anything that answers a parameter bag with ordered result rows.
pub trait Store {
    fn get_by(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>>;
}

impl<B: Backend> Store for QueryReader<B> {
    fn get_by(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>> {
        let strategy = Strategy::select(params, self.config());
        let rows = match strategy {
            Strategy::Minimal => self.get_by_minimal(params)?,
            Strategy::NQueries => self.get_by_n_queries(params)?,
            Strategy::Subquery => self.get_by_subquery(params)?,
        };
        tracing::debug!(strategy = ?strategy, subjects = rows.len(), "fetched subjects");
        Ok(rows)
    }
}

fn var(name: &str) -> Variable {
    Variable::new(name)
}

fn subject_var() -> Variable {
    var(VAR_SUBJECT)
}

fn type_of(subject: impl Into<PatternTerm>, concept: &str) -> GraphPattern {
    triple(subject, Term::rdf_type(), var(concept))
}

/// Apply paging, the constraint tree, native filters and (when `with_order`)
/// ordering to a query over `?s`.
pub fn apply_params(params: &QueryParams, mut query: Query, with_order: bool) -> Query {
    let s = subject_var();
    let (limit, offset) = params.paging.limit_offset();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(offset) = offset {
        query = query.offset(offset);
    }

    if !params.get_by.is_empty() {
        let clauses = params.get_by.compile(&s);
        query = match params.get_by.connection() {
            Some(Connection::Or) => query.where_pattern(GraphPattern::Union(clauses)),
            _ => query.where_patterns(clauses),
        };
    }

    for (i, clause) in params.filters.iter().enumerate() {
        let variable = var(&format!("f{}", i + 1));
        let (subject, predicate, object) = clause.direction.orient(
            PatternTerm::from(&s),
            PatternTerm::from(&clause.attribute),
            PatternTerm::from(&variable),
        );
        query = query
            .where_triple(subject, predicate, object)
            .filter(clause.instantiate(&variable));
    }

    if with_order {
        match &params.order {
            Some(OrderBy::Subject) => query = query.order_by(s, params.desc),
            Some(OrderBy::Path(path)) => {
                let mut counter = VarCounter::starting_at("o", 1);
                let (clauses, last) = walk_path(&s, path.edges(), &mut counter);
                query = query.optional_group(clauses).order_by(last, params.desc);
            }
            None => {}
        }
    }
    query
}

/// Binds `?s` to every typed subject when nothing else in the query does.
const VAR_ANY_TYPE: &str = "t";

/// The distinct subject list every strategy pages over: constraints,
/// filters, order and paging, all applied to `?s` alone.
///
/// A parameter bag without constraints or filters lists the typed subjects.
pub fn subject_query(params: &QueryParams) -> Query {
    let mut query = Query::select([VAR_SUBJECT]).distinct();
    if params.get_by.is_empty() && params.filters.is_empty() {
        query = query.where_pattern(type_of(subject_var(), VAR_ANY_TYPE));
    }
    apply_params(params, query, true)
}

/// Repeat the subject order on a query that joins [`subject_query`].
fn order_outer(params: &QueryParams, query: Query) -> Query {
    let s = subject_var();
    match &params.order {
        Some(OrderBy::Subject) => query.order_by(s, params.desc),
        Some(OrderBy::Path(path)) => {
            let mut counter = VarCounter::starting_at("o", 1);
            let (clauses, last) = walk_path(&s, path.edges(), &mut counter);
            query.optional_group(clauses).order_by(last, params.desc)
        }
        None => query,
    }
}

impl<B: Backend> QueryReader<B> {
    /// Subjects and their types only.
    pub fn get_by_minimal(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>> {
        let query = Query::select([VAR_SUBJECT, VAR_CONCEPT, VAR_GRAPH])
            .distinct()
            .where_subquery(subject_query(params))
            .optional_group(vec![type_of(subject_var(), VAR_CONCEPT)])
            .optional_group(vec![named_group(
                var(VAR_GRAPH),
                vec![type_of(subject_var(), VAR_CONCEPT)],
            )]);
        let query = order_outer(params, query).scoped_to(&params.contexts);

        let mut index: HashMap<Term, usize> = HashMap::new();
        let mut results: Vec<ResultRow> = Vec::new();
        for row in self.table(&query)? {
            let Some(subject) = row.get(VAR_SUBJECT) else {
                continue;
            };
            let slot = *index.entry(subject.clone()).or_insert_with(|| {
                let mut data = InstanceData::default();
                data.direct.insert(Term::rdf_type(), Default::default());
                results.push((subject.clone(), data));
                results.len() - 1
            });
            if let Some(concept) = row.get(VAR_CONCEPT) {
                let context = row.get(VAR_GRAPH).cloned();
                let types = results[slot].1.direct.entry(Term::rdf_type()).or_default();
                types
                    .entry(concept.clone())
                    .or_default()
                    .entry(context)
                    .or_default();
            }
        }
        Ok(results)
    }

    /// One subject query, then a full load per subject.
    pub fn get_by_n_queries(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>> {
        let query = subject_query(params).scoped_to(&params.contexts);

        let mut subjects: Vec<Term> = Vec::new();
        for row in self.table(&query)? {
            if let Some(subject) = row.get(VAR_SUBJECT) {
                if !subjects.contains(subject) {
                    subjects.push(subject.clone());
                }
            }
        }

        let mut results = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let direct = self.load(&subject, Direction::Direct, &params.contexts)?;
            let inverse = if params.only_direct {
                None
            } else {
                Some(self.load(&subject, Direction::Inverse, &params.contexts)?)
            };
            results.push((subject, InstanceData { direct, inverse }));
        }
        Ok(results)
    }

    /// Subjects and their direct attributes in one nested query.
    pub fn get_by_subquery(&self, params: &QueryParams) -> ReaderResult<Vec<ResultRow>> {
        let s = subject_var();
        let core = triple(s, var(VAR_PREDICATE), var(VAR_VALUE));
        let query = Query::select([VAR_SUBJECT, VAR_PREDICATE, VAR_VALUE, VAR_CONCEPT, VAR_GRAPH])
            .distinct()
            .where_subquery(subject_query(params))
            .group(vec![
                core.clone(),
                GraphPattern::Optional(vec![type_of(var(VAR_VALUE), VAR_CONCEPT)]),
                GraphPattern::Optional(vec![named_group(var(VAR_GRAPH), vec![core])]),
            ]);
        let query = order_outer(params, query).scoped_to(&params.contexts);

        let mut index: HashMap<Term, usize> = HashMap::new();
        let mut results: Vec<ResultRow> = Vec::new();
        for row in self.table(&query)? {
            let Some((subject, predicate, value)) = statement(&row) else {
                continue;
            };
            let slot = *index.entry(subject.clone()).or_insert_with(|| {
                results.push((subject.clone(), InstanceData::default()));
                results.len() - 1
            });
            let context = row.get(VAR_GRAPH).cloned();
            let types = results[slot]
                .1
                .direct
                .entry(predicate)
                .or_default()
                .entry(value)
                .or_default()
                .entry(context)
                .or_default();
            if let Some(concept) = row.get(VAR_CONCEPT) {
                if !types.contains(concept) {
                    types.push(concept.clone());
                }
            }
        }
        Ok(results)
    }
}

/// `(?s, ?p, ?v)` of a row; subject and predicate positions are IRIs even
/// when a store reports them as literals.
fn statement(row: &Row) -> Option<(Term, Term, Term)> {
    Some((
        row.get(VAR_SUBJECT)?.clone().into_iri(),
        row.get(VAR_PREDICATE)?.clone().into_iri(),
        row.get(VAR_VALUE)?.clone(),
    ))
}
