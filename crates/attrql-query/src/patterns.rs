//! Query shapes used to read attributes of single subjects.
//!
//! Every builder is a pure function returning a fresh [`Query`]. Variable
//! names are fixed per shape and never collide within one query:
//!
//! | shape                 | projects            |
//! |-----------------------|---------------------|
//! | [`query_sp`]          | `?v ?c ?g`          |
//! | [`query_s`]           | `?p ?v ?c ?g`       |
//! | [`query_ask`]         | (boolean)           |
//! | [`query_p_s`]         | `?s ?c ?g`          |
//! | [`query_concept`]     | `?c`                |
//!
//! `?c` is always the type of the value (or subject) and `?g` the named graph
//! the type statement was found in; both come from optional groups and are
//! unbound when the store has no such statement.

use crate::path::{AttributeEdge, Direction};
use crate::query::{named_group, triple, GraphPattern, PatternTerm, Query, Variable};
use crate::term::Term;

pub const VAR_SUBJECT: &str = "s";
pub const VAR_PREDICATE: &str = "p";
pub const VAR_VALUE: &str = "v";
pub const VAR_CONCEPT: &str = "c";
pub const VAR_GRAPH: &str = "g";

fn var(name: &str) -> PatternTerm {
    PatternTerm::Var(Variable::new(name))
}

fn type_of(subject: PatternTerm) -> GraphPattern {
    triple(subject, Term::rdf_type(), var(VAR_CONCEPT))
}

/// Values of one attribute of `subject`.
///
/// Followed directly, `subject` is bound and `?v` is the object; followed
/// inversely the roles swap and `?v` ranges over subjects pointing at it.
pub fn query_sp(
    subject: impl Into<PatternTerm>,
    attribute: &Term,
    direction: Direction,
    contexts: &[Term],
) -> Query {
    let (s, p, o) = direction.orient(subject.into(), attribute.into(), var(VAR_VALUE));
    Query::select([VAR_VALUE, VAR_CONCEPT, VAR_GRAPH])
        .distinct()
        .where_triple(s, p, o)
        .optional_group(vec![type_of(var(VAR_VALUE))])
        .optional_group(vec![named_group(
            var(VAR_GRAPH),
            vec![type_of(var(VAR_VALUE))],
        )])
        .scoped_to(contexts)
}

/// Every attribute of `subject` in one direction.
pub fn query_s(subject: impl Into<PatternTerm>, direction: Direction, contexts: &[Term]) -> Query {
    let (s, p, o) = direction.orient(subject.into(), var(VAR_PREDICATE), var(VAR_VALUE));
    let core = triple(s, p, o);
    Query::select([VAR_PREDICATE, VAR_VALUE, VAR_CONCEPT, VAR_GRAPH])
        .distinct()
        .where_pattern(core.clone())
        .optional_group(vec![type_of(var(VAR_VALUE))])
        .optional_group(vec![named_group(var(VAR_GRAPH), vec![core])])
        .optional_group(vec![named_group(
            var(VAR_GRAPH),
            vec![type_of(var(VAR_VALUE))],
        )])
        .scoped_to(contexts)
}

/// Does `subject` appear as the subject of any statement?
pub fn query_ask(subject: impl Into<PatternTerm>, contexts: &[Term]) -> Query {
    Query::ask()
        .where_triple(subject, var("p"), var("o"))
        .scoped_to(contexts)
}

/// Subjects carrying every attribute in `attributes`, with their types.
///
/// Entries whose attribute is not an IRI (wildcards, computed values) cannot
/// be expressed as a fixed predicate and are skipped.
pub fn query_p_s(attributes: &[AttributeEdge], context: Option<&Term>) -> Query {
    let mut query = Query::select([VAR_SUBJECT, VAR_CONCEPT, VAR_GRAPH]).distinct();
    for (i, edge) in attributes.iter().enumerate() {
        if !edge.attribute.is_iri() {
            continue;
        }
        let (s, p, o) = edge.direction.orient(
            var(VAR_SUBJECT),
            PatternTerm::from(&edge.attribute),
            var(&format!("{VAR_VALUE}{i}")),
        );
        query = query.where_triple(s, p, o);
    }
    query
        .optional_group(vec![type_of(var(VAR_SUBJECT))])
        .optional_group(vec![named_group(
            var(VAR_GRAPH),
            vec![type_of(var(VAR_SUBJECT))],
        )])
        .scoped_to(context.map(std::slice::from_ref).unwrap_or_default())
}

/// Types of `subject`.
pub fn query_concept(subject: impl Into<PatternTerm>) -> Query {
    Query::select([VAR_CONCEPT])
        .distinct()
        .where_pattern(type_of(subject.into()))
}
