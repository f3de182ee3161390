//! Query shapes produced by the pattern builders.

use attrql_query::patterns::{query_ask, query_concept, query_p_s, query_s, query_sp};
use attrql_query::{AttributeEdge, Direction, Term, Variable};

fn s() -> Term {
    Term::iri("http://x/s")
}

fn g() -> Term {
    Term::iri("http://x/g")
}

#[test]
fn single_attribute_forward_binds_subject() {
    let q = query_sp(s(), &Term::iri("http://x/name"), Direction::Direct, &[g()]);
    assert_eq!(
        q.to_string(),
        "SELECT DISTINCT ?v ?c ?g FROM <http://x/g> FROM NAMED <http://x/g> WHERE { \
         <http://x/s> <http://x/name> ?v . \
         OPTIONAL { ?v a ?c . } \
         OPTIONAL { GRAPH ?g { ?v a ?c . } } }"
    );
}

#[test]
fn single_attribute_inverse_swaps_roles() {
    let q = query_sp(s(), &Term::iri("http://x/knows"), Direction::Inverse, &[]);
    assert_eq!(
        q.to_string(),
        "SELECT DISTINCT ?v ?c ?g WHERE { \
         ?v <http://x/knows> <http://x/s> . \
         OPTIONAL { ?v a ?c . } \
         OPTIONAL { GRAPH ?g { ?v a ?c . } } }"
    );
    assert!(q.from.is_empty());
    assert!(q.from_named.is_empty());
}

#[test]
fn all_attributes_covers_value_type_and_graphs() {
    let q = query_s(s(), Direction::Direct, &[]);
    assert!(q.is_distinct());
    assert_eq!(
        q.variables(),
        &[
            Variable::new("p"),
            Variable::new("v"),
            Variable::new("c"),
            Variable::new("g")
        ]
    );
    assert_eq!(
        q.to_string(),
        "SELECT DISTINCT ?p ?v ?c ?g WHERE { \
         <http://x/s> ?p ?v . \
         OPTIONAL { ?v a ?c . } \
         OPTIONAL { GRAPH ?g { <http://x/s> ?p ?v . } } \
         OPTIONAL { GRAPH ?g { ?v a ?c . } } }"
    );

    let inverse = query_s(s(), Direction::Inverse, &[]);
    assert!(inverse.to_string().contains("?v ?p <http://x/s> ."));
}

#[test]
fn existence_check_is_ask_scoped_to_contexts() {
    let q = query_ask(s(), &[g()]);
    assert!(q.is_ask());
    assert_eq!(
        q.to_string(),
        "ASK FROM <http://x/g> FROM NAMED <http://x/g> WHERE { <http://x/s> ?p ?o . }"
    );
}

#[test]
fn subjects_by_attributes_skips_non_identifiers() {
    let attributes = vec![
        AttributeEdge::direct("http://x/name"),
        AttributeEdge::new(Term::literal("*"), Direction::Direct),
        AttributeEdge::inverse("http://x/knows"),
    ];
    let q = query_p_s(&attributes, Some(&g()));
    assert_eq!(
        q.to_string(),
        "SELECT DISTINCT ?s ?c ?g FROM <http://x/g> FROM NAMED <http://x/g> WHERE { \
         ?s <http://x/name> ?v0 . \
         ?v2 <http://x/knows> ?s . \
         OPTIONAL { ?s a ?c . } \
         OPTIONAL { GRAPH ?g { ?s a ?c . } } }"
    );
}

#[test]
fn subjects_by_attributes_without_context_has_no_sources() {
    let q = query_p_s(&[AttributeEdge::direct("http://x/name")], None);
    assert!(q.from.is_empty());
    assert!(q.from_named.is_empty());
}

#[test]
fn concept_projects_types_only() {
    let q = query_concept(s());
    assert_eq!(q.variables(), &[Variable::new("c")]);
    assert_eq!(
        q.to_string(),
        "SELECT DISTINCT ?c WHERE { <http://x/s> a ?c . }"
    );
}
