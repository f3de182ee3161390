//! attrql query construction
//!
//! Client code asks for "subjects whose `foaf_knows__foaf_name` is Ann" and
//! this crate turns that into structured graph queries:
//!
//! - `term`: RDF terms (IRIs, blank nodes, literals)
//! - `query`: the [`Query`] value and its SPARQL rendering
//! - `path`: attribute names resolved into directed edge paths
//! - `constraint`: AND/OR trees of path constraints and their compilation
//! - `patterns`: the fixed query shapes used to read single subjects
//!
//! Nothing here talks to a store; see `attrql-reader` for execution.

pub mod constraint;
pub mod error;
pub mod path;
pub mod patterns;
pub mod query;
pub mod term;

pub use constraint::{
    walk_path, Connection, ConstraintLeaf, ConstraintNode, ConstraintTree, ConstraintValue,
    VarCounter,
};
pub use error::{QueryError, QueryResult};
pub use path::{
    resolve_path, AttributeEdge, AttributePath, AttributeResolver, Direction, NamespaceResolver,
    PATH_DELIMITER,
};
pub use query::{
    named_group, optional_group, triple, GraphPattern, OrderCondition, PatternTerm, Query,
    QueryForm, TriplePattern, Variable,
};
pub use term::{Literal, Resource, Term, RDF_TYPE_IRI};
