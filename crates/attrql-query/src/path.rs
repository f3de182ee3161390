//! Attribute paths: `foaf_knows__foaf_name` style names resolved into edges.
//!
//! A segmented name is split on [`PATH_DELIMITER`]; every segment is handed to
//! an [`AttributeResolver`] which maps it to an attribute identifier plus a
//! traversal direction. Resolution is eager: callers get the error at the
//! point where they wrote the bad name.

use crate::error::{QueryError, QueryResult};
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PATH_DELIMITER: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// The anchor is the triple's subject.
    Direct,
    /// The anchor is the triple's object.
    Inverse,
}

impl Direction {
    pub fn is_direct(self) -> bool {
        matches!(self, Direction::Direct)
    }

    /// Order `(anchor, predicate, other)` into triple positions.
    pub fn orient<T>(self, anchor: T, predicate: T, other: T) -> (T, T, T) {
        match self {
            Direction::Direct => (anchor, predicate, other),
            Direction::Inverse => (other, predicate, anchor),
        }
    }
}

/// One hop: an attribute identifier and the direction it is followed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeEdge {
    pub attribute: Term,
    pub direction: Direction,
}

impl AttributeEdge {
    pub fn new(attribute: Term, direction: Direction) -> Self {
        Self {
            attribute,
            direction,
        }
    }

    pub fn direct(attribute: impl Into<String>) -> Self {
        Self::new(Term::iri(attribute), Direction::Direct)
    }

    pub fn inverse(attribute: impl Into<String>) -> Self {
        Self::new(Term::iri(attribute), Direction::Inverse)
    }
}

impl fmt::Display for AttributeEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Direct => write!(f, "{}", self.attribute),
            Direction::Inverse => write!(f, "^{}", self.attribute),
        }
    }
}

/// A non-empty chain of edges from a root subject to a terminal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePath {
    hops: Vec<AttributeEdge>,
    terminal: AttributeEdge,
}

impl AttributePath {
    pub fn new(mut edges: Vec<AttributeEdge>) -> QueryResult<Self> {
        let terminal = edges.pop().ok_or(QueryError::EmptyPath)?;
        Ok(Self {
            hops: edges,
            terminal,
        })
    }

    pub fn single(edge: AttributeEdge) -> Self {
        Self {
            hops: Vec::new(),
            terminal: edge,
        }
    }

    /// Edges leading up to the terminal one.
    pub fn hops(&self) -> &[AttributeEdge] {
        &self.hops
    }

    pub fn terminal(&self) -> &AttributeEdge {
        &self.terminal
    }

    pub fn edges(&self) -> impl Iterator<Item = &AttributeEdge> {
        self.hops.iter().chain(std::iter::once(&self.terminal))
    }
}

impl From<AttributeEdge> for AttributePath {
    fn from(value: AttributeEdge) -> Self {
        Self::single(value)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, edge) in self.edges().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            edge.fmt(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Maps one short attribute name to its identifier and direction.
pub trait AttributeResolver {
    fn resolve(&self, name: &str) -> Option<AttributeEdge>;
}

impl<F> AttributeResolver for F
where
    F: Fn(&str) -> Option<AttributeEdge>,
{
    fn resolve(&self, name: &str) -> Option<AttributeEdge> {
        self(name)
    }
}

/// Split `name` on `__` and resolve each segment.
pub fn resolve_path<R>(resolver: &R, name: &str) -> QueryResult<AttributePath>
where
    R: AttributeResolver + ?Sized,
{
    let mut edges = Vec::new();
    for segment in name.split(PATH_DELIMITER) {
        let edge = resolver
            .resolve(segment)
            .ok_or_else(|| QueryError::unknown_attribute(segment))?;
        edges.push(edge);
    }
    AttributePath::new(edges)
}

/// The conventional `prefix_local` / `is_prefix_local_of` naming scheme.
///
/// `foaf_name` resolves to `<http://xmlns.com/foaf/0.1/name>` followed
/// forward; `is_foaf_knows_of` resolves to `foaf:knows` followed inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceResolver {
    prefixes: BTreeMap<String, String>,
}

impl NamespaceResolver {
    pub fn new() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// A resolver preloaded with the rdf, rdfs, owl, xsd, foaf and dc prefixes.
    pub fn standard() -> Self {
        Self::new()
            .with_prefix("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .with_prefix("rdfs", "http://www.w3.org/2000/01/rdf-schema#")
            .with_prefix("owl", "http://www.w3.org/2002/07/owl#")
            .with_prefix("xsd", "http://www.w3.org/2001/XMLSchema#")
            .with_prefix("foaf", "http://xmlns.com/foaf/0.1/")
            .with_prefix("dc", "http://purl.org/dc/elements/1.1/")
    }

    /// Standard prefixes plus a JSON object of `prefix -> namespace` entries.
    pub fn from_json(json: &str) -> QueryResult<Self> {
        let extra: BTreeMap<String, String> = serde_json::from_str(json)?;
        let mut resolver = Self::standard();
        resolver.prefixes.extend(extra);
        Ok(resolver)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.register(prefix, namespace);
        self
    }

    pub fn register(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }
}

impl Default for NamespaceResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl AttributeResolver for NamespaceResolver {
    fn resolve(&self, name: &str) -> Option<AttributeEdge> {
        let (name, direction) = match name
            .strip_prefix("is_")
            .and_then(|rest| rest.strip_suffix("_of"))
        {
            Some(inner) => (inner, Direction::Inverse),
            None => (name, Direction::Direct),
        };
        let (prefix, local) = name.split_once('_')?;
        if local.is_empty() {
            return None;
        }
        let namespace = self.namespace(prefix)?;
        Some(AttributeEdge::new(
            Term::iri(format!("{namespace}{local}")),
            direction,
        ))
    }
}
