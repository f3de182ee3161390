//! Boolean trees of attribute-path constraints.
//!
//! A [`ConstraintTree`] holds ordered children joined by one [`Connection`].
//! Adding a child under a different connection pushes the whole existing
//! tree one level down, so a single level never mixes AND with OR:
//!
//! ```text
//! (a & b) | c   ==>   OR[ AND[a, b], c ]
//! ```
//!
//! Trees compile into graph patterns anchored at a root variable (the
//! queried subject). Intermediate path hops get fresh variables from a
//! [`VarCounter`] scoped to one compilation.

use crate::error::QueryResult;
use crate::path::{resolve_path, AttributeEdge, AttributePath, AttributeResolver};
use crate::query::{triple, GraphPattern, PatternTerm, Variable};
use crate::term::{Resource, Term};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Connection {
    And,
    Or,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connection::And => f.write_str("AND"),
            Connection::Or => f.write_str("OR"),
        }
    }
}

/// The value side of a leaf: one term, or an OR-set over the final edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintValue {
    One(Term),
    AnyOf(Vec<Term>),
}

impl ConstraintValue {
    /// Constrain to the subject of a resource.
    pub fn resource<R: Resource + ?Sized>(resource: &R) -> Self {
        ConstraintValue::One(resource.subject().clone())
    }

    /// OR-set over resources.
    pub fn any_resource<'a, R, I>(resources: I) -> Self
    where
        R: Resource + 'a + ?Sized,
        I: IntoIterator<Item = &'a R>,
    {
        ConstraintValue::AnyOf(resources.into_iter().map(|r| r.subject().clone()).collect())
    }

    /// OR-set over plain values.
    pub fn any_of<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        ConstraintValue::AnyOf(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! single_values {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConstraintValue {
                fn from(value: $ty) -> Self {
                    ConstraintValue::One(value.into())
                }
            }
        )*
    };
}

single_values!(Term, &Term, &str, String, &String, bool, f64, i32, i64, u32, u64, usize);

impl<T: Into<Term>> From<Vec<T>> for ConstraintValue {
    fn from(values: Vec<T>) -> Self {
        ConstraintValue::any_of(values)
    }
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::One(term) => write!(f, "= {term}"),
            ConstraintValue::AnyOf(terms) => {
                f.write_str("IN [")?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    term.fmt(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintLeaf {
    pub path: AttributePath,
    pub value: ConstraintValue,
}

impl ConstraintLeaf {
    pub fn new(path: impl Into<AttributePath>, value: impl Into<ConstraintValue>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Resolve `name` into a path and pair it with `value`.
    pub fn resolve<R>(resolver: &R, name: &str, value: impl Into<ConstraintValue>) -> QueryResult<Self>
    where
        R: AttributeResolver + ?Sized,
    {
        Ok(Self::new(resolve_path(resolver, name)?, value))
    }
}

impl fmt::Display for ConstraintLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintNode {
    Leaf(ConstraintLeaf),
    Composite(ConstraintTree),
}

impl From<ConstraintLeaf> for ConstraintNode {
    fn from(value: ConstraintLeaf) -> Self {
        ConstraintNode::Leaf(value)
    }
}

impl From<ConstraintTree> for ConstraintNode {
    fn from(value: ConstraintTree) -> Self {
        ConstraintNode::Composite(value)
    }
}

impl fmt::Display for ConstraintNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintNode::Leaf(leaf) => leaf.fmt(f),
            ConstraintNode::Composite(tree) => tree.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintTree {
    children: Vec<ConstraintNode>,
    connection: Option<Connection>,
}

impl ConstraintTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(name, value)` pairs, ANDed together.
    pub fn from_pairs<R, I, N, V>(resolver: &R, pairs: I) -> QueryResult<Self>
    where
        R: AttributeResolver + ?Sized,
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<ConstraintValue>,
    {
        let mut tree = Self::new();
        for (name, value) in pairs {
            tree.add(ConstraintLeaf::resolve(resolver, name.as_ref(), value)?, Connection::And);
        }
        Ok(tree)
    }

    pub fn children(&self) -> &[ConstraintNode] {
        &self.children
    }

    pub fn connection(&self) -> Option<Connection> {
        self.connection
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Append `child` under `connection`.
    ///
    /// When the tree already uses the other connection, the current tree
    /// becomes the first child of a new top node.
    pub fn add(&mut self, child: impl Into<ConstraintNode>, connection: Connection) {
        let child = child.into();
        match self.connection {
            Some(current) if current != connection => {
                let old = std::mem::take(self);
                self.children = vec![ConstraintNode::Composite(old), child];
            }
            _ => self.children.push(child),
        }
        self.connection = Some(connection);
    }

    pub fn extend<I, C>(&mut self, children: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<ConstraintNode>,
    {
        for child in children {
            self.add(child, Connection::And);
        }
    }

    /// Copy of `self` with `other` added under `connection`.
    pub fn combine(&self, other: impl Into<ConstraintNode>, connection: Connection) -> Self {
        let mut new = self.clone();
        new.add(other, connection);
        new
    }

    /// Compile into patterns anchored at `root`.
    pub fn compile(&self, root: &Variable) -> Vec<GraphPattern> {
        let mut counter = VarCounter::new("e");
        compile_tree(self, root, &mut counter)
    }
}

impl BitOr for ConstraintTree {
    type Output = ConstraintTree;

    fn bitor(self, rhs: ConstraintTree) -> ConstraintTree {
        self.combine(rhs, Connection::Or)
    }
}

impl BitAnd for ConstraintTree {
    type Output = ConstraintTree;

    fn bitand(self, rhs: ConstraintTree) -> ConstraintTree {
        self.combine(rhs, Connection::And)
    }
}

impl From<ConstraintLeaf> for ConstraintTree {
    fn from(value: ConstraintLeaf) -> Self {
        let mut tree = Self::new();
        tree.add(value, Connection::And);
        tree
    }
}

impl fmt::Display for ConstraintTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.children.as_slice() {
            [] => Ok(()),
            [only] => only.fmt(f),
            children => {
                let connection = self.connection.unwrap_or(Connection::And);
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {connection} ")?;
                    }
                    write!(f, "({child})")?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Compilation to graph patterns
// ============================================================================

/// Fresh variables `?<prefix>0`, `?<prefix>1`, ... for one compilation.
#[derive(Debug, Clone)]
pub struct VarCounter {
    prefix: &'static str,
    next: usize,
}

impl VarCounter {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }

    pub fn starting_at(prefix: &'static str, first: usize) -> Self {
        Self {
            prefix,
            next: first,
        }
    }

    pub fn next_var(&mut self) -> Variable {
        let v = Variable::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        v
    }
}

/// Triples walking `edges` from `root`; returns them with the final variable.
///
/// Used for ordering by a path as well as for constraint leaves.
pub fn walk_path<'a, I>(root: &Variable, edges: I, counter: &mut VarCounter) -> (Vec<GraphPattern>, Variable)
where
    I: IntoIterator<Item = &'a AttributeEdge>,
{
    let mut clauses = Vec::new();
    let mut last = root.clone();
    for edge in edges {
        let next = counter.next_var();
        let (s, p, o) = edge.direction.orient(
            PatternTerm::from(&last),
            PatternTerm::from(&edge.attribute),
            PatternTerm::from(&next),
        );
        clauses.push(triple(s, p, o));
        last = next;
    }
    (clauses, last)
}

fn compile_leaf(leaf: &ConstraintLeaf, root: &Variable, counter: &mut VarCounter) -> Vec<GraphPattern> {
    let (mut clauses, anchor) = walk_path(root, leaf.path.hops(), counter);
    let terminal = leaf.path.terminal();
    let bind = |value: &Term| {
        let (s, p, o) = terminal.direction.orient(
            PatternTerm::from(&anchor),
            PatternTerm::from(&terminal.attribute),
            PatternTerm::from(value),
        );
        triple(s, p, o)
    };
    match &leaf.value {
        ConstraintValue::One(value) => clauses.push(bind(value)),
        ConstraintValue::AnyOf(values) => {
            clauses.push(GraphPattern::Union(values.iter().map(bind).collect()));
        }
    }
    clauses
}

fn compile_tree(tree: &ConstraintTree, root: &Variable, counter: &mut VarCounter) -> Vec<GraphPattern> {
    let mut clauses = Vec::with_capacity(tree.children.len());
    for child in &tree.children {
        let (mut sub, connection) = match child {
            ConstraintNode::Composite(inner) => (
                compile_tree(inner, root, counter),
                inner.connection.unwrap_or(Connection::And),
            ),
            ConstraintNode::Leaf(leaf) => (compile_leaf(leaf, root, counter), Connection::And),
        };
        let clause = if sub.len() == 1 {
            sub.remove(0)
        } else {
            match connection {
                Connection::And => GraphPattern::Group(sub),
                Connection::Or => GraphPattern::Union(sub),
            }
        };
        clauses.push(clause);
    }
    clauses
}
