//! Structured graph queries.
//!
//! A [`Query`] is built fresh for each request and handed to a backend. It is
//! a plain value: the pattern builders and the planner assemble it with the
//! consuming builder methods below, backends either evaluate it directly or
//! send its SPARQL rendering (`Display`) over the wire.

use crate::term::{escape_literal, Term, RDF_TYPE_IRI};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A query variable, stored without its leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self(name.strip_prefix('?').unwrap_or(name).to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// One position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternTerm {
    Var(Variable),
    Term(Term),
}

impl PatternTerm {
    pub fn as_var(&self) -> Option<&Variable> {
        match self {
            PatternTerm::Var(v) => Some(v),
            PatternTerm::Term(_) => None,
        }
    }
}

impl From<Variable> for PatternTerm {
    fn from(value: Variable) -> Self {
        PatternTerm::Var(value)
    }
}

impl From<&Variable> for PatternTerm {
    fn from(value: &Variable) -> Self {
        PatternTerm::Var(value.clone())
    }
}

impl From<Term> for PatternTerm {
    fn from(value: Term) -> Self {
        PatternTerm::Term(value)
    }
}

impl From<&Term> for PatternTerm {
    fn from(value: &Term) -> Self {
        PatternTerm::Term(value.clone())
    }
}

impl fmt::Display for PatternTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternTerm::Var(v) => v.fmt(f),
            PatternTerm::Term(Term::Iri(iri)) if iri == RDF_TYPE_IRI => f.write_str("a"),
            PatternTerm::Term(t) => t.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: PatternTerm,
    pub predicate: PatternTerm,
    pub object: PatternTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphPattern {
    Triple(TriplePattern),
    /// Conjunction evaluated as one block.
    Group(Vec<GraphPattern>),
    /// Disjunction; an empty union matches nothing.
    Union(Vec<GraphPattern>),
    /// Left join of the inner block against what precedes it.
    Optional(Vec<GraphPattern>),
    /// Block evaluated inside the named graph bound to `graph`.
    Named {
        graph: PatternTerm,
        patterns: Vec<GraphPattern>,
    },
    SubSelect(Box<Query>),
}

/// Triple pattern constructor.
pub fn triple(
    subject: impl Into<PatternTerm>,
    predicate: impl Into<PatternTerm>,
    object: impl Into<PatternTerm>,
) -> GraphPattern {
    GraphPattern::Triple(TriplePattern {
        subject: subject.into(),
        predicate: predicate.into(),
        object: object.into(),
    })
}

/// `GRAPH ?g { ... }`
pub fn named_group(graph: impl Into<PatternTerm>, patterns: Vec<GraphPattern>) -> GraphPattern {
    GraphPattern::Named {
        graph: graph.into(),
        patterns,
    }
}

pub fn optional_group(patterns: Vec<GraphPattern>) -> GraphPattern {
    GraphPattern::Optional(patterns)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryForm {
    Select {
        variables: Vec<Variable>,
        distinct: bool,
    },
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCondition {
    pub variable: Variable,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub form: QueryForm,
    pub patterns: Vec<GraphPattern>,
    /// Default-graph sources (`FROM`).
    pub from: Vec<Term>,
    /// Named-graph sources (`FROM NAMED`).
    pub from_named: Vec<Term>,
    /// Native filter expressions, already instantiated with their variables.
    pub filters: Vec<String>,
    pub order_by: Vec<OrderCondition>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// `SELECT` projecting `variables`; repeated names are kept once.
    pub fn select<I, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: AsRef<str>,
    {
        let mut projected: Vec<Variable> = Vec::new();
        for v in variables {
            let v = Variable::new(v);
            if !projected.contains(&v) {
                projected.push(v);
            }
        }
        Self::with_form(QueryForm::Select {
            variables: projected,
            distinct: false,
        })
    }

    pub fn ask() -> Self {
        Self::with_form(QueryForm::Ask)
    }

    fn with_form(form: QueryForm) -> Self {
        Self {
            form,
            patterns: Vec::new(),
            from: Vec::new(),
            from_named: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn distinct(mut self) -> Self {
        if let QueryForm::Select { distinct, .. } = &mut self.form {
            *distinct = true;
        }
        self
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self.form, QueryForm::Select { distinct: true, .. })
    }

    pub fn is_ask(&self) -> bool {
        matches!(self.form, QueryForm::Ask)
    }

    /// Projected variables (empty for `ASK`).
    pub fn variables(&self) -> &[Variable] {
        match &self.form {
            QueryForm::Select { variables, .. } => variables,
            QueryForm::Ask => &[],
        }
    }

    pub fn where_pattern(mut self, pattern: GraphPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn where_patterns(mut self, patterns: impl IntoIterator<Item = GraphPattern>) -> Self {
        self.patterns.extend(patterns);
        self
    }

    pub fn where_triple(
        self,
        subject: impl Into<PatternTerm>,
        predicate: impl Into<PatternTerm>,
        object: impl Into<PatternTerm>,
    ) -> Self {
        self.where_pattern(triple(subject, predicate, object))
    }

    pub fn group(self, patterns: Vec<GraphPattern>) -> Self {
        self.where_pattern(GraphPattern::Group(patterns))
    }

    pub fn optional_group(self, patterns: Vec<GraphPattern>) -> Self {
        self.where_pattern(GraphPattern::Optional(patterns))
    }

    /// Join against a nested `SELECT`.
    pub fn where_subquery(self, inner: Query) -> Self {
        self.where_pattern(GraphPattern::SubSelect(Box::new(inner)))
    }

    pub fn from_graphs<I, T>(mut self, graphs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        self.from.extend(graphs.into_iter().map(Into::into));
        self
    }

    pub fn from_named_graphs<I, T>(mut self, graphs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        self.from_named.extend(graphs.into_iter().map(Into::into));
        self
    }

    /// Register `contexts` both as default and as named sources.
    ///
    /// Several stores keep the default graph disjoint from the named graphs,
    /// so scoping only one of the two would lose matches.
    pub fn scoped_to(self, contexts: &[Term]) -> Self {
        if contexts.is_empty() {
            return self;
        }
        self.from_graphs(contexts.iter().cloned())
            .from_named_graphs(contexts.iter().cloned())
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filters.push(expression.into());
        self
    }

    pub fn order_by(mut self, variable: Variable, descending: bool) -> Self {
        self.order_by.push(OrderCondition {
            variable,
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

// ============================================================================
// SPARQL rendering
// ============================================================================

fn write_block(f: &mut fmt::Formatter<'_>, patterns: &[GraphPattern]) -> fmt::Result {
    f.write_str("{")?;
    for pattern in patterns {
        f.write_str(" ")?;
        fmt::Display::fmt(pattern, f)?;
    }
    f.write_str(" }")
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for GraphPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphPattern::Triple(t) => t.fmt(f),
            GraphPattern::Group(patterns) => write_block(f, patterns),
            GraphPattern::Union(branches) => {
                if branches.is_empty() {
                    return f.write_str("{ FILTER (false) }");
                }
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" UNION ")?;
                    }
                    match branch {
                        GraphPattern::Group(patterns) => write_block(f, patterns)?,
                        other => write_block(f, std::slice::from_ref(other))?,
                    }
                }
                Ok(())
            }
            GraphPattern::Optional(patterns) => {
                f.write_str("OPTIONAL ")?;
                write_block(f, patterns)
            }
            GraphPattern::Named { graph, patterns } => {
                write!(f, "GRAPH {graph} ")?;
                write_block(f, patterns)
            }
            GraphPattern::SubSelect(inner) => write!(f, "{{ {inner} }}"),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.form {
            QueryForm::Select {
                variables,
                distinct,
            } => {
                f.write_str("SELECT")?;
                if *distinct {
                    f.write_str(" DISTINCT")?;
                }
                if variables.is_empty() {
                    f.write_str(" *")?;
                }
                for v in variables {
                    write!(f, " {v}")?;
                }
            }
            QueryForm::Ask => f.write_str("ASK")?,
        }
        for graph in &self.from {
            write!(f, " FROM {graph}")?;
        }
        for graph in &self.from_named {
            write!(f, " FROM NAMED {graph}")?;
        }
        f.write_str(" WHERE {")?;
        for pattern in &self.patterns {
            write!(f, " {pattern}")?;
        }
        for expression in &self.filters {
            if expression.trim_start().starts_with('(') {
                write!(f, " FILTER {expression}")?;
            } else {
                write!(f, " FILTER ({expression})")?;
            }
        }
        f.write_str(" }")?;
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY")?;
            for condition in &self.order_by {
                if condition.descending {
                    write!(f, " DESC({})", condition.variable)?;
                } else {
                    write!(f, " {}", condition.variable)?;
                }
            }
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

/// Render a literal for inclusion in a filter expression.
pub fn sparql_literal(lexical: &str) -> String {
    format!("\"{}\"", escape_literal(lexical))
}
