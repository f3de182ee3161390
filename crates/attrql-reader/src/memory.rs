//! In-memory quad store that evaluates [`Query`] values directly.
//!
//! Dataset rules:
//! - no `FROM` / `FROM NAMED`: default-graph patterns see every quad, `GRAPH`
//!   patterns see every quad with a graph name
//! - otherwise default-graph patterns see only the `FROM` graphs and `GRAPH`
//!   patterns only the `FROM NAMED` graphs
//!
//! Filters are limited to `(?var OP operand)` with `= != < > <= >=`; anything
//! else is rejected rather than ignored.

use crate::backend::Backend;
use crate::convert::{Row, Table};
use anyhow::{anyhow, bail, Result};
use attrql_query::term::{XSD_BOOLEAN, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use attrql_query::{GraphPattern, PatternTerm, Query, QueryForm, Term};
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    /// `None` for the default graph.
    pub graph: Option<Term>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryOutput {
    Boolean(bool),
    Rows(Table),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    quads: Vec<Quad>,
    seen: HashSet<Quad>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quad; returns `false` if it was already present.
    pub fn insert_quad(&mut self, quad: Quad) -> bool {
        if !self.seen.insert(quad.clone()) {
            return false;
        }
        self.quads.push(quad);
        true
    }

    /// Add a default-graph triple.
    pub fn insert(
        &mut self,
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> bool {
        self.insert_quad(Quad {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: None,
        })
    }

    /// Add a triple to the named graph `graph`.
    pub fn insert_in(
        &mut self,
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
        graph: impl Into<Term>,
    ) -> bool {
        self.insert_quad(Quad {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph: Some(graph.into()),
        })
    }

    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Evaluate `query` against the stored quads.
    pub fn evaluate(&self, query: &Query) -> Result<MemoryOutput> {
        let dataset = Dataset::for_query(&self.quads, query);
        let solutions = evaluate_where(&dataset, query)?;
        match &query.form {
            QueryForm::Ask => Ok(MemoryOutput::Boolean(!solutions.is_empty())),
            QueryForm::Select { .. } => Ok(MemoryOutput::Rows(finish_select(query, solutions))),
        }
    }
}

impl Backend for MemoryBackend {
    type Output = MemoryOutput;

    fn execute(&self, query: &Query) -> Result<MemoryOutput> {
        self.evaluate(query)
    }

    fn to_table(&self, output: MemoryOutput) -> Result<Table> {
        match output {
            MemoryOutput::Rows(rows) => Ok(rows),
            MemoryOutput::Boolean(_) => bail!("boolean result has no rows"),
        }
    }

    fn ask(&self, output: MemoryOutput) -> Result<bool> {
        match output {
            MemoryOutput::Boolean(answer) => Ok(answer),
            MemoryOutput::Rows(_) => bail!("expected a boolean result, got rows"),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

struct Dataset<'a> {
    default: Vec<&'a Quad>,
    named: Vec<&'a Quad>,
    /// Graph names visible to `GRAPH`, first-seen order.
    graphs: Vec<&'a Term>,
}

impl<'a> Dataset<'a> {
    fn for_query(quads: &'a [Quad], query: &Query) -> Self {
        let open = query.from.is_empty() && query.from_named.is_empty();
        let default = quads
            .iter()
            .filter(|q| open || q.graph.as_ref().is_some_and(|g| query.from.contains(g)))
            .collect();
        let named: Vec<&Quad> = quads
            .iter()
            .filter(|q| match &q.graph {
                Some(g) => open || query.from_named.contains(g),
                None => false,
            })
            .collect();
        let mut graphs: Vec<&Term> = Vec::new();
        for quad in named.iter().copied() {
            if let Some(g) = &quad.graph {
                if !graphs.contains(&g) {
                    graphs.push(g);
                }
            }
        }
        Self {
            default,
            named,
            graphs,
        }
    }

    fn active<'s>(&'s self, graph: Option<&'s Term>) -> impl Iterator<Item = &'a Quad> + 's {
        let quads = if graph.is_some() {
            &self.named
        } else {
            &self.default
        };
        quads
            .iter()
            .copied()
            .filter(move |q| graph.is_none() || q.graph.as_ref() == graph)
    }
}

// ============================================================================
// Pattern evaluation
// ============================================================================

fn evaluate_where(dataset: &Dataset<'_>, query: &Query) -> Result<Vec<Row>> {
    let solutions = eval_block(dataset, None, &query.patterns, vec![Row::new()])?;
    if query.filters.is_empty() {
        return Ok(solutions);
    }
    let filters = query
        .filters
        .iter()
        .map(String::as_str)
        .map(Filter::parse)
        .collect::<Result<Vec<_>>>()?;
    Ok(solutions
        .into_iter()
        .filter(|row| filters.iter().all(|f| f.accepts(row)))
        .collect())
}

fn eval_block(
    dataset: &Dataset<'_>,
    graph: Option<&Term>,
    patterns: &[GraphPattern],
    mut solutions: Vec<Row>,
) -> Result<Vec<Row>> {
    for pattern in patterns {
        if solutions.is_empty() {
            break;
        }
        solutions = eval_pattern(dataset, graph, pattern, solutions)?;
    }
    Ok(solutions)
}

fn eval_pattern(
    dataset: &Dataset<'_>,
    graph: Option<&Term>,
    pattern: &GraphPattern,
    input: Vec<Row>,
) -> Result<Vec<Row>> {
    let mut out = Vec::new();
    match pattern {
        GraphPattern::Triple(t) => {
            for row in &input {
                for quad in dataset.active(graph) {
                    let mut candidate = row.clone();
                    if bind(&mut candidate, &t.subject, &quad.subject)
                        && bind(&mut candidate, &t.predicate, &quad.predicate)
                        && bind(&mut candidate, &t.object, &quad.object)
                    {
                        out.push(candidate);
                    }
                }
            }
        }
        GraphPattern::Group(patterns) => return eval_block(dataset, graph, patterns, input),
        GraphPattern::Union(branches) => {
            for row in &input {
                for branch in branches {
                    out.extend(eval_pattern(dataset, graph, branch, vec![row.clone()])?);
                }
            }
        }
        GraphPattern::Optional(patterns) => {
            for row in input {
                let matched = eval_block(dataset, graph, patterns, vec![row.clone()])?;
                if matched.is_empty() {
                    out.push(row);
                } else {
                    out.extend(matched);
                }
            }
        }
        GraphPattern::Named {
            graph: name,
            patterns,
        } => {
            for row in &input {
                for candidate in dataset.graphs.iter().copied() {
                    let mut scoped = row.clone();
                    if bind(&mut scoped, name, candidate) {
                        out.extend(eval_block(dataset, Some(candidate), patterns, vec![scoped])?);
                    }
                }
            }
        }
        GraphPattern::SubSelect(inner) => {
            if inner.is_ask() {
                bail!("ASK cannot be used as a sub-select");
            }
            let rows = finish_select(inner, evaluate_where(dataset, inner)?);
            for row in &input {
                for other in &rows {
                    if let Some(joined) = join(row, other) {
                        out.push(joined);
                    }
                }
            }
        }
    }
    Ok(out)
}

fn bind(row: &mut Row, slot: &PatternTerm, term: &Term) -> bool {
    match slot {
        PatternTerm::Term(fixed) => fixed == term,
        PatternTerm::Var(v) => match row.get(v.name()) {
            Some(bound) => bound == term,
            None => {
                row.insert(v.name().to_string(), term.clone());
                true
            }
        },
    }
}

fn join(left: &Row, right: &Row) -> Option<Row> {
    let mut joined = left.clone();
    for (name, term) in right {
        match joined.get(name) {
            Some(bound) if bound != term => return None,
            Some(_) => {}
            None => {
                joined.insert(name.clone(), term.clone());
            }
        }
    }
    Some(joined)
}

/// ORDER BY, projection, DISTINCT, OFFSET and LIMIT, in that order.
fn finish_select(query: &Query, mut solutions: Vec<Row>) -> Table {
    if !query.order_by.is_empty() {
        solutions.sort_by(|a, b| {
            for condition in &query.order_by {
                let name = condition.variable.name();
                let ordering = compare_bound(a.get(name), b.get(name));
                let ordering = if condition.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    let projected = query.variables();
    let mut rows: Vec<Row> = if projected.is_empty() {
        solutions
    } else {
        solutions
            .into_iter()
            .map(|row| {
                projected
                    .iter()
                    .filter_map(|v| row.get(v.name()).map(|t| (v.name().to_string(), t.clone())))
                    .collect()
            })
            .collect()
    };

    if query.is_distinct() {
        let mut seen = HashSet::new();
        rows.retain(|row| seen.insert(row.clone()));
    }

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).collect()
}

/// Unbound sorts first, then blank nodes, IRIs and literals; numeric literals
/// compare by value.
fn compare_bound(a: Option<&Term>, b: Option<&Term>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_terms(a, b),
    }
}

fn compare_terms(a: &Term, b: &Term) -> Ordering {
    fn rank(t: &Term) -> u8 {
        match t {
            Term::BlankNode(_) => 0,
            Term::Iri(_) => 1,
            Term::Literal(_) => 2,
        }
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.lexical().cmp(b.lexical()))
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone)]
struct Filter {
    variable: String,
    op: Op,
    operand: Term,
}

impl Filter {
    fn parse(expression: &str) -> Result<Self> {
        let unsupported = || anyhow!("unsupported filter expression: {expression}");
        let trimmed = expression.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|e| e.strip_suffix(')'))
            .unwrap_or(trimmed)
            .trim();
        let rest = inner.strip_prefix('?').ok_or_else(unsupported)?;
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let (variable, rest) = rest.split_at(name_len);
        if variable.is_empty() {
            return Err(unsupported());
        }
        let rest = rest.trim_start();
        let (op, rest) = [
            (">=", Op::Ge),
            ("<=", Op::Le),
            ("!=", Op::Ne),
            ("=", Op::Eq),
            ("<", Op::Lt),
            (">", Op::Gt),
        ]
        .into_iter()
        .find_map(|(token, op)| rest.strip_prefix(token).map(|r| (op, r)))
        .ok_or_else(unsupported)?;
        let operand = parse_operand(rest.trim()).ok_or_else(unsupported)?;
        Ok(Self {
            variable: variable.to_string(),
            op,
            operand,
        })
    }

    /// Unbound variables never pass.
    fn accepts(&self, row: &Row) -> bool {
        let Some(value) = row.get(&self.variable) else {
            return false;
        };
        let ordering = match (value.as_f64(), self.operand.as_f64()) {
            (Some(x), Some(y)) => match x.partial_cmp(&y) {
                Some(ordering) => ordering,
                None => return false,
            },
            _ => match self.op {
                Op::Eq => return value == &self.operand || same_text(value, &self.operand),
                Op::Ne => return !(value == &self.operand || same_text(value, &self.operand)),
                _ => value.lexical().cmp(self.operand.lexical()),
            },
        };
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Lt => ordering == Ordering::Less,
            Op::Gt => ordering == Ordering::Greater,
            Op::Le => ordering != Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }
}

/// A plain literal equals a literal of the same text regardless of language.
fn same_text(a: &Term, b: &Term) -> bool {
    match (a, b) {
        (Term::Literal(x), Term::Literal(y)) => {
            x.lexical == y.lexical && (x.datatype.is_none() || y.datatype.is_none())
        }
        _ => false,
    }
}

fn parse_operand(text: &str) -> Option<Term> {
    if let Some(iri) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Some(Term::iri(iri));
    }
    if text.starts_with('"') {
        return parse_quoted(text);
    }
    match text {
        "true" | "false" => return Some(Term::typed_literal(text, XSD_BOOLEAN)),
        _ => {}
    }
    text.parse::<f64>().ok()?;
    let datatype = if text.contains(['e', 'E']) {
        XSD_DOUBLE
    } else if text.contains('.') {
        XSD_DECIMAL
    } else {
        XSD_INTEGER
    };
    Some(Term::typed_literal(text, datatype))
}

fn parse_quoted(text: &str) -> Option<Term> {
    let mut lexical = String::new();
    let mut chars = text.char_indices().skip(1);
    let mut end = None;
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                end = Some(i);
                break;
            }
            '\\' => match chars.next()?.1 {
                'n' => lexical.push('\n'),
                'r' => lexical.push('\r'),
                't' => lexical.push('\t'),
                other => lexical.push(other),
            },
            other => lexical.push(other),
        }
    }
    let suffix = text[end? + 1..].trim();
    if suffix.is_empty() {
        Some(Term::literal(lexical))
    } else if let Some(language) = suffix.strip_prefix('@') {
        Some(Term::lang_literal(lexical, language))
    } else {
        let datatype = suffix.strip_prefix("^^<")?.strip_suffix('>')?;
        Some(Term::typed_literal(lexical, datatype))
    }
}
