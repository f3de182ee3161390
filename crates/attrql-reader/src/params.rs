//! The parameter bag handed to the planner.
//!
//! [`QueryParams`] is a plain value. Collections copy it and change one field
//! per chaining call; the planner only reads it.

use attrql_query::{
    AttributeEdge, AttributePath, AttributeResolver, ConstraintTree, Direction, QueryError,
    QueryResult, Term, Variable,
};
use serde::{Deserialize, Serialize};

/// How the fetched subject list is bounded.
///
/// Limit/offset and a window are mutually exclusive; a collection refuses to
/// mix them before they ever reach the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paging {
    #[default]
    Unbounded,
    LimitOffset {
        limit: Option<usize>,
        offset: Option<usize>,
    },
    /// Half-open `[low, high)` slice of the subject list; `high = None` is open.
    Window { low: usize, high: Option<usize> },
}

impl Paging {
    /// The `(limit, offset)` pair sent to the backend.
    pub fn limit_offset(&self) -> (Option<usize>, Option<usize>) {
        match *self {
            Paging::Unbounded => (None, None),
            Paging::LimitOffset { limit, offset } => (limit, offset),
            Paging::Window { low, high } => (
                high.map(|high| high.saturating_sub(low)),
                (low > 0).then_some(low),
            ),
        }
    }

    pub fn is_window(&self) -> bool {
        matches!(self, Paging::Window { .. })
    }

    pub fn is_limit_offset(&self) -> bool {
        matches!(self, Paging::LimitOffset { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    /// By subject identifier.
    Subject,
    /// By the value reached walking `path` from the subject.
    Path(AttributePath),
}

/// A native filter: `template` with `%s` standing for the attribute's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub attribute: Term,
    pub template: String,
    pub direction: Direction,
}

impl FilterClause {
    /// Only direct attributes are accepted.
    pub fn new(edge: AttributeEdge, template: impl Into<String>) -> QueryResult<Self> {
        if !edge.direction.is_direct() {
            return Err(QueryError::inverse_filter_attribute(edge.attribute.to_string()));
        }
        Ok(Self {
            attribute: edge.attribute,
            template: template.into(),
            direction: edge.direction,
        })
    }

    pub fn resolve<R>(resolver: &R, name: &str, template: impl Into<String>) -> QueryResult<Self>
    where
        R: AttributeResolver + ?Sized,
    {
        let edge = resolver
            .resolve(name)
            .ok_or_else(|| QueryError::unknown_attribute(name))?;
        if !edge.direction.is_direct() {
            return Err(QueryError::inverse_filter_attribute(name));
        }
        Self::new(edge, template)
    }

    /// Substitute `variable` for every `%s`; `%%` is a literal percent sign.
    pub fn instantiate(&self, variable: &Variable) -> String {
        let mut out = String::with_capacity(self.template.len() + 8);
        let mut chars = self.template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    out.push_str(&variable.to_string());
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                }
                _ => out.push('%'),
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    pub paging: Paging,
    /// Load every attribute of each subject, not just its types.
    pub full: bool,
    /// With `full`, skip inverse attributes.
    pub only_direct: bool,
    pub order: Option<OrderBy>,
    pub desc: bool,
    pub get_by: ConstraintTree,
    pub filters: Vec<FilterClause>,
    pub contexts: Vec<Term>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }
}
