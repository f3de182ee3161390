//! Query construction errors.

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    /// A path segment has no known attribute identifier.
    #[error("not an attribute: {segment:?}")]
    UnknownAttribute { segment: String },

    #[error("attribute path must contain at least one edge")]
    EmptyPath,

    /// Native filter expressions only bind direct attributes.
    #[error("only direct attributes can be used in filters (got {name:?})")]
    InverseFilterAttribute { name: String },

    #[error("invalid namespace map: {0}")]
    NamespaceMap(#[from] serde_json::Error),
}

impl QueryError {
    pub fn unknown_attribute(segment: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            segment: segment.into(),
        }
    }

    pub fn inverse_filter_attribute(name: impl Into<String>) -> Self {
        Self::InverseFilterAttribute { name: name.into() }
    }
}
