//! Reader errors.

use crate::convert::ConvertError;
use attrql_query::QueryError;
use thiserror::Error;

pub type ReaderResult<T> = Result<T, ReaderError>;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Raised by the backend adapter; passed through untouched.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    #[error("row conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("invalid reader configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to parse {format}: {message}")]
    Load { format: &'static str, message: String },
}

impl ReaderError {
    pub fn load(format: &'static str, message: impl Into<String>) -> Self {
        Self::Load {
            format,
            message: message.into(),
        }
    }
}
