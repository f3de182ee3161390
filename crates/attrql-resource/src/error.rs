use attrql_query::QueryError;
use attrql_reader::ReaderError;
use thiserror::Error;

pub type CollectionResult<T> = Result<T, CollectionError>;

#[derive(Debug, Error)]
pub enum CollectionError {
    /// Limit/offset and slicing windows cannot be mixed on one collection.
    #[error("cannot combine slicing with limit & offset")]
    IncompatiblePaging,

    #[error("slice step cannot be zero")]
    ZeroStep,

    #[error("no result found")]
    Empty,

    #[error("more than one result found")]
    Ambiguous,

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Reader(#[from] ReaderError),
}
