//! The adapter contract between the planner and a graph store.

use crate::convert::Table;
use attrql_query::Query;

/// A store that can evaluate [`Query`] values.
///
/// `execute` is a blocking round trip; its output stays opaque to the reader
/// until it is turned into a table or a boolean. Errors are returned as-is
/// and surface unchanged from every reader operation.
pub trait Backend {
    type Output;

    fn execute(&self, query: &Query) -> anyhow::Result<Self::Output>;

    /// Rows of a `SELECT` result, in the order the store produced them.
    fn to_table(&self, output: Self::Output) -> anyhow::Result<Table>;

    /// The answer of an `ASK`; fails for any other result shape.
    fn ask(&self, output: Self::Output) -> anyhow::Result<bool>;
}

impl<B: Backend + ?Sized> Backend for &B {
    type Output = B::Output;

    fn execute(&self, query: &Query) -> anyhow::Result<Self::Output> {
        (**self).execute(query)
    }

    fn to_table(&self, output: Self::Output) -> anyhow::Result<Table> {
        (**self).to_table(output)
    }

    fn ask(&self, output: Self::Output) -> anyhow::Result<bool> {
        (**self).ask(output)
    }
}
