//! Lazy result collections over an attrql [`Store`].
//!
//! A [`ResultCollection`] is a value: every chaining call returns a new
//! collection with one more constraint layered onto a copy of the parameter
//! bag, and nothing touches the store until the collection is iterated,
//! measured or indexed. That first consumption runs the planner once and
//! caches its rows for the lifetime of that collection only.
//!
//! ```ignore
//! let people = ResultCollection::new(store, resolver)
//!     .get_by([("rdf_type", ConstraintValue::resource(&person))])?
//!     .order_by("foaf_name", false)?
//!     .slice(10..20)?
//!     .into_vec()?;
//! ```

pub mod error;
pub mod window;

#[cfg(test)]
mod tests;

pub use error::{CollectionError, CollectionResult};

use attrql_query::{
    resolve_path, AttributeResolver, Connection, ConstraintNode, ConstraintTree, ConstraintValue,
    Term,
};
use attrql_reader::{FilterClause, OrderBy, Paging, QueryParams, ResultRow, Store};
use std::cell::OnceCell;
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

/// Builds the caller's object for one row.
pub type InstanceMaker<T> = Arc<dyn Fn(&QueryParams, &ResultRow) -> T>;

pub struct ResultCollection<T> {
    params: QueryParams,
    store: Arc<dyn Store>,
    resolver: Arc<dyn AttributeResolver>,
    maker: InstanceMaker<T>,
    rows: OnceCell<Vec<ResultRow>>,
}

/// A slice of a collection: still lazy, or already materialized.
pub enum Slice<T> {
    Pending(ResultCollection<T>),
    Ready(Vec<T>),
}

impl<T> Slice<T> {
    pub fn into_vec(self) -> CollectionResult<Vec<T>> {
        match self {
            Slice::Pending(collection) => collection.to_vec(),
            Slice::Ready(items) => Ok(items),
        }
    }

    /// Slice again; a ready slice is cut in memory.
    pub fn slice(self, range: impl RangeBounds<usize>) -> CollectionResult<Slice<T>> {
        match self {
            Slice::Pending(collection) => collection.slice(range),
            Slice::Ready(mut items) => {
                let (start, stop) = window::bounds(&range);
                let range = window::clamp(items.len(), start, stop);
                Ok(Slice::Ready(items.drain(range).collect()))
            }
        }
    }
}

impl ResultCollection<ResultRow> {
    /// A collection yielding the raw `(subject, instance data)` rows.
    pub fn new(store: Arc<dyn Store>, resolver: Arc<dyn AttributeResolver>) -> Self {
        Self::with_maker(store, resolver, Arc::new(|_: &QueryParams, row: &ResultRow| row.clone()))
    }
}

impl<T> ResultCollection<T> {
    pub fn with_maker(
        store: Arc<dyn Store>,
        resolver: Arc<dyn AttributeResolver>,
        maker: InstanceMaker<T>,
    ) -> Self {
        Self {
            params: QueryParams::default(),
            store,
            resolver,
            maker,
            rows: OnceCell::new(),
        }
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn is_executed(&self) -> bool {
        self.rows.get().is_some()
    }

    fn derive(&self, change: impl FnOnce(&mut QueryParams)) -> Self {
        let mut params = self.params.clone();
        change(&mut params);
        Self {
            params,
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            maker: Arc::clone(&self.maker),
            rows: OnceCell::new(),
        }
    }

    // ========================================================================
    // Chaining
    // ========================================================================

    pub fn with_params(&self, params: QueryParams) -> Self {
        self.derive(|p| *p = params)
    }

    pub fn limit(&self, limit: usize) -> CollectionResult<Self> {
        let offset = self.limit_offset()?.1;
        Ok(self.derive(|p| {
            p.paging = Paging::LimitOffset {
                limit: Some(limit),
                offset,
            }
        }))
    }

    pub fn offset(&self, offset: usize) -> CollectionResult<Self> {
        let limit = self.limit_offset()?.0;
        Ok(self.derive(|p| {
            p.paging = Paging::LimitOffset {
                limit,
                offset: Some(offset),
            }
        }))
    }

    fn limit_offset(&self) -> CollectionResult<(Option<usize>, Option<usize>)> {
        match self.params.paging {
            Paging::Window { .. } => Err(CollectionError::IncompatiblePaging),
            Paging::LimitOffset { limit, offset } => Ok((limit, offset)),
            Paging::Unbounded => Ok((None, None)),
        }
    }

    /// Load every attribute of each subject up front.
    pub fn eager(&self, only_direct: bool) -> Self {
        self.derive(|p| {
            p.full = true;
            p.only_direct = only_direct;
        })
    }

    pub fn order_by_subject(&self, desc: bool) -> Self {
        self.derive(|p| {
            p.order = Some(OrderBy::Subject);
            p.desc = desc;
        })
    }

    /// Order by the value reached through the `__`-separated attribute path.
    pub fn order_by(&self, name: &str, desc: bool) -> CollectionResult<Self> {
        let path = resolve_path(&*self.resolver, name)?;
        Ok(self.derive(|p| {
            p.order = Some(OrderBy::Path(path));
            p.desc = desc;
        }))
    }

    pub fn desc(&self) -> Self {
        self.derive(|p| p.desc = true)
    }

    /// AND `name = value` constraints onto the existing ones.
    pub fn get_by<I, N, V>(&self, pairs: I) -> CollectionResult<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<ConstraintValue>,
    {
        let tree = ConstraintTree::from_pairs(&*self.resolver, pairs)?;
        Ok(self.get_by_tree(tree))
    }

    /// AND a prebuilt tree (possibly containing OR branches) onto the
    /// existing constraints.
    pub fn get_by_tree(&self, tree: ConstraintTree) -> Self {
        self.derive(|p| {
            if tree.is_empty() {
                return;
            }
            if p.get_by.is_empty() {
                p.get_by = tree;
                return;
            }
            match tree.connection() {
                Some(Connection::Or) => p.get_by.add(ConstraintNode::Composite(tree), Connection::And),
                _ => p.get_by.extend(tree.children().iter().cloned()),
            }
        })
    }

    /// Native filters: `name` is a direct attribute, the template uses `%s`
    /// for its value and `%%` for a literal percent sign.
    pub fn filter<I, N, S>(&self, pairs: I) -> CollectionResult<Self>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: Into<String>,
    {
        let clauses = pairs
            .into_iter()
            .map(|(name, template)| FilterClause::resolve(&*self.resolver, name.as_ref(), template))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.derive(|p| p.filters.extend(clauses)))
    }

    /// Restrict loading to one graph.
    pub fn context(&self, context: impl Into<Term>) -> Self {
        let context = context.into();
        self.derive(|p| p.contexts = vec![context])
    }

    pub fn with_instance_maker<U, F>(&self, maker: F) -> ResultCollection<U>
    where
        F: Fn(&QueryParams, &ResultRow) -> U + 'static,
    {
        ResultCollection {
            params: self.params.clone(),
            store: Arc::clone(&self.store),
            resolver: Arc::clone(&self.resolver),
            maker: Arc::new(maker),
            rows: OnceCell::new(),
        }
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    fn rows(&self) -> CollectionResult<&[ResultRow]> {
        if let Some(rows) = self.rows.get() {
            tracing::trace!(rows = rows.len(), "serving collection from cache");
            return Ok(rows.as_slice());
        }
        tracing::trace!(params = ?self.params, "executing collection");
        let rows = self.store.get_by(&self.params)?;
        Ok(self.rows.get_or_init(|| rows).as_slice())
    }

    fn make(&self, row: &ResultRow) -> T {
        (self.maker)(&self.params, row)
    }

    pub fn iter(&self) -> CollectionResult<impl Iterator<Item = T> + '_> {
        Ok(self.rows()?.iter().map(|row| self.make(row)))
    }

    pub fn to_vec(&self) -> CollectionResult<Vec<T>> {
        Ok(self.iter()?.collect())
    }

    pub fn len(&self) -> CollectionResult<usize> {
        Ok(self.rows()?.len())
    }

    pub fn is_empty(&self) -> CollectionResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Item at `index`; `None` past the end.
    ///
    /// On an unexecuted collection this fetches a one-item window instead of
    /// the whole list. Either way the instance maker sees this collection's
    /// parameters, as it does when iterating.
    pub fn get(&self, index: usize) -> CollectionResult<Option<T>> {
        if let Some(rows) = self.rows.get() {
            return Ok(rows.get(index).map(|row| self.make(row)));
        }
        let stop = index.saturating_add(1);
        let narrowed = self.narrowed(Some(index), Some(stop))?;
        let item = narrowed.rows()?.first().map(|row| self.make(row));
        Ok(item)
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> CollectionResult<Slice<T>> {
        let (start, stop) = window::bounds(&range);
        if let Some(rows) = self.rows.get() {
            let range = window::clamp(rows.len(), start, stop);
            return Ok(Slice::Ready(rows[range].iter().map(|row| self.make(row)).collect()));
        }
        Ok(Slice::Pending(self.narrowed(start, stop)?))
    }

    /// Every `step`-th item of the slice; always materializes.
    pub fn slice_step(&self, range: impl RangeBounds<usize>, step: usize) -> CollectionResult<Vec<T>> {
        if step == 0 {
            return Err(CollectionError::ZeroStep);
        }
        let items = self.slice(range)?.into_vec()?;
        Ok(items.into_iter().step_by(step).collect())
    }

    fn narrowed(&self, start: Option<usize>, stop: Option<usize>) -> CollectionResult<Self> {
        let paging = window::narrow(self.params.paging, start, stop)?;
        Ok(self.derive(|p| p.paging = paging))
    }

    pub fn first(&self) -> CollectionResult<Option<T>> {
        Ok(self.iter()?.next())
    }

    /// The only item; fails when there are none or several.
    pub fn one(&self) -> CollectionResult<T> {
        let mut items = self.iter()?;
        let item = items.next().ok_or(CollectionError::Empty)?;
        if items.next().is_some() {
            return Err(CollectionError::Ambiguous);
        }
        Ok(item)
    }
}

impl<T> Clone for ResultCollection<T> {
    /// The copy starts unexecuted.
    fn clone(&self) -> Self {
        self.derive(|_| {})
    }
}

impl<T> fmt::Debug for ResultCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCollection")
            .field("params", &self.params)
            .field("executed", &self.is_executed())
            .finish_non_exhaustive()
    }
}
