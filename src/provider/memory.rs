//! Vec-backed [`ItemDataProvider`].
//!
//! Answers count, load and existence queries from an in-memory vector. An
//! optional predicate stands in for the query filter and an optional
//! comparator for its sort order; both receive the active [`QueryConfig`].
//!
//! Every call is counted so callers can observe how much traffic the store
//! generates, and loads or counts can be made to fail on demand.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;

use crate::error::DataAccessError;
use crate::query::QueryConfig;
use crate::traits::ItemDataProvider;

type Predicate<T> = Box<dyn Fn(&T, &QueryConfig) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T, &QueryConfig) -> Ordering + Send + Sync>;

/// In-memory item source.
///
/// # Example
///
/// ```
/// use itemstore::provider::InMemoryProvider;
/// use itemstore::query::{FilterValue, QueryConfig};
/// use itemstore::traits::ItemDataProvider;
///
/// let provider = InMemoryProvider::new((1..=10).collect::<Vec<i64>>())
///     .with_predicate(|item, query| match query.parameter("min") {
///         Some(FilterValue::Int(min)) => item >= min,
///         _ => true,
///     });
///
/// let query = QueryConfig::new().with_parameter("min", 8i64);
/// assert_eq!(provider.count(&query).unwrap(), 3);
/// assert_eq!(provider.load(&query, 1, 5).unwrap(), vec![9, 10]);
/// assert_eq!(provider.count_calls(), 1);
/// ```
pub struct InMemoryProvider<T> {
    items: RefCell<Vec<T>>,
    predicate: Option<Predicate<T>>,
    comparator: Option<Comparator<T>>,
    count_calls: Cell<usize>,
    load_calls: Cell<usize>,
    exists_calls: Cell<usize>,
    fail_counts: Cell<bool>,
    fail_loads: Cell<bool>,
}

impl<T> InMemoryProvider<T>
where
    T: Clone + PartialEq,
{
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            predicate: None,
            comparator: None,
            count_calls: Cell::new(0),
            load_calls: Cell::new(0),
            exists_calls: Cell::new(0),
            fail_counts: Cell::new(false),
            fail_loads: Cell::new(false),
        }
    }

    /// Keeps only items for which `predicate` holds under the active query.
    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&T, &QueryConfig) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Orders matching items with `comparator` under the active query.
    pub fn with_comparator(
        mut self,
        comparator: impl Fn(&T, &T, &QueryConfig) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    /// Replaces the backing items, as an external writer would.
    pub fn replace_items(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
    }

    /// Applies `f` to the backing items in place.
    pub fn update_items(&self, f: impl FnOnce(&mut Vec<T>)) {
        f(&mut self.items.borrow_mut());
    }

    /// Snapshot of the raw backing items, ignoring predicate and order.
    pub fn items(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.get()
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.get()
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.get()
    }

    pub fn reset_stats(&self) {
        self.count_calls.set(0);
        self.load_calls.set(0);
        self.exists_calls.set(0);
    }

    /// Makes subsequent count queries fail until switched off.
    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.set(fail);
    }

    /// Makes subsequent loads fail until switched off.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.set(fail);
    }

    fn matching(&self, query: &QueryConfig) -> Vec<T> {
        let items = self.items.borrow();
        let mut matching: Vec<T> = match &self.predicate {
            Some(predicate) => items
                .iter()
                .filter(|item| predicate(*item, query))
                .cloned()
                .collect(),
            None => items.clone(),
        };
        if let Some(comparator) = &self.comparator {
            matching.sort_by(|a, b| comparator(a, b, query));
        }
        matching
    }
}

impl<T> ItemDataProvider<T> for InMemoryProvider<T>
where
    T: Clone + PartialEq,
{
    fn count(&self, query: &QueryConfig) -> Result<usize, DataAccessError> {
        self.count_calls.set(self.count_calls.get() + 1);
        if self.fail_counts.get() {
            return Err(DataAccessError::new("count query rejected"));
        }
        Ok(match &self.predicate {
            Some(predicate) => self
                .items
                .borrow()
                .iter()
                .filter(|item| predicate(*item, query))
                .count(),
            None => self.items.borrow().len(),
        })
    }

    fn load(&self, query: &QueryConfig, offset: usize, limit: usize) -> Result<Vec<T>, DataAccessError> {
        self.load_calls.set(self.load_calls.get() + 1);
        if self.fail_loads.get() {
            return Err(DataAccessError::new(format!(
                "load of window {offset}+{limit} rejected"
            )));
        }
        Ok(self
            .matching(query)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    fn exists(&self, query: &QueryConfig, item: &T) -> Result<Option<bool>, DataAccessError> {
        self.exists_calls.set(self.exists_calls.get() + 1);
        let found = self.items.borrow().iter().any(|candidate| {
            candidate == item && self.predicate.as_ref().is_none_or(|predicate| predicate(candidate, query))
        });
        Ok(Some(found))
    }
}

impl<T> fmt::Debug for InMemoryProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryProvider")
            .field("items", &self.items.borrow().len())
            .field("filtered", &self.predicate.is_some())
            .field("sorted", &self.comparator.is_some())
            .field("count_calls", &self.count_calls.get())
            .field("load_calls", &self.load_calls.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{FilterValue, QuerySort, SortDirection};

    fn descending_when_asked(a: &i64, b: &i64, query: &QueryConfig) -> Ordering {
        match query.sorts().first().map(|sort| sort.direction) {
            Some(SortDirection::Descending) => b.cmp(a),
            _ => a.cmp(b),
        }
    }

    #[test]
    fn load_returns_window_and_short_tail() {
        let provider = InMemoryProvider::new(vec![1, 2, 3, 4, 5]);
        let query = QueryConfig::new();
        assert_eq!(provider.load(&query, 0, 2).unwrap(), vec![1, 2]);
        assert_eq!(provider.load(&query, 4, 2).unwrap(), vec![5]);
        assert!(provider.load(&query, 9, 2).unwrap().is_empty());
        assert_eq!(provider.load_calls(), 3);
    }

    #[test]
    fn comparator_sees_query_sorts() {
        let provider = InMemoryProvider::new(vec![3i64, 1, 2]).with_comparator(descending_when_asked);
        let asc = QueryConfig::new();
        let desc = QueryConfig::new().with_sort(QuerySort::desc("value"));
        assert_eq!(provider.load(&asc, 0, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(provider.load(&desc, 0, 3).unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn exists_honors_predicate() {
        let provider = InMemoryProvider::new(vec![1i64, 2, 3]).with_predicate(|item, query| {
            !matches!(query.parameter("odd"), Some(FilterValue::Bool(true))) || item % 2 == 1
        });
        let odd = QueryConfig::new().with_parameter("odd", true);
        assert_eq!(provider.exists(&odd, &2).unwrap(), Some(false));
        assert_eq!(provider.exists(&QueryConfig::new(), &2).unwrap(), Some(true));
        assert_eq!(provider.count(&odd).unwrap(), 2);
    }

    #[test]
    fn failures_are_switchable() {
        let provider = InMemoryProvider::new(vec![1]);
        provider.fail_loads(true);
        assert!(provider.load(&QueryConfig::new(), 0, 1).is_err());
        provider.fail_loads(false);
        provider.fail_counts(true);
        assert!(provider.count(&QueryConfig::new()).is_err());
        assert_eq!(provider.count_calls(), 1);

        provider.reset_stats();
        assert_eq!(provider.load_calls(), 0);
    }
}
