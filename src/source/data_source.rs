//! # Data Source
//!
//! Facade over an [`ItemStore`] that owns the query configuration, the
//! buffered/unbuffered mutation mode and the commit handler.
//!
//! ## Architecture
//!
//! ```text
//!   fixed filter ──┐
//!   provider filters ─┼── AND ──► filter ─┐
//!                                          │
//!   fixed sort ────┐                       ├──► QueryConfig ──► ItemStore::set_query
//!   provider sorts ┼── concat ─► sorts ───┤
//!   default sort ──┘ (only if empty)       │
//!                                          │
//!   parameters (name → value) ─────────────┘
//! ```
//!
//! ## Mutation Modes
//!
//! ```text
//!                 set_buffered(true)
//!   ┌────────────┐ ─────────────────► ┌──────────┐
//!   │ UNBUFFERED │                    │ BUFFERED │
//!   └────────────┘ ◄───────────────── └──────────┘
//!                 set_buffered(false)
//!                 (overlay discarded)
//!
//!   UNBUFFERED  add/update/remove ──► CommitHandler::commit (one item)
//!               overlay stays empty, store invalidated afterwards
//!
//!   BUFFERED    add/update/remove ──► ItemStore overlay
//!               commit()  ──► CommitHandler::commit (all three sets, once)
//!               discard() ──► overlay dropped, no handler call
//! ```
//!
//! ## Commit Ordering
//!
//! The overlay is cleared only after the handler returns `Ok`. A failed
//! commit leaves the overlay intact so the caller can retry or discard.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use log::{debug, warn};

use crate::error::{Result, StoreError};
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::ItemStoreMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::MetricsSnapshotProvider;
use crate::query::{FilterValue, QueryConfig, QueryFilter, QuerySort};
use crate::store::ItemStore;
use crate::traits::{CommitHandler, IdentifierProvider, ItemDataProvider, QueryConfigProvider};

pub(crate) type BoxedCommitHandler<T> = Box<dyn CommitHandler<T> + Send>;
pub(crate) type BoxedQueryProvider = Box<dyn QueryConfigProvider + Send>;

/// Query contributions collected by a [`DataSource`].
#[derive(Default)]
pub(crate) struct QueryParts {
    pub(crate) fixed_filter: Option<QueryFilter>,
    pub(crate) fixed_sort: Vec<QuerySort>,
    pub(crate) default_sort: Vec<QuerySort>,
    pub(crate) providers: Vec<BoxedQueryProvider>,
    pub(crate) parameters: BTreeMap<String, FilterValue>,
}

impl QueryParts {
    /// Combines every contribution into one query.
    pub(crate) fn assemble(&self) -> QueryConfig {
        let filters = self
            .fixed_filter
            .iter()
            .cloned()
            .chain(self.providers.iter().filter_map(|provider| provider.filter()));

        let mut sorts = self.fixed_sort.clone();
        sorts.extend(self.providers.iter().flat_map(|provider| provider.sorts()));
        if sorts.is_empty() {
            sorts = self.default_sort.clone();
        }

        let mut query = QueryConfig::new();
        if let Some(filter) = QueryFilter::all(filters) {
            query = query.with_filter(filter);
        }
        for sort in sorts {
            query = query.with_sort(sort);
        }
        for (name, value) in &self.parameters {
            query = query.with_parameter(name.clone(), value.clone());
        }
        query
    }
}

/// Buffered or immediate-commit facade over an [`ItemStore`].
///
/// Usually created through [`DataSourceBuilder`](crate::builder::DataSourceBuilder).
///
/// # Example
///
/// ```
/// use itemstore::builder::DataSourceBuilder;
/// use itemstore::provider::{InMemoryProvider, RecordingCommitHandler, ValueIdentity};
///
/// let handler = RecordingCommitHandler::new();
/// let mut source = DataSourceBuilder::new(InMemoryProvider::new(vec!["a", "b"]), ValueIdentity)
///     .buffered(true)
///     .commit_handler(handler.clone())
///     .build();
///
/// source.add("c").unwrap();
/// source.remove(&"a").unwrap();
/// assert_eq!(source.size().unwrap(), 2);
///
/// source.commit().unwrap();
/// let records = handler.records();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].added, vec!["c"]);
/// assert_eq!(records[0].removed, vec!["a"]);
/// assert!(!source.is_modified());
/// ```
pub struct DataSource<T, P, I>
where
    I: IdentifierProvider<T>,
{
    store: ItemStore<T, P, I>,
    commit_handler: Option<BoxedCommitHandler<T>>,
    buffered: bool,
    parts: QueryParts,
}

impl<T, P, I> DataSource<T, P, I>
where
    T: Clone,
    P: ItemDataProvider<T>,
    I: IdentifierProvider<T>,
{
    /// Wraps `store` in an unbuffered data source without a commit handler.
    ///
    /// The store's current query is kept until a query contribution is set.
    pub fn new(store: ItemStore<T, P, I>) -> Self {
        Self {
            store,
            commit_handler: None,
            buffered: false,
            parts: QueryParts::default(),
        }
    }

    pub(crate) fn from_parts(
        store: ItemStore<T, P, I>,
        commit_handler: Option<BoxedCommitHandler<T>>,
        buffered: bool,
        parts: QueryParts,
    ) -> Self {
        let mut source = Self {
            store,
            commit_handler,
            buffered,
            parts,
        };
        source.rebind_query();
        source
    }

    // ---------------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------------

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Switches the mutation mode.
    ///
    /// Entering buffered mode requires a commit handler. Leaving it discards
    /// any outstanding overlay and invalidates the store.
    pub fn set_buffered(&mut self, buffered: bool) -> Result<()> {
        if buffered == self.buffered {
            return Ok(());
        }
        if buffered && self.commit_handler.is_none() {
            return Err(StoreError::illegal_state(
                "buffered mode requires a commit handler",
            ));
        }

        if !buffered {
            self.store.clear_overlay();
            self.store.reset(true, true);
        }
        self.buffered = buffered;
        debug!("data source switched to {} mode", if buffered { "buffered" } else { "unbuffered" });
        Ok(())
    }

    pub fn set_commit_handler(&mut self, handler: impl CommitHandler<T> + Send + 'static) {
        self.commit_handler = Some(Box::new(handler));
    }

    pub fn has_commit_handler(&self) -> bool {
        self.commit_handler.is_some()
    }

    pub fn set_fixed_filter(&mut self, filter: Option<QueryFilter>) {
        self.parts.fixed_filter = filter;
        self.rebind_query();
    }

    pub fn set_fixed_sort(&mut self, sorts: Vec<QuerySort>) {
        self.parts.fixed_sort = sorts;
        self.rebind_query();
    }

    /// Sort applied only when neither the fixed sort nor any provider
    /// contributes one.
    pub fn set_default_sort(&mut self, sorts: Vec<QuerySort>) {
        self.parts.default_sort = sorts;
        self.rebind_query();
    }

    pub fn add_query_provider(&mut self, provider: impl QueryConfigProvider + Send + 'static) {
        self.parts.providers.push(Box::new(provider));
        self.rebind_query();
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) {
        self.parts.parameters.insert(name.into(), value.into());
        self.rebind_query();
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<FilterValue> {
        let removed = self.parts.parameters.remove(name);
        if removed.is_some() {
            self.rebind_query();
        }
        removed
    }

    /// The query currently bound to the store.
    pub fn query(&self) -> &QueryConfig {
        self.store.query()
    }

    pub fn store(&self) -> &ItemStore<T, P, I> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ItemStore<T, P, I> {
        &mut self.store
    }

    pub fn into_store(self) -> ItemStore<T, P, I> {
        self.store
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn size(&mut self) -> Result<usize> {
        self.store.size()
    }

    pub fn get_item(&mut self, index: usize) -> Result<T> {
        self.store.get_item(index)
    }

    pub fn items(&mut self, range: Range<usize>) -> Result<Vec<T>> {
        self.store.items(range)
    }

    pub fn get_item_ids(&mut self) -> Result<Vec<I::Id>> {
        self.store.get_item_ids()
    }

    pub fn contains_item(&mut self, item: &T) -> Result<bool> {
        self.store.contains_item(item)
    }

    pub fn index_of(&mut self, item: &T) -> Result<Option<usize>> {
        self.store.index_of(item)
    }

    pub fn is_modified(&self) -> bool {
        self.store.is_modified()
    }

    pub fn added_items(&self) -> Vec<T> {
        self.store.get_added_items()
    }

    pub fn modified_items(&self) -> Vec<T> {
        self.store.get_modified_items()
    }

    pub fn removed_items(&self) -> Vec<T> {
        self.store.get_removed_items()
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Adds `item`: recorded in the overlay when buffered, committed
    /// immediately otherwise.
    pub fn add(&mut self, item: T) -> Result<()> {
        if self.buffered {
            self.store.add_item(item);
            return Ok(());
        }
        self.commit_now(&[item], &[], &[])?;
        self.store.reset(true, false);
        Ok(())
    }

    /// Marks `item` as changed.
    pub fn update(&mut self, item: T) -> Result<()> {
        if self.buffered {
            return self.store.set_item_modified(item);
        }
        self.commit_now(&[], std::slice::from_ref(&item), &[])?;
        self.store.refresh_item(&item)
    }

    /// Removes `item` by identity. Returns whether a removal happened.
    ///
    /// In unbuffered mode the handler is called only for visible items.
    pub fn remove(&mut self, item: &T) -> Result<bool> {
        if self.buffered {
            return self.store.remove_item_by_value(item);
        }
        if !self.store.contains_item(item)? {
            return Ok(false);
        }
        self.commit_now(&[], &[], std::slice::from_ref(item))?;
        self.store.reset(true, false);
        Ok(true)
    }

    /// Removes the item at logical `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<bool> {
        if self.buffered {
            return self.store.remove_item(index);
        }
        let item = self.store.get_item(index)?;
        self.commit_now(&[], &[], &[item])?;
        self.store.reset(true, false);
        Ok(true)
    }

    /// Hands every pending change to the commit handler in one call.
    ///
    /// # Errors
    ///
    /// [`StoreError::IllegalState`] when not buffered;
    /// [`StoreError::Persistence`] when the handler fails, in which case the
    /// overlay is kept.
    pub fn commit(&mut self) -> Result<()> {
        if !self.buffered {
            return Err(StoreError::illegal_state("commit requires buffered mode"));
        }

        let added = self.store.get_added_items();
        let modified = self.store.get_modified_items();
        let removed = self.store.get_removed_items();
        let handler = self
            .commit_handler
            .as_mut()
            .ok_or_else(|| StoreError::illegal_state("no commit handler installed"))?;

        if let Err(err) = handler.commit(&added, &modified, &removed) {
            warn!(
                "commit of {} added, {} modified, {} removed failed: {err}; overlay kept",
                added.len(),
                modified.len(),
                removed.len()
            );
            return Err(err.into());
        }

        debug!(
            "committed {} added, {} modified, {} removed",
            added.len(),
            modified.len(),
            removed.len()
        );
        self.store.clear_overlay();
        self.store.reset(true, false);
        Ok(())
    }

    /// Drops every pending change without calling the handler.
    pub fn discard(&mut self) -> Result<()> {
        if !self.buffered {
            return Err(StoreError::illegal_state("discard requires buffered mode"));
        }
        debug!("discarding pending changes");
        self.store.clear_overlay();
        self.store.reset(true, true);
        Ok(())
    }

    /// Re-collects query contributions and invalidates the store.
    pub fn refresh(&mut self) {
        if !self.rebind_query() {
            self.store.reset(true, true);
        }
    }

    /// Forces `item` to be reloaded on next access.
    pub fn refresh_item(&mut self, item: &T) -> Result<()> {
        self.store.refresh_item(item)
    }

    /// Discards the overlay and forces a full reload on next access.
    pub fn clear(&mut self) {
        if self.buffered {
            self.store.clear_overlay();
        }
        self.store.reset(true, true);
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn commit_now(&mut self, added: &[T], modified: &[T], removed: &[T]) -> Result<()> {
        let handler = self
            .commit_handler
            .as_mut()
            .ok_or_else(|| StoreError::illegal_state("no commit handler installed"))?;
        handler.commit(added, modified, removed).map_err(|err| {
            warn!("immediate commit failed: {err}");
            StoreError::from(err)
        })
    }

    /// Rebuilds the query and rebinds the store if it changed.
    fn rebind_query(&mut self) -> bool {
        let query = self.parts.assemble();
        if query == *self.store.query() {
            return false;
        }
        debug!(
            "rebinding query: filter {}, {} sorts",
            query
                .filter()
                .map_or_else(|| "none".to_string(), ToString::to_string),
            query.sorts().len()
        );
        self.store.set_query(query);
        true
    }
}

#[cfg(feature = "metrics")]
impl<T, P, I> MetricsSnapshotProvider<ItemStoreMetricsSnapshot> for DataSource<T, P, I>
where
    I: IdentifierProvider<T>,
{
    fn snapshot(&self) -> ItemStoreMetricsSnapshot {
        self.store.metrics_snapshot()
    }
}

impl<T, P, I> fmt::Debug for DataSource<T, P, I>
where
    T: Clone,
    I: IdentifierProvider<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("buffered", &self.buffered)
            .field("has_commit_handler", &self.commit_handler.is_some())
            .field("query_providers", &self.parts.providers.len())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DataSourceBuilder;
    use crate::provider::{InMemoryProvider, RecordingCommitHandler, ValueIdentity};
    use crate::query::{CompareOp, SortDirection};

    type Source = DataSource<&'static str, InMemoryProvider<&'static str>, ValueIdentity>;

    fn buffered(items: Vec<&'static str>) -> (Source, RecordingCommitHandler<&'static str>) {
        let handler = RecordingCommitHandler::new();
        let source = DataSourceBuilder::new(InMemoryProvider::new(items), ValueIdentity)
            .batch_size(2)
            .max_cache_size(4)
            .buffered(true)
            .commit_handler(handler.clone())
            .build();
        (source, handler)
    }

    fn unbuffered(items: Vec<&'static str>) -> (Source, RecordingCommitHandler<&'static str>) {
        let handler = RecordingCommitHandler::new();
        let source = DataSourceBuilder::new(InMemoryProvider::new(items), ValueIdentity)
            .batch_size(2)
            .commit_handler(handler.clone())
            .build();
        (source, handler)
    }

    struct StaticContribution {
        filter: Option<QueryFilter>,
        sorts: Vec<QuerySort>,
    }

    impl QueryConfigProvider for StaticContribution {
        fn filter(&self) -> Option<QueryFilter> {
            self.filter.clone()
        }

        fn sorts(&self) -> Vec<QuerySort> {
            self.sorts.clone()
        }
    }

    mod buffered_mode {
        use super::*;

        #[test]
        fn commit_hands_over_all_sets_once() {
            let (mut source, handler) = buffered(vec!["a", "b", "c"]);
            source.add("d").unwrap();
            source.update("b").unwrap();
            assert!(source.remove_at(3).unwrap()); // "c"
            assert!(source.is_modified());
            assert!(handler.is_empty());

            source.commit().unwrap();
            let records = handler.records();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].added, vec!["d"]);
            assert_eq!(records[0].modified, vec!["b"]);
            assert_eq!(records[0].removed, vec!["c"]);
            assert!(!source.is_modified());
        }

        #[test]
        fn empty_commit_still_invokes_handler() {
            let (mut source, handler) = buffered(vec!["a"]);
            source.commit().unwrap();
            assert_eq!(handler.len(), 1);
            assert!(handler.records()[0].is_empty());
        }

        #[test]
        fn commit_invalidates_ids_but_keeps_pages_resident() {
            let (mut source, _handler) = buffered(vec!["a", "b", "c"]);
            source.get_item(0).unwrap();
            source.add("z").unwrap();
            source.commit().unwrap();

            assert_eq!(source.store().resident_pages(), 1);
            source.size().unwrap();
            assert_eq!(source.store().provider().count_calls(), 2);
        }

        #[test]
        fn failed_commit_keeps_overlay() {
            let (mut source, handler) = buffered(vec!["a", "b"]);
            source.add("c").unwrap();
            handler.reject_commits(true);

            let err = source.commit().unwrap_err();
            assert!(matches!(err, StoreError::Persistence(_)));
            assert_eq!(source.added_items(), vec!["c"]);

            handler.reject_commits(false);
            source.commit().unwrap();
            assert!(!source.is_modified());
            assert_eq!(handler.len(), 1);
        }

        #[test]
        fn discard_drops_overlay_without_handler() {
            let (mut source, handler) = buffered(vec!["a", "b"]);
            source.add("c").unwrap();
            source.remove(&"a").unwrap();
            source.discard().unwrap();

            assert!(handler.is_empty());
            assert!(!source.is_modified());
            assert_eq!(source.get_item_ids().unwrap(), vec!["a", "b"]);
            assert_eq!(source.store().provider().count_calls(), 2);
        }

        #[test]
        fn leaving_buffered_mode_discards_overlay() {
            let (mut source, handler) = buffered(vec!["a", "b"]);
            source.add("c").unwrap();
            source.set_buffered(false).unwrap();
            assert!(!source.is_buffered());
            assert!(!source.is_modified());
            assert!(handler.is_empty());
        }

        #[test]
        fn clear_discards_and_drops_pages() {
            let (mut source, _handler) = buffered(vec!["a", "b"]);
            source.get_item(0).unwrap();
            source.update("a").unwrap();
            source.clear();
            assert!(!source.is_modified());
            assert_eq!(source.store().resident_pages(), 0);
        }
    }

    mod unbuffered_mode {
        use super::*;

        #[test]
        fn mutations_commit_immediately() {
            let (mut source, handler) = unbuffered(vec!["a", "b"]);
            source.add("c").unwrap();
            source.update("a").unwrap();
            assert!(source.remove(&"b").unwrap());
            assert!(!source.remove(&"zz").unwrap());

            let records = handler.records();
            assert_eq!(records.len(), 3);
            assert_eq!(records[0].added, vec!["c"]);
            assert_eq!(records[1].modified, vec!["a"]);
            assert_eq!(records[2].removed, vec!["b"]);
            assert!(!source.is_modified());
        }

        #[test]
        fn commit_and_discard_are_illegal() {
            let (mut source, _handler) = unbuffered(vec!["a"]);
            assert!(matches!(source.commit(), Err(StoreError::IllegalState(_))));
            assert!(matches!(source.discard(), Err(StoreError::IllegalState(_))));
        }

        #[test]
        fn remove_at_commits_resolved_item() {
            let (mut source, handler) = unbuffered(vec!["a", "b", "c"]);
            assert!(source.remove_at(1).unwrap());
            assert_eq!(handler.records()[0].removed, vec!["b"]);
            assert!(source.remove_at(9).unwrap_err().is_out_of_bounds());
        }

        #[test]
        fn handler_failure_surfaces() {
            let (mut source, handler) = unbuffered(vec!["a"]);
            handler.reject_commits(true);
            assert!(matches!(source.add("b"), Err(StoreError::Persistence(_))));
        }

        #[test]
        fn missing_handler_is_illegal_state() {
            let store = ItemStore::new(
                InMemoryProvider::new(vec!["a"]),
                ValueIdentity,
                Default::default(),
            );
            let mut source = DataSource::new(store);
            assert!(matches!(source.add("b"), Err(StoreError::IllegalState(_))));
            assert!(matches!(source.set_buffered(true), Err(StoreError::IllegalState(_))));

            source.set_commit_handler(RecordingCommitHandler::new());
            source.set_buffered(true).unwrap();
            source.add("b").unwrap();
            assert_eq!(source.added_items(), vec!["b"]);
        }
    }

    mod query_aggregation {
        use super::*;

        #[test]
        fn filters_are_anded_and_sorts_concatenated() {
            let (mut source, _handler) = buffered(vec!["a"]);
            source.set_fixed_filter(Some(QueryFilter::eq("kind", "doc")));
            source.set_fixed_sort(vec![QuerySort::asc("name")]);
            source.add_query_provider(StaticContribution {
                filter: Some(QueryFilter::compare("size", CompareOp::Gt, 10)),
                sorts: vec![QuerySort::desc("size")],
            });

            let query = source.query();
            assert_eq!(
                query.filter().map(ToString::to_string).as_deref(),
                Some("(kind = 'doc' and size > 10)")
            );
            let directions: Vec<_> = query.sorts().iter().map(|s| s.direction).collect();
            assert_eq!(directions, vec![SortDirection::Ascending, SortDirection::Descending]);
        }

        #[test]
        fn default_sort_only_when_nothing_else_sorts() {
            let (mut source, _handler) = buffered(vec!["a"]);
            source.set_default_sort(vec![QuerySort::asc("id")]);
            assert_eq!(source.query().sorts(), &[QuerySort::asc("id")]);

            source.set_fixed_sort(vec![QuerySort::desc("name")]);
            assert_eq!(source.query().sorts(), &[QuerySort::desc("name")]);
        }

        #[test]
        fn parameter_change_rebinds_store() {
            let (mut source, _handler) = buffered(vec!["a", "b"]);
            source.get_item(0).unwrap();
            source.set_parameter("owner", "ada");
            assert_eq!(source.store().resident_pages(), 0);
            assert_eq!(source.query().parameter("owner"), Some(&FilterValue::from("ada")));

            assert_eq!(source.remove_parameter("owner"), Some(FilterValue::from("ada")));
            assert_eq!(source.remove_parameter("owner"), None);
            assert!(source.query().is_unconstrained());
        }

        #[test]
        fn refresh_without_query_change_still_invalidates() {
            let (mut source, _handler) = buffered(vec!["a", "b"]);
            source.get_item(0).unwrap();
            source.add("c").unwrap();
            source.refresh();
            assert_eq!(source.store().resident_pages(), 0);
            assert_eq!(source.added_items(), vec!["c"]);
            source.size().unwrap();
            assert_eq!(source.store().provider().count_calls(), 2);
        }
    }
}
