//! # Item Store
//!
//! Presents an arbitrarily large backing query as a positional list. Items
//! are fetched in fixed-size pages on demand, held in a page cache bounded by
//! `max_cache_size` pages, and overlaid with pending additions,
//! modifications and removals that have not been persisted yet.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         ItemStore<T, P, I>                           │
//!   │                                                                      │
//!   │   logical index ──► translate ──┬──► Slot::Added(ordinal)            │
//!   │                                 │        └─► Overlay.added           │
//!   │                                 │                                    │
//!   │                                 └──► Slot::Backing(index)            │
//!   │                                          │                           │
//!   │                          page = index / batch_size                   │
//!   │                                          ▼                           │
//!   │   ┌──────────────────────────┐   miss/stale   ┌──────────────────┐   │
//!   │   │ PageTable<T> (LRU pages) │ ─────────────► │ ItemDataProvider │   │
//!   │   └──────────────────────────┘    load()      └──────────────────┘   │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │ Overlay<T, Id>: Added | Modified (id → T) | Removed (id → T) │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Logical Layout
//!
//! ```text
//!   AddedItemPosition::First (default)
//!     [ added (newest first) | backing items without removed ones ]
//!
//!   AddedItemPosition::Last
//!     [ backing items without removed ones | added (oldest first) ]
//!
//!   size() = backing_count - |located removed| + |added|
//! ```
//!
//! ## Reset Semantics
//!
//! | Call                  | Count / ids  | Resident pages            | Overlay   |
//! |-----------------------|--------------|---------------------------|-----------|
//! | `reset(false, false)` | kept         | kept, marked stale        | kept      |
//! | `reset(true, false)`  | invalidated  | kept, marked stale        | kept      |
//! | `reset(_, true)`      | as above     | dropped                   | kept      |
//!
//! A stale page keeps its slot and recency position but is reloaded on its
//! next access.
//!
//! ## Failure Semantics
//!
//! Provider errors propagate unchanged. A failed load stores nothing and
//! leaves cache and overlay untouched; no retry is attempted.
//!
//! ## Thread Safety
//!
//! `ItemStore` is single-threaded. Wrap it (or the owning
//! [`DataSource`](crate::source::DataSource)) in a mutex when it must be
//! shared.

use std::fmt;
use std::ops::Range;

use log::{debug, trace, warn};

use crate::ds::{Page, PageTable};
use crate::error::{DataAccessError, InvariantError, Result, StoreError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::ItemStoreMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::ItemStoreMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    MetricsReset, MetricsSnapshotProvider, OverlayMetricsRecorder, PageCacheMetricsRecorder,
};
use crate::query::QueryConfig;
use crate::store::overlay::Overlay;
use crate::traits::{BulkIdLoader, IdentifierProvider, ItemDataProvider};

/// Default number of items per page.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default page budget.
pub const DEFAULT_MAX_CACHE_SIZE: i64 = 20;

/// Where pending additions appear in the logical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddedItemPosition {
    /// Each addition is prepended: the newest added item is at index 0.
    #[default]
    First,
    /// Additions follow the backing items in insertion order.
    Last,
}

/// Construction parameters of an [`ItemStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStoreConfig {
    /// Items per page; `<= 0` loads the whole set as one page.
    pub batch_size: i64,
    /// Resident page budget; `<= 0` is unbounded.
    pub max_cache_size: i64,
    pub added_position: AddedItemPosition,
}

impl Default for ItemStoreConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            added_position: AddedItemPosition::First,
        }
    }
}

/// Result of translating a logical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Ordinal into the Added collection.
    Added(usize),
    /// Raw index into the backing sequence.
    Backing(usize),
}

/// Paged, cached, mutation-tracking item store.
///
/// # Example
///
/// ```
/// use itemstore::provider::{InMemoryProvider, ValueIdentity};
/// use itemstore::store::{ItemStore, ItemStoreConfig};
///
/// let provider = InMemoryProvider::new(vec!["a", "b", "c", "d", "e"]);
/// let config = ItemStoreConfig { batch_size: 2, max_cache_size: 2, ..Default::default() };
/// let mut store = ItemStore::new(provider, ValueIdentity, config);
///
/// assert_eq!(store.size().unwrap(), 5);
/// assert_eq!(store.get_item(3).unwrap(), "d");
///
/// store.add_item("f");
/// assert_eq!(store.get_item(0).unwrap(), "f");
/// assert!(store.remove_item(4).unwrap()); // "d"
/// assert_eq!(store.get_item_ids().unwrap(), vec!["f", "a", "b", "c", "e"]);
/// ```
pub struct ItemStore<T, P, I>
where
    I: IdentifierProvider<T>,
{
    provider: P,
    identifiers: I,
    id_loader: Option<Box<dyn BulkIdLoader<I::Id> + Send>>,
    query: QueryConfig,
    config: ItemStoreConfig,
    pages: PageTable<T>,
    backing_count: Option<usize>,
    backing_ids: Option<Vec<I::Id>>,
    overlay: Overlay<T, I::Id>,
    #[cfg(feature = "metrics")]
    metrics: ItemStoreMetrics,
}

impl<T, P, I> ItemStore<T, P, I>
where
    T: Clone,
    P: ItemDataProvider<T>,
    I: IdentifierProvider<T>,
{
    /// Creates a store bound to `provider` with an unconstrained query.
    pub fn new(provider: P, identifiers: I, config: ItemStoreConfig) -> Self {
        Self {
            provider,
            identifiers,
            id_loader: None,
            query: QueryConfig::new(),
            config,
            pages: PageTable::new(),
            backing_count: None,
            backing_ids: None,
            overlay: Overlay::new(),
            #[cfg(feature = "metrics")]
            metrics: ItemStoreMetrics::default(),
        }
    }

    /// Installs a dedicated id query used by [`get_item_ids`](Self::get_item_ids).
    pub fn with_id_loader(self, loader: impl BulkIdLoader<I::Id> + Send + 'static) -> Self {
        self.with_boxed_id_loader(Box::new(loader))
    }

    pub(crate) fn with_boxed_id_loader(mut self, loader: Box<dyn BulkIdLoader<I::Id> + Send>) -> Self {
        self.id_loader = Some(loader);
        self
    }

    /// Binds the initial query without invalidating anything.
    pub fn with_query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    /// The backing item source.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The identity mapping used for every overlay lookup.
    pub fn identifiers(&self) -> &I {
        &self.identifiers
    }

    /// The query every count, load and id query is issued with.
    pub fn query(&self) -> &QueryConfig {
        &self.query
    }

    /// Items per page; non-positive means one page holds everything.
    pub fn batch_size(&self) -> i64 {
        self.config.batch_size
    }

    pub fn max_cache_size(&self) -> i64 {
        self.config.max_cache_size
    }

    pub fn added_position(&self) -> AddedItemPosition {
        self.config.added_position
    }

    /// Number of resident pages, stale ones included.
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    /// Resident page indices from most to least recently accessed.
    pub fn page_recency(&self) -> Vec<usize> {
        self.pages.recency_order()
    }

    // ---------------------------------------------------------------------
    // Positional access
    // ---------------------------------------------------------------------

    /// Total item count honoring the overlay.
    ///
    /// Issues a count query only when the backing count is not cached. After
    /// an id refresh, pending removals are counted at their provisional
    /// positions rather than by materializing the fresh ids.
    pub fn size(&mut self) -> Result<usize> {
        let backing = self.backing_count()?;
        let visible_backing = backing - self.overlay.removed_before(backing);
        Ok(visible_backing + self.overlay.added().len())
    }

    /// Item at logical `index`.
    ///
    /// Returns the pending content for modified items.
    pub fn get_item(&mut self, index: usize) -> Result<T> {
        let size = self.size()?;
        if index >= size {
            return Err(StoreError::OutOfBounds { index, size });
        }

        match self.resolve(index)? {
            Slot::Added(ordinal) => self
                .overlay
                .added()
                .get(ordinal)
                .cloned()
                .ok_or(StoreError::OutOfBounds { index, size }),
            Slot::Backing(backing) => {
                let item = self.backing_item(backing)?;
                if self.overlay.counts().1 == 0 {
                    return Ok(item);
                }
                let id = self.identifiers.identify(&item)?;
                Ok(self.overlay.modified_item(&id).cloned().unwrap_or(item))
            },
        }
    }

    /// Items at logical indices `range`, loading each missing page once.
    pub fn items(&mut self, range: Range<usize>) -> Result<Vec<T>> {
        let mut out = Vec::with_capacity(range.len());
        for index in range {
            out.push(self.get_item(index)?);
        }
        Ok(out)
    }

    /// The full ordered id sequence, Added included and Removed excluded.
    ///
    /// Uses the id loader when one is installed, otherwise pages through the
    /// backing set.
    pub fn get_item_ids(&mut self) -> Result<Vec<I::Id>> {
        self.ensure_backing_ids()?;

        let mut added_ids = Vec::with_capacity(self.overlay.added().len());
        for item in self.overlay.added() {
            added_ids.push(self.identifiers.identify(item)?);
        }

        let backing = self.backing_ids.as_deref().unwrap_or_default();
        let visible = backing
            .iter()
            .filter(|id| !self.overlay.is_removed(id))
            .cloned();

        let ids = match self.config.added_position {
            AddedItemPosition::First => added_ids.into_iter().rev().chain(visible).collect(),
            AddedItemPosition::Last => visible.chain(added_ids).collect(),
        };
        Ok(ids)
    }

    /// Whether `item` is visible: pending addition, cached, or confirmed by
    /// the provider, and not pending removal.
    pub fn contains_item(&mut self, item: &T) -> Result<bool> {
        let id = self.identifiers.identify(item)?;
        if self.added_ordinal(&id).is_some() {
            return Ok(true);
        }
        if self.overlay.is_removed(&id) {
            return Ok(false);
        }
        if self.cached_backing_item(&id).is_some() {
            return Ok(true);
        }
        if let Some(ids) = &self.backing_ids {
            return Ok(ids.contains(&id));
        }
        // pending content no longer equals the backing copy; only the id can confirm it
        if !self.overlay.is_modified(&id) {
            if let Some(exists) = self.provider.exists(&self.query, item)? {
                return Ok(exists);
            }
        }
        self.ensure_backing_ids()?;
        Ok(self
            .backing_ids
            .as_ref()
            .is_some_and(|ids| ids.contains(&id)))
    }

    /// Logical index of `item`, if visible.
    pub fn index_of(&mut self, item: &T) -> Result<Option<usize>> {
        let id = self.identifiers.identify(item)?;
        if let Some(ordinal) = self.added_ordinal(&id) {
            let added = self.overlay.added().len();
            let index = match self.config.added_position {
                AddedItemPosition::First => added - 1 - ordinal,
                AddedItemPosition::Last => self.size()? - added + ordinal,
            };
            return Ok(Some(index));
        }
        if self.overlay.is_removed(&id) {
            return Ok(None);
        }

        self.ensure_backing_ids()?;
        let backing = self
            .backing_ids
            .as_ref()
            .and_then(|ids| ids.iter().position(|candidate| *candidate == id));
        let Some(visible) = backing.and_then(|b| self.overlay.to_visible(b)) else {
            return Ok(None);
        };

        Ok(Some(match self.config.added_position {
            AddedItemPosition::First => visible + self.overlay.added().len(),
            AddedItemPosition::Last => visible,
        }))
    }

    /// Resolves an id to its current content.
    pub fn item_by_id(&mut self, id: &I::Id) -> Result<Option<T>> {
        if let Some(ordinal) = self.added_ordinal(id) {
            return Ok(self.overlay.added().get(ordinal).cloned());
        }
        if self.overlay.is_removed(id) {
            return Ok(None);
        }

        let found = match self.cached_backing_item(id) {
            Some(item) => Some(item),
            None => {
                self.ensure_backing_ids()?;
                let position = self
                    .backing_ids
                    .as_ref()
                    .and_then(|ids| ids.iter().position(|candidate| candidate == id));
                match position {
                    Some(backing) => Some(self.backing_item(backing)?),
                    None => None,
                }
            },
        };
        Ok(found.map(|item| self.overlay.modified_item(id).cloned().unwrap_or(item)))
    }

    // ---------------------------------------------------------------------
    // Overlay mutations
    // ---------------------------------------------------------------------

    /// Records `item` as pending addition without touching the provider.
    ///
    /// Returns the ordinal of the entry in [`get_added_items`](Self::get_added_items).
    pub fn add_item(&mut self, item: T) -> usize {
        #[cfg(feature = "metrics")]
        self.metrics.record_added();

        let ordinal = self.overlay.push_added(item);
        trace!("added item pending at ordinal {ordinal}");
        ordinal
    }

    /// Removes the item at logical `index`.
    ///
    /// A pending addition is simply dropped; a backing item moves into
    /// Removed, taking its pending modification with it.
    pub fn remove_item(&mut self, index: usize) -> Result<bool> {
        let size = self.size()?;
        if index >= size {
            return Err(StoreError::OutOfBounds { index, size });
        }

        match self.resolve(index)? {
            Slot::Added(ordinal) => {
                let removed = self.overlay.remove_added(ordinal).is_some();
                trace!("dropped pending addition at ordinal {ordinal}");
                Ok(removed)
            },
            Slot::Backing(backing) => {
                let item = self.backing_item(backing)?;
                let id = self.identifiers.identify(&item)?;
                let item = self.overlay.take_modified(&id).unwrap_or(item);
                let recorded = self.overlay.mark_removed(id, item, backing);

                #[cfg(feature = "metrics")]
                if recorded {
                    self.metrics.record_removed();
                }

                trace!("removed backing index {backing} (logical {index})");
                Ok(recorded)
            },
        }
    }

    /// Removes `item` by identity. Returns `false` if it is not visible.
    pub fn remove_item_by_value(&mut self, item: &T) -> Result<bool> {
        match self.index_of(item)? {
            Some(index) => self.remove_item(index),
            None => Ok(false),
        }
    }

    /// Records `item` as modified; repeat calls keep a single entry holding
    /// the latest content.
    ///
    /// A pending addition is updated in place and a pending removal keeps
    /// the new content; neither is recorded as a modification.
    pub fn set_item_modified(&mut self, item: T) -> Result<()> {
        let id = self.identifiers.identify(&item)?;

        if let Some(ordinal) = self.added_ordinal(&id) {
            self.overlay.replace_added(ordinal, item);
            return Ok(());
        }
        if self.overlay.is_removed(&id) {
            self.overlay.replace_removed(&id, item);
            return Ok(());
        }

        let first = self.overlay.mark_modified(id, item);

        #[cfg(feature = "metrics")]
        if first {
            self.metrics.record_modified();
        }

        trace!("marked item modified (new entry: {first})");
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Pending additions in insertion order.
    pub fn get_added_items(&self) -> Vec<T> {
        self.overlay.added_items()
    }

    /// Latest content of modified items in first-modification order.
    pub fn get_modified_items(&self) -> Vec<T> {
        self.overlay.modified_items()
    }

    /// Pending removals in removal order.
    pub fn get_removed_items(&self) -> Vec<T> {
        self.overlay.removed_items()
    }

    /// Drops every pending addition, modification and removal.
    pub fn clear_overlay(&mut self) {
        let (added, modified, removed) = self.overlay.counts();
        if added + modified + removed > 0 {
            debug!("clearing overlay: {added} added, {modified} modified, {removed} removed");
        }
        self.overlay.clear();
    }

    // ---------------------------------------------------------------------
    // Invalidation
    // ---------------------------------------------------------------------

    /// Forces the page holding `item` to be reloaded on next access.
    ///
    /// Overlay state is unaffected.
    pub fn refresh_item(&mut self, item: &T) -> Result<()> {
        let id = self.identifiers.identify(item)?;
        let page_index = self.pages.iter().find_map(|page| {
            page.items()
                .iter()
                .any(|candidate| {
                    self.identifiers
                        .identify(candidate)
                        .is_ok_and(|candidate_id| candidate_id == id)
                })
                .then(|| page.index())
        });

        if let Some(page_index) = page_index {
            self.pages.mark_stale(page_index);
            trace!("page {page_index} marked stale by item refresh");
        }
        Ok(())
    }

    /// Invalidates cached state.
    ///
    /// `refresh_ids` drops the cached count and id ordering. Resident pages
    /// are always marked stale; `refresh_cache` drops them outright. The
    /// overlay is never touched.
    pub fn reset(&mut self, refresh_ids: bool, refresh_cache: bool) {
        #[cfg(feature = "metrics")]
        self.metrics.record_reset();

        if refresh_ids {
            self.backing_count = None;
            self.backing_ids = None;
            self.overlay.invalidate_positions();
        }
        if refresh_cache {
            self.pages.clear();
        } else {
            self.pages.mark_all_stale();
        }
        debug!("store reset (refresh_ids: {refresh_ids}, refresh_cache: {refresh_cache})");
    }

    /// Rebinds the store to a new query, invalidating count, ids and pages.
    pub fn set_query(&mut self, query: QueryConfig) {
        self.query = query;
        self.reset(true, true);
    }

    /// Verifies cache bound, page table integrity and overlay consistency.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.pages.check_invariants()?;
        if self.config.max_cache_size > 0 && self.pages.len() as i64 > self.config.max_cache_size {
            return Err(InvariantError::new(format!(
                "{} resident pages exceed budget of {}",
                self.pages.len(),
                self.config.max_cache_size
            )));
        }
        self.overlay.check_invariants()?;
        if let (Some(count), Some(ids)) = (self.backing_count, &self.backing_ids) {
            if count != ids.len() {
                return Err(InvariantError::new(format!(
                    "cached count {count} disagrees with {} cached ids",
                    ids.len()
                )));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn backing_count(&mut self) -> Result<usize> {
        if let Some(count) = self.backing_count {
            return Ok(count);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_count_query();

        let count = self.provider.count(&self.query)?;
        trace!("count query returned {count}");
        self.backing_count = Some(count);
        Ok(count)
    }

    /// Items per page; the whole backing set when paging is disabled.
    fn page_span(&mut self) -> Result<usize> {
        if self.config.batch_size > 0 {
            return Ok(usize::try_from(self.config.batch_size).unwrap_or(usize::MAX));
        }
        Ok(self.backing_count()?.max(1))
    }

    /// Translates `index` and, while removed positions are provisional,
    /// checks the backing item behind it. A removed item surfacing there
    /// means it moved upstream, so the fresh ids are materialized and the
    /// index translated again.
    fn resolve(&mut self, index: usize) -> Result<Slot> {
        let slot = self.translate(index)?;
        let Slot::Backing(backing) = slot else {
            return Ok(slot);
        };
        if !self.overlay.positions_provisional() {
            return Ok(slot);
        }

        let item = self.backing_item(backing)?;
        let id = self.identifiers.identify(&item)?;
        if !self.overlay.is_removed(&id) {
            return Ok(slot);
        }

        debug!("removed item surfaced at backing index {backing}; relocating removals");
        self.ensure_backing_ids()?;
        let size = self.size()?;
        if index >= size {
            return Err(StoreError::OutOfBounds { index, size });
        }
        self.translate(index)
    }

    fn translate(&mut self, index: usize) -> Result<Slot> {
        let added = self.overlay.added().len();

        let slot = match self.config.added_position {
            AddedItemPosition::First if index < added => Slot::Added(added - 1 - index),
            AddedItemPosition::First => Slot::Backing(self.overlay.to_backing(index - added)),
            AddedItemPosition::Last => {
                let backing = self.backing_count()?;
                let visible_backing = backing - self.overlay.removed_before(backing);
                if index < visible_backing {
                    Slot::Backing(self.overlay.to_backing(index))
                } else {
                    Slot::Added(index - visible_backing)
                }
            },
        };

        trace!("logical index {index} -> {slot:?}");
        Ok(slot)
    }

    fn backing_item(&mut self, backing: usize) -> Result<T> {
        let span = self.page_span()?;
        let (page_index, offset) = (backing / span, backing % span);
        self.ensure_page(page_index, span)?;

        self.pages
            .peek(page_index)
            .and_then(|page| page.item(offset))
            .cloned()
            .ok_or_else(|| {
                DataAccessError::new(format!(
                    "page {page_index} has no item at offset {offset}; backing set shrank"
                ))
                .into()
            })
    }

    /// Makes `page_index` resident and fresh, loading it on a miss.
    fn ensure_page(&mut self, page_index: usize, span: usize) -> Result<()> {
        match self.pages.peek(page_index).map(Page::is_stale) {
            Some(false) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_page_hit();

                self.pages.touch(page_index);
                return Ok(());
            },
            Some(true) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_stale_reload();
            },
            None => {},
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_page_miss();

        let offset = page_index.saturating_mul(span);
        let items = match self.provider.load(&self.query, offset, span) {
            Ok(items) => items,
            Err(err) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_load_failure();
                return Err(err.into());
            },
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_page_load();

        debug!(
            "loaded page {page_index} (offset {offset}, limit {span}): {} items",
            items.len()
        );
        self.pages.insert(Page::new(page_index, items));
        self.evict_over_budget();
        Ok(())
    }

    fn evict_over_budget(&mut self) {
        if self.config.max_cache_size <= 0 {
            return;
        }
        let budget = usize::try_from(self.config.max_cache_size).unwrap_or(usize::MAX);
        while self.pages.len() > budget {
            let Some(evicted) = self.pages.pop_lru() else {
                break;
            };

            #[cfg(feature = "metrics")]
            self.metrics.record_eviction();

            debug!("evicted page {} ({} items)", evicted.index(), evicted.len());
        }
    }

    fn ensure_backing_ids(&mut self) -> Result<()> {
        if self.backing_ids.is_some() {
            return Ok(());
        }

        let ids = match &self.id_loader {
            Some(loader) => {
                let ids = loader.load_ids(&self.query)?;
                if self.backing_count.is_none() {
                    self.backing_count = Some(ids.len());
                }
                ids
            },
            None => self.scan_backing_ids()?,
        };

        debug!("materialized {} backing ids", ids.len());
        if self.overlay.positions_provisional() {
            let missing = self.overlay.relocate_removed(&ids);
            if !missing.is_empty() {
                warn!(
                    "{} removed items are no longer present in the backing set",
                    missing.len()
                );
            }
        }
        self.backing_ids = Some(ids);
        Ok(())
    }

    fn scan_backing_ids(&mut self) -> Result<Vec<I::Id>> {
        let count = self.backing_count()?;
        let span = self.page_span()?;
        let mut ids = Vec::with_capacity(count);

        let pages = count.div_ceil(span);
        for page_index in 0..pages {
            self.ensure_page(page_index, span)?;
            if let Some(page) = self.pages.peek(page_index) {
                for item in page.items() {
                    ids.push(self.identifiers.identify(item)?);
                }
            }
        }
        ids.truncate(count);
        Ok(ids)
    }

    fn added_ordinal(&self, id: &I::Id) -> Option<usize> {
        self.overlay.added().iter().position(|item| {
            self.identifiers
                .identify(item)
                .is_ok_and(|candidate| candidate == *id)
        })
    }

    /// Looks `id` up in fresh resident pages without touching recency.
    fn cached_backing_item(&self, id: &I::Id) -> Option<T> {
        self.pages
            .iter()
            .filter(|page| !page.is_stale())
            .flat_map(|page| page.items())
            .find(|item| {
                self.identifiers
                    .identify(item)
                    .is_ok_and(|candidate| candidate == *id)
            })
            .cloned()
    }
}

#[cfg(feature = "metrics")]
impl<T, P, I> ItemStore<T, P, I>
where
    I: IdentifierProvider<T>,
{
    pub fn metrics_snapshot(&self) -> ItemStoreMetricsSnapshot {
        ItemStoreMetricsSnapshot {
            count_queries: self.metrics.count_queries,
            page_loads: self.metrics.page_loads,
            load_failures: self.metrics.load_failures,
            page_hits: self.metrics.page_hits,
            page_misses: self.metrics.page_misses,
            stale_reloads: self.metrics.stale_reloads,
            evictions: self.metrics.evictions,
            resets: self.metrics.resets,
            added: self.metrics.added,
            modified: self.metrics.modified,
            removed: self.metrics.removed,
            resident_pages: self.pages.len(),
            max_cache_size: self.config.max_cache_size,
        }
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }
}

#[cfg(feature = "metrics")]
impl<T, P, I> MetricsSnapshotProvider<ItemStoreMetricsSnapshot> for ItemStore<T, P, I>
where
    I: IdentifierProvider<T>,
{
    fn snapshot(&self) -> ItemStoreMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<T, P, I> fmt::Debug for ItemStore<T, P, I>
where
    T: Clone,
    I: IdentifierProvider<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (added, modified, removed) = self.overlay.counts();
        f.debug_struct("ItemStore")
            .field("batch_size", &self.config.batch_size)
            .field("max_cache_size", &self.config.max_cache_size)
            .field("resident_pages", &self.pages.len())
            .field("backing_count", &self.backing_count)
            .field("added", &added)
            .field("modified", &modified)
            .field("removed", &removed)
            .finish_non_exhaustive()
    }
}
