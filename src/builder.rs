//! Builders for [`ItemStore`] and [`DataSource`].
//!
//! ## Example
//!
//! ```rust
//! use itemstore::builder::ItemStoreBuilder;
//! use itemstore::provider::{InMemoryProvider, ValueIdentity};
//! use itemstore::store::AddedItemPosition;
//!
//! let mut store = ItemStoreBuilder::new(InMemoryProvider::new(vec![1, 2, 3]), ValueIdentity)
//!     .batch_size(2)
//!     .max_cache_size(8)
//!     .added_position(AddedItemPosition::Last)
//!     .build();
//!
//! store.add_item(4);
//! assert_eq!(store.get_item_ids().unwrap(), vec![1, 2, 3, 4]);
//! ```

use std::marker::PhantomData;

use crate::error::ConfigError;
use crate::query::{FilterValue, QueryConfig, QueryFilter, QuerySort};
use crate::source::DataSource;
use crate::source::data_source::{BoxedCommitHandler, QueryParts};
use crate::store::{AddedItemPosition, ItemStore, ItemStoreConfig};
use crate::traits::{BulkIdLoader, CommitHandler, IdentifierProvider, ItemDataProvider, QueryConfigProvider};

type BoxedIdLoader<Id> = Box<dyn BulkIdLoader<Id> + Send>;

fn validate_store_config(config: &ItemStoreConfig) -> Result<(), ConfigError> {
    if config.batch_size > 0 && usize::try_from(config.batch_size).is_err() {
        return Err(ConfigError::new(format!(
            "batch_size {} does not fit in the address space",
            config.batch_size
        )));
    }
    Ok(())
}

/// Builder for an [`ItemStore`].
pub struct ItemStoreBuilder<T, P, I>
where
    I: IdentifierProvider<T>,
{
    provider: P,
    identifiers: I,
    config: ItemStoreConfig,
    query: QueryConfig,
    id_loader: Option<BoxedIdLoader<I::Id>>,
    _item: PhantomData<fn() -> T>,
}

impl<T, P, I> ItemStoreBuilder<T, P, I>
where
    T: Clone,
    P: ItemDataProvider<T>,
    I: IdentifierProvider<T>,
{
    /// Starts from [`ItemStoreConfig::default`] and an unconstrained query.
    pub fn new(provider: P, identifiers: I) -> Self {
        Self {
            provider,
            identifiers,
            config: ItemStoreConfig::default(),
            query: QueryConfig::new(),
            id_loader: None,
            _item: PhantomData,
        }
    }

    /// Items per page; `<= 0` loads everything as one page.
    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Resident page budget; `<= 0` is unbounded.
    pub fn max_cache_size(mut self, max_cache_size: i64) -> Self {
        self.config.max_cache_size = max_cache_size;
        self
    }

    pub fn added_position(mut self, position: AddedItemPosition) -> Self {
        self.config.added_position = position;
        self
    }

    pub fn config(mut self, config: ItemStoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn query(mut self, query: QueryConfig) -> Self {
        self.query = query;
        self
    }

    pub fn id_loader(mut self, loader: impl BulkIdLoader<I::Id> + Send + 'static) -> Self {
        self.id_loader = Some(Box::new(loader));
        self
    }

    /// Builds the store.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. For a non-panicking
    /// alternative, use [`try_build`](Self::try_build).
    pub fn build(self) -> ItemStore<T, P, I> {
        match self.try_build() {
            Ok(store) => store,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the store, returning an error on invalid parameters instead
    /// of panicking.
    pub fn try_build(self) -> Result<ItemStore<T, P, I>, ConfigError> {
        validate_store_config(&self.config)?;
        let mut store =
            ItemStore::new(self.provider, self.identifiers, self.config).with_query(self.query);
        if let Some(loader) = self.id_loader {
            store = store.with_boxed_id_loader(loader);
        }
        Ok(store)
    }
}

/// Builder for a [`DataSource`].
///
/// ```
/// use itemstore::builder::DataSourceBuilder;
/// use itemstore::provider::{InMemoryProvider, ValueIdentity};
/// use itemstore::query::{QueryFilter, QuerySort};
///
/// let source = DataSourceBuilder::new(InMemoryProvider::new(vec!["x"]), ValueIdentity)
///     .fixed_filter(QueryFilter::eq("archived", false))
///     .default_sort(QuerySort::asc("name"))
///     .parameter("tenant", 42)
///     .build();
///
/// assert!(!source.is_buffered());
/// assert_eq!(source.query().sorts(), &[QuerySort::asc("name")]);
/// ```
pub struct DataSourceBuilder<T, P, I>
where
    I: IdentifierProvider<T>,
{
    store: ItemStoreBuilder<T, P, I>,
    buffered: bool,
    commit_handler: Option<BoxedCommitHandler<T>>,
    parts: QueryParts,
}

impl<T, P, I> DataSourceBuilder<T, P, I>
where
    T: Clone,
    P: ItemDataProvider<T>,
    I: IdentifierProvider<T>,
{
    /// Unbuffered, without a commit handler, default store parameters.
    pub fn new(provider: P, identifiers: I) -> Self {
        Self {
            store: ItemStoreBuilder::new(provider, identifiers),
            buffered: false,
            commit_handler: None,
            parts: QueryParts::default(),
        }
    }

    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.store = self.store.batch_size(batch_size);
        self
    }

    pub fn max_cache_size(mut self, max_cache_size: i64) -> Self {
        self.store = self.store.max_cache_size(max_cache_size);
        self
    }

    pub fn added_position(mut self, position: AddedItemPosition) -> Self {
        self.store = self.store.added_position(position);
        self
    }

    pub fn id_loader(mut self, loader: impl BulkIdLoader<I::Id> + Send + 'static) -> Self {
        self.store = self.store.id_loader(loader);
        self
    }

    pub fn buffered(mut self, buffered: bool) -> Self {
        self.buffered = buffered;
        self
    }

    pub fn commit_handler(mut self, handler: impl CommitHandler<T> + Send + 'static) -> Self {
        self.commit_handler = Some(Box::new(handler));
        self
    }

    /// ANDs `filter` into the fixed filter.
    pub fn fixed_filter(mut self, filter: QueryFilter) -> Self {
        self.parts.fixed_filter = QueryFilter::all(self.parts.fixed_filter.take().into_iter().chain(Some(filter)));
        self
    }

    /// Appends to the fixed sort.
    pub fn fixed_sort(mut self, sort: QuerySort) -> Self {
        self.parts.fixed_sort.push(sort);
        self
    }

    /// Appends to the default sort.
    pub fn default_sort(mut self, sort: QuerySort) -> Self {
        self.parts.default_sort.push(sort);
        self
    }

    pub fn query_provider(mut self, provider: impl QueryConfigProvider + Send + 'static) -> Self {
        self.parts.providers.push(Box::new(provider));
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.parts.parameters.insert(name.into(), value.into());
        self
    }

    /// Builds the data source.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. For a non-panicking
    /// alternative, use [`try_build`](Self::try_build).
    pub fn build(self) -> DataSource<T, P, I> {
        match self.try_build() {
            Ok(source) => source,
            Err(e) => panic!("{}", e),
        }
    }

    /// Builds the data source, returning an error on invalid parameters
    /// instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if buffered mode is requested without a
    /// commit handler, or if the store parameters are invalid.
    pub fn try_build(self) -> Result<DataSource<T, P, I>, ConfigError> {
        if self.buffered && self.commit_handler.is_none() {
            return Err(ConfigError::new("buffered mode requires a commit handler"));
        }
        let store = self.store.try_build()?;
        Ok(DataSource::from_parts(
            store,
            self.commit_handler,
            self.buffered,
            self.parts,
        ))
    }
}
