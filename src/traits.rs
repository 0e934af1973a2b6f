//! # Collaborator Contracts
//!
//! The item store and its facade are wired to the outside world through a
//! small set of strategy traits. Callers supply the behavior; the store never
//! inspects items beyond what these traits expose.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────┐   count / load    ┌──────────────────────────┐
//!   │      ItemStore       │ ────────────────► │  ItemDataProvider<T>     │
//!   │                      │                   │  count(&QueryConfig)     │
//!   │  pages + overlay     │                   │  load(&QueryConfig, o,l) │
//!   │                      │                   │  exists(&QueryConfig,&T) │
//!   │                      │   identify        └──────────────────────────┘
//!   │                      │ ────────────────► ┌──────────────────────────┐
//!   │                      │                   │  IdentifierProvider<T>   │
//!   │                      │   load_ids        │  identify(&T) → Id       │
//!   │                      │ ───────────────►  └──────────────────────────┘
//!   └──────────▲───────────┘  (optional)       ┌──────────────────────────┐
//!              │                               │  BulkIdLoader<Id>        │
//!              │                               └──────────────────────────┘
//!   ┌──────────┴───────────┐   commit          ┌──────────────────────────┐
//!   │      DataSource      │ ────────────────► │  CommitHandler<T>        │
//!   │                      │                   └──────────────────────────┘
//!   │                      │   filter / sort   ┌──────────────────────────┐
//!   │                      │ ◄──────────────── │  QueryConfigProvider     │
//!   └──────────────────────┘                   └──────────────────────────┘
//! ```
//!
//! ## Trait Summary
//!
//! | Trait                 | Called by    | Purpose                                 |
//! |-----------------------|--------------|-----------------------------------------|
//! | `ItemDataProvider`    | `ItemStore`  | Backing count and paged loads           |
//! | `IdentifierProvider`  | `ItemStore`  | Stable identity for overlay bookkeeping |
//! | `BulkIdLoader`        | `ItemStore`  | Optional dedicated id-only query        |
//! | `CommitHandler`       | `DataSource` | Persists added/modified/removed sets    |
//! | `QueryConfigProvider` | `DataSource` | Pluggable filter and sort contributions |
//!
//! All calls are synchronous and may block. Errors propagate to the caller
//! unchanged; nothing is retried.

use std::hash::Hash;

use crate::error::{DataAccessError, IdentityError, PersistenceError};
use crate::query::{QueryConfig, QueryFilter, QuerySort};

/// Answers count and paged-load queries against the true backing source.
///
/// # Example
///
/// ```
/// use itemstore::error::DataAccessError;
/// use itemstore::query::QueryConfig;
/// use itemstore::traits::ItemDataProvider;
///
/// struct Squares(usize);
///
/// impl ItemDataProvider<u64> for Squares {
///     fn count(&self, _query: &QueryConfig) -> Result<usize, DataAccessError> {
///         Ok(self.0)
///     }
///
///     fn load(
///         &self,
///         _query: &QueryConfig,
///         offset: usize,
///         limit: usize,
///     ) -> Result<Vec<u64>, DataAccessError> {
///         let end = (offset + limit).min(self.0);
///         Ok((offset..end).map(|i| (i * i) as u64).collect())
///     }
/// }
///
/// let provider = Squares(10);
/// assert_eq!(provider.load(&QueryConfig::new(), 2, 3).unwrap(), vec![4, 9, 16]);
/// ```
pub trait ItemDataProvider<T> {
    /// Total number of items matching `query`.
    fn count(&self, query: &QueryConfig) -> Result<usize, DataAccessError>;

    /// Items in the window `[offset, offset + limit)` in query order.
    ///
    /// May return fewer than `limit` items at the end of the set.
    fn load(&self, query: &QueryConfig, offset: usize, limit: usize)
    -> Result<Vec<T>, DataAccessError>;

    /// Direct existence check for `item` under `query`.
    ///
    /// Returns `Ok(None)` when the provider has no cheaper way to answer than
    /// a scan; the store then falls back to its id ordering.
    fn exists(&self, _query: &QueryConfig, _item: &T) -> Result<Option<bool>, DataAccessError> {
        Ok(None)
    }
}

/// Extracts a stable, comparable identity from an item.
///
/// Must be a pure function of the identity-relevant content of the item.
pub trait IdentifierProvider<T> {
    type Id: Clone + Eq + Hash;

    fn identify(&self, item: &T) -> Result<Self::Id, IdentityError>;
}

/// Dedicated id-only query used by `get_item_ids` instead of paging through
/// full items.
///
/// Implemented for closures:
///
/// ```
/// use itemstore::error::DataAccessError;
/// use itemstore::query::QueryConfig;
/// use itemstore::traits::BulkIdLoader;
///
/// let loader = |_: &QueryConfig| -> Result<Vec<u32>, DataAccessError> { Ok(vec![1, 2, 3]) };
/// assert_eq!(loader.load_ids(&QueryConfig::new()).unwrap().len(), 3);
/// ```
pub trait BulkIdLoader<Id> {
    fn load_ids(&self, query: &QueryConfig) -> Result<Vec<Id>, DataAccessError>;
}

impl<Id, F> BulkIdLoader<Id> for F
where
    F: Fn(&QueryConfig) -> Result<Vec<Id>, DataAccessError>,
{
    fn load_ids(&self, query: &QueryConfig) -> Result<Vec<Id>, DataAccessError> {
        self(query)
    }
}

/// Persists pending changes.
///
/// Invoked at most once per `commit()` in buffered mode, and once per
/// mutation in unbuffered mode (with the other two sets empty).
pub trait CommitHandler<T> {
    fn commit(&mut self, added: &[T], modified: &[T], removed: &[T]) -> Result<(), PersistenceError>;
}

/// Contributes an optional filter and sort orders to every query.
///
/// Contributions are collected when the data source (re)builds its
/// [`QueryConfig`].
pub trait QueryConfigProvider {
    fn filter(&self) -> Option<QueryFilter> {
        None
    }

    fn sorts(&self) -> Vec<QuerySort> {
        Vec::new()
    }
}
