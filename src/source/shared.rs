//! Mutex-guarded [`DataSource`].
//!
//! The store itself is single-threaded; this wrapper serializes every call
//! through one `parking_lot::Mutex`. Each method holds the lock for the whole
//! call, including any provider or commit handler round-trip it triggers.
//!
//! ```text
//!   thread A ──┐
//!   thread B ──┼──► Arc<Mutex<DataSource>> ──► ItemStore ──► provider
//!   thread C ──┘        (one caller at a time)
//! ```

use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::source::DataSource;
use crate::traits::{IdentifierProvider, ItemDataProvider};

/// Cloneable, thread-safe handle to a [`DataSource`].
///
/// # Example
///
/// ```
/// use std::thread;
///
/// use itemstore::builder::DataSourceBuilder;
/// use itemstore::provider::{InMemoryProvider, RecordingCommitHandler, ValueIdentity};
/// use itemstore::source::SharedDataSource;
///
/// let source = DataSourceBuilder::new(InMemoryProvider::new((0..100u32).collect()), ValueIdentity)
///     .batch_size(10)
///     .buffered(true)
///     .commit_handler(RecordingCommitHandler::new())
///     .build();
/// let shared = SharedDataSource::new(source);
///
/// let handles: Vec<_> = (0..4u32)
///     .map(|t| {
///         let shared = shared.clone();
///         thread::spawn(move || shared.add(1_000 + t).unwrap())
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(shared.size().unwrap(), 104);
/// ```
pub struct SharedDataSource<T, P, I>
where
    I: IdentifierProvider<T>,
{
    inner: Arc<Mutex<DataSource<T, P, I>>>,
}

impl<T, P, I> SharedDataSource<T, P, I>
where
    T: Clone,
    P: ItemDataProvider<T>,
    I: IdentifierProvider<T>,
{
    pub fn new(source: DataSource<T, P, I>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    /// Runs `f` with exclusive access to the data source.
    pub fn with<R>(&self, f: impl FnOnce(&mut DataSource<T, P, I>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn size(&self) -> Result<usize> {
        self.inner.lock().size()
    }

    pub fn get_item(&self, index: usize) -> Result<T> {
        self.inner.lock().get_item(index)
    }

    pub fn items(&self, range: Range<usize>) -> Result<Vec<T>> {
        self.inner.lock().items(range)
    }

    pub fn get_item_ids(&self) -> Result<Vec<I::Id>> {
        self.inner.lock().get_item_ids()
    }

    pub fn contains_item(&self, item: &T) -> Result<bool> {
        self.inner.lock().contains_item(item)
    }

    pub fn is_modified(&self) -> bool {
        self.inner.lock().is_modified()
    }

    pub fn add(&self, item: T) -> Result<()> {
        self.inner.lock().add(item)
    }

    pub fn update(&self, item: T) -> Result<()> {
        self.inner.lock().update(item)
    }

    pub fn remove(&self, item: &T) -> Result<bool> {
        self.inner.lock().remove(item)
    }

    pub fn remove_at(&self, index: usize) -> Result<bool> {
        self.inner.lock().remove_at(index)
    }

    pub fn commit(&self) -> Result<()> {
        self.inner.lock().commit()
    }

    pub fn discard(&self) -> Result<()> {
        self.inner.lock().discard()
    }

    pub fn refresh(&self) {
        self.inner.lock().refresh();
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Unwraps the data source if this is the last handle.
    pub fn try_into_inner(self) -> std::result::Result<DataSource<T, P, I>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T, P, I> Clone for SharedDataSource<T, P, I>
where
    I: IdentifierProvider<T>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
