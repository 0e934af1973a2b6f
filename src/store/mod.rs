//! Item Store: paged cache plus pending-mutation overlay.

pub mod item_store;
mod overlay;

pub use item_store::{
    AddedItemPosition, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CACHE_SIZE, ItemStore, ItemStoreConfig,
};
