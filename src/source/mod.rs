//! Data Source facade.
//!
//! [`DataSource`] binds an [`ItemStore`](crate::store::ItemStore) to its query
//! contributions and commit handler. With the `concurrency` feature,
//! [`SharedDataSource`] wraps it in a mutex for hosts that touch it from more
//! than one thread.

pub mod data_source;
#[cfg(feature = "concurrency")]
pub mod shared;

pub use data_source::DataSource;
#[cfg(feature = "concurrency")]
pub use shared::SharedDataSource;
