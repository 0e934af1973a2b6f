//! itemstore: a paged, cached, mutation-tracking item store and the data
//! source facade that binds it to query configuration and persistence.
//!
//! ```text
//!   caller ──► DataSource ──► ItemStore ──► ItemDataProvider (on page miss)
//!                  │              │
//!                  │              └── overlay: added / modified / removed
//!                  └──► CommitHandler (commit, or every mutation when unbuffered)
//! ```
//!
//! See [`store::item_store`] for the paging, eviction and index translation
//! rules, and [`source::data_source`] for buffered/unbuffered semantics.

pub mod builder;
pub mod ds;
pub mod error;
pub mod provider;
pub mod query;
pub mod source;
pub mod store;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
