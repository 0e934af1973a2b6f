pub use crate::builder::{DataSourceBuilder, ItemStoreBuilder};
pub use crate::error::{
    ConfigError, DataAccessError, IdentityError, InvariantError, PersistenceError, StoreError,
};
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::ItemStoreMetricsSnapshot;
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::MetricsSnapshotProvider;
pub use crate::provider::{
    FnCommitHandler, FnIdentity, InMemoryProvider, RecordingCommitHandler, ValueIdentity,
};
pub use crate::query::{CompareOp, FilterValue, QueryConfig, QueryFilter, QuerySort, SortDirection};
#[cfg(feature = "concurrency")]
pub use crate::source::SharedDataSource;
pub use crate::source::DataSource;
pub use crate::store::{AddedItemPosition, ItemStore, ItemStoreConfig};
pub use crate::traits::{
    BulkIdLoader, CommitHandler, IdentifierProvider, ItemDataProvider, QueryConfigProvider,
};
