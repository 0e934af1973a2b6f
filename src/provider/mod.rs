//! Ready-made collaborators.
//!
//! | Type               | Implements                | Use                                   |
//! |--------------------|---------------------------|---------------------------------------|
//! | `InMemoryProvider` | `ItemDataProvider`        | Vec-backed source with call counters  |
//! | `ValueIdentity`    | `IdentifierProvider`      | The item is its own id                |
//! | `FnIdentity`       | `IdentifierProvider`      | Id extracted by a closure             |
//! | `FnCommitHandler`  | `CommitHandler`           | Closure receiving the pending sets    |
//! | `RecordingCommitHandler` | `CommitHandler`     | Keeps every commit for inspection     |

pub mod commit;
pub mod identity;
pub mod memory;

pub use commit::{CommitRecord, FnCommitHandler, RecordingCommitHandler};
pub use identity::{FnIdentity, ValueIdentity};
pub use memory::InMemoryProvider;
