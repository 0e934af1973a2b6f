//! Error types for the itemstore library.
//!
//! ## Key Components
//!
//! - [`StoreError`]: Returned by every fallible [`ItemStore`](crate::store::ItemStore)
//!   and [`DataSource`](crate::source::DataSource) operation.
//! - [`DataAccessError`]: Raised by an [`ItemDataProvider`](crate::traits::ItemDataProvider)
//!   when a count or load query fails.
//! - [`IdentityError`]: Raised by an [`IdentifierProvider`](crate::traits::IdentifierProvider)
//!   that cannot derive an id for an item.
//! - [`PersistenceError`]: Raised by a [`CommitHandler`](crate::traits::CommitHandler).
//! - [`ConfigError`]: Returned by builder `try_build()` methods when
//!   configuration parameters are invalid.
//! - [`InvariantError`]: Returned by `check_invariants` when internal state
//!   is inconsistent.
//!
//! ## Propagation
//!
//! ```text
//!   ItemDataProvider ──DataAccessError──┐
//!   IdentifierProvider ──IdentityError──┼──► StoreError ──► caller
//!   CommitHandler ──PersistenceError────┘
//! ```
//!
//! Collaborator errors convert into [`StoreError`] through `From`, so `?`
//! surfaces them unchanged. Nothing is retried or swallowed.
//!
//! ## Example Usage
//!
//! ```
//! use itemstore::error::{DataAccessError, StoreError};
//!
//! let err: StoreError = DataAccessError::new("connection reset").into();
//! assert!(matches!(err, StoreError::DataAccess(_)));
//! assert_eq!(err.to_string(), "data access failed: connection reset");
//! ```

use std::error::Error as StdError;

use thiserror::Error;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias defaulting to [`StoreError`].
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Error returned by item store and data source operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The data provider failed during `count` or `load`.
    #[error("data access failed: {0}")]
    DataAccess(#[from] DataAccessError),

    /// A logical index outside `[0, size)`.
    #[error("index {index} out of bounds for size {size}")]
    OutOfBounds { index: usize, size: usize },

    /// An operation that is not permitted in the current mode.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The identifier provider could not resolve an id.
    #[error("cannot identify item: {0}")]
    Identity(#[from] IdentityError),

    /// The commit handler failed to persist the overlay.
    #[error("commit failed: {0}")]
    Persistence(#[from] PersistenceError),
}

impl StoreError {
    /// Creates an [`StoreError::IllegalState`] with the given description.
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// Returns `true` for [`StoreError::OutOfBounds`].
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

macro_rules! collaborator_error {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Error)]
        #[error("{message}")]
        pub struct $name {
            message: String,
            #[source]
            source: Option<BoxedSource>,
        }

        impl $name {
            /// Creates an error with the given description.
            pub fn new(msg: impl Into<String>) -> Self {
                Self {
                    message: msg.into(),
                    source: None,
                }
            }

            /// Creates an error wrapping an underlying cause.
            pub fn with_source(
                msg: impl Into<String>,
                source: impl StdError + Send + Sync + 'static,
            ) -> Self {
                Self {
                    message: msg.into(),
                    source: Some(Box::new(source)),
                }
            }

            /// Returns the error description.
            #[inline]
            pub fn message(&self) -> &str {
                &self.message
            }
        }
    };
}

collaborator_error!(
    /// Error raised by a data provider while counting or loading items.
    DataAccessError
);

collaborator_error!(
    /// Error raised when an id cannot be derived for an item
    /// (for example a missing required attribute).
    IdentityError
);

collaborator_error!(
    /// Error raised by a commit handler while persisting changes.
    PersistenceError
);

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal store invariants are violated.
///
/// Produced by [`ItemStore::check_invariants`](crate::store::ItemStore::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when store or data source configuration is invalid.
///
/// Produced by builder `try_build()` methods.
///
/// # Example
///
/// ```
/// use itemstore::builder::DataSourceBuilder;
/// use itemstore::provider::{InMemoryProvider, ValueIdentity};
///
/// let err = DataSourceBuilder::new(InMemoryProvider::new(vec![1u32]), ValueIdentity)
///     .buffered(true)
///     .try_build()
///     .unwrap_err();
/// assert!(err.to_string().contains("commit handler"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
