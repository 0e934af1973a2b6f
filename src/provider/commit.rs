//! [`CommitHandler`] adapters.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::PersistenceError;
use crate::traits::CommitHandler;

/// Forwards the pending sets to a closure.
///
/// ```
/// use itemstore::error::PersistenceError;
/// use itemstore::provider::FnCommitHandler;
/// use itemstore::traits::CommitHandler;
///
/// let mut written = 0;
/// let mut handler = FnCommitHandler::new(|added: &[u32], modified: &[u32], removed: &[u32]| {
///     written += added.len() + modified.len() + removed.len();
///     Ok::<(), PersistenceError>(())
/// });
/// handler.commit(&[1, 2], &[], &[3]).unwrap();
/// drop(handler);
/// assert_eq!(written, 3);
/// ```
pub struct FnCommitHandler<F> {
    commit: F,
}

impl<F> FnCommitHandler<F> {
    pub fn new(commit: F) -> Self {
        Self { commit }
    }
}

impl<T, F> CommitHandler<T> for FnCommitHandler<F>
where
    F: FnMut(&[T], &[T], &[T]) -> Result<(), PersistenceError>,
{
    fn commit(&mut self, added: &[T], modified: &[T], removed: &[T]) -> Result<(), PersistenceError> {
        (self.commit)(added, modified, removed)
    }
}

impl<F> fmt::Debug for FnCommitHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommitHandler").finish_non_exhaustive()
    }
}

/// One invocation seen by a [`RecordingCommitHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord<T> {
    pub added: Vec<T>,
    pub modified: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> CommitRecord<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Records every commit it receives.
///
/// Clones share the same log, so one clone can be handed to a data source
/// while another inspects what was committed.
#[derive(Debug)]
pub struct RecordingCommitHandler<T> {
    log: Arc<Mutex<Vec<CommitRecord<T>>>>,
    reject: Arc<AtomicBool>,
}

impl<T> RecordingCommitHandler<T> {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            reject: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes subsequent commits fail until switched off. Rejected commits
    /// are not recorded.
    pub fn reject_commits(&self, reject: bool) {
        self.reject.store(reject, Ordering::Relaxed);
    }

    pub fn records(&self) -> Vec<CommitRecord<T>>
    where
        T: Clone,
    {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Clone for RecordingCommitHandler<T> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            reject: Arc::clone(&self.reject),
        }
    }
}

impl<T> Default for RecordingCommitHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> CommitHandler<T> for RecordingCommitHandler<T> {
    fn commit(&mut self, added: &[T], modified: &[T], removed: &[T]) -> Result<(), PersistenceError> {
        if self.reject.load(Ordering::Relaxed) {
            return Err(PersistenceError::new("commit rejected by handler"));
        }
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CommitRecord {
                added: added.to_vec(),
                modified: modified.to_vec(),
                removed: removed.to_vec(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_log() {
        let observer = RecordingCommitHandler::<&str>::new();
        let mut handler = observer.clone();
        handler.commit(&["a"], &[], &[]).unwrap();
        handler.commit(&[], &[], &[]).unwrap();

        let records = observer.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].added, vec!["a"]);
        assert!(records[1].is_empty());
    }

    #[test]
    fn rejected_commits_are_not_recorded() {
        let mut handler = RecordingCommitHandler::<u8>::new();
        handler.reject_commits(true);
        let err = handler.commit(&[1], &[], &[]).unwrap_err();
        assert_eq!(err.message(), "commit rejected by handler");
        assert!(handler.is_empty());
    }
}
