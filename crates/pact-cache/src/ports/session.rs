//! Ambient transactional session port.
//!
//! All durable reads and writes go through a session scoped to the
//! caller's current storage transaction. The cache and its consumers
//! never open transactions themselves; they receive the active session
//! as an explicit parameter on every operation.

use thiserror::Error;

/// A row type persisted by a session.
pub trait PersistedEntity: Clone + Send + Sync + 'static {
    /// The primary-key type of the row.
    type Key: Clone + Eq + std::hash::Hash + Send + Sync;

    /// The row's primary key.
    fn key(&self) -> Self::Key;
}

/// Errors surfaced by the backing store.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// `save` was asked to insert a row whose key already exists.
    #[error("Duplicate row: key already present in store")]
    DuplicateRow,

    /// The session's transaction is no longer active.
    #[error("Transaction no longer active")]
    Inactive,

    /// The store itself failed.
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Handle to an active durable-storage transaction.
///
/// `save` inserts (and fails on a duplicate key); `merge` upserts. The
/// distinction lets the map pick insert vs update without a second
/// round-trip once it knows the cached state of a key.
pub trait SessionContext<E: PersistedEntity>: Send + Sync {
    /// Find one row by primary key.
    fn find(&self, key: &E::Key) -> Result<Option<E>, SessionError>;

    /// Insert a new row. Fails with `DuplicateRow` if the key exists.
    fn save(&self, row: E) -> Result<(), SessionError>;

    /// Insert or update a row.
    fn merge(&self, row: E) -> Result<(), SessionError>;

    /// Delete a row. Returns whether a row existed.
    fn remove(&self, key: &E::Key) -> Result<bool, SessionError>;

    /// Scan every row.
    fn find_all(&self) -> Result<Vec<E>, SessionError>;

    /// Scan rows matching a criteria predicate.
    fn query(&self, criteria: &dyn Fn(&E) -> bool) -> Result<Vec<E>, SessionError>;
}
