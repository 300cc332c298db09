//! In-memory row store with session handles.
//!
//! Backs the session port for tests and single-process deployments. A
//! disk engine would implement the same `SessionContext` trait; nothing
//! in the map or its consumers changes.

use crate::ports::session::{PersistedEntity, SessionContext, SessionError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared in-memory row store for one entity type.
pub struct InMemoryStore<E: PersistedEntity> {
    rows: Arc<RwLock<HashMap<E::Key, E>>>,
    /// Point reads served, for load-coalescing assertions.
    reads: Arc<AtomicU64>,
}

impl<E: PersistedEntity> InMemoryStore<E> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Open a session against this store.
    ///
    /// Every session sees the same committed rows; transaction scoping
    /// is the caller's concern, exactly as with a real storage engine.
    pub fn session(&self) -> MemorySession<E> {
        MemorySession {
            rows: self.rows.clone(),
            reads: self.reads.clone(),
        }
    }

    /// Point reads served since construction or the last reset.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn reset_read_count(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }
}

impl<E: PersistedEntity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A session handle over the shared store.
#[derive(Clone)]
pub struct MemorySession<E: PersistedEntity> {
    rows: Arc<RwLock<HashMap<E::Key, E>>>,
    reads: Arc<AtomicU64>,
}

impl<E: PersistedEntity> SessionContext<E> for MemorySession<E> {
    fn find(&self, key: &E::Key) -> Result<Option<E>, SessionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.read().get(key).cloned())
    }

    fn save(&self, row: E) -> Result<(), SessionError> {
        let mut rows = self.rows.write();
        if rows.contains_key(&row.key()) {
            return Err(SessionError::DuplicateRow);
        }
        rows.insert(row.key(), row);
        Ok(())
    }

    fn merge(&self, row: E) -> Result<(), SessionError> {
        self.rows.write().insert(row.key(), row);
        Ok(())
    }

    fn remove(&self, key: &E::Key) -> Result<bool, SessionError> {
        Ok(self.rows.write().remove(key).is_some())
    }

    fn find_all(&self) -> Result<Vec<E>, SessionError> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn query(&self, criteria: &dyn Fn(&E) -> bool) -> Result<Vec<E>, SessionError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| criteria(row))
            .cloned()
            .collect())
    }
}

/// Minimal row type for exercising the map in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRow {
    pub key: String,
    pub data: Vec<u8>,
}

impl PersistedEntity for TestRow {
    type Key = String;

    fn key(&self) -> String {
        self.key.clone()
    }
}
