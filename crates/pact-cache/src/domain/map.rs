//! # Write-Through Persistent Map
//!
//! The core cache structure: an in-memory slot index over a durable row
//! store, coherent with the caller's ambient transactional session.
//!
//! ## Concurrency
//!
//! One slot per key; the slot's mutex is the only concurrency primitive.
//! The load-or-insert sequence for a key is atomic with respect to other
//! threads requesting the same key: exactly one loader runs, the rest
//! block on the slot and observe its result. No lock is held across the
//! whole map while a store round-trip is in flight.
//!
//! A `remove` drops the slot from the index while holding its lock;
//! threads that raced and still hold the stale `Arc` detect the
//! invalidation on a currency re-check and retry once. Exhausting the
//! retry is a store/cache inconsistency and is logged as an error.
//!
//! ## Eviction
//!
//! The logical size is unbounded and callers treat the map as a full
//! mirror of the store, so there is no capacity or time-based eviction
//! by construction. `remove` is the only path that discards a slot, and
//! it deletes the backing row inside the same session.

use crate::domain::errors::{CacheError, CacheResult};
use crate::ports::session::{PersistedEntity, SessionContext, SessionError};
use crate::ports::RowMapper;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// Per-key cached state.
///
/// `Absent` is a confirmed miss against the store and is itself cached,
/// so repeat lookups for a key that does not exist skip the round-trip.
enum Cached<V> {
    /// Not yet looked up.
    Unloaded,
    /// Confirmed absent in the store.
    Absent,
    /// Present with this value.
    Present(V),
}

struct Slot<V> {
    state: Mutex<Cached<V>>,
}

impl<V> Slot<V> {
    fn unloaded() -> Self {
        Self {
            state: Mutex::new(Cached::Unloaded),
        }
    }
}

/// One bounded retry after a detected invalidation race.
const MAX_ATTEMPTS: usize = 2;

/// Write-through mapping from logical key `K` to logical value `V`,
/// persisted as rows of type `E` through an explicit session.
pub struct PersistentMap<K, V, E, M>
where
    E: PersistedEntity,
{
    /// Map name, used as log context.
    name: &'static str,
    mapper: M,
    slots: Mutex<HashMap<K, Arc<Slot<V>>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<K, V, E, M> PersistentMap<K, V, E, M>
where
    K: Clone + Eq + Hash + Debug,
    V: Clone,
    E: PersistedEntity,
    M: RowMapper<K, V, E>,
{
    /// Create an empty map over the given row translation.
    pub fn new(name: &'static str, mapper: M) -> Self {
        Self {
            name,
            mapper,
            slots: Mutex::new(HashMap::new()),
            _entity: PhantomData,
        }
    }

    /// Number of keys currently resident in the in-memory index.
    ///
    /// Instrumentation only: this may only shrink through `remove`.
    pub fn resident_entries(&self) -> usize {
        self.slots.lock().len()
    }

    /// Cached value for `key`, or a single coalesced load on a miss.
    ///
    /// A cached confirmed-absence counts as a hit and returns `None`
    /// without touching the store.
    pub fn get(&self, session: &dyn SessionContext<E>, key: &K) -> CacheResult<Option<V>> {
        for _ in 0..MAX_ATTEMPTS {
            let slot = self.slot_for(key);
            let mut state = slot.state.lock();
            if !self.is_current(key, &slot) {
                continue;
            }
            return match &*state {
                Cached::Present(v) => Ok(Some(v.clone())),
                Cached::Absent => Ok(None),
                Cached::Unloaded => {
                    let loaded = self.load(session, key)?;
                    *state = match &loaded {
                        Some(v) => Cached::Present(v.clone()),
                        None => Cached::Absent,
                    };
                    Ok(loaded)
                }
            };
        }
        self.inconsistent(key, "get")
    }

    /// Overwrite semantics: insert if absent, merge if present.
    ///
    /// Returns the previous value, if any. If the cache believed the key
    /// absent but the store already holds a row, the row is merged and
    /// the cache refreshed rather than failing.
    pub fn put(&self, session: &dyn SessionContext<E>, key: &K, value: V) -> CacheResult<Option<V>> {
        for _ in 0..MAX_ATTEMPTS {
            let slot = self.slot_for(key);
            let mut state = slot.state.lock();
            if !self.is_current(key, &slot) {
                continue;
            }

            let previous = match &*state {
                Cached::Unloaded => self.load(session, key)?,
                Cached::Absent => None,
                Cached::Present(v) => Some(v.clone()),
            };

            let row = self.mapper.to_row(key, &value);
            let write = if previous.is_some() {
                session.merge(row)
            } else {
                match session.save(row) {
                    Err(SessionError::DuplicateRow) => {
                        // Store is ahead of the cache; reconcile via merge.
                        tracing::warn!(
                            map = self.name,
                            key = ?key,
                            "stale absence during put; merging over existing row"
                        );
                        session.merge(self.mapper.to_row(key, &value))
                    }
                    other => other,
                }
            };
            write.map_err(|e| self.session_err(e))?;

            *state = Cached::Present(value);
            return Ok(previous);
        }
        self.inconsistent(key, "put")
    }

    /// Insert-if-absent semantics for duplicate-detection bookkeeping.
    ///
    /// Returns whether the key was newly and uniquely inserted. A
    /// non-unique insert keeps the first value and is reported as a
    /// warning with full identifying context; the caller decides
    /// materiality.
    pub fn insert_unique(
        &self,
        session: &dyn SessionContext<E>,
        key: &K,
        value: V,
    ) -> CacheResult<bool> {
        for _ in 0..MAX_ATTEMPTS {
            let slot = self.slot_for(key);
            let mut state = slot.state.lock();
            if !self.is_current(key, &slot) {
                continue;
            }

            if let Cached::Unloaded = &*state {
                *state = match self.load(session, key)? {
                    Some(v) => Cached::Present(v),
                    None => Cached::Absent,
                };
            }

            return match &*state {
                Cached::Present(_) => {
                    tracing::warn!(
                        map = self.name,
                        key = ?key,
                        "non-unique insert ignored; existing value retained"
                    );
                    Ok(false)
                }
                Cached::Absent => {
                    match session.save(self.mapper.to_row(key, &value)) {
                        Ok(()) => {
                            *state = Cached::Present(value);
                            Ok(true)
                        }
                        Err(SessionError::DuplicateRow) => {
                            // Another session inserted between our miss and
                            // this write; adopt the store's row.
                            tracing::warn!(
                                map = self.name,
                                key = ?key,
                                "non-unique insert raced with the store; existing row retained"
                            );
                            *state = match self.load(session, key)? {
                                Some(v) => Cached::Present(v),
                                None => Cached::Absent,
                            };
                            Ok(false)
                        }
                        Err(e) => Err(self.session_err(e)),
                    }
                }
                Cached::Unloaded => unreachable!("slot resolved above"),
            };
        }
        self.inconsistent(key, "insert_unique")
    }

    /// The only sanctioned eviction path: drop the slot and delete the
    /// backing row inside the same session. Returns the removed value.
    pub fn remove(&self, session: &dyn SessionContext<E>, key: &K) -> CacheResult<Option<V>> {
        for _ in 0..MAX_ATTEMPTS {
            let slot = self.slot_for(key);
            let mut state = slot.state.lock();
            if !self.is_current(key, &slot) {
                continue;
            }

            let previous = match &*state {
                Cached::Unloaded => self.load(session, key)?,
                Cached::Absent => None,
                Cached::Present(v) => Some(v.clone()),
            };

            session
                .remove(&self.mapper.to_row_key(key))
                .map_err(|e| self.session_err(e))?;

            // Drop the slot while still holding its lock; racers holding
            // the stale Arc fail the currency re-check and retry.
            let mut slots = self.slots.lock();
            if let Some(current) = slots.get(key) {
                if Arc::ptr_eq(current, &slot) {
                    slots.remove(key);
                }
            }
            drop(slots);
            *state = Cached::Unloaded;

            return Ok(previous);
        }
        self.inconsistent(key, "remove")
    }

    /// All keys, by direct store scan.
    ///
    /// Full-table reads never consult the cache: the index is not
    /// guaranteed to hold the full data set.
    pub fn keys(&self, session: &dyn SessionContext<E>) -> CacheResult<Vec<K>> {
        Ok(self.scan(session)?.into_iter().map(|(k, _)| k).collect())
    }

    /// All values, by direct store scan.
    pub fn values(&self, session: &dyn SessionContext<E>) -> CacheResult<Vec<V>> {
        Ok(self.scan(session)?.into_iter().map(|(_, v)| v).collect())
    }

    /// All entries, by direct store scan.
    pub fn entries(&self, session: &dyn SessionContext<E>) -> CacheResult<Vec<(K, V)>> {
        self.scan(session)
    }

    /// Entries whose persisted row matches `criteria`, pushed down to
    /// the store's own filtered scan. Never served from cache.
    pub fn entries_where(
        &self,
        session: &dyn SessionContext<E>,
        criteria: &dyn Fn(&E) -> bool,
    ) -> CacheResult<Vec<(K, V)>> {
        session
            .query(criteria)
            .map_err(|e| self.session_err(e))?
            .iter()
            .map(|row| self.decode(row))
            .collect()
    }

    /// Row count, by direct store scan.
    pub fn len(&self, session: &dyn SessionContext<E>) -> CacheResult<usize> {
        Ok(self.scan(session)?.len())
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self, session: &dyn SessionContext<E>) -> CacheResult<bool> {
        Ok(self.len(session)? == 0)
    }

    fn scan(&self, session: &dyn SessionContext<E>) -> CacheResult<Vec<(K, V)>> {
        session
            .find_all()
            .map_err(|e| self.session_err(e))?
            .iter()
            .map(|row| self.decode(row))
            .collect()
    }

    fn slot_for(&self, key: &K) -> Arc<Slot<V>> {
        self.slots
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Slot::unloaded()))
            .clone()
    }

    /// A slot is current iff the index still maps its key to it.
    fn is_current(&self, key: &K, slot: &Arc<Slot<V>>) -> bool {
        self.slots
            .lock()
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    fn load(&self, session: &dyn SessionContext<E>, key: &K) -> CacheResult<Option<V>> {
        let row_key = self.mapper.to_row_key(key);
        match session.find(&row_key).map_err(|e| self.session_err(e))? {
            Some(row) => Ok(Some(self.decode(&row)?.1)),
            None => Ok(None),
        }
    }

    fn decode(&self, row: &E) -> CacheResult<(K, V)> {
        self.mapper.from_row(row).map_err(|reason| {
            tracing::error!(map = self.name, reason = %reason, "stored row failed to decode");
            CacheError::CorruptRow {
                map: self.name,
                reason,
            }
        })
    }

    fn session_err(&self, source: SessionError) -> CacheError {
        CacheError::Session {
            map: self.name,
            source,
        }
    }

    fn inconsistent<T>(&self, key: &K, op: &str) -> CacheResult<T> {
        tracing::error!(
            map = self.name,
            key = ?key,
            op,
            "invalidation race persisted past bounded retry"
        );
        Err(CacheError::Inconsistent { map: self.name })
    }
}
