//! Ports: the session contract the map is driven through, and the row
//! translation functions supplied at construction.

pub mod session;

use session::PersistedEntity;

/// Translation functions between the logical (key, value) pair and its
/// persisted row representation. Fixed at map construction.
pub trait RowMapper<K, V, E: PersistedEntity>: Send + Sync {
    /// Logical key → persisted row key.
    fn to_row_key(&self, key: &K) -> E::Key;

    /// Persisted row → logical (key, value). An `Err` marks the row as
    /// corrupt; the map logs it and surfaces `CacheError::CorruptRow`.
    fn from_row(&self, row: &E) -> Result<(K, V), String>;

    /// Logical (key, value) → persisted row.
    fn to_row(&self, key: &K, value: &V) -> E;
}
