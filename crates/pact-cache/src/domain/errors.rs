//! Error types for the cache subsystem.

use crate::ports::session::SessionError;
use thiserror::Error;

/// Cache subsystem errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store failed inside the ambient session.
    #[error("Session error in map {map}: {source}")]
    Session {
        map: &'static str,
        #[source]
        source: SessionError,
    },

    /// A stored row could not be translated back to a (key, value) pair.
    #[error("Corrupt row in map {map}: {reason}")]
    CorruptRow { map: &'static str, reason: String },

    /// A race between an invalidation and a state-changing operation was
    /// detected and the bounded retry path was exhausted.
    #[error("Cache inconsistency in map {map}: invalidation race retry limit reached")]
    Inconsistent { map: &'static str },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
