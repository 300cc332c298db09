//! Domain logic: the write-through map and its error types.

pub mod errors;
pub mod map;

pub use errors::{CacheError, CacheResult};
pub use map::PersistentMap;
