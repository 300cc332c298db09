//! Adapters: in-memory realizations of the session port.

pub mod memory_store;

pub use memory_store::{InMemoryStore, MemorySession};
