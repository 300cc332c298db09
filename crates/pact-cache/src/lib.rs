//! # pact-cache
//!
//! Write-through persistent map: a mapping from a logical key to a
//! logical value that behaves like an in-memory structure to callers but
//! is durably backed by a row store reached through an explicit
//! transactional session.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Coalesced Loads**: exactly one store round-trip per key per race;
//!   concurrent readers block on the loading slot and observe its result
//! - **Confirmed Absence**: a cached "not in store" sentinel, distinct
//!   from "not yet looked up", so repeat misses skip the store
//! - **Insert-Once**: `insert_unique` for duplicate-detection bookkeeping;
//!   a non-unique insert is a warning, never an error
//! - **Explicit Eviction Only**: no capacity or time-based eviction; the
//!   only sanctioned eviction path is `remove`, which also deletes the
//!   backing row inside the same session
//!
//! ## Architecture
//!
//! ```text
//! caller ──get/put/insert_unique/remove──→ PersistentMap
//!                                              │
//!                                              ├── slot index (in-memory)
//!                                              │
//!                                              └── SessionContext ──→ row store
//! ```
//!
//! Every operation takes the active session as an explicit parameter;
//! the map never opens transactions itself and never consults an
//! implicit thread-local.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::errors::{CacheError, CacheResult};
pub use domain::map::PersistentMap;
pub use ports::session::{PersistedEntity, SessionContext, SessionError};
pub use ports::RowMapper;
