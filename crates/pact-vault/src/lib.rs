//! # pact-vault
//!
//! The vault state ledger: tracks which contract states this node owns,
//! which have been consumed, and which are soft-locked by in-flight
//! flows. Every read and write goes through the persistent cache, which
//! supplies the idempotence and double-spend-prevention bookkeeping.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Transaction Recording**: insert-once on the transaction id; a
//!   duplicate recording is a logged warning, never an error
//! - **Lifecycle Tracking**: unconsumed → consumed, with recorded and
//!   consumed timestamps
//! - **Soft Locks**: advisory (lock owner, lock timestamp) reservations;
//!   at most one active owner per state row, honoured by selection but
//!   not enforced by the store
//!
//! ## Architecture
//!
//! ```text
//! flow engine ──record/select/lock──→ Vault
//!                                       │
//!                                       ├── PersistentMap<StateRef, VaultState>
//!                                       └── PersistentMap<Hash, StoredTx>
//! ```

pub mod domain;
pub mod errors;
pub mod service;

pub use domain::{StateStatus, StoredTx, TxRow, VaultRow, VaultState};
pub use errors::{VaultError, VaultResult};
pub use service::{Vault, VaultSession};
