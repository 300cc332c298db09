//! # Shared Types Crate
//!
//! This crate contains the domain entities shared by every subsystem:
//! party identities, the `Handshake<T>` wire envelope, and the
//! transaction model (builder, core transaction, signed transaction).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Identity by Key**: A `Party` is equal to another iff key and name
//!   match; no trust-chain material participates in equality.
//! - **Irreversible Signing**: `TransactionBuilder` → `CoreTransaction` →
//!   `SignedTransaction` is a one-way pipeline; signed transactions are
//!   never mutated, only extended into new values.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod transaction;

pub use entities::*;
pub use envelope::Handshake;
pub use errors::*;
pub use transaction::*;
