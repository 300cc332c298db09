//! # Core Domain Entities
//!
//! Identity and ledger-reference primitives used across all subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `Party`, key/signature aliases
//! - **Ledger**: `StateRef`, `TimeWindow`

use serde::{Deserialize, Serialize};

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// An opaque network participant identity.
///
/// Created by the identity subsystem and referenced (never owned) by
/// flows. Equality is by identity only: the public key and legal name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// The party's well-known public key.
    pub public_key: PublicKey,
    /// The party's legal name.
    pub name: String,
}

impl Party {
    pub fn new(public_key: PublicKey, name: impl Into<String>) -> Self {
        Self {
            public_key,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A pointer to one output of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRef {
    /// Id of the transaction that produced the state.
    pub tx_id: Hash,
    /// Output index within that transaction.
    pub index: u32,
}

impl StateRef {
    pub fn new(tx_id: Hash, index: u32) -> Self {
        Self { tx_id, index }
    }
}

/// Validity window for a transaction (unix seconds, both bounds optional).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeWindow {
    /// Earliest acceptable notarisation time.
    pub not_before: Option<u64>,
    /// Latest acceptable notarisation time.
    pub not_after: Option<u64>,
}

impl TimeWindow {
    /// Window with only an upper bound.
    pub fn until(not_after: u64) -> Self {
        Self {
            not_before: None,
            not_after: Some(not_after),
        }
    }

    /// Window with both bounds.
    pub fn between(not_before: u64, not_after: u64) -> Self {
        Self {
            not_before: Some(not_before),
            not_after: Some(not_after),
        }
    }

    /// Returns true if the given unix time falls inside the window.
    pub fn contains(&self, now: u64) -> bool {
        self.not_before.map_or(true, |t| now >= t) && self.not_after.map_or(true, |t| now <= t)
    }
}
