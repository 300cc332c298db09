//! Error types for the vault subsystem.

use pact_cache::CacheError;
use shared_types::StateRef;
use thiserror::Error;
use uuid::Uuid;

/// Vault subsystem errors.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The underlying cache or its session failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A referenced state is not in this vault.
    #[error("Unknown state: {0:?}")]
    UnknownState(StateRef),

    /// A referenced state has already been consumed.
    #[error("State already consumed: {0:?}")]
    StateConsumed(StateRef),

    /// A referenced state is soft-locked by another flow.
    #[error("State {state:?} is locked by flow {holder}")]
    StateLocked { state: StateRef, holder: Uuid },

    /// A recorded transaction failed to decode.
    #[error("Recorded transaction failed to decode: {0}")]
    Decode(String),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
