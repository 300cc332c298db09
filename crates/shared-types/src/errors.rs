//! # Error Types
//!
//! Errors raised while building, signing, and verifying transactions.

use crate::entities::PublicKey;
use thiserror::Error;

/// Errors related to transaction signatures.
#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    /// A signer's key bytes do not decode to a valid Ed25519 key.
    #[error("Malformed public key for signer {signer:?}")]
    MalformedKey { signer: PublicKey },

    /// An attached signature does not verify over the transaction id.
    #[error("Invalid signature from signer {signer:?}")]
    InvalidSignature { signer: PublicKey },

    /// Required signers have not signed.
    #[error("Missing {0} required signature(s)")]
    MissingSignatures(usize),
}

/// Errors raised while assembling a transaction.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// A transaction must move or create at least one state.
    #[error("Transaction has no inputs and no outputs")]
    Empty,

    /// Serialization of the core transaction failed.
    #[error("Transaction encoding failed: {0}")]
    Encoding(String),
}
