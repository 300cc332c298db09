//! Error types for the flow engine.
//!
//! Each failure class is distinct so callers can decide what to do with
//! a failed flow instance: a rejection is final, a timeout may warrant a
//! fresh flow, a notary conflict must trigger soft-lock release. The
//! engine itself never retries and never substitutes a default result.

use shared_types::{BuildError, Hash, SignatureError};
use thiserror::Error;

/// Flow engine errors.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The counterparty (or a local validation strategy) declined the
    /// exchange. Named party and reason; never retried automatically.
    #[error("Rejected by {by}: {reason}")]
    Rejected { by: String, reason: String },

    /// A suspension point exceeded the flow timeout.
    #[error("Flow timed out awaiting {awaiting}")]
    Timeout { awaiting: &'static str },

    /// The counterparty's channel closed mid-exchange.
    #[error("Counterparty disconnected")]
    PeerDisconnected,

    /// The notary refused to order the transaction because an input is
    /// already consumed. Fatal to this flow instance.
    #[error("Notary conflict: input already consumed by transaction {conflicting_tx:?}")]
    NotaryConflict { conflicting_tx: Hash },

    /// A message arrived out of protocol order.
    #[error("Unexpected message: expected {expected}, got {got}")]
    UnexpectedMessage {
        expected: &'static str,
        got: &'static str,
    },

    /// A signature failed to verify or required signatures are missing.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Transaction assembly failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The local ledger failed or lacks an expected transaction.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// The checkpoint store failed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Wire encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(String),

    /// A crashed flow cannot be resumed from its recorded phase.
    #[error("Flow is not resumable from phase {phase}")]
    NotResumable { phase: String },
}

impl FlowError {
    /// Convenience constructor for strategy rejections.
    pub fn rejected(by: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            by: by.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;
