//! Injected strategies supplied by concrete agreement types.
//!
//! The engine owns the suspension/signature/finality skeleton; a
//! concrete flow (cash issuance, deal origination) supplies only these
//! three policies. Rejection from any of them aborts the exchange and
//! is communicated to the counterparty.

use crate::error::FlowResult;
use async_trait::async_trait;
use shared_types::{Handshake, Party, PartySignature, SignedTransaction, TransactionBuilder};

/// Initiator-side review of the transaction proposed for
/// countersigning. The single extension point of the initiating role.
#[async_trait]
pub trait ProposalChecker: Send + Sync {
    /// Accept (`Ok`) or reject (`Err(FlowError::Rejected)`) the
    /// proposal. The engine has already verified the attached
    /// signatures before calling this.
    async fn check_proposal(&self, stx: &SignedTransaction) -> FlowResult<()>;
}

/// Responder-side validation of the inbound handshake.
///
/// May reshape the payload (e.g. re-resolve referenced entities into
/// richer local types) or reject the exchange.
#[async_trait]
pub trait HandshakeValidator<U, P>: Send + Sync {
    async fn validate(&self, handshake: Handshake<U>) -> FlowResult<P>;
}

/// The responder's assembly step output: the transaction proposal, the
/// local keys that must sign it, and any pre-existing signatures to
/// splice in before collection starts.
#[derive(Debug)]
pub struct Assembly {
    pub builder: TransactionBuilder,
    pub signing_keys: Vec<ed25519_dalek::SigningKey>,
    pub extra_signatures: Vec<PartySignature>,
}

/// Responder-side construction of the shared transaction from the
/// validated proposal.
#[async_trait]
pub trait TransactionAssembler<P>: Send + Sync {
    async fn assemble(&self, proposal: &P, counterparty: &Party) -> FlowResult<Assembly>;

    /// Invoked when the exchange fails after `assemble` may have
    /// reserved resources (e.g. soft-locked inputs); releases anything
    /// this assembler still holds. Default: nothing to release.
    async fn abandon(&self) -> FlowResult<()> {
        Ok(())
    }
}
