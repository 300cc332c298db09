//! Driven ports: sub-protocols and stores the engine depends on.

use crate::domain::checkpoint::FlowCheckpoint;
use crate::error::FlowResult;
use crate::ports::session::FlowSession;
use async_trait::async_trait;
use shared_types::{Hash, Party, SignedTransaction};
use uuid::Uuid;

/// Signature-collection sub-protocol.
///
/// Input: a transaction signed by some parties. Output: the same
/// transaction with every required signature attached, or a rejection
/// naming the refusing party. Implementations MUST collect signatures
/// over precisely the transaction proposed: a counterparty attempting
/// to sign a substituted transaction is rejected, not accommodated.
#[async_trait]
pub trait SignatureCollector: Send + Sync {
    async fn collect(
        &self,
        stx: SignedTransaction,
        session: &dyn FlowSession,
    ) -> FlowResult<SignedTransaction>;
}

/// Finality sub-protocol: notary uniqueness ordering, then recording
/// and broadcast to every transaction participant.
///
/// This is where double-spend is authoritatively prevented: the notary
/// refuses to order a transaction consuming an already-consumed input,
/// surfacing `FlowError::NotaryConflict`.
#[async_trait]
pub trait FinalityGateway: Send + Sync {
    async fn finalize(
        &self,
        stx: SignedTransaction,
        notify: &[Party],
    ) -> FlowResult<SignedTransaction>;
}

/// Read access to the local ledger, for resolving a committed
/// transaction after the finality notice arrives.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn transaction_by_id(&self, tx_id: &Hash) -> FlowResult<Option<SignedTransaction>>;
}

/// Auxiliary recipient of finalized transactions (e.g. a regulatory
/// copy). Forwarding is best-effort: a failure is logged and never
/// unwinds the already-committed transaction.
#[async_trait]
pub trait TransactionObserver: Send + Sync {
    /// Observer name, for forwarding-failure logs.
    fn name(&self) -> &str;

    async fn on_finalized(&self, stx: &SignedTransaction) -> FlowResult<()>;
}

/// Durable store for flow checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Append a checkpoint for its flow.
    async fn record(&self, checkpoint: FlowCheckpoint) -> FlowResult<()>;

    /// The most recent checkpoint for a flow, if any.
    async fn latest(&self, flow_id: Uuid) -> FlowResult<Option<FlowCheckpoint>>;

    /// Every checkpoint recorded for a flow, in order.
    async fn history(&self, flow_id: Uuid) -> FlowResult<Vec<FlowCheckpoint>>;
}
