//! Initiating role of the bilateral exchange.
//!
//! Given a payload, a counterparty session, and the local signing key,
//! drive the handshake, countersign the counterparty's proposal after a
//! caller-supplied review, await the finality notice, and resolve the
//! committed transaction from the local ledger.

use crate::config::FlowConfig;
use crate::domain::checkpoint::{FlowCheckpoint, FlowPhase, InitiatorPhase};
use crate::domain::messages::FlowMessage;
use crate::error::{FlowError, FlowResult};
use crate::ports::outbound::{CheckpointStore, LedgerReader};
use crate::ports::session::FlowSession;
use crate::ports::strategy::ProposalChecker;
use serde::Serialize;
use shared_types::{Handshake, Hash, PartySignature, SignedTransaction};
use std::sync::Arc;
use uuid::Uuid;

/// The initiating-role engine.
///
/// `check_proposal` is the only policy a concrete flow supplies here;
/// everything else is the shared skeleton.
pub struct InitiatorFlow {
    flow_id: Uuid,
    correlation_id: Uuid,
    config: FlowConfig,
    local_key: ed25519_dalek::SigningKey,
    checker: Arc<dyn ProposalChecker>,
    ledger: Arc<dyn LedgerReader>,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl InitiatorFlow {
    pub fn new(
        config: FlowConfig,
        local_key: ed25519_dalek::SigningKey,
        checker: Arc<dyn ProposalChecker>,
        ledger: Arc<dyn LedgerReader>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            config,
            local_key,
            checker,
            ledger,
            checkpoints,
        }
    }

    /// Rebind to an existing flow id, for resuming after a restart.
    #[must_use]
    pub fn with_flow_id(mut self, flow_id: Uuid) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Run the exchange to completion.
    ///
    /// Every failure is typed; retrying is the caller's responsibility,
    /// never this engine's.
    pub async fn run<T>(
        &self,
        session: &dyn FlowSession,
        payload: T,
    ) -> FlowResult<SignedTransaction>
    where
        T: Serialize + Send + Sync,
    {
        match self.drive(session, payload).await {
            Ok(stx) => Ok(stx),
            Err(e) => {
                self.mark_failed().await;
                Err(e)
            }
        }
    }

    /// Resume a crashed flow from its latest checkpoint.
    ///
    /// The checkpoint's context carries everything the recorded phase
    /// needs; nothing is reconstructed from in-process state.
    pub async fn resume(&self, session: &dyn FlowSession) -> FlowResult<SignedTransaction> {
        let result = self.drive_resume(session).await;
        if result.is_err() {
            self.mark_failed().await;
        }
        result
    }

    async fn drive<T>(&self, session: &dyn FlowSession, payload: T) -> FlowResult<SignedTransaction>
    where
        T: Serialize + Send + Sync,
    {
        let mut phase = InitiatorPhase::Init;
        self.checkpoints
            .record(self.checkpoint(phase, Vec::new()))
            .await?;

        let handshake = Handshake::new(payload, self.local_key.verifying_key().to_bytes());
        let encoded =
            bincode::serialize(&handshake).map_err(|e| FlowError::Codec(e.to_string()))?;

        self.advance(&mut phase, InitiatorPhase::SendingProposal, encoded.clone())
            .await?;
        session
            .send(FlowMessage::Propose { handshake: encoded })
            .await?;
        tracing::debug!(flow_id = %self.flow_id, to = %session.counterparty(), "proposal sent");

        self.advance(&mut phase, InitiatorPhase::AwaitingCountersignature, Vec::new())
            .await?;
        let tx_id = self.countersign(session).await?;

        self.advance(&mut phase, InitiatorPhase::AwaitingFinalityNotice, tx_id.to_vec())
            .await?;
        let committed = self.await_finality(session, tx_id).await?;

        self.advance(&mut phase, InitiatorPhase::Complete, Vec::new())
            .await?;
        tracing::info!(flow_id = %self.flow_id, tx_id = ?tx_id, "flow complete");
        Ok(committed)
    }

    async fn drive_resume(&self, session: &dyn FlowSession) -> FlowResult<SignedTransaction> {
        let checkpoint = self
            .checkpoints
            .latest(self.flow_id)
            .await?
            .ok_or_else(|| FlowError::NotResumable {
                phase: "no checkpoint".into(),
            })?;

        let mut phase = match checkpoint.phase {
            FlowPhase::Initiator(p) => p,
            other => {
                return Err(FlowError::NotResumable {
                    phase: other.to_string(),
                })
            }
        };
        tracing::info!(flow_id = %self.flow_id, phase = %checkpoint.phase, "resuming flow");

        match phase {
            InitiatorPhase::SendingProposal => {
                // The proposal may not have reached the peer; resend it.
                session
                    .send(FlowMessage::Propose {
                        handshake: checkpoint.context,
                    })
                    .await?;
                self.advance(&mut phase, InitiatorPhase::AwaitingCountersignature, Vec::new())
                    .await?;
                let tx_id = self.countersign(session).await?;
                self.advance(&mut phase, InitiatorPhase::AwaitingFinalityNotice, tx_id.to_vec())
                    .await?;
                let committed = self.await_finality(session, tx_id).await?;
                self.advance(&mut phase, InitiatorPhase::Complete, Vec::new())
                    .await?;
                Ok(committed)
            }
            InitiatorPhase::AwaitingCountersignature => {
                let tx_id = self.countersign(session).await?;
                self.advance(&mut phase, InitiatorPhase::AwaitingFinalityNotice, tx_id.to_vec())
                    .await?;
                let committed = self.await_finality(session, tx_id).await?;
                self.advance(&mut phase, InitiatorPhase::Complete, Vec::new())
                    .await?;
                Ok(committed)
            }
            InitiatorPhase::AwaitingFinalityNotice => {
                let tx_id: Hash = checkpoint
                    .context
                    .as_slice()
                    .try_into()
                    .map_err(|_| FlowError::Codec("checkpoint context is not a tx id".into()))?;
                let committed = self.await_finality(session, tx_id).await?;
                self.advance(&mut phase, InitiatorPhase::Complete, Vec::new())
                    .await?;
                Ok(committed)
            }
            other => Err(FlowError::NotResumable {
                phase: FlowPhase::Initiator(other).to_string(),
            }),
        }
    }

    /// Await the countersign request, review it, and reply with our
    /// signature. Returns the transaction id we signed.
    async fn countersign(&self, session: &dyn FlowSession) -> FlowResult<Hash> {
        let stx = match self.recv(session, "CountersignRequest").await? {
            FlowMessage::CountersignRequest { stx } => stx,
            FlowMessage::Reject { reason } => {
                return Err(FlowError::rejected(
                    session.counterparty().name.clone(),
                    reason,
                ))
            }
            other => {
                return Err(FlowError::UnexpectedMessage {
                    expected: "CountersignRequest",
                    got: other.kind(),
                })
            }
        };

        // The attached signatures must verify over this exact content
        // before the review policy sees it.
        stx.verify_signatures()?;

        if let Err(rejection) = self.checker.check_proposal(&stx).await {
            // Tell the counterparty why; the send is best-effort since
            // the flow is failing either way.
            let _ = session
                .send(FlowMessage::Reject {
                    reason: rejection.to_string(),
                })
                .await;
            return Err(rejection);
        }

        let tx_id = stx.id();
        let signature = PartySignature::create(&self.local_key, &tx_id);
        session
            .send(FlowMessage::Countersignature { signature })
            .await?;
        Ok(tx_id)
    }

    /// Await the finality notice for the transaction we countersigned
    /// and resolve it from the local ledger.
    async fn await_finality(
        &self,
        session: &dyn FlowSession,
        expected: Hash,
    ) -> FlowResult<SignedTransaction> {
        match self.recv(session, "FinalityNotice").await? {
            FlowMessage::FinalityNotice { tx_id } => {
                if tx_id != expected {
                    return Err(FlowError::UnexpectedMessage {
                        expected: "FinalityNotice for the countersigned transaction",
                        got: "FinalityNotice for a different transaction",
                    });
                }
                self.ledger
                    .transaction_by_id(&tx_id)
                    .await?
                    .ok_or_else(|| {
                        FlowError::Ledger(format!(
                            "finalized transaction {tx_id:?} not found in local ledger"
                        ))
                    })
            }
            FlowMessage::Reject { reason } => Err(FlowError::rejected(
                session.counterparty().name.clone(),
                reason,
            )),
            other => Err(FlowError::UnexpectedMessage {
                expected: "FinalityNotice",
                got: other.kind(),
            }),
        }
    }

    async fn recv(
        &self,
        session: &dyn FlowSession,
        awaiting: &'static str,
    ) -> FlowResult<FlowMessage> {
        tokio::time::timeout(self.config.exchange_timeout, session.receive())
            .await
            .map_err(|_| FlowError::Timeout { awaiting })?
    }

    /// Validate the transition, then persist the checkpoint before the
    /// suspension the new phase implies.
    async fn advance(
        &self,
        phase: &mut InitiatorPhase,
        next: InitiatorPhase,
        context: Vec<u8>,
    ) -> FlowResult<()> {
        if !phase.can_advance_to(next) {
            return Err(FlowError::Checkpoint(format!(
                "illegal transition {phase:?} -> {next:?}"
            )));
        }
        *phase = next;
        self.checkpoints.record(self.checkpoint(next, context)).await
    }

    fn checkpoint(&self, phase: InitiatorPhase, context: Vec<u8>) -> FlowCheckpoint {
        FlowCheckpoint::new(
            self.flow_id,
            FlowPhase::Initiator(phase),
            self.correlation_id,
            context,
        )
    }

    async fn mark_failed(&self) {
        let record = self.checkpoint(InitiatorPhase::Failed, Vec::new());
        if let Err(e) = self.checkpoints.record(record).await {
            tracing::error!(flow_id = %self.flow_id, error = %e, "failed to record Failed checkpoint");
        }
    }
}
