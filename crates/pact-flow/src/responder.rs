//! Accepting role of the bilateral exchange.
//!
//! Given a handshake from an initiating party: validate it, assemble
//! and co-sign the shared transaction, drive signature collection and
//! finality, forward to observers, and notify the initiator.

use crate::config::FlowConfig;
use crate::domain::checkpoint::{FlowCheckpoint, FlowPhase, ResponderPhase};
use crate::domain::messages::FlowMessage;
use crate::error::{FlowError, FlowResult};
use crate::ports::outbound::{
    CheckpointStore, FinalityGateway, SignatureCollector, TransactionObserver,
};
use crate::ports::session::FlowSession;
use crate::ports::strategy::{HandshakeValidator, TransactionAssembler};
use serde::de::DeserializeOwned;
use shared_types::{Handshake, PartySignature, SignedTransaction};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// The accepting-role engine, generic over the raw handshake payload
/// `U` and the validated proposal `P`.
///
/// Validation and assembly are injected strategies; the suspension,
/// signature-collection, and finality skeleton is shared across every
/// concrete agreement type.
pub struct ResponderFlow<U, P> {
    flow_id: Uuid,
    correlation_id: Uuid,
    config: FlowConfig,
    validator: Arc<dyn HandshakeValidator<U, P>>,
    assembler: Arc<dyn TransactionAssembler<P>>,
    collector: Arc<dyn SignatureCollector>,
    finality: Arc<dyn FinalityGateway>,
    observers: Vec<Arc<dyn TransactionObserver>>,
    checkpoints: Arc<dyn CheckpointStore>,
    _payload: PhantomData<fn() -> (U, P)>,
}

impl<U, P> ResponderFlow<U, P>
where
    U: DeserializeOwned + Send + Sync + 'static,
    P: Send + Sync + 'static,
{
    pub fn new(
        config: FlowConfig,
        validator: Arc<dyn HandshakeValidator<U, P>>,
        assembler: Arc<dyn TransactionAssembler<P>>,
        collector: Arc<dyn SignatureCollector>,
        finality: Arc<dyn FinalityGateway>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            config,
            validator,
            assembler,
            collector,
            finality,
            observers: Vec::new(),
            checkpoints,
            _payload: PhantomData,
        }
    }

    /// Register an auxiliary observer for best-effort forwarding.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn TransactionObserver>) -> Self {
        self.observers.push(observer);
        self
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
    pub async fn run(&self, session: &dyn FlowSession) -> FlowResult<SignedTransaction> {
        match self.drive(session).await {
            Ok(stx) => Ok(stx),
            Err(e) => {
                self.mark_failed().await;
                self.release_assembly().await;
                Err(e)
            }
        }
    }

    /// Resume a crashed flow from its latest checkpoint.
    ///
    /// Phases before signing cannot be resumed (the handshake is gone
    /// with the crashed instance); the initiator starts a fresh flow.
    /// From collection onward the checkpoint context carries the
    /// assembled transaction, and finality re-submission is idempotent
    /// because recording is insert-once on the transaction id.
    pub async fn resume(&self, session: &dyn FlowSession) -> FlowResult<SignedTransaction> {
        let result = self.drive_resume(session).await;
        if result.is_err() {
            self.mark_failed().await;
            self.release_assembly().await;
        }
        result
    }

    async fn drive(&self, session: &dyn FlowSession) -> FlowResult<SignedTransaction> {
        let mut phase = ResponderPhase::Receiving;
        self.checkpoints
            .record(self.checkpoint(phase, Vec::new()))
            .await?;

        let handshake: Handshake<U> = match self.recv(session, "Propose").await? {
            FlowMessage::Propose { handshake } => {
                bincode::deserialize(&handshake).map_err(|e| FlowError::Codec(e.to_string()))?
            }
            FlowMessage::Reject { reason } => {
                return Err(FlowError::rejected(
                    session.counterparty().name.clone(),
                    reason,
                ))
            }
            other => {
                return Err(FlowError::UnexpectedMessage {
                    expected: "Propose",
                    got: other.kind(),
                })
            }
        };
        tracing::debug!(flow_id = %self.flow_id, from = %session.counterparty(), "handshake received");

        self.advance(&mut phase, ResponderPhase::Validating, Vec::new())
            .await?;
        let proposal = match self.validator.validate(handshake).await {
            Ok(p) => p,
            Err(rejection) => {
                let _ = session
                    .send(FlowMessage::Reject {
                        reason: rejection.to_string(),
                    })
                    .await;
                return Err(rejection);
            }
        };

        self.advance(&mut phase, ResponderPhase::Signing, Vec::new())
            .await?;
        let assembly = match self.assembler.assemble(&proposal, session.counterparty()).await {
            Ok(a) => a,
            Err(rejection) => {
                let _ = session
                    .send(FlowMessage::Reject {
                        reason: rejection.to_string(),
                    })
                    .await;
                return Err(rejection);
            }
        };

        let core = assembly.builder.build()?;
        let tx_id = core.id();
        let mut stx = SignedTransaction::new(core);
        for key in &assembly.signing_keys {
            stx = stx.with_signature(PartySignature::create(key, &tx_id));
        }
        for sig in assembly.extra_signatures {
            // Pre-existing signatures must already cover this content.
            sig.verify(&tx_id)?;
            stx = stx.with_signature(sig);
        }

        let context = encode(&stx)?;
        self.advance(&mut phase, ResponderPhase::CollectingSignatures, context)
            .await?;
        let stx = self.collect(session, stx).await?;

        let context = encode(&stx)?;
        self.advance(&mut phase, ResponderPhase::Recording, context)
            .await?;
        let stx = self.record(session, stx).await?;

        let context = encode(&stx)?;
        self.advance(&mut phase, ResponderPhase::Forwarding, context)
            .await?;
        let stx = self.forward_and_notify(session, stx).await?;

        self.advance(&mut phase, ResponderPhase::Complete, Vec::new())
            .await?;
        tracing::info!(flow_id = %self.flow_id, tx_id = ?stx.id(), "flow complete");
        Ok(stx)
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
            FlowPhase::Responder(p) => p,
            other => {
                return Err(FlowError::NotResumable {
                    phase: other.to_string(),
                })
            }
        };
        tracing::info!(flow_id = %self.flow_id, phase = %checkpoint.phase, "resuming flow");

        let stx: SignedTransaction = match phase {
            ResponderPhase::CollectingSignatures
            | ResponderPhase::Recording
            | ResponderPhase::Forwarding => bincode::deserialize(&checkpoint.context)
                .map_err(|e| FlowError::Codec(e.to_string()))?,
            other => {
                return Err(FlowError::NotResumable {
                    phase: FlowPhase::Responder(other).to_string(),
                })
            }
        };

        let stx = if phase == ResponderPhase::CollectingSignatures {
            let collected = self.collect(session, stx).await?;
            let context = encode(&collected)?;
            self.advance(&mut phase, ResponderPhase::Recording, context)
                .await?;
            collected
        } else {
            stx
        };

        let stx = if phase == ResponderPhase::Recording {
            let recorded = self.record(session, stx).await?;
            let context = encode(&recorded)?;
            self.advance(&mut phase, ResponderPhase::Forwarding, context)
                .await?;
            recorded
        } else {
            stx
        };

        let stx = self.forward_and_notify(session, stx).await?;
        self.advance(&mut phase, ResponderPhase::Complete, Vec::new())
            .await?;
        Ok(stx)
    }

    /// Delegate to the signature-collection sub-protocol, then verify
    /// the result covers exactly the transaction we proposed.
    async fn collect(
        &self,
        session: &dyn FlowSession,
        stx: SignedTransaction,
    ) -> FlowResult<SignedTransaction> {
        let proposed_id = stx.id();
        let collected = self
            .bounded(self.collector.collect(stx, session), "signature collection")
            .await?;

        if collected.id() != proposed_id {
            return Err(FlowError::UnexpectedMessage {
                expected: "signatures over the proposed transaction",
                got: "a substituted transaction",
            });
        }
        collected.verify_complete()?;
        Ok(collected)
    }

    /// Delegate to the finality sub-protocol. Its failures (notary
    /// conflict included) propagate unchanged.
    async fn record(
        &self,
        session: &dyn FlowSession,
        stx: SignedTransaction,
    ) -> FlowResult<SignedTransaction> {
        let notify = vec![session.counterparty().clone()];
        self.bounded(self.finality.finalize(stx, &notify), "finality")
            .await
    }

    /// Best-effort observer forwarding, then the finality notice back
    /// to the initiator.
    async fn forward_and_notify(
        &self,
        session: &dyn FlowSession,
        stx: SignedTransaction,
    ) -> FlowResult<SignedTransaction> {
        for observer in &self.observers {
            if let Err(e) = observer.on_finalized(&stx).await {
                tracing::warn!(
                    flow_id = %self.flow_id,
                    observer = observer.name(),
                    error = %e,
                    "observer forwarding failed; transaction remains committed"
                );
            }
        }

        session
            .send(FlowMessage::FinalityNotice { tx_id: stx.id() })
            .await?;
        Ok(stx)
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

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = FlowResult<T>> + Send,
        awaiting: &'static str,
    ) -> FlowResult<T> {
        tokio::time::timeout(self.config.exchange_timeout, fut)
            .await
            .map_err(|_| FlowError::Timeout { awaiting })?
    }

    async fn advance(
        &self,
        phase: &mut ResponderPhase,
        next: ResponderPhase,
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

    fn checkpoint(&self, phase: ResponderPhase, context: Vec<u8>) -> FlowCheckpoint {
        FlowCheckpoint::new(
            self.flow_id,
            FlowPhase::Responder(phase),
            self.correlation_id,
            context,
        )
    }

    async fn mark_failed(&self) {
        let record = self.checkpoint(ResponderPhase::Failed, Vec::new());
        if let Err(e) = self.checkpoints.record(record).await {
            tracing::error!(flow_id = %self.flow_id, error = %e, "failed to record Failed checkpoint");
        }
    }

    /// A dead flow must not keep the assembler's reservations alive; a
    /// notary conflict in particular leaves soft-locked inputs the
    /// conflicting transaction never consumed.
    async fn release_assembly(&self) {
        if let Err(e) = self.assembler.abandon().await {
            tracing::warn!(flow_id = %self.flow_id, error = %e, "failed to release assembler reservations");
        }
    }
}

fn encode(stx: &SignedTransaction) -> FlowResult<Vec<u8>> {
    bincode::serialize(stx).map_err(|e| FlowError::Codec(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        session_pair, InMemoryCheckpointStore, InProcessNotary, SessionSignatureCollector,
        VaultLedger,
    };
    use crate::config::FlowConfig;
    use crate::domain::checkpoint::InitiatorPhase;
    use crate::initiator::InitiatorFlow;
    use crate::ports::outbound::TransactionObserver;
    use crate::ports::strategy::{Assembly, ProposalChecker};
    use ed25519_dalek::SigningKey;
    use rand::rngs::OsRng;
    use shared_types::{Command, OutputState, Party, TransactionBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn keypair(name: &str) -> (SigningKey, Party) {
        let key = SigningKey::generate(&mut OsRng);
        let party = Party::new(key.verifying_key().to_bytes(), name);
        (key, party)
    }

    /// Accepts any issuance of a positive amount.
    struct PositiveAmount;

    #[async_trait::async_trait]
    impl HandshakeValidator<u64, u64> for PositiveAmount {
        async fn validate(&self, handshake: Handshake<u64>) -> FlowResult<u64> {
            if handshake.payload == 0 {
                return Err(FlowError::rejected("Responder", "zero amount"));
            }
            Ok(handshake.payload)
        }
    }

    /// Issues the requested amount to the counterparty, co-signed by
    /// both parties.
    struct IssueAssembler {
        key: SigningKey,
        notary: Party,
    }

    #[async_trait::async_trait]
    impl TransactionAssembler<u64> for IssueAssembler {
        async fn assemble(&self, amount: &u64, counterparty: &Party) -> FlowResult<Assembly> {
            let mut builder = TransactionBuilder::new(self.notary.clone());
            builder
                .add_output(OutputState {
                    state_type: "test.Cash".into(),
                    data: amount.to_le_bytes().to_vec(),
                    owner: counterparty.public_key,
                })
                .add_command(Command {
                    name: "Issue".into(),
                    signers: vec![
                        self.key.verifying_key().to_bytes(),
                        counterparty.public_key,
                    ],
                });
            Ok(Assembly {
                builder,
                signing_keys: vec![self.key.clone()],
                extra_signatures: Vec::new(),
            })
        }
    }

    struct AcceptAll;

    #[async_trait::async_trait]
    impl ProposalChecker for AcceptAll {
        async fn check_proposal(&self, _stx: &SignedTransaction) -> FlowResult<()> {
            Ok(())
        }
    }

    struct FlakyObserver {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TransactionObserver for FlakyObserver {
        fn name(&self) -> &str {
            "flaky-regulator"
        }

        async fn on_finalized(&self, _stx: &SignedTransaction) -> FlowResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FlowError::Ledger("regulator endpoint down".into()))
        }
    }

    struct Rig {
        initiator_key: SigningKey,
        initiator_party: Party,
        responder_party: Party,
        notary: Arc<InProcessNotary>,
        initiator_ledger: Arc<VaultLedger>,
        initiator_checkpoints: Arc<InMemoryCheckpointStore>,
        responder_checkpoints: Arc<InMemoryCheckpointStore>,
    }

    impl Rig {
        fn new() -> (Self, ResponderFlow<u64, u64>) {
            let (initiator_key, initiator_party) = keypair("Alice");
            let (responder_key, responder_party) = keypair("Bob");
            let notary_party = Party::new([0xEE; 32], "Notary");

            let notary = Arc::new(InProcessNotary::new(notary_party.clone()));
            let initiator_ledger =
                Arc::new(VaultLedger::new(vec![initiator_party.public_key]));
            let responder_ledger =
                Arc::new(VaultLedger::new(vec![responder_party.public_key]));
            notary.register(initiator_ledger.clone());
            notary.register(responder_ledger.clone());

            let initiator_checkpoints = Arc::new(InMemoryCheckpointStore::new());
            let responder_checkpoints = Arc::new(InMemoryCheckpointStore::new());

            let responder = ResponderFlow::new(
                FlowConfig::default(),
                Arc::new(PositiveAmount),
                Arc::new(IssueAssembler {
                    key: responder_key,
                    notary: notary_party,
                }),
                Arc::new(SessionSignatureCollector),
                notary.clone(),
                responder_checkpoints.clone(),
            );

            let rig = Self {
                initiator_key,
                initiator_party,
                responder_party,
                notary,
                initiator_ledger,
                initiator_checkpoints,
                responder_checkpoints,
            };
            (rig, responder)
        }

        fn initiator(&self) -> InitiatorFlow {
            InitiatorFlow::new(
                FlowConfig::default(),
                self.initiator_key.clone(),
                Arc::new(AcceptAll),
                self.initiator_ledger.clone(),
                self.initiator_checkpoints.clone(),
            )
        }
    }

    #[tokio::test]
    async fn test_end_to_end_issuance() {
        let (rig, responder) = Rig::new();
        let (initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);

        let responder_task =
            tokio::spawn(async move { responder.run(&responder_session).await });

        let committed = rig
            .initiator()
            .run(&initiator_session, 1_000_000u64)
            .await
            .unwrap();
        let recorded = responder_task.await.unwrap().unwrap();

        assert_eq!(committed.id(), recorded.id());
        committed.verify_complete().unwrap();

        // The initiator's vault holds the issued state.
        let unconsumed = rig.initiator_ledger.unconsumed().unwrap();
        assert_eq!(unconsumed.len(), 1);
        assert_eq!(amount_of(&unconsumed[0].1), 1_000_000);
    }

    fn amount_of(state: &pact_vault::VaultState) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&state.state_data);
        u64::from_le_bytes(bytes)
    }

    #[tokio::test]
    async fn test_rejected_handshake_fails_both_sides_before_any_ledger_change() {
        let (rig, responder) = Rig::new();
        let (initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);

        let responder_task =
            tokio::spawn(async move { responder.run(&responder_session).await });

        let initiator_err = rig
            .initiator()
            .run(&initiator_session, 0u64)
            .await
            .unwrap_err();
        let responder_err = responder_task.await.unwrap().unwrap_err();

        assert!(matches!(initiator_err, FlowError::Rejected { .. }));
        assert!(matches!(responder_err, FlowError::Rejected { .. }));
        assert!(rig.initiator_ledger.unconsumed().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_observer_failure_does_not_unwind_the_commit() {
        let (rig, responder) = Rig::new();
        let observer = Arc::new(FlakyObserver {
            calls: AtomicUsize::new(0),
        });
        let responder = responder.with_observer(observer.clone());
        let (initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);

        let responder_task =
            tokio::spawn(async move { responder.run(&responder_session).await });

        rig.initiator()
            .run(&initiator_session, 500u64)
            .await
            .unwrap();
        responder_task.await.unwrap().unwrap();

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rig.initiator_ledger.unconsumed().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkpoints_advance_monotonically() {
        let (rig, responder) = Rig::new();
        let (initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);

        let responder_id = responder.flow_id();
        let responder_task =
            tokio::spawn(async move { responder.run(&responder_session).await });

        let initiator = rig.initiator();
        let initiator_id = initiator.flow_id();
        initiator.run(&initiator_session, 42u64).await.unwrap();
        responder_task.await.unwrap().unwrap();

        let history = rig
            .responder_checkpoints
            .history(responder_id)
            .await
            .unwrap();
        let phases: Vec<FlowPhase> = history.iter().map(|c| c.phase).collect();
        assert_eq!(
            phases.first(),
            Some(&FlowPhase::Responder(ResponderPhase::Receiving))
        );
        assert_eq!(
            phases.last(),
            Some(&FlowPhase::Responder(ResponderPhase::Complete))
        );
        assert!(history.windows(2).all(|w| w[0].updated_at <= w[1].updated_at));

        let latest = rig
            .initiator_checkpoints
            .latest(initiator_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.phase, FlowPhase::Initiator(InitiatorPhase::Complete));
    }

    #[tokio::test]
    async fn test_resume_from_recording_re_submits_idempotently() {
        let (rig, responder) = Rig::new();

        // Assemble and fully sign a transaction out of band.
        let (responder_key, _) = keypair("BobAgain");
        let mut builder = TransactionBuilder::new(rig.notary.identity().clone());
        builder
            .add_output(OutputState {
                state_type: "test.Cash".into(),
                data: 77u64.to_le_bytes().to_vec(),
                owner: rig.initiator_party.public_key,
            })
            .add_command(Command {
                name: "Issue".into(),
                signers: vec![
                    responder_key.verifying_key().to_bytes(),
                    rig.initiator_party.public_key,
                ],
            });
        let core = builder.build().unwrap();
        let tx_id = core.id();
        let stx = SignedTransaction::new(core)
            .with_signature(PartySignature::create(&responder_key, &tx_id))
            .with_signature(PartySignature::create(&rig.initiator_key, &tx_id));

        // A crash left the flow checkpointed mid-recording.
        let flow_id = responder.flow_id();
        rig.responder_checkpoints
            .record(FlowCheckpoint::new(
                flow_id,
                FlowPhase::Responder(ResponderPhase::Recording),
                Uuid::new_v4(),
                bincode::serialize(&stx).unwrap(),
            ))
            .await
            .unwrap();

        let (initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);
        let resumed = tokio::spawn(async move { responder.resume(&responder_session).await });

        // The initiator side only needs to absorb the finality notice.
        match initiator_session.receive().await.unwrap() {
            FlowMessage::FinalityNotice { tx_id: noticed } => assert_eq!(noticed, tx_id),
            other => panic!("unexpected message {}", other.kind()),
        }
        let recorded = resumed.await.unwrap().unwrap();
        assert_eq!(recorded.id(), tx_id);
        assert_eq!(rig.initiator_ledger.unconsumed().unwrap().len(), 1);
    }

    /// Refuses to order anything, as if every input were already spent.
    struct ConflictingNotary;

    #[async_trait::async_trait]
    impl FinalityGateway for ConflictingNotary {
        async fn finalize(
            &self,
            _stx: SignedTransaction,
            _notify: &[Party],
        ) -> FlowResult<SignedTransaction> {
            Err(FlowError::NotaryConflict {
                conflicting_tx: [0xAB; 32],
            })
        }
    }

    struct TrackingAssembler {
        inner: IssueAssembler,
        abandoned: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TransactionAssembler<u64> for TrackingAssembler {
        async fn assemble(&self, amount: &u64, counterparty: &Party) -> FlowResult<Assembly> {
            self.inner.assemble(amount, counterparty).await
        }

        async fn abandon(&self) -> FlowResult<()> {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_finality_abandons_the_assembly() {
        let (initiator_key, initiator_party) = keypair("Alice");
        let (responder_key, responder_party) = keypair("Bob");
        let notary_party = Party::new([0xEE; 32], "Notary");

        let assembler = Arc::new(TrackingAssembler {
            inner: IssueAssembler {
                key: responder_key,
                notary: notary_party,
            },
            abandoned: AtomicUsize::new(0),
        });
        let responder: ResponderFlow<u64, u64> = ResponderFlow::new(
            FlowConfig::default(),
            Arc::new(PositiveAmount),
            assembler.clone(),
            Arc::new(SessionSignatureCollector),
            Arc::new(ConflictingNotary),
            Arc::new(InMemoryCheckpointStore::new()),
        );

        let (initiator_session, responder_session) =
            session_pair(initiator_party.clone(), responder_party, 8);
        let responder_task =
            tokio::spawn(async move { responder.run(&responder_session).await });

        let initiator = InitiatorFlow::new(
            FlowConfig::default(),
            initiator_key,
            Arc::new(AcceptAll),
            Arc::new(VaultLedger::new(vec![initiator_party.public_key])),
            Arc::new(InMemoryCheckpointStore::new()),
        );
        // The initiator never sees finality; its own error is not the
        // subject here.
        let _ = initiator.run(&initiator_session, 900u64).await;

        let err = responder_task.await.unwrap().unwrap_err();
        assert!(matches!(err, FlowError::NotaryConflict { .. }));
        assert_eq!(assembler.abandoned.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resume_before_signing_is_refused() {
        let (rig, responder) = Rig::new();
        let flow_id = responder.flow_id();
        rig.responder_checkpoints
            .record(FlowCheckpoint::new(
                flow_id,
                FlowPhase::Responder(ResponderPhase::Validating),
                Uuid::new_v4(),
                Vec::new(),
            ))
            .await
            .unwrap();

        let (_initiator_session, responder_session) =
            session_pair(rig.initiator_party.clone(), rig.responder_party.clone(), 8);
        let err = responder.resume(&responder_session).await.unwrap_err();
        assert!(matches!(err, FlowError::NotResumable { .. }));
    }
}
