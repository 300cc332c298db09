//! Fixtures for multi-party flow scenarios: nodes with their own vault
//! and checkpoint store, joined to one in-process notary.

use ed25519_dalek::SigningKey;
use pact_finance::{
    CashIssueAssembler, CashPaymentChecker, CashReceiptChecker, CashTransferAssembler,
    CurrencyValidator, IssuanceRequest, TransferRequest, TransferRequestValidator,
};
use pact_flow::adapters::{
    session_pair, InMemoryCheckpointStore, InProcessNotary, SessionSignatureCollector, VaultLedger,
};
use pact_flow::{FlowConfig, FlowResult, InitiatorFlow, ResponderFlow};
use rand::rngs::OsRng;
use shared_types::{Party, SignedTransaction};
use std::sync::Arc;

/// One participant: identity key, vault-backed ledger, checkpoint store.
pub struct Node {
    pub key: SigningKey,
    pub party: Party,
    pub ledger: Arc<VaultLedger>,
    pub checkpoints: Arc<InMemoryCheckpointStore>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let party = Party::new(key.verifying_key().to_bytes(), name);
        Self {
            ledger: Arc::new(VaultLedger::new(vec![party.public_key])),
            checkpoints: Arc::new(InMemoryCheckpointStore::new()),
            key,
            party,
        }
    }
}

/// A set of participants sharing one uniqueness notary.
pub struct Network {
    pub notary_party: Party,
    pub notary: Arc<InProcessNotary>,
}

impl Network {
    pub fn new() -> Self {
        let notary_party = Party::new([0xEE; 32], "Notary");
        Self {
            notary: Arc::new(InProcessNotary::new(notary_party.clone())),
            notary_party,
        }
    }

    /// Create a node and register its vault for committed transactions.
    pub fn join(&self, name: &str) -> Node {
        let node = Node::new(name);
        self.notary.register(node.ledger.clone());
        node
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a full issuance: `holder` initiates, `issuer` responds.
///
/// Returns both sides' outcomes so callers can assert success or the
/// exact failure on each end.
pub async fn run_issuance(
    net: &Network,
    issuer: &Node,
    holder: &Node,
    accepted: Vec<String>,
    amount: u64,
    currency: &str,
) -> (
    FlowResult<SignedTransaction>,
    FlowResult<SignedTransaction>,
) {
    let (holder_session, issuer_session) =
        session_pair(holder.party.clone(), issuer.party.clone(), 16);

    let responder: ResponderFlow<IssuanceRequest, IssuanceRequest> = ResponderFlow::new(
        FlowConfig::default(),
        Arc::new(CurrencyValidator::new(issuer.party.name.clone(), accepted)),
        Arc::new(CashIssueAssembler::new(
            issuer.key.clone(),
            net.notary_party.clone(),
        )),
        Arc::new(SessionSignatureCollector),
        net.notary.clone(),
        issuer.checkpoints.clone(),
    );
    let responder_task = tokio::spawn(async move { responder.run(&issuer_session).await });

    let initiator = InitiatorFlow::new(
        FlowConfig::default(),
        holder.key.clone(),
        Arc::new(CashReceiptChecker::new(
            holder.party.public_key,
            amount,
            currency,
        )),
        holder.ledger.clone(),
        holder.checkpoints.clone(),
    );
    let initiated = initiator
        .run(
            &holder_session,
            IssuanceRequest {
                amount,
                currency: currency.into(),
            },
        )
        .await;
    let responded = responder_task.await.expect("responder task panicked");
    (initiated, responded)
}

/// Drive a full transfer: `recipient` initiates, `payer` responds by
/// spending from its own vault.
pub async fn run_transfer(
    net: &Network,
    payer: &Node,
    recipient: &Node,
    amount: u64,
    currency: &str,
) -> (
    FlowResult<SignedTransaction>,
    FlowResult<SignedTransaction>,
) {
    let (recipient_session, payer_session) =
        session_pair(recipient.party.clone(), payer.party.clone(), 16);

    let responder: ResponderFlow<TransferRequest, TransferRequest> = ResponderFlow::new(
        FlowConfig::default(),
        Arc::new(TransferRequestValidator::new(payer.party.name.clone())),
        Arc::new(CashTransferAssembler::new(
            payer.key.clone(),
            net.notary_party.clone(),
            payer.ledger.clone(),
        )),
        Arc::new(SessionSignatureCollector),
        net.notary.clone(),
        payer.checkpoints.clone(),
    );
    let responder_task = tokio::spawn(async move { responder.run(&payer_session).await });

    let initiator = InitiatorFlow::new(
        FlowConfig::default(),
        recipient.key.clone(),
        Arc::new(CashPaymentChecker::new(
            recipient.party.public_key,
            amount,
            currency,
        )),
        recipient.ledger.clone(),
        recipient.checkpoints.clone(),
    );
    let initiated = initiator
        .run(
            &recipient_session,
            TransferRequest {
                amount,
                currency: currency.into(),
            },
        )
        .await;
    let responded = responder_task.await.expect("responder task panicked");
    (initiated, responded)
}

/// Total unconsumed cash a node holds in one currency.
pub fn holdings(node: &Node, currency: &str) -> u64 {
    node.ledger
        .unconsumed()
        .expect("vault scan failed")
        .iter()
        .filter(|(_, s)| s.state_type == pact_finance::CASH_STATE_TYPE)
        .filter_map(|(_, s)| pact_finance::Cash::from_data(&s.state_data).ok())
        .filter(|c| c.currency == currency)
        .map(|c| c.amount)
        .sum()
}
