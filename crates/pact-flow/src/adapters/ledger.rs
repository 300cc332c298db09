//! Vault-backed ledger access for one node.

use crate::error::{FlowError, FlowResult};
use crate::ports::outbound::LedgerReader;
use async_trait::async_trait;
use pact_cache::adapters::InMemoryStore;
use pact_vault::{TxRow, Vault, VaultResult, VaultRow, VaultSession};
use shared_types::{Hash, PublicKey, SignedTransaction};
use uuid::Uuid;

/// One node's vault together with its backing row stores.
///
/// Bundles the pieces a flow needs from the ledger side: session
/// construction, transaction recording, and read access behind the
/// `LedgerReader` port.
pub struct VaultLedger {
    vault: Vault,
    state_store: InMemoryStore<VaultRow>,
    tx_store: InMemoryStore<TxRow>,
}

impl VaultLedger {
    pub fn new(our_keys: Vec<PublicKey>) -> Self {
        Self {
            vault: Vault::new(our_keys),
            state_store: InMemoryStore::new(),
            tx_store: InMemoryStore::new(),
        }
    }

    /// Run a closure inside a fresh pair of store sessions.
    pub fn with_session<T>(&self, f: impl FnOnce(&Vault, &VaultSession<'_>) -> T) -> T {
        let states = self.state_store.session();
        let txs = self.tx_store.session();
        let session = VaultSession {
            states: &states,
            txs: &txs,
        };
        f(&self.vault, &session)
    }

    /// Record a committed transaction into this node's vault.
    pub fn record(&self, stx: &SignedTransaction) -> VaultResult<bool> {
        self.with_session(|vault, session| vault.record_transaction(session, stx))
    }

    pub fn transaction(&self, tx_id: &Hash) -> VaultResult<Option<SignedTransaction>> {
        self.with_session(|vault, session| vault.get_transaction(session, tx_id))
    }

    /// Reserve unconsumed states for an in-flight flow.
    pub fn reserve(&self, lock_id: Uuid, refs: &[shared_types::StateRef]) -> VaultResult<()> {
        self.with_session(|vault, session| vault.soft_lock_reserve(session, lock_id, refs))
    }

    /// Release soft locks held by a flow; empty `refs` releases all.
    pub fn release(&self, lock_id: Uuid, refs: &[shared_types::StateRef]) -> VaultResult<()> {
        self.with_session(|vault, session| vault.soft_lock_release(session, lock_id, refs))
    }

    /// Unconsumed states a flow may select, honouring soft locks.
    pub fn selectable(
        &self,
        flow: Uuid,
    ) -> VaultResult<Vec<(shared_types::StateRef, pact_vault::VaultState)>> {
        self.with_session(|vault, session| vault.selectable_states(session, flow))
    }

    pub fn unconsumed(
        &self,
    ) -> VaultResult<Vec<(shared_types::StateRef, pact_vault::VaultState)>> {
        self.with_session(|vault, session| vault.unconsumed_states(session))
    }

    pub fn consumed(
        &self,
    ) -> VaultResult<Vec<(shared_types::StateRef, pact_vault::VaultState)>> {
        self.with_session(|vault, session| vault.consumed_states(session))
    }
}

#[async_trait]
impl LedgerReader for VaultLedger {
    async fn transaction_by_id(&self, tx_id: &Hash) -> FlowResult<Option<SignedTransaction>> {
        self.transaction(tx_id)
            .map_err(|e| FlowError::Ledger(e.to_string()))
    }
}
