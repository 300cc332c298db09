//! Single-node uniqueness notary with in-process recording.

use crate::adapters::ledger::VaultLedger;
use crate::domain::checkpoint::unix_now;
use crate::error::{FlowError, FlowResult};
use crate::ports::outbound::FinalityGateway;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Hash, Party, SignedTransaction, StateRef};
use std::collections::HashMap;
use std::sync::Arc;

/// Orders transactions by refusing any that consumes an input already
/// consumed by a different transaction, then records the committed
/// transaction into every registered participant vault.
///
/// Re-submitting an already-notarised transaction is accepted: spent
/// markers point at the consuming transaction id, so a retry of the
/// same transaction is indistinguishable from the first attempt, and
/// vault recording is insert-once downstream.
pub struct InProcessNotary {
    identity: Party,
    spent: Mutex<HashMap<StateRef, Hash>>,
    participants: Mutex<Vec<Arc<VaultLedger>>>,
}

impl InProcessNotary {
    pub fn new(identity: Party) -> Self {
        Self {
            identity,
            spent: Mutex::new(HashMap::new()),
            participants: Mutex::new(Vec::new()),
        }
    }

    pub fn identity(&self) -> &Party {
        &self.identity
    }

    /// Register a participant vault to receive committed transactions.
    pub fn register(&self, ledger: Arc<VaultLedger>) {
        self.participants.lock().push(ledger);
    }

    /// Check input uniqueness and mark the inputs spent, atomically.
    fn order(&self, tx_id: Hash, inputs: &[StateRef]) -> FlowResult<()> {
        let mut spent = self.spent.lock();
        for input in inputs {
            if let Some(&prior) = spent.get(input) {
                if prior != tx_id {
                    tracing::warn!(
                        input = ?input,
                        conflicting_tx = ?prior,
                        "notary refused double-spend"
                    );
                    return Err(FlowError::NotaryConflict {
                        conflicting_tx: prior,
                    });
                }
            }
        }
        for input in inputs {
            spent.insert(*input, tx_id);
        }
        Ok(())
    }
}

#[async_trait]
impl FinalityGateway for InProcessNotary {
    async fn finalize(
        &self,
        stx: SignedTransaction,
        notify: &[Party],
    ) -> FlowResult<SignedTransaction> {
        stx.verify_complete()?;
        let tx_id = stx.id();

        if let Some(window) = &stx.core.time_window {
            if !window.contains(unix_now()) {
                return Err(FlowError::rejected(
                    self.identity.name.clone(),
                    "transaction time window has closed",
                ));
            }
        }

        self.order(tx_id, &stx.core.inputs)?;

        for ledger in self.participants.lock().iter() {
            ledger
                .record(&stx)
                .map_err(|e| FlowError::Ledger(e.to_string()))?;
        }
        tracing::info!(
            tx_id = ?tx_id,
            inputs = stx.core.inputs.len(),
            notified = notify.len(),
            "transaction notarised and recorded"
        );
        Ok(stx)
    }
}
