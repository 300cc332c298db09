//! Vault service - ledger bookkeeping over the persistent cache.

use crate::domain::{
    StateRowMapper, StateStatus, StoredTx, TxRow, TxRowMapper, VaultRow, VaultState,
};
use crate::errors::{VaultError, VaultResult};
use pact_cache::{PersistentMap, SessionContext};
use shared_types::{Hash, PublicKey, SignedTransaction, StateRef};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The ambient sessions a vault operation runs inside: one per backing
/// row store, both scoped to the caller's current transaction.
pub struct VaultSession<'a> {
    pub states: &'a dyn SessionContext<VaultRow>,
    pub txs: &'a dyn SessionContext<TxRow>,
}

/// The vault state ledger for one node.
///
/// Holds states owned by any of the node's keys, tracks their
/// lifecycle, and records every committed transaction exactly once.
pub struct Vault {
    /// Keys under this node's control; outputs owned by other keys are
    /// not relevant and are not stored.
    our_keys: Vec<PublicKey>,
    states: PersistentMap<StateRef, VaultState, VaultRow, StateRowMapper>,
    txs: PersistentMap<Hash, StoredTx, TxRow, TxRowMapper>,
}

impl Vault {
    pub fn new(our_keys: Vec<PublicKey>) -> Self {
        Self {
            our_keys,
            states: PersistentMap::new("vault_states", StateRowMapper),
            txs: PersistentMap::new("vault_txs", TxRowMapper),
        }
    }

    /// Record a committed transaction: store it once, consume its
    /// inputs, and store its relevant outputs as unconsumed states.
    ///
    /// Returns `false` when the transaction id was already recorded; the
    /// duplicate is a warning (idempotent re-submission is expected in a
    /// distributed setting) and the ledger is left untouched.
    pub fn record_transaction(
        &self,
        session: &VaultSession<'_>,
        stx: &SignedTransaction,
    ) -> VaultResult<bool> {
        let tx_id = stx.id();
        let now = unix_now();

        let encoded = bincode::serialize(stx).map_err(|e| VaultError::Decode(e.to_string()))?;
        let fresh = self.txs.insert_unique(
            session.txs,
            &tx_id,
            StoredTx {
                stx_bytes: encoded,
                recorded_at: now,
            },
        )?;
        if !fresh {
            // insert_unique already warned with the identifying context.
            return Ok(false);
        }

        for input in &stx.core.inputs {
            if let Some(mut state) = self.states.get(session.states, input)? {
                state.status = StateStatus::Consumed;
                state.consumed_at = Some(now);
                state.lock_id = None;
                state.locked_at = None;
                self.states.put(session.states, input, state)?;
            }
        }

        let mut produced = 0usize;
        for (index, output) in stx.core.outputs.iter().enumerate() {
            if !self.is_ours(&output.owner) {
                continue;
            }
            let state_ref = StateRef::new(tx_id, index as u32);
            self.states.put(
                session.states,
                &state_ref,
                VaultState {
                    notary_key: stx.core.notary.public_key,
                    state_type: output.state_type.clone(),
                    state_data: output.data.clone(),
                    owner: output.owner,
                    status: StateStatus::Unconsumed,
                    recorded_at: now,
                    consumed_at: None,
                    lock_id: None,
                    locked_at: None,
                },
            )?;
            produced += 1;
        }

        tracing::info!(
            tx_id = ?tx_id,
            consumed = stx.core.inputs.len(),
            produced,
            "transaction recorded"
        );
        Ok(true)
    }

    /// Resolve a committed transaction from the local ledger.
    pub fn get_transaction(
        &self,
        session: &VaultSession<'_>,
        tx_id: &Hash,
    ) -> VaultResult<Option<SignedTransaction>> {
        match self.txs.get(session.txs, tx_id)? {
            Some(stored) => {
                let stx = bincode::deserialize(&stored.stx_bytes)
                    .map_err(|e| VaultError::Decode(e.to_string()))?;
                Ok(Some(stx))
            }
            None => Ok(None),
        }
    }

    /// All unconsumed states, by filtered store scan.
    pub fn unconsumed_states(
        &self,
        session: &VaultSession<'_>,
    ) -> VaultResult<Vec<(StateRef, VaultState)>> {
        Ok(self
            .states
            .entries_where(session.states, &|row| {
                row.state.status == StateStatus::Unconsumed
            })?)
    }

    /// All consumed states, by filtered store scan.
    pub fn consumed_states(
        &self,
        session: &VaultSession<'_>,
    ) -> VaultResult<Vec<(StateRef, VaultState)>> {
        Ok(self
            .states
            .entries_where(session.states, &|row| {
                row.state.status == StateStatus::Consumed
            })?)
    }

    /// Unconsumed states the given flow may select as inputs: unlocked,
    /// or already locked by that flow itself.
    pub fn selectable_states(
        &self,
        session: &VaultSession<'_>,
        flow: Uuid,
    ) -> VaultResult<Vec<(StateRef, VaultState)>> {
        Ok(self
            .states
            .entries_where(session.states, &|row| row.state.selectable_by(flow))?)
    }

    /// Reserve states for an in-flight flow.
    ///
    /// At most one active lock owner per state row. On any failure the
    /// locks already taken by this call are released before the error
    /// surfaces, so a failed reservation leaves no residue.
    pub fn soft_lock_reserve(
        &self,
        session: &VaultSession<'_>,
        lock_id: Uuid,
        refs: &[StateRef],
    ) -> VaultResult<()> {
        let mut acquired: Vec<StateRef> = Vec::new();
        for state_ref in refs {
            match self.try_lock_one(session, lock_id, state_ref) {
                Ok(()) => acquired.push(*state_ref),
                Err(e) => {
                    self.soft_lock_release(session, lock_id, &acquired)?;
                    return Err(e);
                }
            }
        }
        tracing::debug!(%lock_id, count = refs.len(), "soft locks reserved");
        Ok(())
    }

    /// Release soft locks held by `lock_id`. An empty `refs` slice
    /// releases every lock the flow holds (the abandonment sweep path).
    pub fn soft_lock_release(
        &self,
        session: &VaultSession<'_>,
        lock_id: Uuid,
        refs: &[StateRef],
    ) -> VaultResult<()> {
        let targets: Vec<StateRef> = if refs.is_empty() {
            self.states
                .entries_where(session.states, &|row| row.state.lock_id == Some(lock_id))?
                .into_iter()
                .map(|(r, _)| r)
                .collect()
        } else {
            refs.to_vec()
        };

        for state_ref in &targets {
            if let Some(mut state) = self.states.get(session.states, state_ref)? {
                if state.lock_id == Some(lock_id) {
                    state.lock_id = None;
                    state.locked_at = None;
                    self.states.put(session.states, state_ref, state)?;
                }
            }
        }
        tracing::debug!(%lock_id, count = targets.len(), "soft locks released");
        Ok(())
    }

    fn try_lock_one(
        &self,
        session: &VaultSession<'_>,
        lock_id: Uuid,
        state_ref: &StateRef,
    ) -> VaultResult<()> {
        let mut state = self
            .states
            .get(session.states, state_ref)?
            .ok_or(VaultError::UnknownState(*state_ref))?;

        if state.status == StateStatus::Consumed {
            return Err(VaultError::StateConsumed(*state_ref));
        }
        if let Some(holder) = state.lock_id {
            if holder != lock_id {
                return Err(VaultError::StateLocked {
                    state: *state_ref,
                    holder,
                });
            }
            return Ok(()); // already ours
        }

        state.lock_id = Some(lock_id);
        state.locked_at = Some(unix_now());
        self.states.put(session.states, state_ref, state)?;
        Ok(())
    }

    fn is_ours(&self, key: &PublicKey) -> bool {
        self.our_keys.contains(key)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
