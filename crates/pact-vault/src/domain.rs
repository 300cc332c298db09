//! Vault row shapes and their cache translations.

use pact_cache::{PersistedEntity, RowMapper};
use serde::{Deserialize, Serialize};
use shared_types::{Hash, PublicKey, StateRef};
use uuid::Uuid;

/// Lifecycle status of a ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateStatus {
    /// Produced and not yet spent.
    Unconsumed,
    /// Spent by a later committed transaction.
    Consumed,
}

/// The logical value tracked per state: everything but the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultState {
    /// Key of the notary ordering this state.
    pub notary_key: PublicKey,
    /// Contract state type tag.
    pub state_type: String,
    /// Serialized contract state blob.
    pub state_data: Vec<u8>,
    /// Key that controls the state.
    pub owner: PublicKey,
    /// Lifecycle status.
    pub status: StateStatus,
    /// Unix seconds when the state was recorded.
    pub recorded_at: u64,
    /// Unix seconds when consumed, if consumed.
    pub consumed_at: Option<u64>,
    /// Active soft-lock owner, if reserved by an in-flight flow.
    pub lock_id: Option<Uuid>,
    /// Unix seconds when the soft lock was taken.
    pub locked_at: Option<u64>,
}

impl VaultState {
    /// Whether a flow identified by `owner` may select this state as an
    /// input: it must be unconsumed and either unlocked or locked by
    /// that same flow.
    pub fn selectable_by(&self, owner: Uuid) -> bool {
        self.status == StateStatus::Unconsumed
            && self.lock_id.map_or(true, |holder| holder == owner)
    }
}

/// Persisted row: the state reference plus the tracked value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRow {
    pub state_ref: StateRef,
    pub state: VaultState,
}

impl PersistedEntity for VaultRow {
    type Key = StateRef;

    fn key(&self) -> StateRef {
        self.state_ref
    }
}

/// Row translation for the state map: the row is the (key, value) pair.
pub struct StateRowMapper;

impl RowMapper<StateRef, VaultState, VaultRow> for StateRowMapper {
    fn to_row_key(&self, key: &StateRef) -> StateRef {
        *key
    }

    fn from_row(&self, row: &VaultRow) -> Result<(StateRef, VaultState), String> {
        Ok((row.state_ref, row.state.clone()))
    }

    fn to_row(&self, key: &StateRef, value: &VaultState) -> VaultRow {
        VaultRow {
            state_ref: *key,
            state: value.clone(),
        }
    }
}

/// A committed transaction as recorded locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTx {
    /// Bincode-encoded `SignedTransaction`.
    pub stx_bytes: Vec<u8>,
    /// Unix seconds when recorded.
    pub recorded_at: u64,
}

/// Persisted row for the recorded-transaction map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRow {
    pub tx_id: Hash,
    pub tx: StoredTx,
}

impl PersistedEntity for TxRow {
    type Key = Hash;

    fn key(&self) -> Hash {
        self.tx_id
    }
}

/// Row translation for the recorded-transaction map.
pub struct TxRowMapper;

impl RowMapper<Hash, StoredTx, TxRow> for TxRowMapper {
    fn to_row_key(&self, key: &Hash) -> Hash {
        *key
    }

    fn from_row(&self, row: &TxRow) -> Result<(Hash, StoredTx), String> {
        Ok((row.tx_id, row.tx.clone()))
    }

    fn to_row(&self, key: &Hash, value: &StoredTx) -> TxRow {
        TxRow {
            tx_id: *key,
            tx: value.clone(),
        }
    }
}
