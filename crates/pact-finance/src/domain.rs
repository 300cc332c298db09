//! Cash states and handshake payloads.

use crate::errors::FinanceError;
use serde::{Deserialize, Serialize};
use shared_types::{OutputState, PublicKey};

/// State type tag for cash outputs.
pub const CASH_STATE_TYPE: &str = "pact.finance.Cash";

/// A fungible claim of `amount` units of `currency`, spendable by
/// `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cash {
    pub amount: u64,
    pub currency: String,
    pub owner: PublicKey,
}

impl Cash {
    pub fn new(amount: u64, currency: impl Into<String>, owner: PublicKey) -> Self {
        Self {
            amount,
            currency: currency.into(),
            owner,
        }
    }

    /// Encode as a transaction output.
    pub fn to_output(&self) -> Result<OutputState, FinanceError> {
        Ok(OutputState {
            state_type: CASH_STATE_TYPE.into(),
            data: bincode::serialize(self).map_err(|e| FinanceError::Decode(e.to_string()))?,
            owner: self.owner,
        })
    }

    /// Decode from a transaction output, refusing non-cash state types.
    pub fn from_output(output: &OutputState) -> Result<Self, FinanceError> {
        if output.state_type != CASH_STATE_TYPE {
            return Err(FinanceError::NotCash(output.state_type.clone()));
        }
        bincode::deserialize(&output.data).map_err(|e| FinanceError::Decode(e.to_string()))
    }

    /// Decode from raw vault state data (already known to be cash).
    pub fn from_data(data: &[u8]) -> Result<Self, FinanceError> {
        bincode::deserialize(data).map_err(|e| FinanceError::Decode(e.to_string()))
    }
}

/// Handshake payload: a holder asks an issuer to create cash for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceRequest {
    pub amount: u64,
    pub currency: String,
}

/// Handshake payload: a recipient asks a payer to transfer cash to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub amount: u64,
    pub currency: String,
}
