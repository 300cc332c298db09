//! Cash transfer strategies.
//!
//! The recipient initiates with a `TransferRequest`; the payer responds
//! by selecting unconsumed cash from its vault (soft-locking the
//! selected inputs), consuming it, and producing a recipient output
//! plus change back to itself.

use crate::domain::{Cash, TransferRequest, CASH_STATE_TYPE};
use crate::errors::FinanceError;
use async_trait::async_trait;
use pact_flow::adapters::VaultLedger;
use pact_flow::{
    Assembly, FlowError, FlowResult, HandshakeValidator, ProposalChecker, TransactionAssembler,
};
use shared_types::{Command, Handshake, Party, SignedTransaction, StateRef, TransactionBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Payer-side handshake validation.
pub struct TransferRequestValidator {
    payer_name: String,
}

impl TransferRequestValidator {
    pub fn new(payer_name: impl Into<String>) -> Self {
        Self {
            payer_name: payer_name.into(),
        }
    }
}

#[async_trait]
impl HandshakeValidator<TransferRequest, TransferRequest> for TransferRequestValidator {
    async fn validate(&self, handshake: Handshake<TransferRequest>) -> FlowResult<TransferRequest> {
        if handshake.payload.amount == 0 {
            return Err(FlowError::rejected(
                self.payer_name.clone(),
                "cannot transfer zero units",
            ));
        }
        Ok(handshake.payload)
    }
}

/// Payer-side assembly over the payer's own vault.
///
/// Selection sees only unconsumed states that are unlocked or already
/// held by this assembler's lock. Selected inputs are reserved before
/// the proposal leaves this method; a failed assembly releases them. A
/// caller abandoning the flow after assembly calls [`release_locks`]
/// (consumption at finality clears them otherwise).
///
/// [`release_locks`]: CashTransferAssembler::release_locks
pub struct CashTransferAssembler {
    key: ed25519_dalek::SigningKey,
    notary: Party,
    ledger: Arc<VaultLedger>,
    lock_id: Uuid,
}

impl CashTransferAssembler {
    pub fn new(key: ed25519_dalek::SigningKey, notary: Party, ledger: Arc<VaultLedger>) -> Self {
        Self {
            key,
            notary,
            ledger,
            lock_id: Uuid::new_v4(),
        }
    }

    pub fn lock_id(&self) -> Uuid {
        self.lock_id
    }

    /// Release every soft lock this assembler holds.
    pub fn release_locks(&self) -> FlowResult<()> {
        self.ledger
            .release(self.lock_id, &[])
            .map_err(|e| FlowError::Ledger(e.to_string()))
    }

    /// Greedily pick unconsumed cash in the requested currency until the
    /// amount is covered.
    fn select_inputs(&self, request: &TransferRequest) -> FlowResult<(Vec<StateRef>, u64)> {
        let our_key = self.key.verifying_key().to_bytes();
        let selectable = self
            .ledger
            .selectable(self.lock_id)
            .map_err(|e| FlowError::Ledger(e.to_string()))?;

        let mut picked = Vec::new();
        let mut total = 0u64;
        for (state_ref, state) in selectable {
            if state.state_type != CASH_STATE_TYPE || state.owner != our_key {
                continue;
            }
            let cash = match Cash::from_data(&state.state_data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(state = ?state_ref, error = %e, "skipping undecodable cash state");
                    continue;
                }
            };
            if cash.currency != request.currency {
                continue;
            }
            picked.push(state_ref);
            total = total.checked_add(cash.amount).ok_or_else(|| {
                FlowError::rejected("payer", "selected holdings exceed the representable amount")
            })?;
            if total >= request.amount {
                break;
            }
        }

        if total < request.amount {
            return Err(FlowError::rejected(
                "payer",
                FinanceError::InsufficientFunds {
                    needed: request.amount,
                    currency: request.currency.clone(),
                    available: total,
                }
                .to_string(),
            ));
        }
        Ok((picked, total))
    }
}

#[async_trait]
impl TransactionAssembler<TransferRequest> for CashTransferAssembler {
    async fn assemble(
        &self,
        request: &TransferRequest,
        counterparty: &Party,
    ) -> FlowResult<Assembly> {
        let our_key = self.key.verifying_key().to_bytes();
        let (inputs, total) = self.select_inputs(request)?;

        self.ledger
            .reserve(self.lock_id, &inputs)
            .map_err(|e| FlowError::rejected("payer", format!("inputs contended: {e}")))?;

        let build = || -> FlowResult<TransactionBuilder> {
            let mut builder = TransactionBuilder::new(self.notary.clone());
            for input in &inputs {
                builder.add_input(*input);
            }
            let payment = Cash::new(request.amount, request.currency.clone(), counterparty.public_key);
            builder.add_output(
                payment
                    .to_output()
                    .map_err(|e| FlowError::Codec(e.to_string()))?,
            );
            let change = total - request.amount;
            if change > 0 {
                let remainder = Cash::new(change, request.currency.clone(), our_key);
                builder.add_output(
                    remainder
                        .to_output()
                        .map_err(|e| FlowError::Codec(e.to_string()))?,
                );
            }
            builder.add_command(Command {
                name: "Move".into(),
                signers: vec![our_key, counterparty.public_key],
            });
            Ok(builder)
        };

        let builder = match build() {
            Ok(b) => b,
            Err(e) => {
                // A failed assembly must not leave inputs reserved.
                self.release_locks()?;
                return Err(e);
            }
        };

        tracing::debug!(
            lock_id = %self.lock_id,
            inputs = inputs.len(),
            total,
            amount = request.amount,
            "transfer assembled"
        );
        Ok(Assembly {
            builder,
            signing_keys: vec![self.key.clone()],
            extra_signatures: Vec::new(),
        })
    }

    async fn abandon(&self) -> FlowResult<()> {
        self.release_locks()
    }
}

/// Recipient-side review of the proposed transfer: it must pay us at
/// least the requested amount in the requested currency. The payer's
/// inputs and change are its own business.
pub struct CashPaymentChecker {
    our_key: [u8; 32],
    expected_amount: u64,
    expected_currency: String,
}

impl CashPaymentChecker {
    pub fn new(our_key: [u8; 32], expected_amount: u64, expected_currency: impl Into<String>) -> Self {
        Self {
            our_key,
            expected_amount,
            expected_currency: expected_currency.into(),
        }
    }
}

#[async_trait]
impl ProposalChecker for CashPaymentChecker {
    async fn check_proposal(&self, stx: &SignedTransaction) -> FlowResult<()> {
        let mut received = 0u64;
        for output in &stx.core.outputs {
            if output.state_type != CASH_STATE_TYPE || output.owner != self.our_key {
                continue;
            }
            let cash = Cash::from_output(output).map_err(|e| FlowError::Codec(e.to_string()))?;
            if cash.currency != self.expected_currency {
                continue;
            }
            received = received.saturating_add(cash.amount);
        }
        if received < self.expected_amount {
            return Err(FlowError::rejected(
                "recipient",
                format!(
                    "proposal pays {received} {}, requested {}",
                    self.expected_currency, self.expected_amount
                ),
            ));
        }
        Ok(())
    }
}
