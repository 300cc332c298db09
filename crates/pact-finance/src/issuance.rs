//! Cash issuance strategies.
//!
//! The holder initiates with an `IssuanceRequest`; the issuer responds
//! by validating the currency, assembling a zero-input transaction with
//! one produced cash output owned by the holder, and co-signing it.

use crate::domain::{Cash, IssuanceRequest, CASH_STATE_TYPE};
use async_trait::async_trait;
use pact_flow::{
    Assembly, FlowError, FlowResult, HandshakeValidator, ProposalChecker, TransactionAssembler,
};
use shared_types::{Command, Handshake, Party, PublicKey, SignedTransaction, TransactionBuilder};

/// Issuer-side handshake validation: only listed currencies may be
/// issued. Rejection happens here, before any ledger interaction.
pub struct CurrencyValidator {
    issuer_name: String,
    accepted: Vec<String>,
}

impl CurrencyValidator {
    pub fn new(issuer_name: impl Into<String>, accepted: Vec<String>) -> Self {
        Self {
            issuer_name: issuer_name.into(),
            accepted,
        }
    }
}

#[async_trait]
impl HandshakeValidator<IssuanceRequest, IssuanceRequest> for CurrencyValidator {
    async fn validate(&self, handshake: Handshake<IssuanceRequest>) -> FlowResult<IssuanceRequest> {
        let request = handshake.payload;
        if request.amount == 0 {
            return Err(FlowError::rejected(
                self.issuer_name.clone(),
                "cannot issue zero units",
            ));
        }
        if !self.accepted.contains(&request.currency) {
            tracing::warn!(currency = %request.currency, "issuance refused: currency not accepted");
            return Err(FlowError::rejected(
                self.issuer_name.clone(),
                format!("currency {} is not accepted", request.currency),
            ));
        }
        Ok(request)
    }
}

/// Issuer-side assembly: zero inputs, one produced cash output owned by
/// the requesting holder, signed by issuer and holder.
pub struct CashIssueAssembler {
    key: ed25519_dalek::SigningKey,
    notary: Party,
}

impl CashIssueAssembler {
    pub fn new(key: ed25519_dalek::SigningKey, notary: Party) -> Self {
        Self { key, notary }
    }
}

#[async_trait]
impl TransactionAssembler<IssuanceRequest> for CashIssueAssembler {
    async fn assemble(
        &self,
        request: &IssuanceRequest,
        counterparty: &Party,
    ) -> FlowResult<Assembly> {
        let cash = Cash::new(request.amount, request.currency.clone(), counterparty.public_key);
        let output = cash
            .to_output()
            .map_err(|e| FlowError::Codec(e.to_string()))?;

        let mut builder = TransactionBuilder::new(self.notary.clone());
        builder.add_output(output).add_command(Command {
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

/// Holder-side review of the proposed transaction: it must pay us the
/// amount and currency we asked for, and nothing may be consumed.
pub struct CashReceiptChecker {
    our_key: PublicKey,
    expected_amount: u64,
    expected_currency: String,
}

impl CashReceiptChecker {
    pub fn new(our_key: PublicKey, amount: u64, currency: impl Into<String>) -> Self {
        Self {
            our_key,
            expected_amount: amount,
            expected_currency: currency.into(),
        }
    }
}

#[async_trait]
impl ProposalChecker for CashReceiptChecker {
    async fn check_proposal(&self, stx: &SignedTransaction) -> FlowResult<()> {
        if !stx.core.inputs.is_empty() {
            return Err(FlowError::rejected(
                "holder",
                "issuance must not consume states",
            ));
        }
        let received: u64 = stx
            .core
            .outputs
            .iter()
            .filter(|o| o.state_type == CASH_STATE_TYPE && o.owner == self.our_key)
            .filter_map(|o| Cash::from_output(o).ok())
            .filter(|c| c.currency == self.expected_currency)
            .map(|c| c.amount)
            .sum();
        if received != self.expected_amount {
            return Err(FlowError::rejected(
                "holder",
                format!(
                    "proposal pays {received}, requested {}",
                    self.expected_amount
                ),
            ));
        }
        Ok(())
    }
}
