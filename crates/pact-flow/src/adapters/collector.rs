//! Bilateral signature-collection sub-protocol.

use crate::domain::messages::FlowMessage;
use crate::error::{FlowError, FlowResult};
use crate::ports::outbound::SignatureCollector;
use crate::ports::session::FlowSession;
use async_trait::async_trait;
use shared_types::SignedTransaction;

/// Collects the counterparty's signatures over the current session.
///
/// Sends the partially-signed transaction, then accepts signatures one
/// at a time until none are missing. Every accepted signature must name
/// a still-missing required signer and must verify over the proposed
/// transaction's id, so a peer cannot smuggle in approval of different
/// content.
pub struct SessionSignatureCollector;

#[async_trait]
impl SignatureCollector for SessionSignatureCollector {
    async fn collect(
        &self,
        stx: SignedTransaction,
        session: &dyn FlowSession,
    ) -> FlowResult<SignedTransaction> {
        let tx_id = stx.id();
        session
            .send(FlowMessage::CountersignRequest { stx: stx.clone() })
            .await?;

        let mut stx = stx;
        while !stx.missing_signers().is_empty() {
            match session.receive().await? {
                FlowMessage::Countersignature { signature } => {
                    if !stx.missing_signers().contains(&signature.signer) {
                        return Err(FlowError::UnexpectedMessage {
                            expected: "a signature from a missing required signer",
                            got: "a signature from a non-required or duplicate signer",
                        });
                    }
                    signature.verify(&tx_id)?;
                    stx = stx.with_signature(signature);
                }
                FlowMessage::Reject { reason } => {
                    return Err(FlowError::rejected(
                        session.counterparty().name.clone(),
                        reason,
                    ))
                }
                other => {
                    return Err(FlowError::UnexpectedMessage {
                        expected: "Countersignature",
                        got: other.kind(),
                    })
                }
            }
        }
        tracing::debug!(tx_id = ?tx_id, "all required signatures collected");
        Ok(stx)
    }
}
