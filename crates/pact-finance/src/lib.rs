//! # pact-finance
//!
//! Concrete cash agreements on top of the flow engine: issuance (an
//! issuer creates cash on the ledger for a requesting holder) and
//! transfer (a payer spends vault states to a recipient, with change).
//!
//! Each agreement type supplies only the validation, review, and
//! assembly strategies; the handshake, signature, and finality skeleton
//! comes from `pact-flow`.

pub mod domain;
pub mod errors;
pub mod issuance;
pub mod transfer;

pub use domain::{Cash, IssuanceRequest, TransferRequest, CASH_STATE_TYPE};
pub use errors::FinanceError;
pub use issuance::{CashIssueAssembler, CashReceiptChecker, CurrencyValidator};
pub use transfer::{CashPaymentChecker, CashTransferAssembler, TransferRequestValidator};
