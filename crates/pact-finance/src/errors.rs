use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinanceError {
    #[error("output is not a cash state: {0}")]
    NotCash(String),

    #[error("cash state failed to decode: {0}")]
    Decode(String),

    #[error("insufficient funds: needed {needed} {currency}, available {available}")]
    InsufficientFunds {
        needed: u64,
        currency: String,
        available: u64,
    },
}
