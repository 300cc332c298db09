pub mod cash_lifecycle;
pub mod concurrent_issuance;
pub mod double_spend;
pub mod support;
