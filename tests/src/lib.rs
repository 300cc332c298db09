//! # Pact Test Suite
//!
//! Unified test crate for cross-crate scenarios.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Multi-party flow choreography
//!     ├── support.rs            # Node/network fixtures
//!     ├── cash_lifecycle.rs     # Issuance and transfer scenarios
//!     ├── double_spend.rs       # Racing flows and notary conflicts
//!     └── concurrent_issuance.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pact-tests
//!
//! # By category
//! cargo test -p pact-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
