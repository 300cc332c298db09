//! Single-process adapters for the flow ports.
//!
//! These back the ports for tests and in-process deployments; a
//! networked node would swap in transport-backed implementations
//! without touching the engines.

pub mod channel;
pub mod checkpoint_store;
pub mod collector;
pub mod ledger;
pub mod notary;

pub use channel::{session_pair, ChannelSession};
pub use checkpoint_store::InMemoryCheckpointStore;
pub use collector::SessionSignatureCollector;
pub use ledger::VaultLedger;
pub use notary::InProcessNotary;
