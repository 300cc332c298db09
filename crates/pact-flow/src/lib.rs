//! # pact-flow
//!
//! The bilateral flow protocol engine: a suspendable, checkpointable
//! state machine that drives a handshake between two mutually
//! distrusting parties, collects countersignatures, and submits the
//! result to a uniqueness-ordering notary for final commitment.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Initiator Role**: sends the handshake, countersigns the proposal
//!   after a caller-supplied review, awaits the finality notice
//! - **Responder Role**: validates the handshake, assembles and signs
//!   the shared transaction, drives signature collection and finality,
//!   forwards to observers, notifies the initiator
//! - **Checkpointing**: every suspension point persists (phase,
//!   correlation id, resume context) so a restarted node resumes
//!   in-flight flows instead of losing them
//! - **Typed Failures**: rejection, timeout, peer loss, and notary
//!   conflict are distinct errors; the engine never retries and never
//!   swallows a sub-protocol failure
//!
//! ## Architecture
//!
//! ```text
//! Initiator ──Propose──────────────→ Responder
//!           ←─CountersignRequest──── │ validate + assemble + sign
//!           ──Countersignature─────→ │ collect signatures
//!                                    │ finality (notary order + record)
//!           ←─FinalityNotice──────── │ forward to observers
//!           resolve from local ledger
//! ```
//!
//! The asymmetry is deliberate: one side proposes, the other assembles
//! and submits for ordering. Concrete agreement types supply only the
//! validation and assembly strategies; the suspension, signature, and
//! finality skeleton is shared.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod initiator;
pub mod ports;
pub mod responder;

pub use config::FlowConfig;
pub use domain::checkpoint::{FlowCheckpoint, FlowPhase, InitiatorPhase, ResponderPhase};
pub use domain::messages::FlowMessage;
pub use error::{FlowError, FlowResult};
pub use initiator::InitiatorFlow;
pub use ports::outbound::{
    CheckpointStore, FinalityGateway, LedgerReader, SignatureCollector, TransactionObserver,
};
pub use ports::session::FlowSession;
pub use ports::strategy::{Assembly, HandshakeValidator, ProposalChecker, TransactionAssembler};
pub use responder::ResponderFlow;
