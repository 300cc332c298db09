//! Domain types: the wire message set and the checkpoint model.

pub mod checkpoint;
pub mod messages;

pub use checkpoint::{FlowCheckpoint, FlowPhase, InitiatorPhase, ResponderPhase};
pub use messages::FlowMessage;
