//! Wire messages exchanged between the two roles.
//!
//! Within one protocol instance the messages are strictly ordered:
//! propose, countersign request, countersignature, finality notice.
//! Each step's preconditions depend on the prior step's completion, so
//! no reordering or pipelining is permitted; an out-of-order message is
//! a protocol violation, not something to buffer.

use serde::{Deserialize, Serialize};
use shared_types::{Hash, PartySignature, SignedTransaction};

/// One message on the party-to-party channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowMessage {
    /// Bincode-encoded `Handshake<T>`; opaque to the engine, typed by
    /// the concrete flow.
    Propose { handshake: Vec<u8> },

    /// The assembled, partially-signed transaction offered for
    /// countersigning.
    CountersignRequest { stx: SignedTransaction },

    /// One party's signature over the proposed transaction id.
    Countersignature { signature: PartySignature },

    /// The committed transaction's id, sent once finality is reached.
    FinalityNotice { tx_id: Hash },

    /// The sender is aborting the exchange.
    Reject { reason: String },
}

impl FlowMessage {
    /// Message kind, for protocol-violation errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowMessage::Propose { .. } => "Propose",
            FlowMessage::CountersignRequest { .. } => "CountersignRequest",
            FlowMessage::Countersignature { .. } => "Countersignature",
            FlowMessage::FinalityNotice { .. } => "FinalityNotice",
            FlowMessage::Reject { .. } => "Reject",
        }
    }
}
