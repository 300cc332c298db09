//! The party-to-party flow session.

use crate::domain::messages::FlowMessage;
use crate::error::FlowResult;
use async_trait::async_trait;
use shared_types::Party;

/// A logical conversation scoped to one protocol instance and one
/// counterparty, over an authenticated, ordered channel.
///
/// Sending and receiving are the engine's suspension points; both are
/// bounded by the flow timeout at the call sites. The transport behind
/// the trait is out of scope.
#[async_trait]
pub trait FlowSession: Send + Sync {
    /// The party on the other end of this session.
    fn counterparty(&self) -> &Party;

    /// Send one message. Fails if the peer is gone.
    async fn send(&self, msg: FlowMessage) -> FlowResult<()>;

    /// Receive the next message in order. Fails if the peer is gone.
    async fn receive(&self) -> FlowResult<FlowMessage>;
}
