//! In-process flow sessions over paired channels.

use crate::domain::messages::FlowMessage;
use crate::error::{FlowError, FlowResult};
use crate::ports::session::FlowSession;
use async_trait::async_trait;
use shared_types::Party;
use tokio::sync::mpsc;

/// A session endpoint over a pair of in-process channels.
///
/// Message order is the channel's FIFO order, matching the ordered
/// delivery the session contract requires. A dropped peer endpoint
/// closes the channel and surfaces as `PeerDisconnected`.
pub struct ChannelSession {
    counterparty: Party,
    tx: mpsc::Sender<FlowMessage>,
    rx: tokio::sync::Mutex<mpsc::Receiver<FlowMessage>>,
}

/// Build the two endpoints of one bilateral session.
///
/// `a` receives the endpoint whose counterparty is `b`, and vice versa.
pub fn session_pair(a: Party, b: Party, capacity: usize) -> (ChannelSession, ChannelSession) {
    let (a_to_b_tx, a_to_b_rx) = mpsc::channel(capacity);
    let (b_to_a_tx, b_to_a_rx) = mpsc::channel(capacity);
    (
        ChannelSession {
            counterparty: b,
            tx: a_to_b_tx,
            rx: tokio::sync::Mutex::new(b_to_a_rx),
        },
        ChannelSession {
            counterparty: a,
            tx: b_to_a_tx,
            rx: tokio::sync::Mutex::new(a_to_b_rx),
        },
    )
}

#[async_trait]
impl FlowSession for ChannelSession {
    fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    async fn send(&self, msg: FlowMessage) -> FlowResult<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| FlowError::PeerDisconnected)
    }

    async fn receive(&self) -> FlowResult<FlowMessage> {
        self.rx
            .lock()
            .await
            .recv()
            .await
            .ok_or(FlowError::PeerDisconnected)
    }
}
