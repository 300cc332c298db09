//! Flow phases and durable checkpoints.
//!
//! A flow is a suspendable task driven by an explicit phase enum plus a
//! checkpoint record. Suspension persists (phase, correlation id, resume
//! context) and yields; resumption matches an incoming message or
//! timeout against the recorded phase and continues from there rather
//! than from the start.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Initiating-role phases, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiatorPhase {
    Init,
    SendingProposal,
    AwaitingCountersignature,
    AwaitingFinalityNotice,
    Complete,
    Failed,
}

impl InitiatorPhase {
    /// Whether `next` is a legal successor of `self`.
    ///
    /// `Failed` is reachable from any non-terminal phase.
    pub fn can_advance_to(self, next: Self) -> bool {
        use InitiatorPhase::*;
        match (self, next) {
            (_, Failed) => !matches!(self, Complete | Failed),
            (Init, SendingProposal) => true,
            (SendingProposal, AwaitingCountersignature) => true,
            (AwaitingCountersignature, AwaitingFinalityNotice) => true,
            (AwaitingFinalityNotice, Complete) => true,
            _ => false,
        }
    }
}

/// Accepting-role phases, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponderPhase {
    Receiving,
    Validating,
    Signing,
    CollectingSignatures,
    Recording,
    Forwarding,
    Complete,
    Failed,
}

impl ResponderPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: Self) -> bool {
        use ResponderPhase::*;
        match (self, next) {
            (_, Failed) => !matches!(self, Complete | Failed),
            (Receiving, Validating) => true,
            (Validating, Signing) => true,
            (Signing, CollectingSignatures) => true,
            (CollectingSignatures, Recording) => true,
            (Recording, Forwarding) => true,
            (Forwarding, Complete) => true,
            _ => false,
        }
    }
}

/// Role-tagged phase for checkpoint records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowPhase {
    Initiator(InitiatorPhase),
    Responder(ResponderPhase),
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowPhase::Initiator(p) => write!(f, "Initiator::{p:?}"),
            FlowPhase::Responder(p) => write!(f, "Responder::{p:?}"),
        }
    }
}

/// Durable record of a flow's progress, written before every suspension
/// point. Resumption must depend on nothing outside this record and the
/// ordered channel, so `context` carries the role-specific state the
/// phase needs (proposed payload, awaited tx id, assembled transaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCheckpoint {
    /// The flow instance this record belongs to.
    pub flow_id: Uuid,
    /// The phase being entered.
    pub phase: FlowPhase,
    /// Correlation id matching replies to this instance.
    pub correlation_id: Uuid,
    /// Bincode-encoded resume context for the phase.
    pub context: Vec<u8>,
    /// Unix seconds when recorded.
    pub updated_at: u64,
}

impl FlowCheckpoint {
    pub fn new(flow_id: Uuid, phase: FlowPhase, correlation_id: Uuid, context: Vec<u8>) -> Self {
        Self {
            flow_id,
            phase,
            correlation_id,
            context,
            updated_at: unix_now(),
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
