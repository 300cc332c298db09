//! # `Handshake<T>` Envelope
//!
//! The first message of every bilateral flow: an application-defined
//! payload plus the sender's public key. Sent exactly once per protocol
//! instance over an authenticated, ordered, party-to-party channel.
//!
//! The envelope is immutable once constructed; validation on the
//! receiving side produces a new, reshaped payload rather than mutating
//! the envelope in place.

use crate::entities::PublicKey;
use serde::{Deserialize, Serialize};

/// The opening message of a bilateral flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake<T> {
    /// Application-defined proposal payload.
    pub payload: T,
    /// Public key of the initiating party.
    pub sender_key: PublicKey,
}

impl<T> Handshake<T> {
    pub fn new(payload: T, sender_key: PublicKey) -> Self {
        Self {
            payload,
            sender_key,
        }
    }

    /// Map the payload through a fallible transform, keeping the sender.
    ///
    /// Used by responder-side validation to re-resolve referenced
    /// entities without losing the sender binding.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Handshake<U>, E> {
        Ok(Handshake {
            payload: f(self.payload)?,
            sender_key: self.sender_key,
        })
    }
}
