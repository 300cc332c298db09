//! # Transaction Model
//!
//! The one-way pipeline from a mutable proposal to an immutable, signed
//! transaction:
//!
//! ```text
//! TransactionBuilder ──build()──→ CoreTransaction ──sign──→ SignedTransaction
//!      (mutable)                    (frozen)                 (append-only)
//! ```
//!
//! A transaction id is a deterministic SHA-256 over the frozen contents;
//! signatures are excluded so every co-signer signs the same id.

use crate::entities::{Hash, Party, PublicKey, Signature, StateRef, TimeWindow};
use crate::errors::{BuildError, SignatureError};
use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

/// A produced ledger state: a contract type tag, the serialized state
/// blob, and the owning key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    /// Contract state type tag (e.g. `"pact.finance.Cash"`).
    pub state_type: String,
    /// Serialized contract state.
    pub data: Vec<u8>,
    /// Key that controls the produced state.
    pub owner: PublicKey,
}

/// A command names the intent of a transaction and the keys that must
/// sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name (e.g. `"Issue"`, `"Move"`).
    pub name: String,
    /// Keys whose signatures the command requires.
    pub signers: Vec<PublicKey>,
}

/// Mutable accumulator for a transaction proposal.
///
/// Becomes immutable once `build()` freezes it into a `CoreTransaction`;
/// the transition is one-way and happens once per flow instance.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    notary: Party,
    inputs: Vec<StateRef>,
    outputs: Vec<OutputState>,
    commands: Vec<Command>,
    attachments: Vec<Hash>,
    time_window: Option<TimeWindow>,
}

impl TransactionBuilder {
    /// Start a proposal bound to a uniqueness-ordering notary.
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            attachments: Vec::new(),
            time_window: None,
        }
    }

    /// Consume an existing state.
    pub fn add_input(&mut self, input: StateRef) -> &mut Self {
        self.inputs.push(input);
        self
    }

    /// Produce a new state.
    pub fn add_output(&mut self, output: OutputState) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Record an intent and its required signers.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Reference an attachment by hash.
    pub fn add_attachment(&mut self, attachment: Hash) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Constrain the notarisation time.
    pub fn set_time_window(&mut self, window: TimeWindow) -> &mut Self {
        self.time_window = Some(window);
        self
    }

    /// Freeze the proposal. Irreversible.
    pub fn build(self) -> Result<CoreTransaction, BuildError> {
        if self.inputs.is_empty() && self.outputs.is_empty() {
            return Err(BuildError::Empty);
        }
        Ok(CoreTransaction {
            notary: self.notary,
            inputs: self.inputs,
            outputs: self.outputs,
            commands: self.commands,
            attachments: self.attachments,
            time_window: self.time_window,
        })
    }
}

/// The frozen, signable content of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreTransaction {
    /// The notary responsible for uniqueness ordering.
    pub notary: Party,
    /// Consumed states.
    pub inputs: Vec<StateRef>,
    /// Produced states.
    pub outputs: Vec<OutputState>,
    /// Commands and their required signers.
    pub commands: Vec<Command>,
    /// Referenced attachments.
    pub attachments: Vec<Hash>,
    /// Optional notarisation time constraint.
    pub time_window: Option<TimeWindow>,
}

impl CoreTransaction {
    /// Compute the deterministic transaction id.
    ///
    /// Field-by-field SHA-256 with length prefixes, so reordering or
    /// splicing content always changes the id. Signatures are excluded.
    pub fn id(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.notary.public_key);
        hasher.update((self.notary.name.len() as u64).to_le_bytes());
        hasher.update(self.notary.name.as_bytes());

        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.tx_id);
            hasher.update(input.index.to_le_bytes());
        }

        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            hasher.update((output.state_type.len() as u64).to_le_bytes());
            hasher.update(output.state_type.as_bytes());
            hasher.update((output.data.len() as u64).to_le_bytes());
            hasher.update(&output.data);
            hasher.update(output.owner);
        }

        hasher.update((self.commands.len() as u64).to_le_bytes());
        for command in &self.commands {
            hasher.update((command.name.len() as u64).to_le_bytes());
            hasher.update(command.name.as_bytes());
            hasher.update((command.signers.len() as u64).to_le_bytes());
            for signer in &command.signers {
                hasher.update(signer);
            }
        }

        hasher.update((self.attachments.len() as u64).to_le_bytes());
        for attachment in &self.attachments {
            hasher.update(attachment);
        }

        match self.time_window {
            Some(w) => {
                hasher.update([1u8]);
                hasher.update(w.not_before.unwrap_or(0).to_le_bytes());
                hasher.update(w.not_after.unwrap_or(u64::MAX).to_le_bytes());
            }
            None => hasher.update([0u8]),
        }

        hasher.finalize().into()
    }

    /// Every key named by any command, deduplicated, in first-seen order.
    pub fn required_signers(&self) -> Vec<PublicKey> {
        let mut keys: Vec<PublicKey> = Vec::new();
        for command in &self.commands {
            for signer in &command.signers {
                if !keys.contains(signer) {
                    keys.push(*signer);
                }
            }
        }
        keys
    }
}

/// A single party's signature over a transaction id.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySignature {
    /// The signer's public key.
    pub signer: PublicKey,
    /// Ed25519 signature over the transaction id.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl PartySignature {
    /// Sign a transaction id with a local key.
    pub fn create(key: &ed25519_dalek::SigningKey, tx_id: &Hash) -> Self {
        let signature = key.sign(tx_id);
        Self {
            signer: key.verifying_key().to_bytes(),
            signature: signature.to_bytes(),
        }
    }

    /// Verify this signature over the given transaction id.
    pub fn verify(&self, tx_id: &Hash) -> Result<(), SignatureError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&self.signer)
            .map_err(|_| SignatureError::MalformedKey {
                signer: self.signer,
            })?;
        let sig = ed25519_dalek::Signature::from_bytes(&self.signature);
        key.verify(tx_id, &sig)
            .map_err(|_| SignatureError::InvalidSignature {
                signer: self.signer,
            })
    }
}

/// A frozen transaction plus the signatures collected so far.
///
/// Never mutated after creation; adding a signature produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The signable content.
    pub core: CoreTransaction,
    /// Collected (signer, signature) pairs.
    pub signatures: Vec<PartySignature>,
}

impl SignedTransaction {
    /// Wrap a frozen transaction with no signatures yet.
    pub fn new(core: CoreTransaction) -> Self {
        Self {
            core,
            signatures: Vec::new(),
        }
    }

    /// The deterministic transaction id (contents only, no signatures).
    pub fn id(&self) -> Hash {
        self.core.id()
    }

    /// Extend with one more signature, returning a new value.
    ///
    /// A repeated signer is ignored rather than duplicated.
    #[must_use]
    pub fn with_signature(mut self, sig: PartySignature) -> Self {
        if !self.is_signed_by(&sig.signer) {
            self.signatures.push(sig);
        }
        self
    }

    /// Keys that have signed so far.
    pub fn signer_keys(&self) -> Vec<PublicKey> {
        self.signatures.iter().map(|s| s.signer).collect()
    }

    /// Whether the given key has signed.
    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signatures.iter().any(|s| &s.signer == key)
    }

    /// Required signers that have not yet signed.
    pub fn missing_signers(&self) -> Vec<PublicKey> {
        self.core
            .required_signers()
            .into_iter()
            .filter(|k| !self.is_signed_by(k))
            .collect()
    }

    /// Verify every attached signature over the transaction id.
    pub fn verify_signatures(&self) -> Result<(), SignatureError> {
        let id = self.id();
        for sig in &self.signatures {
            sig.verify(&id)?;
        }
        Ok(())
    }

    /// Verify signatures and check that every required signer has signed.
    pub fn verify_complete(&self) -> Result<(), SignatureError> {
        self.verify_signatures()?;
        let missing = self.missing_signers();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SignatureError::MissingSignatures(missing.len()))
        }
    }
}
