//! the eleven UniRep event topics the ingestor dispatches on
//!
//! ten primary topics plus the legacy attestation topic; the legacy topic
//! decodes and dispatches identically to `AttestationSubmitted` — handlers
//! should never branch on which of the two fired.

use crate::circuit::Circuit;
use std::collections::HashMap;

/// 32-byte keccak256 topic hash as emitted in a log's `topics[0]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TopicHash(pub [u8; 32]);

impl TopicHash {
    /// keccak256 of an event's canonical Solidity signature, the same way
    /// `topics[0]` is computed on-chain
    fn of_signature(signature: &str) -> Self {
        use sha3::{Digest, Keccak256};
        let mut hasher = Keccak256::new();
        hasher.update(signature.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }
}

/// the eleven dispatchable event kinds
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Topic {
    UserSignedUp,
    AttestationSubmitted,
    /// legacy event signature, same semantics as `AttestationSubmitted`
    AttestationSubmittedLegacy,
    EpochEnded,
    IndexedSignUpProof,
    IndexedReputationProof,
    IndexedEpochKeyProof,
    IndexedStartTransitionProof,
    IndexedProcessAttestationsProof,
    IndexedUserStateTransitionProof,
    UserStateTransitioned,
}

impl Topic {
    pub const ALL: [Topic; 11] = [
        Topic::UserSignedUp,
        Topic::AttestationSubmitted,
        Topic::AttestationSubmittedLegacy,
        Topic::EpochEnded,
        Topic::IndexedSignUpProof,
        Topic::IndexedReputationProof,
        Topic::IndexedEpochKeyProof,
        Topic::IndexedStartTransitionProof,
        Topic::IndexedProcessAttestationsProof,
        Topic::IndexedUserStateTransitionProof,
        Topic::UserStateTransitioned,
    ];

    /// whether this event indexes a zk proof (one of the six Indexed*Proof topics)
    pub fn is_proof_event(&self) -> bool {
        matches!(
            self,
            Topic::IndexedSignUpProof
                | Topic::IndexedReputationProof
                | Topic::IndexedEpochKeyProof
                | Topic::IndexedStartTransitionProof
                | Topic::IndexedProcessAttestationsProof
                | Topic::IndexedUserStateTransitionProof
        )
    }

    /// the event's canonical Solidity signature, as declared by the UniRep
    /// contract ABI. the legacy attestation topic has no signature of its
    /// own here since its hash is a fixed historical constant, not derived.
    fn signature(&self) -> Option<&'static str> {
        match self {
            Topic::UserSignedUp => {
                Some("UserSignedUp(uint256,uint256,uint256,uint256)")
            }
            Topic::AttestationSubmitted => Some(
                "AttestationSubmitted(uint256,uint256,address,uint256,uint256,uint256,uint256,uint256,uint256,uint256)",
            ),
            Topic::AttestationSubmittedLegacy => None,
            Topic::EpochEnded => Some("EpochEnded(uint256)"),
            Topic::IndexedSignUpProof => Some("IndexedSignUpProof(uint256,uint256,uint256,uint256)"),
            Topic::IndexedReputationProof => Some("IndexedReputationProof(uint256,uint256,uint256)"),
            Topic::IndexedEpochKeyProof => Some("IndexedEpochKeyProof(uint256,uint256,uint256)"),
            Topic::IndexedStartTransitionProof => {
                Some("IndexedStartedTransitionProof(uint256,uint256,uint256,uint256)")
            }
            Topic::IndexedProcessAttestationsProof => {
                Some("IndexedProcessedAttestationsProof(uint256,uint256,uint256)")
            }
            Topic::IndexedUserStateTransitionProof => {
                Some("IndexedUserStateTransitionProof(uint256,uint256,uint256)")
            }
            Topic::UserStateTransitioned => {
                Some("UserStateTransitioned(uint256,uint256,uint256,uint256)")
            }
        }
    }

    /// the fixed legacy attestation topic hash: `0xdbd3d665…b0b376`
    const LEGACY_ATTESTATION_HASH: [u8; 32] = {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xdb;
        bytes[1] = 0xd3;
        bytes[2] = 0xd6;
        bytes[3] = 0x65;
        bytes[29] = 0xb0;
        bytes[30] = 0xb3;
        bytes[31] = 0x76;
        bytes
    };

    /// this topic's canonical on-chain hash
    pub fn hash(&self) -> TopicHash {
        match self {
            Topic::AttestationSubmittedLegacy => TopicHash(Self::LEGACY_ATTESTATION_HASH),
            other => TopicHash::of_signature(other.signature().expect("non-legacy topics declare a signature")),
        }
    }

    /// the circuit a proof event indexes, for the six `Indexed*Proof` topics
    pub fn circuit(&self) -> Option<Circuit> {
        match self {
            Topic::IndexedSignUpProof => Some(Circuit::ProveUserSignUp),
            Topic::IndexedReputationProof => Some(Circuit::ProveReputation),
            Topic::IndexedEpochKeyProof => Some(Circuit::VerifyEpochKey),
            Topic::IndexedStartTransitionProof => Some(Circuit::StartTransition),
            Topic::IndexedProcessAttestationsProof => Some(Circuit::ProcessAttestations),
            Topic::IndexedUserStateTransitionProof => Some(Circuit::UserStateTransition),
            _ => None,
        }
    }

    /// a registry pre-populated with every topic's canonical hash, suitable
    /// for the deployed UniRep contract's ABI
    pub fn default_registry() -> TopicRegistry {
        let mut registry = TopicRegistry::new();
        for topic in Topic::ALL {
            registry.register(topic.hash(), topic);
        }
        registry
    }
}

/// deployment-specific mapping from on-chain topic hashes to [`Topic`] values.
///
/// the hashes themselves are keccak256(event signature) and are a property of
/// the deployed contract ABI, not of this crate; callers build the registry
/// once at startup from the contract's known event signatures. the legacy
/// attestation topic's hash (`0xdbd3d665…b0b376`) is fixed by the deployed
/// contract; everything else is supplied by the chain collaborator's ABI at
/// wiring time.
#[derive(Clone, Debug, Default)]
pub struct TopicRegistry {
    by_hash: HashMap<TopicHash, Topic>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self { by_hash: HashMap::new() }
    }

    pub fn register(&mut self, hash: TopicHash, topic: Topic) {
        self.by_hash.insert(hash, topic);
    }

    pub fn resolve(&self, hash: &TopicHash) -> Option<Topic> {
        self.by_hash.get(hash).copied()
    }
}
