//! the persisted record types the synchronizer mirrors on-chain state into

use serde::{Deserialize, Serialize};
use unirep_types::{Circuit, FieldElement};

/// one sealed epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub number: u64,
    pub start_timestamp: u64,
    /// set once the epoch's `EpochEnded` event has been processed
    pub sealed: bool,
    /// final epoch-tree root, set at the same time as `sealed`
    pub epoch_root: Option<FieldElement>,
}

impl Epoch {
    pub fn unsealed(number: u64, start_timestamp: u64) -> Self {
        Self { number, start_timestamp, sealed: false, epoch_root: None }
    }
}

/// one leaf inserted into an epoch's global state tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GstLeaf {
    pub epoch: u64,
    pub index: u64,
    pub hash: FieldElement,
    pub tx_hash: [u8; 32],
}

/// one historical root of an epoch's global state tree, recorded after
/// every leaf insertion so a later proof may reference any of them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GstRoot {
    pub epoch: u64,
    pub root: FieldElement,
}

/// one epoch key observed via an attestation; created lazily on first
/// attestation rather than pre-populated for every derivable key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochKey {
    pub epoch: u64,
    pub key: u64,
}

/// one attestation submitted against an epoch key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    pub epoch: u64,
    pub epoch_key: u64,
    /// the event's total order position (block, tx index, log index packed
    /// into one u64-comparable value); unique and totally ordered
    pub index: u64,
    /// attester contract address, kept as a field element since the chain
    /// collaborator hands addresses over as 20-byte values embedded in log data
    pub attester: FieldElement,
    pub attester_id: u64,
    pub pos_rep: u64,
    pub neg_rep: u64,
    pub graffiti: FieldElement,
    pub overwrite_graffiti: bool,
    pub sign_up: bool,
    /// the proof this attestation's reputation claim draws on, 0 if none
    pub from_proof_index: u64,
    /// the submitter's own proof of authorization to attest
    pub to_proof_index: u64,
    /// `H(attestation fields)`, folded into the epoch key's hash chain at seal time
    pub hash: FieldElement,
    /// unset until the referenced proofs have been checked; `None` means
    /// "not yet evaluated"
    pub valid: Option<bool>,
}

/// a nullifier spent by a reputation or user-state-transition proof
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nullifier {
    pub epoch: u64,
    pub value: FieldElement,
    /// `true` once the proof that spent it has been accepted; a nullifier
    /// row may exist unconfirmed (seen in a rejected proof) without
    /// blocking future confirmation attempts
    pub confirmed: bool,
}

/// one proof event observed from the chain, independent of whether it was
/// judged valid. carries every auxiliary field any handler downstream
/// might chain on (`blindedUserState`, `globalStateTree`,
/// `proofIndexRecords`, ...), even though a given circuit only populates
/// the subset relevant to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    pub index: u64,
    pub circuit: Circuit,
    /// `None` for circuits that don't carry an epoch signal (none currently
    /// do, but the field stays optional since it's circuit-dependent)
    pub epoch: Option<u64>,
    pub public_signals: Vec<FieldElement>,
    pub proof: Vec<FieldElement>,
    /// `verify ∧ referenced-root-exists ∧ (reputation: ¬duplicate-nullifier)`
    pub valid: bool,
    /// set once a later attestation's `fromProofIndex` has consumed this proof
    pub spent: bool,
    pub blinded_user_state: Option<FieldElement>,
    pub blinded_hash_chain: Option<FieldElement>,
    pub output_blinded_user_state: Option<FieldElement>,
    pub input_blinded_user_state: Option<FieldElement>,
    pub output_blinded_hash_chain: Option<FieldElement>,
    pub global_state_tree: Option<FieldElement>,
    /// the proof indices a user-state-transition proof chains through:
    /// `[startTransition, processAttestations..., ]`
    pub proof_index_records: Vec<u64>,
    pub submitted_at: u64,
}

/// the synchronizer's own progress cursor, one row, updated at the end of
/// every committed batch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    pub latest_processed_block: u64,
    pub latest_processed_transaction_index: u32,
    pub latest_processed_log_index: u32,
    pub latest_complete_block: u64,
}

impl SyncState {
    pub fn genesis() -> Self {
        Self {
            latest_processed_block: 0,
            latest_processed_transaction_index: 0,
            latest_processed_log_index: 0,
            latest_complete_block: 0,
        }
    }
}
