//! assembled circuit inputs for the four proof families UserState can
//! prepare a witness for. Actual proof generation is delegated to the
//! prover collaborator (§1 non-goal); these structs carry the Merkle
//! material and selectors a real witness generator would consume.

use unirep_tree::{MerklePath, SmtProof};
use unirep_types::FieldElement;

/// inputs for `proveUserSignUp`: membership of the identity's own GST leaf
#[derive(Clone, Debug)]
pub struct SignUpProofInputs {
    pub epoch: u64,
    pub epoch_key: u64,
    pub global_state_tree: FieldElement,
    pub gst_path: MerklePath,
    pub attester_id: u64,
    pub user_has_signed_up: bool,
}

/// inputs for `verifyEpochKey`: same GST membership, no attester context
#[derive(Clone, Debug)]
pub struct EpochKeyProofInputs {
    pub epoch: u64,
    pub epoch_key: u64,
    pub global_state_tree: FieldElement,
    pub gst_path: MerklePath,
}

/// inputs for `proveReputation`: GST membership plus the user-state-tree
/// membership path for the attester whose reputation is being asserted, and
/// the nullifier elements the circuit will derive `repNullifiers` from
#[derive(Clone, Debug)]
pub struct ReputationProofInputs {
    pub epoch: u64,
    pub epoch_key: u64,
    pub global_state_tree: FieldElement,
    pub gst_path: MerklePath,
    pub attester_id: u64,
    pub ust_root: FieldElement,
    pub ust_path: SmtProof,
    pub min_rep: u64,
    pub prove_graffiti: bool,
    pub graffiti_pre_image: FieldElement,
}

/// inputs for the user-state-transition trio (`startTransition` /
/// `processAttestations` / `userStateTransition`): the epoch-tree membership
/// path for every epoch key the identity held in `from_epoch`, feeding the
/// hash-chain the transition proof must reproduce
#[derive(Clone, Debug)]
pub struct UserStateTransitionProofInputs {
    pub from_epoch: u64,
    pub from_global_state_tree: FieldElement,
    pub gst_path: MerklePath,
    pub epoch_key_paths: Vec<(u64, SmtProof)>,
    pub from_epoch_tree: FieldElement,
}
