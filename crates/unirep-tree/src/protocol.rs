//! protocol-level values derived from the generic tree primitives: the
//! reputation leaf hash, the default (all-empty) user-state-tree root, and
//! the initial user-state root a fresh signup starts from. kept here rather
//! than in the synchronizer crate since both the sign-up handler and the
//! user-state read model need the exact same derivation.

use crate::hasher::Hasher;
use crate::sparse::SparseMerkleTree;
use unirep_types::FieldElement;

/// the sparse tree's default leaf: an untouched key reads as `1`, not `0`,
/// so a hash-chain fold over absent epoch keys is distinguishable from one
/// that folded in a zero-valued attestation
pub const SMT_ONE_LEAF: FieldElement = FieldElement::ONE;

/// `H(posRep, negRep, graffiti, signUp)`, the value a user-state tree
/// stores at an attester's id
pub fn hash_reputation<H: Hasher>(
    hasher: &H,
    pos_rep: u64,
    neg_rep: u64,
    graffiti: FieldElement,
    sign_up: bool,
) -> FieldElement {
    hasher.hash_n(&[
        FieldElement::from_u64(pos_rep),
        FieldElement::from_u64(neg_rep),
        graffiti,
        FieldElement::from_u64(sign_up as u64),
    ])
}

/// root of an all-default (never-updated) user-state tree of `depth`
pub fn empty_ust_root<H: Hasher>(hasher: &H, depth: usize) -> FieldElement {
    SparseMerkleTree::new(depth, SMT_ONE_LEAF, hasher.clone()).root()
}

/// the initial user-state-tree root for a freshly signed-up identity: empty
/// except for one leaf at `attester_id` when an airdrop was granted
pub fn compute_init_ust_root<H: Hasher>(
    hasher: &H,
    depth: usize,
    attester_id: u64,
    airdrop_amount: u64,
) -> FieldElement {
    let mut ust = SparseMerkleTree::new(depth, SMT_ONE_LEAF, hasher.clone());
    if airdrop_amount > 0 {
        let leaf = hash_reputation(hasher, airdrop_amount, 0, FieldElement::ZERO, true);
        ust.update(attester_id, leaf);
    }
    ust.root()
}

/// `defaultGSTLeaf = H(0, emptyUSTRoot)`, the GST's empty-leaf value
pub fn default_gst_leaf<H: Hasher>(hasher: &H, ust_depth: usize) -> FieldElement {
    hasher.hash2(&FieldElement::ZERO, &empty_ust_root(hasher, ust_depth))
}

/// the epoch key a signup-time airdrop credit is recorded under: derived
/// from `idCommitment` and `attesterId` alone (both public in the
/// `UserSignedUp` event), so the synchronizer can record the credit without
/// ever learning the identity's private nullifier, and the identity can
/// later look it up knowing only the same two public values.
pub fn signup_airdrop_epoch_key<H: Hasher>(
    hasher: &H,
    id_commitment: FieldElement,
    attester_id: u64,
    epoch_tree_depth: usize,
) -> u64 {
    let digest = hasher.hash2(&id_commitment, &FieldElement::from_u64(attester_id));
    truncate_to_depth(&digest, epoch_tree_depth)
}

fn truncate_to_depth(value: &FieldElement, depth: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&value.as_bytes()[24..]);
    let raw = u64::from_be_bytes(bytes);
    if depth >= 64 {
        raw
    } else {
        raw & ((1u64 << depth) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::PoseidonStub;

    #[test]
    fn no_airdrop_matches_empty_ust_root() {
        let h = PoseidonStub;
        assert_eq!(compute_init_ust_root(&h, 4, 7, 0), empty_ust_root(&h, 4));
    }

    #[test]
    fn airdrop_changes_the_root() {
        let h = PoseidonStub;
        let with_airdrop = compute_init_ust_root(&h, 4, 7, 10);
        let without = compute_init_ust_root(&h, 4, 7, 0);
        assert_ne!(with_airdrop, without);
    }

    #[test]
    fn default_gst_leaf_is_deterministic() {
        let h = PoseidonStub;
        assert_eq!(default_gst_leaf(&h, 4), default_gst_leaf(&h, 4));
    }

    #[test]
    fn signup_airdrop_epoch_key_is_deterministic_and_bounded() {
        let h = PoseidonStub;
        let id = FieldElement::from_u64(11);
        let a = signup_airdrop_epoch_key(&h, id, 7, 8);
        let b = signup_airdrop_epoch_key(&h, id, 7, 8);
        assert_eq!(a, b);
        assert!(a < (1u64 << 8));
        assert_ne!(a, signup_airdrop_epoch_key(&h, id, 9, 8));
    }
}
