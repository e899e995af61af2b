//! per-identity read model (§4.5): epoch-key derivation, reputation
//! aggregation, and circuit-input assembly, all read-only over the
//! synchronizer's [`Store`] and [`Hasher`]. UserState never writes to the
//! store and never touches the ingestor's live tree — an arbitrary-epoch
//! GST is rebuilt on demand via [`gen_gst_tree`].

pub mod error;
pub mod proof_inputs;
pub mod reputation;

use unirep_store::records::Epoch;
use unirep_store::Store;
use unirep_sync::ProtocolParams;
use unirep_tree::{
    default_gst_leaf, empty_ust_root, hash_reputation, signup_airdrop_epoch_key, Hasher,
    IncrementalTree, SparseMerkleTree, SMT_ONE_LEAF,
};
use unirep_types::FieldElement;

pub use error::{UserStateError, UserStateResult};
pub use proof_inputs::{
    EpochKeyProofInputs, ReputationProofInputs, SignUpProofInputs, UserStateTransitionProofInputs,
};
pub use reputation::Reputation;

/// replays an epoch's persisted `GstLeaf` rows, in `index` order, into a
/// fresh tree. Both the ingestor's live tree and every past-epoch rebuild
/// here go through the same `IncrementalTree`, so determinism is a
/// type-level guarantee rather than a convention (§4.5 SUPPLEMENT).
pub fn gen_gst_tree<H: Hasher>(
    store: &Store,
    epoch: u64,
    params: &ProtocolParams,
    hasher: &H,
) -> UserStateResult<IncrementalTree<H>> {
    let mut leaves = store.gst_leaves_for_epoch(epoch)?;
    leaves.sort_by_key(|l| l.index);
    let empty_leaf = default_gst_leaf(hasher, params.ust_depth);
    let mut tree = IncrementalTree::new(params.gst_depth, empty_leaf, hasher.clone());
    for leaf in leaves {
        tree.insert(leaf.hash)?;
    }
    Ok(tree)
}

/// the identity's epoch keys for `epoch`: `H(identityNullifier, epoch,
/// nonce)` truncated to `D_epoch` bits, one per nonce up to
/// `numEpochKeyNoncePerEpoch`
pub fn epoch_keys<H: Hasher>(
    hasher: &H,
    identity_nullifier: FieldElement,
    epoch: u64,
    params: &ProtocolParams,
) -> Vec<u64> {
    (0..params.epoch_key_nonces)
        .map(|nonce| {
            let digest = hasher.hash_n(&[
                identity_nullifier,
                FieldElement::from_u64(epoch),
                FieldElement::from_u64(nonce as u64),
            ]);
            truncate_to_depth(&digest, params.epoch_tree_depth)
        })
        .collect()
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

/// a read-only view of one identity, parameterized by the hasher the
/// synchronizer's tree engine uses
pub struct UserState<'a, H: Hasher> {
    store: &'a Store,
    hasher: &'a H,
    params: ProtocolParams,
    identity_nullifier: FieldElement,
    id_commitment: FieldElement,
}

impl<'a, H: Hasher> UserState<'a, H> {
    pub fn new(
        store: &'a Store,
        hasher: &'a H,
        params: ProtocolParams,
        identity_nullifier: FieldElement,
        id_commitment: FieldElement,
    ) -> Self {
        Self { store, hasher, params, identity_nullifier, id_commitment }
    }

    /// the highest-numbered `Epoch` row
    pub fn current_epoch(&self) -> UserStateResult<Epoch> {
        self.store
            .latest_epoch()?
            .ok_or_else(|| UserStateError::NotFound("no epoch row exists yet".into()))
    }

    /// this identity's epoch keys for `epoch`
    pub fn epoch_keys(&self, epoch: u64) -> Vec<u64> {
        epoch_keys(self.hasher, self.identity_nullifier, epoch, &self.params)
    }

    /// valid attestations ever submitted against `key`, across every epoch,
    /// ordered by epoch then submission order
    pub fn attestations_for_key(&self, key: u64) -> UserStateResult<Vec<unirep_store::records::Attestation>> {
        Ok(self
            .store
            .attestations_for_key(key)?
            .into_iter()
            .filter(|a| a.valid == Some(true))
            .collect())
    }

    /// folds this identity's valid attestations against `attester_id`,
    /// across every sealed epoch, into one reputation record. The
    /// signup-time airdrop (recorded under a key derived from
    /// `idCommitment`/`attesterId` rather than the private epoch-key
    /// derivation, since the synchronizer that writes it never learns the
    /// identity nullifier) is folded in the same way.
    pub fn reputation(&self, attester_id: u64) -> UserStateResult<Reputation> {
        let current = self.current_epoch()?;
        let mut matched = Vec::new();
        let airdrop_key =
            signup_airdrop_epoch_key(self.hasher, self.id_commitment, attester_id, self.params.epoch_tree_depth);
        for epoch in 0..=current.number {
            // the signup credit is available as soon as the synchronizer
            // has recorded it, independent of whether this epoch has sealed
            for attestation in self.store.attestations_for_epoch_key(epoch, airdrop_key)? {
                if attestation.valid == Some(true) && attestation.attester_id == attester_id {
                    matched.push((attestation.epoch, attestation.index, attestation));
                }
            }

            let sealed = match self.store.get_epoch(epoch)? {
                Some(e) if e.sealed => e,
                _ => continue,
            };
            for key in self.epoch_keys(sealed.number) {
                for attestation in self.store.attestations_for_epoch_key(epoch, key)? {
                    if attestation.valid == Some(true) && attestation.attester_id == attester_id {
                        matched.push((attestation.epoch, attestation.index, attestation));
                    }
                }
            }
        }
        matched.sort_by_key(|(epoch, index, _)| (*epoch, *index));
        Ok(reputation::fold(matched.into_iter().map(|(_, _, a)| a)))
    }

    /// this identity's user-state tree, rebuilt by folding its reputation
    /// against every attester it has ever been attested by
    fn user_state_tree(&self, attesters: &[u64]) -> UserStateResult<SparseMerkleTree<H>> {
        let mut ust = SparseMerkleTree::new(self.params.ust_depth, SMT_ONE_LEAF, self.hasher.clone());
        for &attester_id in attesters {
            let rep = self.reputation(attester_id)?;
            let leaf = hash_reputation(self.hasher, rep.pos_rep, rep.neg_rep, rep.graffiti, rep.sign_up);
            ust.update(attester_id, leaf);
        }
        Ok(ust)
    }

    fn own_gst_leaf(&self, ust_root: FieldElement) -> FieldElement {
        self.hasher.hash2(&self.id_commitment, &ust_root)
    }

    /// locates this identity's own leaf in `epoch`'s global state tree and
    /// returns its authentication path, or `NotFound` if the identity has no
    /// recorded leaf in that epoch (e.g. it signed up in a later epoch)
    fn gst_membership(&self, epoch: u64, ust_root: FieldElement) -> UserStateResult<(FieldElement, unirep_tree::MerklePath)> {
        let leaf = self.own_gst_leaf(ust_root);
        let row = self
            .store
            .gst_leaves_for_epoch(epoch)?
            .into_iter()
            .find(|row| row.hash == leaf)
            .ok_or_else(|| UserStateError::NotFound(format!("no GST leaf for this identity in epoch {epoch}")))?;
        let tree = gen_gst_tree(self.store, epoch, &self.params, self.hasher)?;
        let path = tree.path(row.index as usize)?;
        Ok((tree.root(), path))
    }

    /// `proveUserSignUp` inputs: GST membership for `epoch`, assuming no
    /// attestations have yet changed the identity's user-state root
    pub fn gen_sign_up_proof_inputs(
        &self,
        epoch: u64,
        nonce: usize,
        attester_id: u64,
        user_has_signed_up: bool,
    ) -> UserStateResult<SignUpProofInputs> {
        let ust_root = empty_ust_root(self.hasher, self.params.ust_depth);
        let (root, gst_path) = self.gst_membership(epoch, ust_root)?;
        let epoch_key = self.epoch_keys(epoch)[nonce];
        Ok(SignUpProofInputs {
            epoch,
            epoch_key,
            global_state_tree: root,
            gst_path,
            attester_id,
            user_has_signed_up,
        })
    }

    /// `verifyEpochKey` inputs
    pub fn gen_epoch_key_proof_inputs(
        &self,
        epoch: u64,
        nonce: usize,
        attesters: &[u64],
    ) -> UserStateResult<EpochKeyProofInputs> {
        let ust = self.user_state_tree(attesters)?;
        let (root, gst_path) = self.gst_membership(epoch, ust.root())?;
        let epoch_key = self.epoch_keys(epoch)[nonce];
        Ok(EpochKeyProofInputs { epoch, epoch_key, global_state_tree: root, gst_path })
    }

    /// `proveReputation` inputs for the reputation currently held against
    /// `attester_id`
    pub fn gen_reputation_proof_inputs(
        &self,
        epoch: u64,
        nonce: usize,
        attester_id: u64,
        attesters: &[u64],
        min_rep: u64,
        prove_graffiti: bool,
        graffiti_pre_image: FieldElement,
    ) -> UserStateResult<ReputationProofInputs> {
        let ust = self.user_state_tree(attesters)?;
        let ust_root = ust.root();
        let ust_path = ust.merkle_proof(attester_id);
        let (root, gst_path) = self.gst_membership(epoch, ust_root)?;
        let epoch_key = self.epoch_keys(epoch)[nonce];
        Ok(ReputationProofInputs {
            epoch,
            epoch_key,
            global_state_tree: root,
            gst_path,
            attester_id,
            ust_root,
            ust_path,
            min_rep,
            prove_graffiti,
            graffiti_pre_image,
        })
    }

    /// inputs for the user-state-transition trio: GST membership in
    /// `from_epoch` plus the sealed epoch tree's membership path for every
    /// epoch key the identity held there
    pub fn gen_user_state_transition_proof_inputs(
        &self,
        from_epoch: u64,
        attesters: &[u64],
    ) -> UserStateResult<UserStateTransitionProofInputs> {
        let ust = self.user_state_tree(attesters)?;
        let (root, gst_path) = self.gst_membership(from_epoch, ust.root())?;
        let sealed = self
            .store
            .get_epoch(from_epoch)?
            .ok_or_else(|| UserStateError::NotFound(format!("epoch {from_epoch} does not exist")))?;
        let from_epoch_tree = sealed
            .epoch_root
            .ok_or_else(|| UserStateError::NotFound(format!("epoch {from_epoch} is not sealed yet")))?;

        let mut epoch_tree = SparseMerkleTree::new(self.params.epoch_tree_depth, SMT_ONE_LEAF, self.hasher.clone());
        let mut epoch_key_paths = Vec::new();
        for key in self.epoch_keys(from_epoch) {
            let attestations = self.store.attestations_for_epoch_key(from_epoch, key)?;
            let mut chain = FieldElement::ZERO;
            for a in attestations.iter().filter(|a| a.valid == Some(true)) {
                chain = self.hasher.hash2(&a.hash, &chain);
            }
            chain = self.hasher.hash2(&FieldElement::ONE, &chain);
            epoch_tree.update(key, chain);
            epoch_key_paths.push((key, epoch_tree.merkle_proof(key)));
        }

        Ok(UserStateTransitionProofInputs {
            from_epoch,
            from_global_state_tree: root,
            gst_path,
            epoch_key_paths,
            from_epoch_tree,
        })
    }
}
