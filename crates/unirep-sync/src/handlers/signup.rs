//! `UserSignedUp` handler: derives the initial user-state-tree root, computes
//! the GST leaf, and inserts it into both the durable store and the live
//! in-memory tree.

use unirep_store::records::{Attestation, GstLeaf};
use unirep_tree::{compute_init_ust_root, signup_airdrop_epoch_key, Hasher};

use super::{Decision, HandlerCtx};
use crate::decode::UserSignedUpLog;
use crate::error::{RejectReason, SyncError};

pub async fn handle_user_signed_up<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    log: UserSignedUpLog,
) -> Result<Decision<H>, SyncError> {
    if let Err(reason) = super::require_open_epoch(ctx.store, log.epoch) {
        return Ok(Decision::rejected(reason));
    }

    let init_ust_root =
        compute_init_ust_root(ctx.hasher, ctx.params.ust_depth, log.attester_id, log.airdrop_amount);
    let leaf = ctx.hasher.hash2(&log.id_commitment, &init_ust_root);

    // probe a clone first: the live tree must only ever be mutated once the
    // write below has durably committed, so a would-be failure has to be
    // known before either closure is built.
    let mut probe = ctx.gst.clone();
    let index = match probe.insert(leaf) {
        Ok(index) => index,
        Err(_) => {
            return Ok(Decision::rejected(RejectReason::ProtocolViolation(
                "global state tree is full".into(),
            )))
        }
    };
    let root = probe.root();

    let epoch = log.epoch;
    let tx_hash = ctx.tx_hash;

    // the airdrop is baked into `init_ust_root` above, which only the
    // identity itself can ever open — record it as an Attestation too, on a
    // key derived purely from the event's own public fields, so
    // `UserState::reputation` can recover `signUp`/`posRep` for this
    // attester without needing the private identity nullifier.
    let airdrop_attestation = if log.airdrop_amount > 0 {
        let epoch_key =
            signup_airdrop_epoch_key(ctx.hasher, log.id_commitment, log.attester_id, ctx.params.epoch_tree_depth);
        let hash = ctx.hasher.hash_n(&[
            log.id_commitment,
            unirep_types::FieldElement::from_u64(log.attester_id),
            unirep_types::FieldElement::from_u64(log.airdrop_amount),
        ]);
        Some(Attestation {
            epoch,
            epoch_key,
            index: 0,
            attester: unirep_types::FieldElement::ZERO,
            attester_id: log.attester_id,
            pos_rep: log.airdrop_amount,
            neg_rep: 0,
            graffiti: unirep_types::FieldElement::ZERO,
            overwrite_graffiti: false,
            sign_up: true,
            from_proof_index: 0,
            to_proof_index: 0,
            hash,
            valid: Some(true),
        })
    } else {
        None
    };

    let write: super::WriteFn = Box::new(move |txn| {
        txn.put_gst_leaf(&GstLeaf { epoch, index: index as u64, hash: leaf, tx_hash })?;
        txn.put_gst_root(epoch, &root)?;
        if let Some(attestation) = &airdrop_attestation {
            txn.put_attestation(attestation)?;
        }
        Ok(())
    });
    let finalize: super::FinalizeFn<H> = Box::new(move |gst| gst.insert(leaf).map(|_| ()));

    Ok(Decision::applied_with_finalize(write, finalize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolParams;
    use crate::error::Outcome;
    use crate::handlers::apply_decision;
    use unirep_prover::mock::MockProver;
    use unirep_store::records::Epoch;
    use unirep_store::Store;
    use unirep_tree::{IncrementalTree, PoseidonStub};

    fn ctx_fixture<'a>(
        store: &'a Store,
        gst: &'a IncrementalTree<PoseidonStub>,
        prover: &'a MockProver,
    ) -> HandlerCtx<'a, PoseidonStub> {
        HandlerCtx {
            store,
            gst,
            hasher: &PoseidonStub,
            prover,
            params: ProtocolParams::default(),
            position: unirep_types::LogPosition::genesis(),
            tx_hash: [1u8; 32],
        }
    }

    #[tokio::test]
    async fn inserts_a_leaf_and_advances_the_tree() {
        let store = Store::open_temporary().unwrap();
        store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();
        let mut gst = IncrementalTree::new(4, unirep_tree::default_gst_leaf(&PoseidonStub, 8), PoseidonStub);
        let prover = MockProver::new(true);

        let log = UserSignedUpLog { epoch: 0, id_commitment: unirep_types::FieldElement::from_u64(1), attester_id: 7, airdrop_amount: 0 };
        let decision = handle_user_signed_up(&ctx_fixture(&store, &gst, &prover), log).await.unwrap();
        let outcome = apply_decision(&store, &mut gst, decision).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(gst.len(), 1);
        assert_eq!(store.gst_leaf_count(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn an_airdrop_is_recorded_as_a_synthetic_attestation() {
        let store = Store::open_temporary().unwrap();
        store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();
        let mut gst = IncrementalTree::new(4, unirep_tree::default_gst_leaf(&PoseidonStub, 8), PoseidonStub);
        let prover = MockProver::new(true);

        let id_commitment = unirep_types::FieldElement::from_u64(1);
        let log = UserSignedUpLog { epoch: 0, id_commitment, attester_id: 7, airdrop_amount: 10 };
        let decision = handle_user_signed_up(&ctx_fixture(&store, &gst, &prover), log).await.unwrap();
        apply_decision(&store, &mut gst, decision).unwrap();

        let epoch_key = unirep_tree::signup_airdrop_epoch_key(&PoseidonStub, id_commitment, 7, ProtocolParams::default().epoch_tree_depth);
        let attestations = store.attestations_for_epoch_key(0, epoch_key).unwrap();
        assert_eq!(attestations.len(), 1);
        assert_eq!(attestations[0].pos_rep, 10);
        assert!(attestations[0].sign_up);
        assert_eq!(attestations[0].valid, Some(true));
    }

    #[tokio::test]
    async fn no_airdrop_records_no_attestation() {
        let store = Store::open_temporary().unwrap();
        store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();
        let mut gst = IncrementalTree::new(4, unirep_tree::default_gst_leaf(&PoseidonStub, 8), PoseidonStub);
        let prover = MockProver::new(true);

        let id_commitment = unirep_types::FieldElement::from_u64(1);
        let log = UserSignedUpLog { epoch: 0, id_commitment, attester_id: 7, airdrop_amount: 0 };
        let decision = handle_user_signed_up(&ctx_fixture(&store, &gst, &prover), log).await.unwrap();
        apply_decision(&store, &mut gst, decision).unwrap();

        let epoch_key = unirep_tree::signup_airdrop_epoch_key(&PoseidonStub, id_commitment, 7, ProtocolParams::default().epoch_tree_depth);
        assert!(store.attestations_for_epoch_key(0, epoch_key).unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_epoch() {
        let store = Store::open_temporary().unwrap();
        store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();
        let mut gst = IncrementalTree::new(4, unirep_tree::default_gst_leaf(&PoseidonStub, 8), PoseidonStub);
        let prover = MockProver::new(true);

        let log = UserSignedUpLog { epoch: 5, id_commitment: unirep_types::FieldElement::from_u64(1), attester_id: 7, airdrop_amount: 0 };
        let decision = handle_user_signed_up(&ctx_fixture(&store, &gst, &prover), log).await.unwrap();
        let outcome = apply_decision(&store, &mut gst, decision).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(RejectReason::ProtocolViolation(_))));
        assert_eq!(gst.len(), 0);
    }
}
