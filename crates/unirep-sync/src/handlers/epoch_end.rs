//! `EpochEnded`: seals the ending epoch's epoch tree, persists its root,
//! opens the next epoch, and resets the in-memory GST.

use unirep_store::records::Epoch;
use unirep_tree::{default_gst_leaf, Hasher, IncrementalTree, SparseMerkleTree};
use unirep_types::FieldElement;

use super::{Decision, HandlerCtx};
use crate::decode::EpochEndedLog;
use crate::error::SyncError;

pub async fn handle_epoch_ended<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    log: EpochEndedLog,
) -> Result<Decision<H>, SyncError> {
    if let Err(reason) = super::require_open_epoch(ctx.store, log.epoch) {
        return Ok(Decision::rejected(reason));
    }

    let keys = ctx.store.epoch_keys_for_epoch(log.epoch)?;
    let mut epoch_tree = SparseMerkleTree::new(
        ctx.params.epoch_tree_depth,
        unirep_tree::SMT_ONE_LEAF,
        ctx.hasher.clone(),
    );

    for epoch_key in &keys {
        let attestations = ctx.store.attestations_for_epoch_key(log.epoch, epoch_key.key)?;
        let mut chain = attestations
            .iter()
            .filter(|a| a.valid == Some(true))
            .fold(FieldElement::ZERO, |chain, a| ctx.hasher.hash2(&a.hash, &chain));
        chain = ctx.hasher.hash2(&FieldElement::ONE, &chain);
        epoch_tree.update(epoch_key.key, chain);
    }

    let epoch_root = epoch_tree.root();

    let mut sealed = ctx
        .store
        .get_epoch(log.epoch)?
        .ok_or_else(|| unirep_store::StoreError::NotFound(format!("epoch {}", log.epoch)))?;
    sealed.sealed = true;
    sealed.epoch_root = Some(epoch_root);
    let next = Epoch::unsealed(log.epoch + 1, ctx.position.block_number);

    let write: super::WriteFn = Box::new(move |txn| {
        txn.put_epoch(&sealed)?;
        txn.put_epoch(&next)
    });

    let gst_depth = ctx.params.gst_depth;
    let ust_depth = ctx.params.ust_depth;
    let hasher = ctx.hasher.clone();
    let finalize: super::FinalizeFn<H> = Box::new(move |gst| {
        let empty_leaf = default_gst_leaf(&hasher, ust_depth);
        *gst = IncrementalTree::new(gst_depth, empty_leaf, hasher);
        Ok(())
    });

    Ok(Decision::applied_with_finalize(write, finalize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolParams;
    use crate::error::Outcome;
    use crate::handlers::apply_decision;
    use unirep_prover::mock::MockProver;
    use unirep_store::records::{Attestation, EpochKey};
    use unirep_store::Store;
    use unirep_tree::PoseidonStub;

    fn attestation(epoch: u64, epoch_key: u64, index: u64, valid: Option<bool>) -> Attestation {
        Attestation {
            epoch,
            epoch_key,
            index,
            attester: FieldElement::from_u64(1),
            attester_id: 1,
            pos_rep: 5,
            neg_rep: 0,
            graffiti: FieldElement::ZERO,
            overwrite_graffiti: false,
            sign_up: false,
            from_proof_index: 0,
            to_proof_index: 0,
            hash: FieldElement::from_u64(index + 100),
            valid,
        }
    }

    #[tokio::test]
    async fn seals_the_epoch_and_opens_the_next() {
        let store = Store::open_temporary().unwrap();
        store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();
        store
            .transaction(|txn| {
                txn.put_epoch_key(&EpochKey { epoch: 0, key: 3 })?;
                txn.put_attestation(&attestation(0, 3, 1, Some(true)))?;
                txn.put_attestation(&attestation(0, 3, 2, Some(false)))
            })
            .unwrap();

        let params = ProtocolParams::default();
        let mut gst = IncrementalTree::new(
            params.gst_depth,
            default_gst_leaf(&PoseidonStub, params.ust_depth),
            PoseidonStub,
        );
        gst.insert(FieldElement::from_u64(42)).unwrap();
        let prover = MockProver::new(true);
        let ctx = HandlerCtx {
            store: &store,
            gst: &gst,
            hasher: &PoseidonStub,
            prover: &prover,
            params: params.clone(),
            position: unirep_types::LogPosition { block_number: 10, transaction_index: 0, log_index: 0 },
            tx_hash: [0u8; 32],
        };

        let decision = handle_epoch_ended(&ctx, EpochEndedLog { epoch: 0 }).await.unwrap();
        let outcome = apply_decision(&store, &mut gst, decision).unwrap();
        assert_eq!(outcome, Outcome::Applied);

        let sealed = store.get_epoch(0).unwrap().unwrap();
        assert!(sealed.sealed);
        assert!(sealed.epoch_root.is_some());
        let next = store.get_epoch(1).unwrap().unwrap();
        assert!(!next.sealed);
        assert_eq!(gst.len(), 0);
    }
}
