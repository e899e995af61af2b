//! `AttestationSubmitted`, and its legacy topic alike: persist the
//! attestation row, then resolve its validity against the proofs it
//! references.

use unirep_store::records::{Attestation, EpochKey};
use unirep_store::StoreError;
use unirep_tree::Hasher;

use super::{Decision, HandlerCtx};
use crate::decode::AttestationSubmittedLog;
use crate::error::SyncError;

pub async fn handle_attestation_submitted<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    log: AttestationSubmittedLog,
) -> Result<Decision<H>, SyncError> {
    if let Err(reason) = super::require_open_epoch(ctx.store, log.epoch) {
        return Ok(Decision::rejected(reason));
    }
    if let Err(reason) = super::validate_epoch_key(log.epoch_key, ctx.params.epoch_tree_depth) {
        return Ok(Decision::rejected(reason));
    }

    let hash = ctx.hasher.hash_n(&[
        log.attester,
        unirep_types::FieldElement::from_u64(log.attester_id),
        unirep_types::FieldElement::from_u64(log.pos_rep),
        unirep_types::FieldElement::from_u64(log.neg_rep),
        log.graffiti,
    ]);

    let to_proof = ctx
        .store
        .get_proof(log.to_proof_index)?
        .ok_or_else(|| StoreError::NotFound(format!("to_proof_index {}", log.to_proof_index)))?;

    let mut valid = to_proof.valid;
    let mut spent_from_proof = None;

    if valid && log.from_proof_index != 0 {
        let from_proof = ctx
            .store
            .get_proof(log.from_proof_index)?
            .ok_or_else(|| StoreError::NotFound(format!("from_proof_index {}", log.from_proof_index)))?;
        if !from_proof.valid || from_proof.spent {
            valid = false;
        } else {
            let mut updated = from_proof;
            updated.spent = true;
            spent_from_proof = Some(updated);
        }
    }

    let attestation = Attestation {
        epoch: log.epoch,
        epoch_key: log.epoch_key,
        index: ctx.position_order_key(),
        attester: log.attester,
        attester_id: log.attester_id,
        pos_rep: log.pos_rep,
        neg_rep: log.neg_rep,
        graffiti: log.graffiti,
        overwrite_graffiti: log.overwrite_graffiti,
        sign_up: log.sign_up,
        from_proof_index: log.from_proof_index,
        to_proof_index: log.to_proof_index,
        hash,
        valid: Some(valid),
    };

    let epoch = log.epoch;
    let epoch_key = log.epoch_key;
    let write: super::WriteFn = Box::new(move |txn| {
        txn.put_attestation(&attestation)?;
        if let Some(updated) = &spent_from_proof {
            txn.put_proof(updated)?;
        }
        if valid && txn.get_epoch_key(epoch, epoch_key)?.is_none() {
            txn.put_epoch_key(&EpochKey { epoch, key: epoch_key })?;
        }
        Ok(())
    });

    Ok(Decision::applied(write))
}
