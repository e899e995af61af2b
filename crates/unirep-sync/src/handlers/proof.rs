//! the six `Indexed*Proof` topics: decode the circuit's public-signal
//! layout, call the prover, and persist a Proof row carrying every
//! auxiliary field a later user-state-transition handler may chain on.

use unirep_store::records::{Nullifier, Proof};
use unirep_tree::Hasher;
use unirep_types::{Circuit, FieldElement, ReputationSignals};

use super::{Decision, HandlerCtx};
use crate::decode::IndexedProofLog;
use crate::error::SyncError;

pub async fn handle_indexed_proof<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    circuit: Circuit,
    log: IndexedProofLog,
) -> Result<Decision<H>, SyncError> {
    if let Some(epoch) = log.epoch {
        if let Err(reason) = super::require_existing_epoch(ctx.store, epoch) {
            return Ok(Decision::rejected(reason));
        }
    }

    let verified = ctx.prover.verify(circuit, &log.public_signals, &log.proof).await?;

    let root_exists = match log.global_state_tree {
        Some(root) => root_exists_in_any_epoch(ctx, &root)?,
        None => true,
    };

    let mut duplicate_nullifier = false;
    let mut fresh_rep_nullifiers: Vec<FieldElement> = Vec::new();
    if circuit == Circuit::ProveReputation {
        if let Ok(signals) = ReputationSignals::decode(&log.public_signals, nullifier_count(&log)) {
            for nullifier in &signals.rep_nullifiers {
                if nullifier.is_zero() {
                    continue;
                }
                if ctx.store.nullifier_confirmed_epoch(nullifier)?.is_some() {
                    duplicate_nullifier = true;
                    break;
                }
                fresh_rep_nullifiers.push(*nullifier);
            }
        }
    }

    let valid = verified && root_exists && !duplicate_nullifier;
    let epoch = log.epoch;

    let record = Proof {
        index: log.proof_index,
        circuit,
        epoch: log.epoch,
        public_signals: log.public_signals,
        proof: log.proof,
        valid,
        spent: false,
        blinded_user_state: log.blinded_user_state,
        blinded_hash_chain: log.blinded_hash_chain,
        output_blinded_user_state: log.output_blinded_user_state,
        input_blinded_user_state: log.input_blinded_user_state,
        output_blinded_hash_chain: log.output_blinded_hash_chain,
        global_state_tree: log.global_state_tree,
        proof_index_records: log.proof_index_records,
        submitted_at: ctx.position.block_number,
    };

    let write: super::WriteFn = Box::new(move |txn| {
        txn.put_proof(&record)?;
        if valid {
            // persist the reputation proof's own nullifiers now that it has
            // verified, so a later repeated submission of the same
            // nullifier is caught by the `duplicate_nullifier` check above
            // instead of passing unnoticed every time.
            for nullifier in &fresh_rep_nullifiers {
                txn.put_nullifier(&Nullifier {
                    epoch: epoch.unwrap_or(0),
                    value: *nullifier,
                    confirmed: true,
                })?;
            }
        }
        Ok(())
    });

    Ok(Decision::applied(write))
}

/// `globalStateTree` isn't tagged with the epoch it belongs to on the wire,
/// so membership is checked against every epoch's recorded root set; real
/// deployments bound this by the small number of epochs a proof can
/// plausibly reference (§1 scopes exact age-bounding out).
fn root_exists_in_any_epoch<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    root: &unirep_types::FieldElement,
) -> Result<bool, SyncError> {
    let mut epoch = 0;
    loop {
        match ctx.store.get_epoch(epoch)? {
            Some(_) => {
                if ctx.store.gst_root_exists(epoch, root)? {
                    return Ok(true);
                }
                epoch += 1;
            }
            None => return Ok(false),
        }
    }
}

fn nullifier_count(log: &IndexedProofLog) -> usize {
    // reputation proofs encode their nullifier count implicitly in the
    // signal vector's length relative to the fixed 8 trailing signals
    log.public_signals.len().saturating_sub(8)
}
