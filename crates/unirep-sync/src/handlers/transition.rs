//! `UserStateTransitioned`: the most intricate handler (§4.4 step 1-7).
//! Walks the chain of proofs a user-state transition rests on, checks every
//! blinded-state/hash-chain link, confirms the epoch-key nullifiers it
//! spends, and — only if every step holds — inserts the new GST leaf.

use unirep_store::records::{GstLeaf, Nullifier, Proof};
use unirep_store::StoreError;
use unirep_tree::Hasher;
use unirep_types::{Circuit, FieldElement, UserStateTransitionSignals};

use super::{Decision, HandlerCtx};
use crate::decode::UserStateTransitionedLog;
use crate::error::{RejectReason, SyncError};

pub async fn handle_user_state_transitioned<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    log: UserStateTransitionedLog,
) -> Result<Decision<H>, SyncError> {
    if let Err(reason) = super::require_existing_epoch(ctx.store, log.epoch) {
        return Ok(Decision::rejected(reason));
    }

    let ust_proof = ctx
        .store
        .get_proof(log.proof_index)?
        .ok_or_else(|| StoreError::NotFound(format!("proof_index {}", log.proof_index)))?;

    if !ust_proof.valid || ust_proof.circuit != Circuit::UserStateTransition {
        return Ok(reject(
            "referenced proof is not a valid user-state-transition proof",
        ));
    }

    let signals = match UserStateTransitionSignals::decode(
        &ust_proof.public_signals,
        ctx.params.epoch_key_nonces,
        ust_proof.proof_index_records.len(),
    ) {
        Ok(signals) => signals,
        Err(_) => return Ok(reject("user-state-transition proof has a malformed signal vector")),
    };

    let Some((&start_index, process_indices)) = ust_proof.proof_index_records.split_first() else {
        return Ok(reject("user-state-transition proof has no proofIndexRecords"));
    };

    let start = ctx
        .store
        .get_proof(start_index)?
        .ok_or_else(|| StoreError::NotFound(format!("start-transition proof {start_index}")))?;
    if !start.valid
        || start.blinded_user_state != ust_proof.blinded_user_state
        || start.global_state_tree != ust_proof.global_state_tree
    {
        return Ok(reject("start-transition proof does not match the user-state-transition proof"));
    }

    let mut chain_proofs: Vec<Proof> = vec![start.clone()];
    let mut current_blinded_user_state = start.output_blinded_user_state;
    for &index in process_indices {
        let step = ctx
            .store
            .get_proof(index)?
            .ok_or_else(|| StoreError::NotFound(format!("process-attestations proof {index}")))?;
        if !step.valid || step.input_blinded_user_state != current_blinded_user_state {
            return Ok(reject("process-attestations proof chain is broken"));
        }
        current_blinded_user_state = step.output_blinded_user_state;
        chain_proofs.push(step.clone());
    }

    for wanted in &signals.blinded_hash_chains {
        let found = chain_proofs
            .iter()
            .any(|p| p.output_blinded_hash_chain == Some(*wanted));
        if !found {
            return Ok(reject("a blindedHashChain has no matching proof in the referenced chain"));
        }
    }

    let transition_from_epoch = decimal_to_u64(&signals.transition_from_epoch);
    let from_root_exists = ctx
        .store
        .gst_root_exists(transition_from_epoch, &signals.from_global_state_tree)?;
    if !from_root_exists {
        return Ok(reject("fromGlobalStateTree does not exist for transitionFromEpoch"));
    }
    let source_epoch = ctx
        .store
        .get_epoch(transition_from_epoch)?
        .ok_or_else(|| StoreError::NotFound(format!("epoch {transition_from_epoch}")))?;
    if source_epoch.epoch_root != Some(signals.from_epoch_tree) {
        return Ok(reject("fromEpochTree does not match the sealed epoch tree root"));
    }

    let nonzero_nullifiers: Vec<FieldElement> =
        signals.epk_nullifiers.iter().filter(|n| !n.is_zero()).copied().collect();
    for nullifier in &nonzero_nullifiers {
        if ctx.store.nullifier_confirmed_epoch(nullifier)?.is_some() {
            return Ok(Decision::rejected(RejectReason::DuplicateNullifier));
        }
    }

    if log.leaf != signals.new_global_state_tree_leaf {
        return Ok(reject(
            "event leaf does not match the proof's newGlobalStateTreeLeaf",
        ));
    }

    let mut probe = ctx.gst.clone();
    let index = match probe.insert(log.leaf) {
        Ok(index) => index,
        Err(_) => return Ok(reject("global state tree is full")),
    };
    let root = probe.root();

    let epoch = log.epoch;
    let tx_hash = ctx.tx_hash;
    let leaf = log.leaf;
    let write: super::WriteFn = Box::new(move |txn| {
        for nullifier in &nonzero_nullifiers {
            txn.delete_nullifier(epoch, nullifier)?;
            txn.put_nullifier(&Nullifier { epoch, value: *nullifier, confirmed: true })?;
        }
        txn.put_gst_leaf(&GstLeaf { epoch, index: index as u64, hash: leaf, tx_hash })?;
        txn.put_gst_root(epoch, &root)
    });
    let finalize: super::FinalizeFn<H> = Box::new(move |gst| gst.insert(leaf).map(|_| ()));

    Ok(Decision::applied_with_finalize(write, finalize))
}

fn reject<H: Hasher>(reason: &str) -> Decision<H> {
    Decision::rejected(RejectReason::ProtocolViolation(reason.to_string()))
}

/// epoch numbers travel as plain `u64`s everywhere except inside circuit
/// public signals, where every value is a field element; this recovers the
/// small integer `transitionFromEpoch` actually encodes.
fn decimal_to_u64(value: &FieldElement) -> u64 {
    value.to_decimal().parse().unwrap_or(u64::MAX)
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

    fn f(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    fn signals(k: usize, nullifiers: &[u64], from_epoch: u64, blinded_hash_chains: &[u64], new_leaf: u64) -> Vec<FieldElement> {
        let mut out = vec![f(new_leaf)];
        for i in 0..k {
            out.push(f(nullifiers.get(i).copied().unwrap_or(0)));
        }
        out.push(f(from_epoch));
        out.push(f(100)); // blindedUserStates[0]
        out.push(f(101)); // blindedUserStates[1]
        out.push(f(200)); // fromGlobalStateTree
        for c in blinded_hash_chains {
            out.push(f(*c));
        }
        out.push(f(300)); // fromEpochTree
        out
    }

    fn base_proof(index: u64, circuit: Circuit) -> Proof {
        Proof {
            index,
            circuit,
            epoch: None,
            public_signals: vec![],
            proof: vec![],
            valid: true,
            spent: false,
            blinded_user_state: None,
            blinded_hash_chain: None,
            output_blinded_user_state: None,
            input_blinded_user_state: None,
            output_blinded_hash_chain: None,
            global_state_tree: None,
            proof_index_records: vec![],
            submitted_at: 0,
        }
    }

    #[tokio::test]
    async fn applies_a_well_formed_transition() {
        let store = Store::open_temporary().unwrap();
        store
            .transaction(|txn| {
                let mut epoch0 = Epoch::unsealed(0, 0);
                epoch0.sealed = true;
                epoch0.epoch_root = Some(f(300));
                txn.put_epoch(&epoch0)?;
                txn.put_epoch(&Epoch::unsealed(1, 0))?;
                txn.put_gst_root(0, &f(200))
            })
            .unwrap();

        let mut start = base_proof(10, Circuit::StartTransition);
        start.blinded_user_state = Some(f(100));
        start.global_state_tree = Some(f(200));
        start.output_blinded_user_state = Some(f(101));
        start.output_blinded_hash_chain = Some(f(400));
        store.transaction(|txn| txn.put_proof(&start)).unwrap();

        let mut ust = base_proof(20, Circuit::UserStateTransition);
        ust.blinded_user_state = Some(f(100));
        ust.global_state_tree = Some(f(200));
        ust.proof_index_records = vec![10];
        ust.public_signals = signals(3, &[5], 0, &[400], 999);
        store.transaction(|txn| txn.put_proof(&ust)).unwrap();

        let params = ProtocolParams::default();
        let mut gst = IncrementalTree::new(params.gst_depth, FieldElement::ZERO, PoseidonStub);
        let prover = MockProver::new(true);
        let ctx = HandlerCtx {
            store: &store,
            gst: &gst,
            hasher: &PoseidonStub,
            prover: &prover,
            params,
            position: unirep_types::LogPosition::genesis(),
            tx_hash: [0u8; 32],
        };

        let log = UserStateTransitionedLog { epoch: 1, leaf: f(999), proof_index: 20 };
        let decision = handle_user_state_transitioned(&ctx, log).await.unwrap();
        let outcome = apply_decision(&store, &mut gst, decision).unwrap();
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(gst.len(), 1);
        assert_eq!(store.nullifier_confirmed_epoch(&f(5)).unwrap(), Some(1));
    }

    #[tokio::test]
    async fn rejects_a_reused_nullifier() {
        let store = Store::open_temporary().unwrap();
        store
            .transaction(|txn| {
                let mut epoch0 = Epoch::unsealed(0, 0);
                epoch0.sealed = true;
                epoch0.epoch_root = Some(f(300));
                txn.put_epoch(&epoch0)?;
                txn.put_epoch(&Epoch::unsealed(1, 0))?;
                txn.put_gst_root(0, &f(200))?;
                txn.put_nullifier(&Nullifier { epoch: 0, value: f(5), confirmed: true })
            })
            .unwrap();

        let mut start = base_proof(10, Circuit::StartTransition);
        start.blinded_user_state = Some(f(100));
        start.global_state_tree = Some(f(200));
        start.output_blinded_user_state = Some(f(101));
        start.output_blinded_hash_chain = Some(f(400));
        store.transaction(|txn| txn.put_proof(&start)).unwrap();

        let mut ust = base_proof(20, Circuit::UserStateTransition);
        ust.blinded_user_state = Some(f(100));
        ust.global_state_tree = Some(f(200));
        ust.proof_index_records = vec![10];
        ust.public_signals = signals(3, &[5], 0, &[400], 999);
        store.transaction(|txn| txn.put_proof(&ust)).unwrap();

        let params = ProtocolParams::default();
        let mut gst = IncrementalTree::new(params.gst_depth, FieldElement::ZERO, PoseidonStub);
        let prover = MockProver::new(true);
        let ctx = HandlerCtx {
            store: &store,
            gst: &gst,
            hasher: &PoseidonStub,
            prover: &prover,
            params,
            position: unirep_types::LogPosition::genesis(),
            tx_hash: [0u8; 32],
        };

        let log = UserStateTransitionedLog { epoch: 1, leaf: f(999), proof_index: 20 };
        let decision = handle_user_state_transitioned(&ctx, log).await.unwrap();
        let outcome = apply_decision(&store, &mut gst, decision).unwrap();
        assert_eq!(outcome, Outcome::Rejected(RejectReason::DuplicateNullifier));
        assert_eq!(gst.len(), 0);
    }
}
