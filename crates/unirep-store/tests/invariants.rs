use unirep_store::{Attestation, Epoch, EpochKey, GstLeaf, Nullifier, Proof, Store, SyncState};
use unirep_types::{Circuit, FieldElement};

fn store() -> Store {
    Store::open_temporary().expect("open temporary store")
}

#[test]
fn gst_leaves_are_returned_in_dense_index_order() {
    let s = store();
    s.transaction(|txn| {
        for i in 0..5u64 {
            txn.put_gst_leaf(&GstLeaf {
                epoch: 1,
                index: i,
                hash: FieldElement::from_u64(i),
                tx_hash: [i as u8; 32],
            })?;
        }
        Ok(())
    })
    .unwrap();

    let leaves = s.gst_leaves_for_epoch(1).unwrap();
    let indices: Vec<u64> = leaves.iter().map(|l| l.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(s.gst_leaf_count(1).unwrap(), 5);
}

#[test]
fn gst_roots_are_independently_addressable_per_epoch() {
    let s = store();
    let root_a = FieldElement::from_u64(111);
    let root_b = FieldElement::from_u64(222);
    s.transaction(|txn| {
        txn.put_gst_root(1, &root_a)?;
        txn.put_gst_root(2, &root_b)?;
        Ok(())
    })
    .unwrap();

    assert!(s.gst_root_exists(1, &root_a).unwrap());
    assert!(!s.gst_root_exists(1, &root_b).unwrap());
    assert!(s.gst_root_exists(2, &root_b).unwrap());
}

#[test]
fn confirmed_nullifier_is_unique_across_the_whole_store_not_just_one_epoch() {
    let s = store();
    let value = FieldElement::from_u64(999);
    s.transaction(|txn| txn.put_nullifier(&Nullifier { epoch: 1, value, confirmed: true }))
        .unwrap();

    assert_eq!(s.nullifier_confirmed_epoch(&value).unwrap(), Some(1));

    // an unconfirmed sighting of the same value in a later epoch does not
    // overwrite the confirming epoch
    s.transaction(|txn| txn.put_nullifier(&Nullifier { epoch: 2, value, confirmed: false })).unwrap();
    assert_eq!(s.nullifier_confirmed_epoch(&value).unwrap(), Some(1));
}

fn attestation(epoch: u64, epoch_key: u64, index: u64) -> Attestation {
    Attestation {
        epoch,
        epoch_key,
        index,
        attester: FieldElement::from_u64(7),
        attester_id: 7,
        pos_rep: 1,
        neg_rep: 0,
        graffiti: FieldElement::ZERO,
        overwrite_graffiti: false,
        sign_up: false,
        from_proof_index: 0,
        to_proof_index: 0,
        hash: FieldElement::from_u64(index),
        valid: Some(true),
    }
}

#[test]
fn attestations_are_queryable_both_within_an_epoch_key_and_across_all_epochs() {
    let s = store();
    s.transaction(|txn| {
        for (epoch, idx) in [(1u64, 0u64), (1, 1), (2, 0)] {
            txn.put_attestation(&attestation(epoch, 42, idx))?;
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(s.attestations_for_epoch_key(1, 42).unwrap().len(), 2);
    assert_eq!(s.attestations_for_epoch_key(2, 42).unwrap().len(), 1);
    assert_eq!(s.attestations_for_key(42).unwrap().len(), 3);
}

#[test]
fn sync_state_defaults_to_genesis_and_round_trips() {
    let s = store();
    assert_eq!(s.get_sync_state().unwrap(), SyncState::genesis());

    let advanced = SyncState {
        latest_processed_block: 10,
        latest_processed_transaction_index: 2,
        latest_processed_log_index: 0,
        latest_complete_block: 9,
    };
    s.transaction(|txn| txn.put_sync_state(&advanced)).unwrap();
    assert_eq!(s.get_sync_state().unwrap(), advanced);
}

fn signup_proof(index: u64) -> Proof {
    Proof {
        index,
        circuit: Circuit::ProveUserSignUp,
        epoch: Some(1),
        public_signals: vec![FieldElement::from_u64(1)],
        proof: vec![FieldElement::from_u64(2)],
        valid: true,
        spent: false,
        blinded_user_state: None,
        blinded_hash_chain: None,
        output_blinded_user_state: None,
        input_blinded_user_state: None,
        output_blinded_hash_chain: None,
        global_state_tree: None,
        proof_index_records: Vec::new(),
        submitted_at: 0,
    }
}

#[test]
fn epoch_and_proof_records_round_trip_through_one_transaction() {
    let s = store();
    s.transaction(|txn| {
        txn.put_epoch(&Epoch::unsealed(1, 0))?;
        txn.put_epoch_key(&EpochKey { epoch: 1, key: 5 })?;
        txn.put_proof(&signup_proof(0))
    })
    .unwrap();

    assert_eq!(s.get_epoch(1).unwrap().unwrap().sealed, false);
    assert_eq!(s.get_epoch_key(1, 5).unwrap(), Some(EpochKey { epoch: 1, key: 5 }));
    assert!(s.get_proof(0).unwrap().unwrap().valid);
    assert_eq!(s.proof_count().unwrap(), 1);
}

#[test]
fn a_failing_transaction_commits_none_of_its_writes() {
    let s = store();
    let result = s.transaction(|txn| {
        txn.put_epoch(&Epoch::unsealed(1, 0))?;
        Err(unirep_store::StoreError::InvariantViolation("deliberate abort".into()))
    });
    assert!(result.is_err());
    assert!(s.get_epoch(1).unwrap().is_none());
}
