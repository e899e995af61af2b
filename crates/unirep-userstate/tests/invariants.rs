//! cross-checks that a rebuilt tree agrees with what the ingestor itself
//! persisted, so "replay the leaves" and "trust the live tree" are
//! guaranteed to produce the same root rather than merely expected to.

use unirep_store::records::{Epoch, GstLeaf};
use unirep_store::Store;
use unirep_sync::ProtocolParams;
use unirep_tree::{default_gst_leaf, Hasher, IncrementalTree, PoseidonStub};
use unirep_types::FieldElement;
use unirep_userstate::gen_gst_tree;

fn params() -> ProtocolParams {
    ProtocolParams { gst_depth: 8, epoch_tree_depth: 8, ust_depth: 8, epoch_key_nonces: 1, epoch_length_secs: 300 }
}

#[test]
fn gen_gst_tree_root_matches_the_root_persisted_at_insert_time() {
    let store = Store::open_temporary().unwrap();
    let hasher = PoseidonStub;
    let p = params();
    store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(0, 0))).unwrap();

    let empty_leaf = default_gst_leaf(&hasher, p.ust_depth);
    let mut live = IncrementalTree::new(p.gst_depth, empty_leaf, hasher.clone());
    for i in 0..7u64 {
        let leaf = hasher.hash2(&FieldElement::from_u64(i), &FieldElement::from_u64(i * 2));
        let index = live.insert(leaf).unwrap();
        let root = live.root();
        store
            .transaction(|txn| {
                txn.put_gst_leaf(&GstLeaf { epoch: 0, index: index as u64, hash: leaf, tx_hash: [0u8; 32] })?;
                txn.put_gst_root(0, &root)
            })
            .unwrap();
    }

    let rebuilt = gen_gst_tree(&store, 0, &p, &hasher).unwrap();
    assert_eq!(rebuilt.root(), live.root());
    assert!(store.gst_root_exists(0, &rebuilt.root()).unwrap());
}

#[test]
fn gen_gst_tree_over_an_untouched_epoch_is_the_empty_root() {
    let store = Store::open_temporary().unwrap();
    let hasher = PoseidonStub;
    let p = params();
    store.transaction(|txn| txn.put_epoch(&Epoch::unsealed(3, 0))).unwrap();

    let rebuilt = gen_gst_tree(&store, 3, &p, &hasher).unwrap();
    let empty_leaf = default_gst_leaf(&hasher, p.ust_depth);
    let empty = IncrementalTree::new(p.gst_depth, empty_leaf, hasher.clone());
    assert_eq!(rebuilt.root(), empty.root());
}
