//! merkle tree engine: incremental binary tree for the global state tree,
//! sparse Merkle tree for epoch trees and user-state trees

pub mod hasher;
pub mod incremental;
pub mod protocol;
pub mod sparse;

pub use hasher::{Hasher, PoseidonStub};
pub use incremental::{verify_path, IncrementalTree, MerklePath, TreeError};
pub use protocol::{
    compute_init_ust_root, default_gst_leaf, empty_ust_root, hash_reputation,
    signup_airdrop_epoch_key, SMT_ONE_LEAF,
};
pub use sparse::{SmtProof, SparseMerkleTree};
