//! sparse Merkle tree for epoch trees and user-state trees
//!
//! sparse tree with per-level default-subtree compression, the same
//! technique used for a commitment tree's unfilled levels: a subtree with no
//! inserted leaves short-circuits to a precomputed all-default hash instead
//! of being walked.

use crate::hasher::Hasher;
use std::collections::HashMap;
use unirep_types::FieldElement;

/// inclusion/exclusion proof for one key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtProof {
    pub key: u64,
    pub siblings: Vec<FieldElement>,
}

/// sparse Merkle tree of fixed depth `D`; unset leaves read as `default_leaf`
#[derive(Clone)]
pub struct SparseMerkleTree<H: Hasher> {
    depth: usize,
    default_leaf: FieldElement,
    /// precomputed root of an all-default subtree at each level, index 0 = leaf level
    empty_hash: Vec<FieldElement>,
    leaves: HashMap<u64, FieldElement>,
    hasher: H,
}

impl<H: Hasher> SparseMerkleTree<H> {
    pub fn new(depth: usize, default_leaf: FieldElement, hasher: H) -> Self {
        let mut empty_hash = Vec::with_capacity(depth + 1);
        empty_hash.push(default_leaf);
        for level in 1..=depth {
            let child = empty_hash[level - 1];
            empty_hash.push(hasher.hash2(&child, &child));
        }
        Self {
            depth,
            default_leaf,
            empty_hash,
            leaves: HashMap::new(),
            hasher,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn mask(&self) -> u64 {
        if self.depth >= 64 {
            u64::MAX
        } else {
            (1u64 << self.depth) - 1
        }
    }

    /// set `key`'s leaf value, returning the new root. `key` is truncated to
    /// the tree's depth, matching the epoch-key invariant `key < 2^D_epoch`.
    pub fn update(&mut self, key: u64, value: FieldElement) -> FieldElement {
        let key = key & self.mask();
        if value == self.default_leaf {
            self.leaves.remove(&key);
        } else {
            self.leaves.insert(key, value);
        }
        self.root()
    }

    pub fn get(&self, key: u64) -> FieldElement {
        self.leaves.get(&(key & self.mask())).copied().unwrap_or(self.default_leaf)
    }

    pub fn root(&self) -> FieldElement {
        self.node(self.depth, 0)
    }

    pub fn merkle_proof(&self, key: u64) -> SmtProof {
        let key = key & self.mask();
        let mut siblings = Vec::with_capacity(self.depth);
        let mut index = key;
        for level in 0..self.depth {
            let sibling_index = index ^ 1;
            siblings.push(self.node(level, sibling_index));
            index >>= 1;
        }
        SmtProof { key, siblings }
    }

    pub fn verify_membership(&self, proof: &SmtProof, value: &FieldElement, root: &FieldElement) -> bool {
        let mut current = *value;
        let mut index = proof.key;
        for sibling in &proof.siblings {
            current = if index & 1 == 0 {
                self.hasher.hash2(&current, sibling)
            } else {
                self.hasher.hash2(sibling, &current)
            };
            index >>= 1;
        }
        current == *root
    }

    /// recursively compute the node at (level, index), using only the sparse
    /// `leaves` map plus the precomputed per-level default-subtree hashes; a
    /// subtree that has no inserted leaves under it short-circuits to
    /// `empty_hash[level]` without descending further.
    fn node(&self, level: usize, index: u64) -> FieldElement {
        if level == 0 {
            return self.leaves.get(&index).copied().unwrap_or(self.default_leaf);
        }
        let span = 1u64 << level;
        if self.subtree_is_empty(level, index, span) {
            return self.empty_hash[level];
        }
        let left = self.node(level - 1, index * 2);
        let right = self.node(level - 1, index * 2 + 1);
        self.hasher.hash2(&left, &right)
    }

    fn subtree_is_empty(&self, level: usize, index: u64, span: u64) -> bool {
        let start = index * span;
        let end = start + span;
        !self.leaves.keys().any(|k| *k >= start && *k < end)
    }
}
