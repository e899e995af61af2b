//! fixed-depth incremental binary Merkle tree for the global state tree (GST)
//!
//! unlike a rightmost-frontier accumulator, this keeps full per-level node
//! vectors so that `path(index)` works for any already-inserted leaf, not
//! just the most recently appended one.

use crate::hasher::Hasher;
use thiserror::Error;
use unirep_types::FieldElement;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("tree is full: capacity {capacity} already reached")]
    Full { capacity: usize },
    #[error("leaf index {index} out of range (inserted so far: {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// merkle authentication path for one leaf: `depth` sibling hashes, bottom-up
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    pub leaf_index: usize,
    pub siblings: Vec<FieldElement>,
}

/// incremental binary tree of fixed depth `D`; leaves are inserted densely
/// from index 0. Recomputes the full tree on
/// every insert — correctness-first; a large `depth` should be paired with
/// an incrementally-updated variant (TODO: maintain a frontier + dirty-path
/// set instead of a full rebuild once GST depths in production exceed ~24).
#[derive(Clone)]
pub struct IncrementalTree<H: Hasher> {
    depth: usize,
    empty_leaf: FieldElement,
    leaves: Vec<FieldElement>,
    levels: Vec<Vec<FieldElement>>,
    hasher: H,
}

impl<H: Hasher> IncrementalTree<H> {
    pub fn new(depth: usize, empty_leaf: FieldElement, hasher: H) -> Self {
        let mut tree = Self {
            depth,
            empty_leaf,
            leaves: Vec::new(),
            levels: Vec::new(),
            hasher,
        };
        tree.rebuild();
        tree
    }

    pub fn capacity(&self) -> usize {
        1usize << self.depth
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// insert the next dense leaf, returning its index
    pub fn insert(&mut self, leaf: FieldElement) -> Result<usize, TreeError> {
        if self.leaves.len() >= self.capacity() {
            return Err(TreeError::Full { capacity: self.capacity() });
        }
        let index = self.leaves.len();
        self.leaves.push(leaf);
        self.rebuild();
        Ok(index)
    }

    pub fn root(&self) -> FieldElement {
        self.levels[self.depth][0]
    }

    pub fn path(&self, index: usize) -> Result<MerklePath, TreeError> {
        if index >= self.leaves.len() {
            return Err(TreeError::IndexOutOfRange { index, count: self.leaves.len() });
        }
        let mut siblings = Vec::with_capacity(self.depth);
        let mut idx = index;
        for level in 0..self.depth {
            let sibling_idx = idx ^ 1;
            siblings.push(self.levels[level][sibling_idx]);
            idx /= 2;
        }
        Ok(MerklePath { leaf_index: index, siblings })
    }

    fn rebuild(&mut self) {
        let capacity = self.capacity();
        let mut current: Vec<FieldElement> = (0..capacity)
            .map(|i| self.leaves.get(i).copied().unwrap_or(self.empty_leaf))
            .collect();
        let mut levels = vec![current.clone()];
        while current.len() > 1 {
            let next: Vec<FieldElement> = current
                .chunks(2)
                .map(|pair| self.hasher.hash2(&pair[0], &pair[1]))
                .collect();
            levels.push(next.clone());
            current = next;
        }
        self.levels = levels;
    }
}

/// verify a leaf's path against a claimed root, independent of any live tree
pub fn verify_path<H: Hasher>(
    hasher: &H,
    leaf: &FieldElement,
    path: &MerklePath,
    root: &FieldElement,
) -> bool {
    let mut current = *leaf;
    let mut idx = path.leaf_index;
    for sibling in &path.siblings {
        current = if idx % 2 == 0 {
            hasher.hash2(&current, sibling)
        } else {
            hasher.hash2(sibling, &current)
        };
        idx /= 2;
    }
    current == *root
}
