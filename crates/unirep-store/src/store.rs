//! sled-backed durable store
//!
//! every record type and every secondary index lives as a prefixed key
//! range inside one `sled::Tree`, so a multi-record mutation commits with a
//! single sled transaction — true cross-record atomicity without juggling
//! sled's per-tuple-of-trees transaction API. handlers perform their reads
//! against the live (already-committed) tree before opening a transaction
//! for their writes; since the ingestor is the store's only writer, nothing
//! can change state between a handler's read and its subsequent commit, so
//! this is equivalent to reading inside the transaction.

use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::Db;
use std::path::Path;
use unirep_types::FieldElement;

use crate::error::{StoreError, StoreResult};
use crate::key;
use crate::records::{Attestation, Epoch, EpochKey, GstLeaf, GstRoot, Nullifier, Proof, SyncState};

#[derive(Clone)]
pub struct Store {
    tree: sled::Tree,
    _db: Db,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree("unirep")?;
        Ok(Self { tree, _db: db })
    }

    /// in-memory store, for tests and ephemeral tooling
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree("unirep")?;
        Ok(Self { tree, _db: db })
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.tree.flush()?;
        Ok(())
    }

    /// run `f` as one atomic commit; sled may invoke `f` more than once if
    /// it detects a write conflict, so `f` must be free of external side
    /// effects beyond the `Txn` it is given
    pub fn transaction<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: Fn(&mut Txn) -> StoreResult<T>,
    {
        let outcome = self.tree.transaction(|tt| {
            let mut txn = Txn { inner: tt };
            f(&mut txn).map_err(ConflictableTransactionError::Abort)
        });
        match outcome {
            Ok(v) => Ok(v),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StoreError::Sled(e)),
        }
    }

    // ---- direct (non-transactional) reads ----

    pub fn get_epoch(&self, number: u64) -> StoreResult<Option<Epoch>> {
        get(&self.tree, &key::epoch(number))
    }

    pub fn latest_epoch(&self) -> StoreResult<Option<Epoch>> {
        let prefix = key::epoch_prefix();
        match self.tree.scan_prefix(&prefix).last() {
            Some(entry) => {
                let (_, v) = entry?;
                Ok(Some(bincode::deserialize(&v)?))
            }
            None => Ok(None),
        }
    }

    pub fn gst_leaves_for_epoch(&self, epoch: u64) -> StoreResult<Vec<GstLeaf>> {
        scan_values(&self.tree, &key::gst_leaf_epoch_prefix(epoch))
    }

    pub fn gst_leaf_count(&self, epoch: u64) -> StoreResult<u64> {
        Ok(self.gst_leaves_for_epoch(epoch)?.len() as u64)
    }

    pub fn gst_root_exists(&self, epoch: u64, root: &FieldElement) -> StoreResult<bool> {
        Ok(self.tree.contains_key(key::gst_root(epoch, root))?)
    }

    pub fn get_epoch_key(&self, epoch: u64, key_value: u64) -> StoreResult<Option<EpochKey>> {
        get(&self.tree, &key::epoch_key(epoch, key_value))
    }

    /// every epoch key that has an `EpochKey` row in `epoch`, ascending by
    /// key value; used by the epoch-end handler to enumerate the keys whose
    /// attestation chains must be folded into the sealing epoch tree
    pub fn epoch_keys_for_epoch(&self, epoch: u64) -> StoreResult<Vec<EpochKey>> {
        scan_values(&self.tree, &key::epoch_key_prefix(epoch))
    }

    pub fn attestations_for_epoch_key(&self, epoch: u64, key_value: u64) -> StoreResult<Vec<Attestation>> {
        scan_values(&self.tree, &key::attestation_epoch_key_prefix(epoch, key_value))
    }

    /// all attestations ever submitted against `key_value`, across every
    /// epoch it appeared in, ordered by epoch then by in-epoch index
    pub fn attestations_for_key(&self, key_value: u64) -> StoreResult<Vec<Attestation>> {
        let prefix = key::attestation_by_key_prefix(key_value);
        let mut out = Vec::new();
        for entry in self.tree.scan_prefix(&prefix) {
            let (_, primary_key) = entry?;
            if let Some(bytes) = self.tree.get(primary_key.as_ref())? {
                out.push(bincode::deserialize::<Attestation>(&bytes)?);
            }
        }
        Ok(out)
    }

    pub fn nullifier(&self, epoch: u64, value: &FieldElement) -> StoreResult<Option<Nullifier>> {
        get(&self.tree, &key::nullifier(epoch, value))
    }

    /// the epoch that first confirmed `value`, if any confirmed row exists
    /// for it anywhere — confirmed nullifiers are unique protocol-wide, not
    /// per epoch
    pub fn nullifier_confirmed_epoch(&self, value: &FieldElement) -> StoreResult<Option<u64>> {
        match self.tree.get(key::nullifier_confirmed(value))? {
            Some(bytes) => Ok(Some(u64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                StoreError::InvariantViolation("malformed nullifier index value".into())
            })?))),
            None => Ok(None),
        }
    }

    pub fn get_proof(&self, index: u64) -> StoreResult<Option<Proof>> {
        get(&self.tree, &key::proof(index))
    }

    pub fn proof_count(&self) -> StoreResult<u64> {
        Ok(self.tree.scan_prefix(key::proof_prefix()).count() as u64)
    }

    pub fn get_sync_state(&self) -> StoreResult<SyncState> {
        Ok(get(&self.tree, &key::sync_state())?.unwrap_or_else(SyncState::genesis))
    }
}

fn get<T: serde::de::DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> StoreResult<Option<T>> {
    match tree.get(key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

fn scan_values<T: serde::de::DeserializeOwned>(tree: &sled::Tree, prefix: &[u8]) -> StoreResult<Vec<T>> {
    let mut out = Vec::new();
    for entry in tree.scan_prefix(prefix) {
        let (_, v) = entry?;
        out.push(bincode::deserialize(&v)?);
    }
    Ok(out)
}

/// the write surface exposed inside a [`Store::transaction`] closure
pub struct Txn<'a> {
    inner: &'a TransactionalTree,
}

impl<'a> Txn<'a> {
    fn put<T: serde::Serialize>(&self, key: Vec<u8>, value: &T) -> StoreResult<()> {
        let bytes = bincode::serialize(value)?;
        self.inner.insert(key, bytes)?;
        Ok(())
    }

    fn get<T: serde::de::DeserializeOwned>(&self, key: &[u8]) -> StoreResult<Option<T>> {
        match self.inner.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_epoch(&self, epoch: &Epoch) -> StoreResult<()> {
        self.put(key::epoch(epoch.number), epoch)
    }

    pub fn get_epoch(&self, number: u64) -> StoreResult<Option<Epoch>> {
        self.get(&key::epoch(number))
    }

    pub fn put_gst_leaf(&self, leaf: &GstLeaf) -> StoreResult<()> {
        self.put(key::gst_leaf(leaf.epoch, leaf.index), leaf)
    }

    pub fn put_gst_root(&self, epoch: u64, root: &FieldElement) -> StoreResult<()> {
        self.put(key::gst_root(epoch, root), &GstRoot { epoch, root: *root })
    }

    pub fn put_epoch_key(&self, epoch_key: &EpochKey) -> StoreResult<()> {
        self.put(key::epoch_key(epoch_key.epoch, epoch_key.key), epoch_key)
    }

    pub fn get_epoch_key(&self, epoch: u64, key_value: u64) -> StoreResult<Option<EpochKey>> {
        self.get(&key::epoch_key(epoch, key_value))
    }

    pub fn put_attestation(&self, attestation: &Attestation) -> StoreResult<()> {
        self.put(
            key::attestation(attestation.epoch, attestation.epoch_key, attestation.index),
            attestation,
        )?;
        let primary = key::attestation(attestation.epoch, attestation.epoch_key, attestation.index);
        self.put(
            key::attestation_by_key(attestation.epoch_key, attestation.epoch, attestation.index),
            &primary,
        )
    }

    pub fn put_nullifier(&self, nullifier: &Nullifier) -> StoreResult<()> {
        self.put(key::nullifier(nullifier.epoch, &nullifier.value), nullifier)?;
        if nullifier.confirmed {
            self.inner
                .insert(key::nullifier_confirmed(&nullifier.value), nullifier.epoch.to_be_bytes().to_vec())?;
        }
        Ok(())
    }

    pub fn nullifier_confirmed_epoch(&self, value: &FieldElement) -> StoreResult<Option<u64>> {
        match self.inner.get(key::nullifier_confirmed(value))? {
            Some(bytes) => Ok(Some(u64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                StoreError::InvariantViolation("malformed nullifier index value".into())
            })?))),
            None => Ok(None),
        }
    }

    /// remove an unconfirmed sighting of `value` in `epoch`, e.g. when a
    /// user-state-transition promotes it to confirmed under a different row
    pub fn delete_nullifier(&self, epoch: u64, value: &FieldElement) -> StoreResult<()> {
        self.inner.remove(key::nullifier(epoch, value))?;
        Ok(())
    }

    pub fn put_proof(&self, proof: &Proof) -> StoreResult<()> {
        self.put(key::proof(proof.index), proof)
    }

    pub fn get_proof(&self, index: u64) -> StoreResult<Option<Proof>> {
        self.get(&key::proof(index))
    }

    pub fn put_sync_state(&self, state: &SyncState) -> StoreResult<()> {
        self.put(key::sync_state(), state)
    }

    pub fn get_sync_state(&self) -> StoreResult<SyncState> {
        Ok(self.get(&key::sync_state())?.unwrap_or_else(SyncState::genesis))
    }
}
