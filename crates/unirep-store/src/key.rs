//! composite key encoding for the single transactional keyspace
//!
//! every record type lives behind its own one-byte prefix inside one
//! `sled::Tree`; numeric components are big-endian so that sled's natural
//! byte-lexicographic ordering is also insertion/index order, which lets
//! range scans double as `find_many(... orderBy ...)`.

use unirep_types::FieldElement;

const EPOCH: u8 = b'E';
const GST_LEAF: u8 = b'L';
const GST_ROOT: u8 = b'R';
const EPOCH_KEY: u8 = b'K';
const ATTESTATION: u8 = b'A';
const ATTESTATION_BY_KEY: u8 = b'a';
const NULLIFIER: u8 = b'N';
const NULLIFIER_CONFIRMED: u8 = b'n';
const PROOF: u8 = b'P';
const SYNC_STATE: u8 = b'S';

fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn epoch(number: u64) -> Vec<u8> {
    let mut k = vec![EPOCH];
    push_u64(&mut k, number);
    k
}

pub fn epoch_prefix() -> Vec<u8> {
    vec![EPOCH]
}

pub fn gst_leaf(epoch: u64, index: u64) -> Vec<u8> {
    let mut k = vec![GST_LEAF];
    push_u64(&mut k, epoch);
    push_u64(&mut k, index);
    k
}

pub fn gst_leaf_epoch_prefix(epoch: u64) -> Vec<u8> {
    let mut k = vec![GST_LEAF];
    push_u64(&mut k, epoch);
    k
}

pub fn gst_root(epoch: u64, root: &FieldElement) -> Vec<u8> {
    let mut k = vec![GST_ROOT];
    push_u64(&mut k, epoch);
    k.extend_from_slice(root.as_bytes());
    k
}

pub fn epoch_key(epoch: u64, key: u64) -> Vec<u8> {
    let mut k = vec![EPOCH_KEY];
    push_u64(&mut k, epoch);
    push_u64(&mut k, key);
    k
}

pub fn epoch_key_prefix(epoch: u64) -> Vec<u8> {
    let mut k = vec![EPOCH_KEY];
    push_u64(&mut k, epoch);
    k
}

pub fn attestation(epoch: u64, epoch_key: u64, index: u64) -> Vec<u8> {
    let mut k = vec![ATTESTATION];
    push_u64(&mut k, epoch);
    push_u64(&mut k, epoch_key);
    push_u64(&mut k, index);
    k
}

pub fn attestation_epoch_key_prefix(epoch: u64, epoch_key: u64) -> Vec<u8> {
    let mut k = vec![ATTESTATION];
    push_u64(&mut k, epoch);
    push_u64(&mut k, epoch_key);
    k
}

pub fn attestation_by_key(epoch_key: u64, epoch: u64, index: u64) -> Vec<u8> {
    let mut k = vec![ATTESTATION_BY_KEY];
    push_u64(&mut k, epoch_key);
    push_u64(&mut k, epoch);
    push_u64(&mut k, index);
    k
}

pub fn attestation_by_key_prefix(epoch_key: u64) -> Vec<u8> {
    let mut k = vec![ATTESTATION_BY_KEY];
    push_u64(&mut k, epoch_key);
    k
}

pub fn nullifier(epoch: u64, value: &FieldElement) -> Vec<u8> {
    let mut k = vec![NULLIFIER];
    push_u64(&mut k, epoch);
    k.extend_from_slice(value.as_bytes());
    k
}

pub fn nullifier_confirmed(value: &FieldElement) -> Vec<u8> {
    let mut k = vec![NULLIFIER_CONFIRMED];
    k.extend_from_slice(value.as_bytes());
    k
}

pub fn proof(index: u64) -> Vec<u8> {
    let mut k = vec![PROOF];
    push_u64(&mut k, index);
    k
}

pub fn proof_prefix() -> Vec<u8> {
    vec![PROOF]
}

pub fn sync_state() -> Vec<u8> {
    vec![SYNC_STATE]
}
