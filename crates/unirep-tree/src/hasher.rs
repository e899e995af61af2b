//! pluggable hash backend
//!
//! the protocol's real hash is a Poseidon-style arithmetic hash, an
//! assumed-available cryptographic primitive that is out of scope for this
//! crate to implement. the tree engine is generic over any
//! [`Hasher`] so production wiring can plug in a real Poseidon
//! implementation while tests use a cheap stand-in.

use unirep_types::FieldElement;

pub trait Hasher: Clone {
    fn hash2(&self, left: &FieldElement, right: &FieldElement) -> FieldElement;
    fn hash_n(&self, xs: &[FieldElement]) -> FieldElement;
}

/// domain-separated blake2b stand-in for Poseidon. Not a protocol
/// primitive — swap for a real Poseidon `Hasher` impl in production.
#[derive(Clone, Default)]
pub struct PoseidonStub;

impl Hasher for PoseidonStub {
    fn hash2(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
        use blake2::{Blake2b512, Digest};
        let mut hasher = Blake2b512::new();
        hasher.update(b"UNIREP_POSEIDON_STUB_2");
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..32]);
        FieldElement::from_bytes(out)
    }

    fn hash_n(&self, xs: &[FieldElement]) -> FieldElement {
        use blake2::{Blake2b512, Digest};
        let mut hasher = Blake2b512::new();
        hasher.update(b"UNIREP_POSEIDON_STUB_N");
        hasher.update(&(xs.len() as u64).to_le_bytes());
        for x in xs {
            hasher.update(x.as_bytes());
        }
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..32]);
        FieldElement::from_bytes(out)
    }
}
