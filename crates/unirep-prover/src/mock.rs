//! test doubles for the [`Prover`] collaborator
//!
//! real proof verification is out of scope (§1): these doubles let the
//! synchronizer's handler and ingestor logic be exercised deterministically
//! without a zk backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use unirep_tree::{Hasher, PoseidonStub};
use unirep_types::{Circuit, FieldElement};

use crate::{Prover, ProverError};

/// a prover whose verdict for each `(circuit, proof)` pair is set explicitly
/// by the test driving it; unset pairs fall back to a configurable default
pub struct MockProver {
    default_outcome: bool,
    overrides: Mutex<HashMap<(Circuit, Vec<FieldElement>), bool>>,
    pending_failure: Mutex<Option<ProverError>>,
}

impl MockProver {
    /// every `verify` call returns `default_outcome` unless overridden
    pub fn new(default_outcome: bool) -> Self {
        Self {
            default_outcome,
            overrides: Mutex::new(HashMap::new()),
            pending_failure: Mutex::new(None),
        }
    }

    /// force the verdict for the next `verify(circuit, proof, ..)` call
    /// whose `proof` matches exactly; used to simulate a mutated public
    /// signal producing a failed zk-verify
    pub fn force(&self, circuit: Circuit, proof: Vec<FieldElement>, outcome: bool) {
        self.overrides.lock().expect("mock prover mutex poisoned").insert((circuit, proof), outcome);
    }

    /// the next `verify` call returns `err` instead of a verdict
    pub fn fail_once(&self, err: ProverError) {
        *self.pending_failure.lock().expect("mock prover mutex poisoned") = Some(err);
    }
}

#[async_trait]
impl Prover for MockProver {
    async fn verify(
        &self,
        circuit: Circuit,
        _public_signals: &[FieldElement],
        proof: &[FieldElement],
    ) -> Result<bool, ProverError> {
        if let Some(err) = self.pending_failure.lock().expect("mock prover mutex poisoned").take() {
            return Err(err);
        }
        let overrides = self.overrides.lock().expect("mock prover mutex poisoned");
        Ok(overrides.get(&(circuit, proof.to_vec())).copied().unwrap_or(self.default_outcome))
    }
}

/// a prover that treats "valid" as a recomputable hash check rather than a
/// cryptographic verification: `proof == [hash_n(public_signals)]`. useful
/// for fast, non-cryptographic tests that still exercise a real data
/// dependency between signals and proof instead of an unconditional stub.
#[derive(Default)]
pub struct DeterministicHashProver {
    hasher: PoseidonStub,
}

impl DeterministicHashProver {
    pub fn new() -> Self {
        Self { hasher: PoseidonStub }
    }

    /// the `proof` a caller must submit for `verify` to accept `signals`
    pub fn expected_proof(&self, signals: &[FieldElement]) -> Vec<FieldElement> {
        vec![self.hasher.hash_n(signals)]
    }
}

#[async_trait]
impl Prover for DeterministicHashProver {
    async fn verify(
        &self,
        _circuit: Circuit,
        public_signals: &[FieldElement],
        proof: &[FieldElement],
    ) -> Result<bool, ProverError> {
        Ok(proof == self.expected_proof(public_signals).as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_prover_defaults_and_overrides() {
        let prover = MockProver::new(true);
        let proof = vec![FieldElement::from_u64(1)];
        assert!(prover.verify(Circuit::ProveUserSignUp, &[], &proof).await.unwrap());

        prover.force(Circuit::ProveUserSignUp, proof.clone(), false);
        assert!(!prover.verify(Circuit::ProveUserSignUp, &[], &proof).await.unwrap());
    }

    #[tokio::test]
    async fn mock_prover_fail_once_surfaces_then_clears() {
        let prover = MockProver::new(true);
        prover.fail_once(ProverError::Timeout);
        assert!(prover.verify(Circuit::ProveUserSignUp, &[], &[]).await.is_err());
        assert!(prover.verify(Circuit::ProveUserSignUp, &[], &[]).await.is_ok());
    }

    #[tokio::test]
    async fn deterministic_hash_prover_accepts_matching_proof_only() {
        let prover = DeterministicHashProver::new();
        let signals = vec![FieldElement::from_u64(1), FieldElement::from_u64(2)];
        let good_proof = prover.expected_proof(&signals);
        assert!(prover.verify(Circuit::VerifyEpochKey, &signals, &good_proof).await.unwrap());

        let bad_proof = vec![FieldElement::from_u64(0)];
        assert!(!prover.verify(Circuit::VerifyEpochKey, &signals, &bad_proof).await.unwrap());
    }
}
