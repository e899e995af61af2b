//! the prover/verifier collaborator: `verify(circuit, public_signals, proof)
//! -> bool`, an opaque black box. kept behind a trait so production wiring
//! can point at a real zk verifier while tests run against doubles.

mod error;
pub mod mock;

pub use error::ProverError;

use async_trait::async_trait;
use unirep_types::{Circuit, FieldElement};

#[async_trait]
pub trait Prover: Send + Sync {
    /// `true` iff `proof` is a valid zk-SNARK for `circuit` against
    /// `public_signals`, bit-exact in the circuit's public-signal layout
    async fn verify(
        &self,
        circuit: Circuit,
        public_signals: &[FieldElement],
        proof: &[FieldElement],
    ) -> Result<bool, ProverError>;
}
