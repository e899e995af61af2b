//! the ingestor's error taxonomy (§7): transient/fatal infrastructure errors
//! propagate as [`SyncError`]; protocol-level rejections never escape the
//! ingestor loop and are represented as an [`Outcome`] returned from a
//! handler instead.

use thiserror::Error;
use unirep_types::TopicHash;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("chain error: {0}")]
    Chain(#[from] unirep_chain::ChainError),

    #[error("unknown event topic: {0:#x?}")]
    UnknownTopic(TopicHash),

    #[error("store error: {0}")]
    Store(#[from] unirep_store::StoreError),

    #[error("prover error: {0}")]
    Prover(#[from] unirep_prover::ProverError),

    #[error("malformed log data: {0}")]
    Decode(#[from] crate::decode::DecodeError),

    /// the in-memory GST rejected an insert (e.g. capacity exceeded); this
    /// is an internal invariant violation, not a protocol-level rejection,
    /// so it is fatal rather than a no-op
    #[error("tree error: {0}")]
    Tree(#[from] unirep_tree::TreeError),
}

/// the result of applying one handler to one event. `Applied`/`Rejected`
/// both advance the cursor past the event — a protocol-level rejection is
/// "processed" the same as a successful application, matching on-chain
/// semantics where the contract already indexed a bad submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Rejected(RejectReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// the event referenced a proof, nullifier, or epoch key that does not
    /// satisfy a protocol invariant (missing predecessor, mismatched root,
    /// broken proof chain, ...)
    ProtocolViolation(String),
    /// the event's nullifier(s) were already confirmed spent
    DuplicateNullifier,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::ProtocolViolation(reason) => write!(f, "protocol violation: {reason}"),
            RejectReason::DuplicateNullifier => write!(f, "duplicate nullifier"),
        }
    }
}
