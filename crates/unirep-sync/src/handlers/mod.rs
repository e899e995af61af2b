//! one module per event topic family, sharing the preamble of §4.4: decode,
//! validate epoch context, validate epoch-key range, reject writes to
//! sealed epoch keys.

mod attestation;
mod epoch_end;
mod proof;
mod signup;
mod transition;

pub use attestation::handle_attestation_submitted;
pub use epoch_end::handle_epoch_ended;
pub use proof::handle_indexed_proof;
pub use signup::handle_user_signed_up;
pub use transition::handle_user_state_transitioned;

use crate::config::ProtocolParams;
use crate::error::{Outcome, RejectReason, SyncError};
use unirep_store::{Store, StoreResult, Txn};
use unirep_tree::{Hasher, IncrementalTree, TreeError};
use unirep_types::LogPosition;

/// everything a handler needs: the durable store, the live in-memory GST for
/// the open epoch, the hash backend, the prover, protocol constants, and
/// the position/tx hash of the event being applied.
///
/// a handler only ever reads through this context during its decide phase
/// (§4.3/§4.4); `gst` is a shared reference for that reason — any write it
/// wants to make is queued as a [`Decision`] instead, so it can be folded
/// into the same store transaction as the cursor advance.
pub struct HandlerCtx<'a, H: Hasher> {
    pub store: &'a Store,
    pub gst: &'a IncrementalTree<H>,
    pub hasher: &'a H,
    pub prover: &'a (dyn unirep_prover::Prover + 'a),
    pub params: ProtocolParams,
    pub position: LogPosition,
    pub tx_hash: [u8; 32],
}

impl<'a, H: Hasher> HandlerCtx<'a, H> {
    /// the event's total order position packed into one comparable `u64`;
    /// this is the `index` field of `Attestation`/`Proof` rows
    pub fn position_order_key(&self) -> u64 {
        self.position.order_key()
    }
}

/// a handler's queued store writes, folded into the caller's transaction
/// rather than committed by the handler itself; `f` may run more than once
/// if sled retries on conflict, so it must be free of side effects beyond
/// the `Txn` it is given (same discipline as [`Store::transaction`]).
pub type WriteFn = Box<dyn Fn(&mut Txn) -> StoreResult<()>>;

/// a handler's deferred mutation of the live in-memory GST, applied exactly
/// once by the caller after (and only after) the paired `WriteFn` has
/// durably committed.
pub type FinalizeFn<H> = Box<dyn FnOnce(&mut IncrementalTree<H>) -> Result<(), TreeError>>;

/// what a handler decided to do with one event, split into a part that
/// still needs to be committed (`write`) and a part that still needs to be
/// applied to the live tree once committed (`finalize`) — see §4.3's
/// "open a transaction, call the handler, then in the same transaction
/// advance the cursor" and the ingestor's `process_one`, which is the only
/// place that actually runs either closure.
pub struct Decision<H: Hasher> {
    pub outcome: Outcome,
    pub write: Option<WriteFn>,
    pub finalize: Option<FinalizeFn<H>>,
}

impl<H: Hasher> Decision<H> {
    pub fn rejected(reason: RejectReason) -> Self {
        Self { outcome: Outcome::Rejected(reason), write: None, finalize: None }
    }

    pub fn applied(write: WriteFn) -> Self {
        Self { outcome: Outcome::Applied, write: Some(write), finalize: None }
    }

    pub fn applied_with_finalize(write: WriteFn, finalize: FinalizeFn<H>) -> Self {
        Self { outcome: Outcome::Applied, write: Some(write), finalize: Some(finalize) }
    }
}

/// test-only helper mirroring the relevant half of `Ingestor::process_one`:
/// commits a decision's write (if any) on its own, then applies its
/// finalize step. Handler unit tests exercise one decision in isolation and
/// have no sync cursor of their own to fold the write into.
#[cfg(test)]
pub(crate) fn apply_decision<H: Hasher>(
    store: &Store,
    gst: &mut IncrementalTree<H>,
    decision: Decision<H>,
) -> Result<Outcome, SyncError> {
    if let Some(write) = &decision.write {
        store.transaction(|txn| write(txn))?;
    }
    if let Some(finalize) = decision.finalize {
        finalize(gst)?;
    }
    Ok(decision.outcome)
}

/// epoch-key range check shared by every handler that receives one:
/// `epochKey < 2^D_epoch`
pub fn validate_epoch_key(key: u64, depth: usize) -> Result<(), RejectReason> {
    let capacity = if depth >= 64 { u64::MAX } else { 1u64 << depth };
    if key >= capacity {
        return Err(RejectReason::ProtocolViolation(format!(
            "epoch key {key} exceeds 2^{depth}"
        )));
    }
    Ok(())
}

/// the current (highest-numbered) epoch must exist and be unsealed, and
/// must match `expected` for a state-mutating event
pub fn require_open_epoch(store: &Store, expected: u64) -> Result<(), RejectReason> {
    let current = store
        .latest_epoch()
        .map_err(|e| RejectReason::ProtocolViolation(format!("store error reading current epoch: {e}")))?
        .ok_or_else(|| RejectReason::ProtocolViolation("no epoch row exists yet".into()))?;
    if current.sealed {
        return Err(RejectReason::ProtocolViolation(format!("epoch {} is already sealed", current.number)));
    }
    if current.number != expected {
        return Err(RejectReason::ProtocolViolation(format!(
            "event targets epoch {expected} but the open epoch is {}",
            current.number
        )));
    }
    Ok(())
}

/// an existing-epoch check for events that reference a past or current
/// epoch without needing it to still be open (proof events)
pub fn require_existing_epoch(store: &Store, epoch: u64) -> Result<(), RejectReason> {
    store
        .get_epoch(epoch)
        .map_err(|e| RejectReason::ProtocolViolation(format!("store error reading epoch {epoch}: {e}")))?
        .ok_or_else(|| RejectReason::ProtocolViolation(format!("epoch {epoch} does not exist")))?;
    Ok(())
}
