//! topic → handler dispatch (§4.4): one exhaustive match rather than a
//! runtime table, since each handler decodes a different log shape and
//! a boxed-closure table would need boxed futures for no benefit the
//! compiler-checked match doesn't already give for free.

use unirep_tree::Hasher;
use unirep_types::Topic;

use crate::error::SyncError;
use crate::handlers::{Decision, HandlerCtx};

/// dispatches one decoded log body to its handler; `AttestationSubmitted`
/// and its legacy topic share this function since they decode and apply
/// identically (§9). Handlers only decide here — see [`Decision`] — so the
/// caller can fold the write they queue into its own transaction.
pub async fn dispatch<H: Hasher>(
    ctx: &HandlerCtx<'_, H>,
    topic: Topic,
    data: &[u8],
) -> Result<Decision<H>, SyncError> {
    match topic {
        Topic::UserSignedUp => {
            let log = crate::decode::decode_user_signed_up(data)?;
            crate::handlers::handle_user_signed_up(ctx, log).await
        }
        Topic::AttestationSubmitted | Topic::AttestationSubmittedLegacy => {
            let log = crate::decode::decode_attestation_submitted(data)?;
            crate::handlers::handle_attestation_submitted(ctx, log).await
        }
        Topic::EpochEnded => {
            let log = crate::decode::decode_epoch_ended(data)?;
            crate::handlers::handle_epoch_ended(ctx, log).await
        }
        Topic::UserStateTransitioned => {
            let log = crate::decode::decode_user_state_transitioned(data)?;
            crate::handlers::handle_user_state_transitioned(ctx, log).await
        }
        proof_topic => {
            let circuit = proof_topic
                .circuit()
                .expect("every remaining topic variant is a proof event");
            let log = crate::decode::decode_indexed_proof(data)?;
            crate::handlers::handle_indexed_proof(ctx, circuit, log).await
        }
    }
}
