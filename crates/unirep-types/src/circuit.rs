//! the six zk circuits UniRep proves against, and their bit-exact public
//! signal layouts

use crate::field::FieldElement;

/// which circuit a proof targets
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub enum Circuit {
    ProveUserSignUp,
    VerifyEpochKey,
    ProveReputation,
    StartTransition,
    ProcessAttestations,
    UserStateTransition,
}

#[derive(thiserror::Error, Debug)]
pub enum SignalError {
    #[error("expected at least {expected} public signals, found {found}")]
    TooFew { expected: usize, found: usize },
}

/// `proveUserSignUp`: epoch, epochKey, globalStateTree, attesterId, userHasSignedUp
#[derive(Clone, Debug)]
pub struct SignUpSignals {
    pub epoch: FieldElement,
    pub epoch_key: FieldElement,
    pub global_state_tree: FieldElement,
    pub attester_id: FieldElement,
    pub user_has_signed_up: FieldElement,
}

impl SignUpSignals {
    pub fn decode(signals: &[FieldElement]) -> Result<Self, SignalError> {
        require_len(signals, 5)?;
        Ok(Self {
            epoch: signals[0],
            epoch_key: signals[1],
            global_state_tree: signals[2],
            attester_id: signals[3],
            user_has_signed_up: signals[4],
        })
    }
}

/// `verifyEpochKey`: globalStateTree, epoch, epochKey
#[derive(Clone, Debug)]
pub struct EpochKeySignals {
    pub global_state_tree: FieldElement,
    pub epoch: FieldElement,
    pub epoch_key: FieldElement,
}

impl EpochKeySignals {
    pub fn decode(signals: &[FieldElement]) -> Result<Self, SignalError> {
        require_len(signals, 3)?;
        Ok(Self {
            global_state_tree: signals[0],
            epoch: signals[1],
            epoch_key: signals[2],
        })
    }
}

/// `proveReputation`: repNullifiers[N], epoch, epochKey, globalStateTree,
/// attesterId, proveReputationAmount, minRep, proveGraffiti, graffitiPreImage
#[derive(Clone, Debug)]
pub struct ReputationSignals {
    pub rep_nullifiers: Vec<FieldElement>,
    pub epoch: FieldElement,
    pub epoch_key: FieldElement,
    pub global_state_tree: FieldElement,
    pub attester_id: FieldElement,
    pub prove_reputation_amount: FieldElement,
    pub min_rep: FieldElement,
    pub prove_graffiti: FieldElement,
    pub graffiti_pre_image: FieldElement,
}

impl ReputationSignals {
    /// `n` is the protocol's `numEpochKeyNoncePerEpoch`-derived nullifier count,
    /// fixed per deployment and known to the caller.
    pub fn decode(signals: &[FieldElement], n: usize) -> Result<Self, SignalError> {
        require_len(signals, n + 6)?;
        let (rep_nullifiers, rest) = signals.split_at(n);
        Ok(Self {
            rep_nullifiers: rep_nullifiers.to_vec(),
            epoch: rest[0],
            epoch_key: rest[1],
            global_state_tree: rest[2],
            attester_id: rest[3],
            prove_reputation_amount: rest[4],
            min_rep: rest[5],
            prove_graffiti: rest[6],
            graffiti_pre_image: rest[7],
        })
    }
}

/// `startTransition`: blindedUserState, blindedHashChain, globalStateTree
#[derive(Clone, Debug)]
pub struct StartTransitionSignals {
    pub blinded_user_state: FieldElement,
    pub blinded_hash_chain: FieldElement,
    pub global_state_tree: FieldElement,
}

impl StartTransitionSignals {
    pub fn decode(signals: &[FieldElement]) -> Result<Self, SignalError> {
        require_len(signals, 3)?;
        Ok(Self {
            blinded_user_state: signals[0],
            blinded_hash_chain: signals[1],
            global_state_tree: signals[2],
        })
    }
}

/// `processAttestations`: outputBlindedUserState, outputBlindedHashChain,
/// inputBlindedUserState
#[derive(Clone, Debug)]
pub struct ProcessAttestationsSignals {
    pub output_blinded_user_state: FieldElement,
    pub output_blinded_hash_chain: FieldElement,
    pub input_blinded_user_state: FieldElement,
}

impl ProcessAttestationsSignals {
    pub fn decode(signals: &[FieldElement]) -> Result<Self, SignalError> {
        require_len(signals, 3)?;
        Ok(Self {
            output_blinded_user_state: signals[0],
            output_blinded_hash_chain: signals[1],
            input_blinded_user_state: signals[2],
        })
    }
}

/// `userStateTransition`: newGlobalStateTreeLeaf, epkNullifiers[K],
/// transitionFromEpoch, blindedUserStates[2], fromGlobalStateTree,
/// blindedHashChains[M], fromEpochTree
#[derive(Clone, Debug)]
pub struct UserStateTransitionSignals {
    pub new_global_state_tree_leaf: FieldElement,
    pub epk_nullifiers: Vec<FieldElement>,
    pub transition_from_epoch: FieldElement,
    pub blinded_user_states: [FieldElement; 2],
    pub from_global_state_tree: FieldElement,
    pub blinded_hash_chains: Vec<FieldElement>,
    pub from_epoch_tree: FieldElement,
}

impl UserStateTransitionSignals {
    /// `k` = number of epoch keys per epoch, `m` = number of blinded hash
    /// chains (process-attestations steps + 1); both are deployment constants.
    pub fn decode(signals: &[FieldElement], k: usize, m: usize) -> Result<Self, SignalError> {
        require_len(signals, 1 + k + 1 + 2 + 1 + m + 1)?;
        let mut idx = 0;
        let new_global_state_tree_leaf = signals[idx];
        idx += 1;
        let epk_nullifiers = signals[idx..idx + k].to_vec();
        idx += k;
        let transition_from_epoch = signals[idx];
        idx += 1;
        let blinded_user_states = [signals[idx], signals[idx + 1]];
        idx += 2;
        let from_global_state_tree = signals[idx];
        idx += 1;
        let blinded_hash_chains = signals[idx..idx + m].to_vec();
        idx += m;
        let from_epoch_tree = signals[idx];
        Ok(Self {
            new_global_state_tree_leaf,
            epk_nullifiers,
            transition_from_epoch,
            blinded_user_states,
            from_global_state_tree,
            blinded_hash_chains,
            from_epoch_tree,
        })
    }
}

fn require_len(signals: &[FieldElement], expected: usize) -> Result<(), SignalError> {
    if signals.len() < expected {
        return Err(SignalError::TooFew { expected, found: signals.len() });
    }
    Ok(())
}
