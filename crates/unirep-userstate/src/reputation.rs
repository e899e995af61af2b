//! `Reputation`: the identity's folded view of one attester's attestations,
//! derived rather than persisted (§3: "not stored directly, since it can be
//! rebuilt from GSTLeaf rows")

use unirep_store::records::Attestation;
use unirep_types::FieldElement;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reputation {
    pub pos_rep: u64,
    pub neg_rep: u64,
    pub graffiti: FieldElement,
    pub sign_up: bool,
}

impl Default for Reputation {
    fn default() -> Self {
        Self { pos_rep: 0, neg_rep: 0, graffiti: FieldElement::ZERO, sign_up: false }
    }
}

/// folds a sequence of valid attestations (already filtered to the
/// identity's own epoch keys and the attester of interest, in submission
/// order) into one reputation record. `graffiti` takes the value of the
/// latest attestation that set `overwriteGraffiti`.
pub fn fold(attestations: impl IntoIterator<Item = Attestation>) -> Reputation {
    let mut rep = Reputation::default();
    for a in attestations {
        rep.pos_rep += a.pos_rep;
        rep.neg_rep += a.neg_rep;
        if a.overwrite_graffiti {
            rep.graffiti = a.graffiti;
        }
        rep.sign_up = rep.sign_up || a.sign_up;
    }
    rep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attestation(pos: u64, neg: u64, overwrite: bool, graffiti: u64, sign_up: bool) -> Attestation {
        Attestation {
            epoch: 0,
            epoch_key: 1,
            index: 0,
            attester: FieldElement::ZERO,
            attester_id: 7,
            pos_rep: pos,
            neg_rep: neg,
            graffiti: FieldElement::from_u64(graffiti),
            overwrite_graffiti: overwrite,
            sign_up,
            from_proof_index: 0,
            to_proof_index: 0,
            hash: FieldElement::ZERO,
            valid: Some(true),
        }
    }

    #[test]
    fn sums_reputation_and_tracks_latest_graffiti() {
        let rep = fold(vec![
            attestation(5, 1, false, 0, false),
            attestation(3, 0, true, 99, false),
            attestation(2, 2, false, 0, true),
        ]);
        assert_eq!(rep.pos_rep, 10);
        assert_eq!(rep.neg_rep, 3);
        assert_eq!(rep.graffiti, FieldElement::from_u64(99));
        assert!(rep.sign_up);
    }

    #[test]
    fn empty_input_is_the_default() {
        assert_eq!(fold(Vec::new()), Reputation::default());
    }
}
