//! decodes a [`RawLog`]'s `data` blob into the fields each topic's handler
//! needs
//!
//! real ABI decoding of EVM event data is a chain-client concern out of
//! this crate's scope (§1); the chain collaborator trait nonetheless hands
//! over raw bytes, so something here must turn them into typed fields. we
//! adopt one deterministic convention: every field is a 32-byte big-endian
//! word, addresses and small integers use the low bytes of their word, and
//! variable-length arrays are length-prefixed by one word — the same shape
//! `FieldElement` already uses for the persisted `publicSignals`/`proof`
//! blobs (§9's "choose a canonical encoding and document it"). Production
//! wiring that decodes real contract calldata replaces this module; the
//! [`mock`](unirep_chain::mock) chain and this crate's own tests both build
//! logs through [`Writer`] so the round trip is exercised either way.

use thiserror::Error;
use unirep_types::FieldElement;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("log data truncated: needed {needed} more bytes, had {available}")]
    Truncated { needed: usize, available: usize },
    #[error("log data has {extra} unconsumed trailing bytes")]
    TrailingBytes { extra: usize },
}

const WORD: usize = 32;

pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::Truncated { needed: n, available: self.data.len() - self.pos });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn word(&mut self) -> Result<FieldElement, DecodeError> {
        let bytes: [u8; WORD] = self.take(WORD)?.try_into().expect("sliced to WORD bytes");
        Ok(FieldElement::from_bytes(bytes))
    }

    pub fn u64(&mut self) -> Result<u64, DecodeError> {
        let word = self.word()?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&word.as_bytes()[24..]);
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.u64()? != 0)
    }

    pub fn vec_field(&mut self) -> Result<Vec<FieldElement>, DecodeError> {
        let len = self.u64()? as usize;
        (0..len).map(|_| self.word()).collect()
    }

    pub fn vec_u64(&mut self) -> Result<Vec<u64>, DecodeError> {
        let len = self.u64()? as usize;
        (0..len).map(|_| self.u64()).collect()
    }

    pub fn option_field(&mut self) -> Result<Option<FieldElement>, DecodeError> {
        if self.bool()? {
            Ok(Some(self.word()?))
        } else {
            Ok(None)
        }
    }

    /// assert every byte of the log was consumed; guards against a handler
    /// silently ignoring trailing fields from a future contract version
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.pos != self.data.len() {
            return Err(DecodeError::TrailingBytes { extra: self.data.len() - self.pos });
        }
        Ok(())
    }
}

/// the write side of [`Cursor`]'s encoding, used by tests and the mock
/// chain to construct `RawLog::data` blobs
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(mut self, f: FieldElement) -> Self {
        self.buf.extend_from_slice(f.as_bytes());
        self
    }

    pub fn u64(self, v: u64) -> Self {
        self.word(FieldElement::from_u64(v))
    }

    pub fn bool(self, v: bool) -> Self {
        self.u64(v as u64)
    }

    pub fn vec_field(self, values: &[FieldElement]) -> Self {
        let mut w = self.u64(values.len() as u64);
        for v in values {
            w = w.word(*v);
        }
        w
    }

    pub fn vec_u64(self, values: &[u64]) -> Self {
        let mut w = self.u64(values.len() as u64);
        for v in values {
            w = w.u64(*v);
        }
        w
    }

    pub fn option_field(self, value: Option<FieldElement>) -> Self {
        match value {
            Some(v) => self.bool(true).word(v),
            None => self.bool(false),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// `UserSignedUp`: epoch, identity commitment, attester id, airdrop amount
pub struct UserSignedUpLog {
    pub epoch: u64,
    pub id_commitment: FieldElement,
    pub attester_id: u64,
    pub airdrop_amount: u64,
}

pub fn decode_user_signed_up(data: &[u8]) -> Result<UserSignedUpLog, DecodeError> {
    let mut c = Cursor::new(data);
    let out = UserSignedUpLog {
        epoch: c.u64()?,
        id_commitment: c.word()?,
        attester_id: c.u64()?,
        airdrop_amount: c.u64()?,
    };
    c.finish()?;
    Ok(out)
}

/// `AttestationSubmitted` and its legacy topic alike (§9: identical decoding)
pub struct AttestationSubmittedLog {
    pub epoch: u64,
    pub epoch_key: u64,
    pub attester: FieldElement,
    pub attester_id: u64,
    pub pos_rep: u64,
    pub neg_rep: u64,
    pub graffiti: FieldElement,
    pub overwrite_graffiti: bool,
    pub sign_up: bool,
    pub to_proof_index: u64,
    pub from_proof_index: u64,
}

pub fn decode_attestation_submitted(data: &[u8]) -> Result<AttestationSubmittedLog, DecodeError> {
    let mut c = Cursor::new(data);
    let out = AttestationSubmittedLog {
        epoch: c.u64()?,
        epoch_key: c.u64()?,
        attester: c.word()?,
        attester_id: c.u64()?,
        pos_rep: c.u64()?,
        neg_rep: c.u64()?,
        graffiti: c.word()?,
        overwrite_graffiti: c.bool()?,
        sign_up: c.bool()?,
        to_proof_index: c.u64()?,
        from_proof_index: c.u64()?,
    };
    c.finish()?;
    Ok(out)
}

pub struct EpochEndedLog {
    pub epoch: u64,
}

pub fn decode_epoch_ended(data: &[u8]) -> Result<EpochEndedLog, DecodeError> {
    let mut c = Cursor::new(data);
    let out = EpochEndedLog { epoch: c.u64()? };
    c.finish()?;
    Ok(out)
}

/// the shared envelope of all six `Indexed*Proof` topics: a proof index, an
/// optional epoch, the public-signal and proof-byte arrays, and whichever
/// auxiliary blinded-state fields this circuit carries (unused ones decode
/// to `None` via [`Cursor::option_field`])
pub struct IndexedProofLog {
    pub proof_index: u64,
    pub epoch: Option<u64>,
    pub public_signals: Vec<FieldElement>,
    pub proof: Vec<FieldElement>,
    pub blinded_user_state: Option<FieldElement>,
    pub blinded_hash_chain: Option<FieldElement>,
    pub output_blinded_user_state: Option<FieldElement>,
    pub input_blinded_user_state: Option<FieldElement>,
    pub output_blinded_hash_chain: Option<FieldElement>,
    pub global_state_tree: Option<FieldElement>,
    pub proof_index_records: Vec<u64>,
}

pub fn decode_indexed_proof(data: &[u8]) -> Result<IndexedProofLog, DecodeError> {
    let mut c = Cursor::new(data);
    let out = IndexedProofLog {
        proof_index: c.u64()?,
        epoch: if c.bool()? { Some(c.u64()?) } else { None },
        public_signals: c.vec_field()?,
        proof: c.vec_field()?,
        blinded_user_state: c.option_field()?,
        blinded_hash_chain: c.option_field()?,
        output_blinded_user_state: c.option_field()?,
        input_blinded_user_state: c.option_field()?,
        output_blinded_hash_chain: c.option_field()?,
        global_state_tree: c.option_field()?,
        proof_index_records: c.vec_u64()?,
    };
    c.finish()?;
    Ok(out)
}

pub struct UserStateTransitionedLog {
    pub epoch: u64,
    pub leaf: FieldElement,
    pub proof_index: u64,
}

pub fn decode_user_state_transitioned(data: &[u8]) -> Result<UserStateTransitionedLog, DecodeError> {
    let mut c = Cursor::new(data);
    let out =
        UserStateTransitionedLog { epoch: c.u64()?, leaf: c.word()?, proof_index: c.u64()? };
    c.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_signed_up_round_trips() {
        let data = Writer::new()
            .u64(1)
            .word(FieldElement::from_u64(42))
            .u64(7)
            .u64(10)
            .into_bytes();
        let log = decode_user_signed_up(&data).unwrap();
        assert_eq!(log.epoch, 1);
        assert_eq!(log.attester_id, 7);
        assert_eq!(log.airdrop_amount, 10);
    }

    #[test]
    fn truncated_log_is_rejected() {
        let data = Writer::new().u64(1).into_bytes();
        assert!(decode_user_signed_up(&data).is_err());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut data = Writer::new().u64(1).into_bytes();
        data.extend_from_slice(&[0u8; 31]);
        assert!(decode_epoch_ended(&data).is_err());
    }

    #[test]
    fn indexed_proof_round_trips_with_optional_fields() {
        let data = Writer::new()
            .u64(5)
            .bool(true)
            .u64(2)
            .vec_field(&[FieldElement::from_u64(1), FieldElement::from_u64(2)])
            .vec_field(&[FieldElement::from_u64(3)])
            .option_field(Some(FieldElement::from_u64(9)))
            .option_field(None)
            .option_field(None)
            .option_field(None)
            .option_field(None)
            .option_field(None)
            .vec_u64(&[10, 11])
            .into_bytes();
        let log = decode_indexed_proof(&data).unwrap();
        assert_eq!(log.proof_index, 5);
        assert_eq!(log.epoch, Some(2));
        assert_eq!(log.public_signals.len(), 2);
        assert_eq!(log.blinded_user_state, Some(FieldElement::from_u64(9)));
        assert_eq!(log.blinded_hash_chain, None);
        assert_eq!(log.proof_index_records, vec![10, 11]);
    }
}
