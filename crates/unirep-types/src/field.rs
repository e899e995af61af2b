//! field element encoding for values that cross the chain/store boundary
//!
//! field elements are kept as big-endian [u8; 32] in memory and in the
//! tree engine, but round-trip through decimal strings when persisted
//! or logged, matching the legacy decimal-string encoding used for public
//! signals and proof blobs on the reference client's wire boundary.

use num_bigint::BigUint;
use num_traits::Zero;
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug)]
pub enum FieldError {
    #[error("decimal string is not a valid field element: {0}")]
    InvalidDecimal(String),
    #[error("field element overflows 32 bytes")]
    Overflow,
}

/// a 32-byte big-endian field element
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct FieldElement(pub [u8; 32]);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0u8; 32]);
    pub const ONE: FieldElement = FieldElement({
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes
    });

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn from_decimal(s: &str) -> Result<Self, FieldError> {
        let value = BigUint::from_str(s).map_err(|_| FieldError::InvalidDecimal(s.to_string()))?;
        let be = value.to_bytes_be();
        if be.len() > 32 {
            return Err(FieldError::Overflow);
        }
        let mut bytes = [0u8; 32];
        bytes[32 - be.len()..].copy_from_slice(&be);
        Ok(Self(bytes))
    }

    pub fn to_decimal(&self) -> String {
        let value = BigUint::from_bytes_be(&self.0);
        if value.is_zero() {
            "0".to_string()
        } else {
            value.to_string()
        }
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal(s)
    }
}

impl From<[u8; 32]> for FieldElement {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for FieldElement {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
