//! Field elements used as leaf values, leaf hashes, node hashes and roots.
//!
//! An [`Fr`] is kept as its canonical 32-byte big-endian representation, so
//! byte order of stored keys equals numeric order of the values.

use std::fmt;

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

use crate::Error;

/// Scalar field modulus of BN254, big-endian.
const MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// Canonical field element.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fr([u8; 32]);

impl Fr {
    /// Zero element
    pub const ZERO: Fr = Fr([0; 32]);

    /// Size of the encoded element
    pub const LEN: usize = 32;

    /// Element from its big-endian representation, `None` if the value is not
    /// below the modulus.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Option<Self> {
        (bytes < MODULUS).then_some(Fr(bytes))
    }

    /// Big-endian representation
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Whether this is the zero element
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 32]
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        let mut bytes = [0; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Fr(bytes)
    }
}

impl From<u128> for Fr {
    fn from(value: u128) -> Self {
        let mut bytes = [0; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Fr(bytes)
    }
}

impl TryFrom<&[u8]> for Fr {
    type Error = Error;

    /// Parses a stored key or value, rejecting anything that is not a
    /// canonical 32-byte element.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            Error::CorruptedData(format!(
                "field element must be {} bytes, got {}",
                Fr::LEN,
                bytes.len()
            ))
        })?;
        Fr::from_be_bytes(bytes).ok_or_else(|| {
            Error::CorruptedData(format!(
                "field element 0x{} is not below the modulus",
                hex::encode(bytes)
            ))
        })
    }
}

impl AsRef<[u8]> for Fr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr(0x{})", hex::encode(self.0))
    }
}

impl Encode for Fr {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.0.encode(encoder)
    }
}

impl<Context> Decode<Context> for Fr {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let bytes = <[u8; 32] as Decode<Context>>::decode(decoder)?;
        Fr::from_be_bytes(bytes).ok_or_else(|| {
            DecodeError::OtherString(format!(
                "non-canonical field element 0x{}",
                hex::encode(bytes)
            ))
        })
    }
}

bincode::impl_borrow_decode!(Fr);

/// Any canonical element: the top byte is kept below that of the modulus.
#[cfg(test)]
pub(crate) fn arb_fr() -> impl proptest::strategy::Strategy<Value = Fr> {
    use proptest::prelude::*;

    any::<[u8; 32]>().prop_map(|mut bytes| {
        bytes[0] &= 0x1f;
        Fr(bytes)
    })
}
