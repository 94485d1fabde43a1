//! 20-byte chain addresses
//!
//! Addresses are kept as raw bytes, so comparing two of them is independent
//! of how either was spelled (lowercase, uppercase, or checksummed hex).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AddressParseError {
    #[error("expected 40 hex digits, got {len}")]
    InvalidLength { len: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    /// Accepts an optional `0x`/`0X` prefix followed by 40 hex digits in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength { len: digits.len() });
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}
