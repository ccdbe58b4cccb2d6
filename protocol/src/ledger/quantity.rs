//! Unsigned 256-bit token quantities.
//!
//! Amounts, fees and PoW difficulties on the ledger are all 256-bit
//! unsigned integers. The node speaks them as decimal strings, the content
//! hash wants them as 32 big-endian bytes.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::LedgerError;

/// An unsigned 256-bit quantity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(U256);

impl Quantity {
    pub const ZERO: Quantity = Quantity(U256([0; 4]));

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Quantity {
    type Err = LedgerError;

    /// Parse a non-negative decimal string. Signs, whitespace and hex are
    /// rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::InvalidAmount(s.to_string()));
        }
        U256::from_dec_str(s)
            .map(Quantity)
            .map_err(|_| LedgerError::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self.0)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    /// Accepts a decimal string or a JSON integer; gvite uses both
    /// depending on the endpoint.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => text.parse().map_err(de::Error::custom),
            serde_json::Value::Number(number) => number
                .as_u64()
                .map(Quantity::from)
                .ok_or_else(|| de::Error::custom(format!("{} is not a valid amount", number))),
            other => Err(de::Error::custom(format!("{} is not a valid amount", other))),
        }
    }
}
