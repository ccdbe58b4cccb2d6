//! Addresses, token type ids and block hashes.
//!
//! All three are fixed-size byte strings with a canonical text form. The
//! text forms carry BLAKE2b checksums, so a typo in a Rosetta request is
//! caught at parse time instead of turning into a send to nowhere.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::LedgerError;
use crate::crypto::{address_checksum, blake2b_160, token_id_checksum};

// ---------------------------------------------------------------------------
// Sizes & Prefixes
// ---------------------------------------------------------------------------

pub const ADDRESS_PREFIX: &str = "vite_";
pub const ADDRESS_CORE_SIZE: usize = 20;
pub const ADDRESS_SIZE: usize = ADDRESS_CORE_SIZE + 1;
const ADDRESS_CHECKSUM_SIZE: usize = 5;
const ADDRESS_TEXT_LEN: usize = ADDRESS_PREFIX.len() + 2 * (ADDRESS_CORE_SIZE + ADDRESS_CHECKSUM_SIZE);

const USER_ADDRESS_TYPE: u8 = 0;
const CONTRACT_ADDRESS_TYPE: u8 = 1;

pub const TOKEN_ID_PREFIX: &str = "tti_";
pub const TOKEN_ID_SIZE: usize = 10;
const TOKEN_ID_CHECKSUM_SIZE: usize = 2;
const TOKEN_ID_TEXT_LEN: usize = TOKEN_ID_PREFIX.len() + 2 * (TOKEN_ID_SIZE + TOKEN_ID_CHECKSUM_SIZE);

pub const HASH_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A ledger account: 20-byte core plus a type byte (0 user, 1 contract).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The all-zero user address. Receive blocks carry it as their
    /// `toAddress` when broadcast.
    pub const ZERO: Address = Address([0u8; ADDRESS_SIZE]);

    /// User address owned by an Ed25519 public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[..ADDRESS_CORE_SIZE].copy_from_slice(&blake2b_160(public_key));
        bytes[ADDRESS_CORE_SIZE] = USER_ADDRESS_TYPE;
        Self(bytes)
    }

    /// Parse the 21-byte binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let arr: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidAddress(hex::encode(bytes)))?;
        if arr[ADDRESS_CORE_SIZE] > CONTRACT_ADDRESS_TYPE {
            return Err(LedgerError::InvalidAddress(hex::encode(bytes)));
        }
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn core(&self) -> &[u8] {
        &self.0[..ADDRESS_CORE_SIZE]
    }

    pub fn is_contract(&self) -> bool {
        self.0[ADDRESS_CORE_SIZE] == CONTRACT_ADDRESS_TYPE
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn checksum(&self) -> [u8; ADDRESS_CHECKSUM_SIZE] {
        let mut checksum = address_checksum(self.core());
        if self.is_contract() {
            for byte in checksum.iter_mut() {
                *byte = !*byte;
            }
        }
        checksum
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidAddress(s.to_string());
        if s.len() != ADDRESS_TEXT_LEN {
            return Err(invalid());
        }
        let body = s.strip_prefix(ADDRESS_PREFIX).ok_or_else(invalid)?;
        let decoded = hex::decode(body).map_err(|_| invalid())?;
        let (core, checksum) = decoded.split_at(ADDRESS_CORE_SIZE);

        let expected = address_checksum(core);
        let address_type = if checksum == expected {
            USER_ADDRESS_TYPE
        } else if checksum.iter().zip(expected.iter()).all(|(c, e)| *c == !*e) {
            CONTRACT_ADDRESS_TYPE
        } else {
            return Err(invalid());
        };

        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[..ADDRESS_CORE_SIZE].copy_from_slice(core);
        bytes[ADDRESS_CORE_SIZE] = address_type;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            ADDRESS_PREFIX,
            hex::encode(self.core()),
            hex::encode(self.checksum())
        )
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

// ---------------------------------------------------------------------------
// TokenTypeId
// ---------------------------------------------------------------------------

/// Identifier of a token on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenTypeId([u8; TOKEN_ID_SIZE]);

impl TokenTypeId {
    pub const ZERO: TokenTypeId = TokenTypeId([0u8; TOKEN_ID_SIZE]);

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let arr: [u8; TOKEN_ID_SIZE] = bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidTokenId(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_ID_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for TokenTypeId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidTokenId(s.to_string());
        if s.len() != TOKEN_ID_TEXT_LEN {
            return Err(invalid());
        }
        let body = s.strip_prefix(TOKEN_ID_PREFIX).ok_or_else(invalid)?;
        let decoded = hex::decode(body).map_err(|_| invalid())?;
        let (id, checksum) = decoded.split_at(TOKEN_ID_SIZE);
        if checksum != token_id_checksum(id) {
            return Err(invalid());
        }
        Self::from_bytes(id)
    }
}

impl fmt::Display for TokenTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            TOKEN_ID_PREFIX,
            hex::encode(self.0),
            hex::encode(token_id_checksum(&self.0))
        )
    }
}

impl fmt::Debug for TokenTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenTypeId({})", self)
    }
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// A 32-byte block hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_SIZE]);

    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let arr: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| LedgerError::InvalidHash(hex::encode(bytes)))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl FromStr for Hash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s).map_err(|_| LedgerError::InvalidHash(s.to_string()))?;
        Self::from_bytes(&decoded).map_err(|_| LedgerError::InvalidHash(s.to_string()))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

// ---------------------------------------------------------------------------
// Serde: always the canonical text form
// ---------------------------------------------------------------------------

macro_rules! text_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

text_serde!(Address);
text_serde!(TokenTypeId);
text_serde!(Hash);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MINT_ADDRESS, VITE_TOKEN_ID};

    #[test]
    fn test_mint_address_is_contract() {
        let mint: Address = MINT_ADDRESS.parse().unwrap();
        assert!(mint.is_contract());
        assert_eq!(mint.core()[19], 0x05);
        assert_eq!(mint.to_string(), MINT_ADDRESS);
    }

    #[test]
    fn test_zero_address_text() {
        assert_eq!(
            Address::ZERO.to_string(),
            "vite_0000000000000000000000000000000000000000a4f3a0cb58"
        );
        let parsed: Address = Address::ZERO.to_string().parse().unwrap();
        assert!(parsed.is_zero());
    }

    #[test]
    fn test_address_rejects_bad_checksum() {
        let mut text = MINT_ADDRESS.to_string();
        text.replace_range(text.len() - 1.., "e");
        assert!(text.parse::<Address>().is_err());
    }

    #[test]
    fn test_address_rejects_wrong_prefix_and_length() {
        let swapped = MINT_ADDRESS.replacen("vite_", "vit3_", 1);
        assert!(swapped.parse::<Address>().is_err());
        assert!("vite_00".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_from_public_key_roundtrips_through_text() {
        let address = Address::from_public_key(&[5u8; 32]);
        assert!(!address.is_contract());
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_from_bytes_rejects_unknown_type() {
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[ADDRESS_CORE_SIZE] = 2;
        assert!(Address::from_bytes(&bytes).is_err());
        assert!(Address::from_bytes(&bytes[..20]).is_err());
    }

    #[test]
    fn test_native_token_id() {
        let tti: TokenTypeId = VITE_TOKEN_ID.parse().unwrap();
        assert_eq!(&tti.as_bytes()[..], b"VITE TOKEN");
        assert_eq!(tti.to_string(), VITE_TOKEN_ID);
    }

    #[test]
    fn test_token_id_rejects_bad_checksum() {
        assert!("tti_5649544520544f4b454e6e41".parse::<TokenTypeId>().is_err());
        assert!("xxx_5649544520544f4b454e6e40".parse::<TokenTypeId>().is_err());
    }

    #[test]
    fn test_hash_parsing() {
        let text = "ab".repeat(32);
        let hash: Hash = text.parse().unwrap();
        assert_eq!(hash.to_string(), text);
        assert!("ab".parse::<Hash>().is_err());
        assert!("zz".repeat(32).parse::<Hash>().is_err());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let mint: Address = MINT_ADDRESS.parse().unwrap();
        let json = serde_json::to_string(&mint).unwrap();
        assert_eq!(json, format!("\"{}\"", MINT_ADDRESS));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mint);
        assert!(serde_json::from_str::<Address>("\"vite_nope\"").is_err());
    }
}
