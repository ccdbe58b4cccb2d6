//! # Key Management
//!
//! Ed25519 keys as the Vite ledger uses them.
//!
//! The curve is the standard one, but every internal hash that RFC 8032
//! performs with SHA-512 is BLAKE2b-512 here: the seed expansion, the nonce
//! derivation and the challenge. Signatures produced by a stock Ed25519
//! library will not verify on-chain, so this module goes through
//! `ed25519-dalek`'s `hazmat` layer and plugs in the right digest.
//!
//! The middleware itself never holds user keys. [`ViteKeypair`] exists for
//! the `sign` CLI subcommand and for tests that play the role of a wallet.

use std::fmt;

use blake2::Blake2b512;
use ed25519_dalek::hazmat::{raw_sign, raw_verify, ExpandedSecretKey};
use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use super::hash::blake2b_512;
use crate::ledger::Address;

/// Length of an Ed25519 seed.
pub const SEED_LENGTH: usize = 32;

/// Length of a public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Length of a signature.
pub const SIGNATURE_LENGTH: usize = 64;

/// Errors that can occur during key operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid private key: expected 32-byte seed or 64-byte seed||public key")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,

    #[error("keypair validation failed: public key does not match secret key")]
    KeypairMismatch,
}

/// A ledger keypair.
///
/// Only the 32-byte seed is stored; the expanded secret is recomputed per
/// signature. `ExpandedSecretKey` zeroizes itself on drop, so it never
/// outlives the call that needed it.
///
/// # Examples
///
/// ```
/// use vite_rosetta::crypto::ViteKeypair;
///
/// let kp = ViteKeypair::generate();
/// let sig = kp.sign(b"account block hash");
/// assert!(kp.public_key().verify(b"account block hash", &sig));
/// ```
#[derive(Clone)]
pub struct ViteKeypair {
    seed: [u8; SEED_LENGTH],
}

/// Public half of a ledger keypair.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VitePublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A 64-byte signature under the ledger's Ed25519 variant.
#[derive(Clone, PartialEq, Eq)]
pub struct ViteSignature {
    bytes: [u8; SIGNATURE_LENGTH],
}

// ---------------------------------------------------------------------------
// ViteKeypair
// ---------------------------------------------------------------------------

impl ViteKeypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let mut seed = [0u8; SEED_LENGTH];
        OsRng.fill_bytes(&mut seed);
        Self { seed }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self { seed: *seed }
    }

    /// Load a keypair from hex.
    ///
    /// Accepts either the bare 32-byte seed or the 64-byte `seed || public
    /// key` form that gvite wallets export. In the latter case the embedded
    /// public key must match the one derived from the seed.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let (seed_bytes, embedded_public) = match bytes.len() {
            SEED_LENGTH => (&bytes[..], None),
            64 => (&bytes[..SEED_LENGTH], Some(&bytes[SEED_LENGTH..])),
            _ => return Err(KeyError::InvalidSecretKey),
        };

        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(seed_bytes);
        let keypair = Self::from_seed(&seed);

        if let Some(public) = embedded_public {
            if public != keypair.public_key().as_bytes() {
                return Err(KeyError::KeypairMismatch);
            }
        }
        Ok(keypair)
    }

    fn expanded(&self) -> ExpandedSecretKey {
        ExpandedSecretKey::from_bytes(&blake2b_512(&self.seed))
    }

    pub fn public_key(&self) -> VitePublicKey {
        let verifying_key = VerifyingKey::from(&self.expanded());
        VitePublicKey {
            bytes: verifying_key.to_bytes(),
        }
    }

    /// The user address owned by this keypair.
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign a message. Deterministic for a given (seed, message) pair.
    pub fn sign(&self, message: &[u8]) -> ViteSignature {
        let expanded = self.expanded();
        let verifying_key = VerifyingKey::from(&expanded);
        let signature = raw_sign::<Blake2b512>(&expanded, message, &verifying_key);
        ViteSignature {
            bytes: signature.to_bytes(),
        }
    }
}

impl fmt::Debug for ViteKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViteKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// VitePublicKey
// ---------------------------------------------------------------------------

impl VitePublicKey {
    /// Parse and validate a public key.
    ///
    /// Rejects anything that is not 32 bytes or does not decompress to a
    /// curve point.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Address derived from this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.bytes)
    }

    /// Verify a signature. Returns `false` on any failure.
    pub fn verify(&self, message: &[u8], signature: &ViteSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        raw_verify::<Blake2b512>(&verifying_key, message, &dalek_sig).is_ok()
    }
}

impl fmt::Display for VitePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for VitePublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VitePublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// ViteSignature
// ---------------------------------------------------------------------------

impl ViteSignature {
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGNATURE_LENGTH] =
            slice.try_into().map_err(|_| KeyError::InvalidSignature)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for ViteSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViteSignature({}...)", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
