//! Account block verification.
//!
//! A signature is only ever checked against the hash recomputed from the
//! block's fields; the stored `hash` is never trusted. The checks run from
//! cheapest to most expensive.

use thiserror::Error;

use crate::crypto::{verify, SignatureError, VitePublicKey};
use crate::ledger::{AccountBlock, Address, Hash};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("block is unsigned")]
    MissingSignature,

    #[error("public key belongs to {actual}, block is issued by {expected}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("stored hash {stored} does not match content hash {computed}")]
    HashMismatch { stored: Hash, computed: Hash },

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Verifies `signature` by `public_key` over the block's content hash.
///
/// The key must also derive the block's issuing address. Returns the
/// recomputed hash.
pub fn verify_block_signature(
    block: &AccountBlock,
    public_key: &[u8],
    signature: &[u8],
) -> Result<Hash, VerificationError> {
    let key = VitePublicKey::try_from_slice(public_key).map_err(SignatureError::from)?;
    let signer = key.address();
    if signer != block.address {
        return Err(VerificationError::AddressMismatch {
            expected: block.address,
            actual: signer,
        });
    }

    let hash = block.compute_hash();
    verify(public_key, hash.as_bytes(), signature)?;
    Ok(hash)
}

/// Full check of a block that claims to be signed: the stored hash must
/// equal the content hash, and the embedded signature must verify under
/// the embedded public key.
pub fn verify_signed_block(block: &AccountBlock) -> Result<Hash, VerificationError> {
    let signature = block
        .signature
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(VerificationError::MissingSignature)?;

    let computed = block.compute_hash();
    if block.hash != computed {
        return Err(VerificationError::HashMismatch {
            stored: block.hash,
            computed,
        });
    }

    verify_block_signature(block, &block.public_key, signature)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
