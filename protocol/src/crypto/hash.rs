//! # Hashing Utilities
//!
//! Every digest on the Vite ledger is some flavour of BLAKE2b, parameterised
//! by output length:
//!
//! - **256-bit** — account block content hashes and the data digest folded
//!   into them.
//! - **160-bit** — the core of an address derived from a public key.
//! - **40-bit / 16-bit** — the checksums appended to textual addresses and
//!   token type ids.
//! - **512-bit** — the Ed25519 key expansion and challenge hash (the ledger
//!   swaps SHA-512 for BLAKE2b-512).
//!
//! The short variants are real BLAKE2b instances with the digest length in
//! the parameter block, not truncations of a longer digest.

use blake2::digest::consts::{U2, U20, U32, U5};
use blake2::{Blake2b, Blake2b512, Digest};

/// BLAKE2b with a 32-byte digest.
pub type Blake2b256 = Blake2b<U32>;

type Blake2b160 = Blake2b<U20>;
type Blake2b40 = Blake2b<U5>;
type Blake2b16 = Blake2b<U2>;

fn finalize_into<D: Digest, const N: usize>(hasher: D) -> [u8; N] {
    let result = hasher.finalize();
    let mut output = [0u8; N];
    output.copy_from_slice(&result);
    output
}

/// BLAKE2b-256 of the input.
///
/// # Example
///
/// ```
/// use vite_rosetta::crypto::blake2b_256;
///
/// let digest = blake2b_256(b"");
/// assert_eq!(
///     hex::encode(digest),
///     "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
/// );
/// ```
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    finalize_into(hasher)
}

/// BLAKE2b-256 over several slices, equivalent to hashing their
/// concatenation without allocating it.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    finalize_into(hasher)
}

/// BLAKE2b-160, used to derive an address core from a public key.
pub fn blake2b_160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Blake2b160::new();
    hasher.update(data);
    finalize_into(hasher)
}

/// 5-byte address checksum.
pub fn address_checksum(core: &[u8]) -> [u8; 5] {
    let mut hasher = Blake2b40::new();
    hasher.update(core);
    finalize_into(hasher)
}

/// 2-byte token type id checksum.
pub fn token_id_checksum(body: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b16::new();
    hasher.update(body);
    finalize_into(hasher)
}

/// BLAKE2b-512 of the input.
pub fn blake2b_512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(data);
    finalize_into(hasher)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
