//! # Cryptographic Primitives
//!
//! BLAKE2b digests and the ledger's Ed25519 variant. Everything here is a
//! thin, type-safe wrapper around `blake2` and `ed25519-dalek`; nothing is
//! hand-rolled.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{
    address_checksum, blake2b_160, blake2b_256, blake2b_256_multi, blake2b_512, token_id_checksum,
};
pub use keys::{KeyError, ViteKeypair, VitePublicKey, ViteSignature};
pub use signatures::{sign, verify, SignatureError};
