//! # Ledger Primitives
//!
//! Native Vite types as the node speaks them: addresses, token ids, hashes,
//! 256-bit quantities and account blocks, plus the encodings used to move
//! blocks between construction stages.
//!
//! ```text
//! address.rs  — Address, TokenTypeId, Hash and their checksummed text forms
//! quantity.rs — Quantity, an unsigned 256-bit amount
//! block.rs    — AccountBlock, BlockType, BlockDirection, content hashing
//! encoding.rs — base64/JSON payload encoding and serde adapters
//! ```

pub mod address;
pub mod block;
pub mod encoding;
pub mod quantity;

use thiserror::Error;

pub use address::{Address, Hash, TokenTypeId};
pub use block::{AccountBlock, BlockDirection, BlockType, TokenInfo};
pub use encoding::{decode_block, encode_block};
pub use quantity::Quantity;

/// Errors raised while parsing or encoding ledger values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0} is not a valid address")]
    InvalidAddress(String),

    #[error("{0} is not a valid token type id")]
    InvalidTokenId(String),

    #[error("{0} is not a valid hash")]
    InvalidHash(String),

    #[error("{0} is not a valid amount")]
    InvalidAmount(String),

    #[error("unknown account block type {0}")]
    UnknownBlockType(u8),

    #[error("encoding error: {0}")]
    Encoding(String),
}
