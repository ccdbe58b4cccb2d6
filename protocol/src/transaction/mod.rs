//! # Transaction Module
//!
//! The mapping between native account blocks and Rosetta operations, in
//! both directions, plus building, signing and verifying blocks.
//!
//! ## Architecture
//!
//! ```text
//! codec.rs        — AccountBlock → operations, block type ↔ operation type
//! matcher.rs      — operations → TransactionDescription
//! builder.rs      — TransactionDescription + metadata → unsigned AccountBlock
//! signing.rs      — content-hash signing and signature attachment
//! verification.rs — signature and hash checks against the recomputed hash
//! ```
//!
//! ## Block Lifecycle
//!
//! 1. **Match**: [`match_transaction`] turns client operations into a
//!    [`TransactionDescription`].
//! 2. **Build**: [`create_account_block`] assembles the unsigned block.
//! 3. **Sign**: the client signs the content hash; [`apply_signature`]
//!    attaches it only after [`verify_block_signature`] accepts it.
//! 4. **Parse**: [`operations_for_block`] projects any block back onto
//!    operations.

pub mod builder;
pub mod codec;
pub mod matcher;
pub mod signing;
pub mod verification;

pub use builder::{create_account_block, AccountBlockBuilder, BuildError};
pub use codec::{
    block_to_transaction, block_type_to_operation_type, currency_for_block, is_receive_operation,
    is_send_operation, operation_type_to_block_type, operations_for_block,
    related_transactions_for_block, CodecError,
};
pub use matcher::{match_transaction, MatchError, TransactionDescription};
pub use signing::{apply_signature, sign_block, sign_payload};
pub use verification::{verify_block_signature, verify_signed_block, VerificationError};
