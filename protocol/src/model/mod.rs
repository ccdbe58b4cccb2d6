//! # Rosetta Data Model
//!
//! The ledger-neutral types the HTTP surface speaks: identifiers,
//! operations, transactions, signing payloads, and one request/response
//! pair per endpoint. All of them serialize to the Rosetta JSON shapes
//! (snake_case keys, optional fields omitted).

pub mod api;
pub mod identifiers;
pub mod operation;
pub mod signing;
pub mod transaction;

pub use identifiers::{
    AccountIdentifier, BlockIdentifier, NetworkIdentifier, PartialBlockIdentifier,
    TransactionIdentifier,
};
pub use operation::{
    Amount, AmountSign, Currency, Operation, OperationIdentifier, OperationStatus,
    OperationStatusInfo, OperationType,
};
pub use signing::{CurveType, PublicKey, Signature, SignatureType, SigningPayload};
pub use transaction::{Block, Direction, Peer, RelatedTransaction, SyncStatus, Transaction};
