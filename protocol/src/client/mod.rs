//! # Node Client
//!
//! Everything this service knows about the ledger comes through
//! [`NodeClient`]. The trait is the seam between the Rosetta engine and
//! gvite: [`GviteClient`] speaks JSON-RPC to a real node, [`OfflineClient`]
//! refuses every call, and [`InMemoryNode`] serves scripted answers to
//! tests.
//!
//! Implementations must be safe to share across concurrent requests. They
//! never retry; a failed call surfaces as a [`NodeError`] and the caller
//! decides what to do with it.

pub mod gvite;
pub mod memory;
pub mod rpc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::GENESIS_BLOCK_INDEX;
use crate::ledger::encoding::base64_opt;
use crate::ledger::{AccountBlock, Address, BlockType, Hash, LedgerError, Quantity};
use crate::model::api::AccountBalanceResponse;
use crate::model::{
    Block, BlockIdentifier, Currency, PartialBlockIdentifier, Peer, SyncStatus, Transaction,
    TransactionIdentifier,
};
use crate::transaction::CodecError;

pub use gvite::GviteClient;
pub use memory::InMemoryNode;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("{method} returned no result")]
    MissingResult { method: String },

    #[error("unable to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("node client is unavailable in offline mode")]
    Offline,
}

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// Head of the snapshot chain plus sync and peer information.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStatus {
    pub current_block_identifier: BlockIdentifier,
    /// Milliseconds since the Unix epoch.
    pub current_block_timestamp: i64,
    pub sync_status: Option<SyncStatus>,
    pub peers: Vec<Peer>,
}

/// Parameters of a proof-of-work difficulty quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowDifficultyParams {
    pub address: Address,
    pub previous_hash: Hash,
    pub block_type: BlockType,
    pub to_address: Address,
    #[serde(with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn status(&self) -> Result<NodeStatus, NodeError>;

    /// Cached when the client connects.
    fn genesis_block_identifier(&self) -> BlockIdentifier;

    /// The snapshot block `id` names, or the latest one. Account blocks
    /// are either inlined in the block or returned as identifiers,
    /// depending on the client's configuration.
    async fn block(
        &self,
        id: Option<&PartialBlockIdentifier>,
    ) -> Result<(Block, Vec<TransactionIdentifier>), NodeError>;

    async fn block_transaction(&self, id: &TransactionIdentifier)
        -> Result<Transaction, NodeError>;

    /// Confirmed balances at a snapshot block. An empty `currencies` means
    /// every token the account holds.
    async fn balance(
        &self,
        address: &Address,
        currencies: &[Currency],
        block: Option<&PartialBlockIdentifier>,
    ) -> Result<AccountBalanceResponse, NodeError>;

    /// `None` for an account with no blocks yet.
    async fn latest_account_block(
        &self,
        address: &Address,
    ) -> Result<Option<AccountBlock>, NodeError>;

    /// One page of sends addressed to `address` that it has not received.
    async fn unreceived_blocks(
        &self,
        address: &Address,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<AccountBlock>, NodeError>;

    /// `None` when the account has enough quota and needs no PoW.
    async fn pow_difficulty(
        &self,
        params: &PowDifficultyParams,
    ) -> Result<Option<Quantity>, NodeError>;

    async fn pow_nonce(&self, difficulty: &Quantity, hash: &Hash) -> Result<Vec<u8>, NodeError>;

    async fn send_raw_transaction(&self, block: &AccountBlock) -> Result<(), NodeError>;
}

// ---------------------------------------------------------------------------
// OfflineClient
// ---------------------------------------------------------------------------

/// Client for offline deployments. Every node call fails with
/// [`NodeError::Offline`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineClient;

#[async_trait]
impl NodeClient for OfflineClient {
    async fn status(&self) -> Result<NodeStatus, NodeError> {
        Err(NodeError::Offline)
    }

    fn genesis_block_identifier(&self) -> BlockIdentifier {
        BlockIdentifier {
            index: GENESIS_BLOCK_INDEX as i64,
            hash: Hash::ZERO.to_string(),
        }
    }

    async fn block(
        &self,
        _id: Option<&PartialBlockIdentifier>,
    ) -> Result<(Block, Vec<TransactionIdentifier>), NodeError> {
        Err(NodeError::Offline)
    }

    async fn block_transaction(
        &self,
        _id: &TransactionIdentifier,
    ) -> Result<Transaction, NodeError> {
        Err(NodeError::Offline)
    }

    async fn balance(
        &self,
        _address: &Address,
        _currencies: &[Currency],
        _block: Option<&PartialBlockIdentifier>,
    ) -> Result<AccountBalanceResponse, NodeError> {
        Err(NodeError::Offline)
    }

    async fn latest_account_block(
        &self,
        _address: &Address,
    ) -> Result<Option<AccountBlock>, NodeError> {
        Err(NodeError::Offline)
    }

    async fn unreceived_blocks(
        &self,
        _address: &Address,
        _page: u64,
        _page_size: u64,
    ) -> Result<Vec<AccountBlock>, NodeError> {
        Err(NodeError::Offline)
    }

    async fn pow_difficulty(
        &self,
        _params: &PowDifficultyParams,
    ) -> Result<Option<Quantity>, NodeError> {
        Err(NodeError::Offline)
    }

    async fn pow_nonce(&self, _difficulty: &Quantity, _hash: &Hash) -> Result<Vec<u8>, NodeError> {
        Err(NodeError::Offline)
    }

    async fn send_raw_transaction(&self, _block: &AccountBlock) -> Result<(), NodeError> {
        Err(NodeError::Offline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pow_params_wire_shape() {
        let params = PowDifficultyParams {
            address: Address::ZERO,
            previous_hash: Hash::ZERO,
            block_type: BlockType::SendCall,
            to_address: Address::ZERO,
            data: Some(vec![1, 2, 3]),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["address"], json!(Address::ZERO.to_string()));
        assert_eq!(value["previousHash"], json!(Hash::ZERO.to_string()));
        assert_eq!(value["blockType"], json!(2));
        assert_eq!(value["data"], json!("AQID"));
    }

    #[tokio::test]
    async fn test_offline_client_refuses() {
        let client = OfflineClient;
        assert!(matches!(client.status().await, Err(NodeError::Offline)));
        assert!(matches!(
            client.latest_account_block(&Address::ZERO).await,
            Err(NodeError::Offline)
        ));
        assert_eq!(
            client.genesis_block_identifier().index,
            GENESIS_BLOCK_INDEX as i64
        );
    }
}
