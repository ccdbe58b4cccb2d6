use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{BlockIdentifier, NetworkIdentifier, Operation, TransactionIdentifier};

/// Direction of a related transaction relative to the one reporting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The related transaction happens after this one (e.g. the receive
    /// acknowledging this send).
    Forward,
    /// The related transaction happened before this one.
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_identifier: Option<NetworkIdentifier>,
    pub transaction_identifier: TransactionIdentifier,
    pub direction: Direction,
}

impl RelatedTransaction {
    pub fn new(hash: impl ToString, direction: Direction) -> Self {
        Self {
            network_identifier: None,
            transaction_identifier: TransactionIdentifier::new(hash),
            direction,
        }
    }
}

/// One account block, as Rosetta sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_identifier: TransactionIdentifier,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_transactions: Vec<RelatedTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One snapshot block, as Rosetta sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_identifier: BlockIdentifier,
    pub parent_block_identifier: BlockIdentifier,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub peer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}
