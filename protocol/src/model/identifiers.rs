use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which chain and network a request targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentifier {
    pub blockchain: String,
    pub network: String,
}

/// A snapshot block, by height and hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIdentifier {
    pub index: i64,
    pub hash: String,
}

/// A snapshot block lookup key. Both fields empty means "latest".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialBlockIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl From<&BlockIdentifier> for PartialBlockIdentifier {
    fn from(id: &BlockIdentifier) -> Self {
        Self {
            index: Some(id.index),
            hash: Some(id.hash.clone()),
        }
    }
}

/// An account block, by hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionIdentifier {
    pub hash: String,
}

impl TransactionIdentifier {
    pub fn new(hash: impl ToString) -> Self {
        Self {
            hash: hash.to_string(),
        }
    }
}

/// An account, by textual address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl AccountIdentifier {
    pub fn new(address: impl ToString) -> Self {
        Self {
            address: address.to_string(),
            metadata: None,
        }
    }
}
