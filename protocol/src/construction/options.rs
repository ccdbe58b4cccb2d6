//! Typed records carried between construction stages.
//!
//! Each record is decoded once at the HTTP boundary and never read through
//! untyped lookups afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ledger::encoding::base64_opt;
use crate::ledger::{Hash, Quantity};
use crate::model::{AccountIdentifier, Amount, OperationType};
use crate::transaction::TransactionDescription;

/// Preprocess metadata key that asks Metadata to fetch a PoW quote.
pub const USE_POW_KEY: &str = "use_pow";

/// Preprocess output, Metadata input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionOptions {
    pub operation_type: OperationType,
    pub account_identifier: AccountIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account: Option<AccountIdentifier>,
    pub to_account: AccountIdentifier,
    pub amount: Amount,
    #[serde(default = "default_true", deserialize_with = "flag::deserialize")]
    pub fetch_previous_block: bool,
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub use_pow: bool,
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    /// Set when the client already named the send a receive acknowledges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_block_hash: Option<Hash>,
}

impl ConstructionOptions {
    pub fn from_description(description: &TransactionDescription, use_pow: bool) -> Self {
        Self {
            operation_type: description.operation_type,
            account_identifier: description.account.clone(),
            from_account: description.from_account.clone(),
            to_account: description.to_account.clone(),
            amount: description.amount.clone(),
            fetch_previous_block: true,
            use_pow,
            data: description.data.clone(),
            send_block_hash: description.send_block_hash,
        }
    }
}

/// Metadata output, Payloads input.
///
/// `height` is the height of the account's latest block; the block being
/// built sits at `height + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructionMetadata {
    pub height: u64,
    pub previous_hash: Hash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Quantity>,
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_block_hash: Option<Hash>,
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

/// Metadata reported by Parse alongside the recovered operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMetadata {
    pub height: u64,
    pub previous_hash: Hash,
    pub block_type: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Quantity>,
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Quantity>,
    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_block_hash: Option<Hash>,
}

/// Reads `use_pow` from free-form preprocess metadata. Accepts a JSON bool
/// or the strings `"true"`/`"false"`; anything else is false.
pub fn use_pow_flag(metadata: Option<&Map<String, Value>>) -> bool {
    metadata
        .and_then(|m| m.get(USE_POW_KEY))
        .and_then(flag::from_value)
        .unwrap_or(false)
}

fn default_true() -> bool {
    true
}

/// Boolean fields that older clients send as strings.
mod flag {
    use super::*;

    pub fn from_value(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = Value::deserialize(deserializer)?;
        from_value(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a boolean, got {}", value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Currency;
    use serde_json::json;

    fn options_json() -> Value {
        json!({
            "operation_type": "REQUEST",
            "account_identifier": {"address": "vite_0000000000000000000000000000000000000000a4f3a0cb58"},
            "to_account": {"address": "vite_0000000000000000000000000000000000000000a4f3a0cb58"},
            "amount": {"value": "10", "currency": Currency::vite()},
        })
    }

    #[test]
    fn test_options_defaults() {
        let options: ConstructionOptions = serde_json::from_value(options_json()).unwrap();
        assert!(options.fetch_previous_block);
        assert!(!options.use_pow);
        assert!(options.data.is_none());
        assert!(options.send_block_hash.is_none());
    }

    #[test]
    fn test_options_accept_string_flags() {
        let mut value = options_json();
        value["fetch_previous_block"] = json!("false");
        value["use_pow"] = json!("true");
        let options: ConstructionOptions = serde_json::from_value(value).unwrap();
        assert!(!options.fetch_previous_block);
        assert!(options.use_pow);
    }

    #[test]
    fn test_options_reject_garbage_flag() {
        let mut value = options_json();
        value["use_pow"] = json!(7);
        assert!(serde_json::from_value::<ConstructionOptions>(value).is_err());
    }

    #[test]
    fn test_use_pow_flag() {
        let mut metadata = Map::new();
        assert!(!use_pow_flag(None));
        assert!(!use_pow_flag(Some(&metadata)));
        metadata.insert(USE_POW_KEY.into(), json!(true));
        assert!(use_pow_flag(Some(&metadata)));
        metadata.insert(USE_POW_KEY.into(), json!("true"));
        assert!(use_pow_flag(Some(&metadata)));
        metadata.insert(USE_POW_KEY.into(), json!("yes"));
        assert!(!use_pow_flag(Some(&metadata)));
    }

    #[test]
    fn test_metadata_wire_names() {
        let metadata = ConstructionMetadata {
            height: 4,
            previous_hash: Hash::ZERO,
            difficulty: Some(Quantity::from(65_534u64)),
            nonce: Some(vec![1, 2]),
            send_block_hash: None,
            data: None,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["height"], json!(4));
        assert_eq!(value["previousHash"], json!(Hash::ZERO.to_string()));
        assert_eq!(value["difficulty"], json!("65534"));
        assert_eq!(value["nonce"], json!("AQI="));
        assert!(value.get("sendBlockHash").is_none());

        let back: ConstructionMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, metadata);
    }
}
