//! Operations: the ledger-neutral vocabulary a transfer is described in.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AccountIdentifier;
use crate::config::{DECIMALS, SYMBOL, VITE_TOKEN_ID};
use crate::ledger::{LedgerError, Quantity, TokenTypeId};

/// Currency metadata key holding the token type id.
pub const TOKEN_ID_METADATA_KEY: &str = "tti";

// ---------------------------------------------------------------------------
// OperationType
// ---------------------------------------------------------------------------

/// The nine operation kinds the API reports and accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    CreateContract,
    Request,
    Mint,
    Response,
    ResponseFail,
    Refund,
    Genesis,
    Fee,
    Burn,
}

impl OperationType {
    pub const ALL: [OperationType; 9] = [
        OperationType::CreateContract,
        OperationType::Request,
        OperationType::Mint,
        OperationType::Response,
        OperationType::ResponseFail,
        OperationType::Refund,
        OperationType::Genesis,
        OperationType::Fee,
        OperationType::Burn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateContract => "CREATE_CONTRACT",
            Self::Request => "REQUEST",
            Self::Mint => "MINT",
            Self::Response => "RESPONSE",
            Self::ResponseFail => "RESPONSE_FAIL",
            Self::Refund => "REFUND",
            Self::Genesis => "GENESIS",
            Self::Fee => "FEE",
            Self::Burn => "BURN",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Applied to the ledger.
    Success,
    /// The credit side of a send, not yet acknowledged by a receive.
    Intent,
    /// Acknowledged, but the contract execution failed.
    Reverted,
    /// Nested send list too deep to expand.
    ExceedMaxDepth,
}

impl OperationStatus {
    pub const ALL: [OperationStatus; 4] = [
        OperationStatus::Success,
        OperationStatus::Intent,
        OperationStatus::Reverted,
        OperationStatus::ExceedMaxDepth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Intent => "INTENT",
            Self::Reverted => "REVERTED",
            Self::ExceedMaxDepth => "EXCEED_MAX_DEPTH",
        }
    }

    /// Only SUCCESS moves balances.
    pub fn successful(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A status as listed in `/network/options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatusInfo {
    pub status: String,
    pub successful: bool,
}

impl From<OperationStatus> for OperationStatusInfo {
    fn from(status: OperationStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            successful: status.successful(),
        }
    }
}

// ---------------------------------------------------------------------------
// Currency & Amount
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Currency {
    pub fn for_token(symbol: impl Into<String>, decimals: i32, token_id: &TokenTypeId) -> Self {
        let mut metadata = Map::new();
        metadata.insert(
            TOKEN_ID_METADATA_KEY.to_string(),
            Value::String(token_id.to_string()),
        );
        Self {
            symbol: symbol.into(),
            decimals,
            metadata: Some(metadata),
        }
    }

    /// The native token.
    pub fn vite() -> Self {
        Self {
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
            metadata: Some(Map::from_iter([(
                TOKEN_ID_METADATA_KEY.to_string(),
                Value::String(VITE_TOKEN_ID.to_string()),
            )])),
        }
    }

    /// Token type id from `metadata.tti`. A bare `VITE` currency without
    /// metadata means the native token.
    pub fn token_id(&self) -> Result<TokenTypeId, LedgerError> {
        match self
            .metadata
            .as_ref()
            .and_then(|m| m.get(TOKEN_ID_METADATA_KEY))
        {
            Some(Value::String(tti)) => tti.parse(),
            Some(other) => Err(LedgerError::InvalidTokenId(other.to_string())),
            None if self.symbol == SYMBOL => VITE_TOKEN_ID.parse(),
            None => Err(LedgerError::InvalidTokenId(format!(
                "currency {} carries no token id",
                self.symbol
            ))),
        }
    }
}

/// Sign of an [`Amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSign {
    Negative,
    Zero,
    Positive,
}

/// A signed decimal amount in the smallest unit of `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub value: String,
    pub currency: Currency,
}

impl Amount {
    pub fn new(value: impl Into<String>, currency: Currency) -> Self {
        Self {
            value: value.into(),
            currency,
        }
    }

    pub fn positive(quantity: &Quantity, currency: Currency) -> Self {
        Self::new(quantity.to_string(), currency)
    }

    /// `-quantity`, or `"0"` for zero.
    pub fn negative(quantity: &Quantity, currency: Currency) -> Self {
        if quantity.is_zero() {
            Self::new("0", currency)
        } else {
            Self::new(format!("-{}", quantity), currency)
        }
    }

    /// Split the value into sign and magnitude. `-0` is zero.
    pub fn parse(&self) -> Result<(AmountSign, Quantity), LedgerError> {
        let (negative, digits) = match self.value.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, self.value.as_str()),
        };
        let magnitude: Quantity = digits
            .parse()
            .map_err(|_| LedgerError::InvalidAmount(self.value.clone()))?;
        let sign = if magnitude.is_zero() {
            AmountSign::Zero
        } else if negative {
            AmountSign::Negative
        } else {
            AmountSign::Positive
        };
        Ok((sign, magnitude))
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationIdentifier {
    pub index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_index: Option<i64>,
}

impl OperationIdentifier {
    pub fn new(index: i64) -> Self {
        Self {
            index,
            network_index: None,
        }
    }
}

/// One balance-affecting (or intended) step of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_identifier: OperationIdentifier,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_operations: Vec<OperationIdentifier>,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OperationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Operation {
    pub fn index(&self) -> i64 {
        self.operation_identifier.index
    }

    /// String value of a metadata key, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
    }

    pub fn is_related_to(&self, index: i64) -> bool {
        self.related_operations.iter().any(|r| r.index == index)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_wire_names() {
        for op_type in OperationType::ALL {
            let json = serde_json::to_value(op_type).unwrap();
            assert_eq!(json, op_type.as_str());
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(OperationStatus::ExceedMaxDepth).unwrap(),
            "EXCEED_MAX_DEPTH"
        );
        let successful: Vec<_> = OperationStatus::ALL
            .into_iter()
            .filter(OperationStatus::successful)
            .collect();
        assert_eq!(successful, vec![OperationStatus::Success]);
    }

    #[test]
    fn test_amount_parse_signs() {
        let vite = Currency::vite();
        let (sign, magnitude) = Amount::new("-100", vite.clone()).parse().unwrap();
        assert_eq!(sign, AmountSign::Negative);
        assert_eq!(magnitude, Quantity::from(100u64));

        assert_eq!(Amount::new("0", vite.clone()).parse().unwrap().0, AmountSign::Zero);
        assert_eq!(Amount::new("-0", vite.clone()).parse().unwrap().0, AmountSign::Zero);
        assert_eq!(Amount::new("7", vite.clone()).parse().unwrap().0, AmountSign::Positive);

        for bad in ["", "-", "--1", "+1", "1e3"] {
            assert!(Amount::new(bad, vite.clone()).parse().is_err(), "{bad}");
        }
    }

    #[test]
    fn test_negative_of_zero_is_plain_zero() {
        assert_eq!(Amount::negative(&Quantity::ZERO, Currency::vite()).value, "0");
        assert_eq!(
            Amount::negative(&Quantity::from(5u64), Currency::vite()).value,
            "-5"
        );
    }

    #[test]
    fn test_currency_token_id() {
        assert_eq!(
            Currency::vite().token_id().unwrap().to_string(),
            VITE_TOKEN_ID
        );

        let bare = Currency {
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
            metadata: None,
        };
        assert_eq!(bare.token_id().unwrap().to_string(), VITE_TOKEN_ID);

        let unknown = Currency {
            symbol: "ABC".to_string(),
            decimals: 2,
            metadata: None,
        };
        assert!(unknown.token_id().is_err());
    }

    #[test]
    fn test_operation_json_shape() {
        let op: Operation = serde_json::from_value(serde_json::json!({
            "operation_identifier": {"index": 1},
            "related_operations": [{"index": 0}],
            "type": "RESPONSE",
            "account": {"address": "vite_x"},
            "metadata": {"sendBlockHash": "ab"}
        }))
        .unwrap();
        assert_eq!(op.op_type, OperationType::Response);
        assert!(op.is_related_to(0));
        assert_eq!(op.metadata_str("sendBlockHash"), Some("ab"));
        assert!(op.status.is_none());
    }
}
