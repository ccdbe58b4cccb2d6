//! # Operation Matcher
//!
//! Interprets a client-supplied operation list as one of the transaction
//! shapes the engine knows how to build, and extracts a
//! [`TransactionDescription`] from it.
//!
//! Recognised shapes:
//!
//! | Shape           | Operations                                        |
//! |-----------------|---------------------------------------------------|
//! | paired          | debit leg, credit leg related to it, optional FEE |
//! | paired burn     | debit leg, amount-less BURN on the mint address   |
//! | single request  | one debit leg with `toAddress` metadata           |
//! | single response | one credit leg with `sendBlockHash` metadata      |
//! | burn            | one BURN on the mint address, no amount           |
//!
//! A pair describes a *send* when its credit leg is zero (the value rides
//! on the send block, the receive is not confirmed yet), and a *receive*
//! when its credit leg carries the value and the debit leg is the zero
//! placeholder for the send that already happened.
//!
//! Amounts in the resulting description are always positive magnitudes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MINT_ADDRESS;
use crate::ledger::encoding::decode_base64;
use crate::ledger::{Address, Hash, Quantity, TokenTypeId};
use crate::model::{AccountIdentifier, Amount, AmountSign, Currency, Operation, OperationType};

/// Operation metadata key naming the recipient of a single request.
pub const TO_ADDRESS_KEY: &str = "toAddress";

/// Operation metadata key naming the send a single response acknowledges.
pub const SEND_BLOCK_HASH_KEY: &str = "sendBlockHash";

/// Operation metadata key carrying base64 call data.
pub const DATA_KEY: &str = "data";

const DEBIT_TYPES: [OperationType; 3] = [
    OperationType::Request,
    OperationType::CreateContract,
    OperationType::Refund,
];

const CREDIT_TYPES: [OperationType; 2] = [OperationType::Response, OperationType::ResponseFail];

/// The canonical intent behind an operation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDescription {
    pub operation_type: OperationType,
    /// The account issuing the block.
    pub account: AccountIdentifier,
    pub from_account: Option<AccountIdentifier>,
    pub to_account: AccountIdentifier,
    /// Always a non-negative magnitude.
    pub amount: Amount,
    pub fee: Option<Amount>,
    pub send_block_hash: Option<Hash>,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("missing operations")]
    Empty,

    #[error("incorrect number of operations: expected {expected}, got {actual}")]
    OperationCount { expected: &'static str, actual: usize },

    #[error("operation {index}: type {actual} is not one of {expected}")]
    OperationType {
        index: i64,
        expected: String,
        actual: OperationType,
    },

    #[error("operation {index}: missing account")]
    MissingAccount { index: i64 },

    #[error("operation {index}: {address} is not a valid address")]
    InvalidAddress { index: i64, address: String },

    #[error("operation {index}: missing amount")]
    MissingAmount { index: i64 },

    #[error("operation {index}: amount must not exist")]
    UnexpectedAmount { index: i64 },

    #[error("operation {index}: {value} is not a valid amount")]
    InvalidAmount { index: i64, value: String },

    #[error("operation {index}: amount {value} must be {expected}")]
    AmountSign {
        index: i64,
        value: String,
        expected: &'static str,
    },

    #[error("operation {index}: placeholder leg must carry a zero amount, got {value}")]
    NonZeroPlaceholder { index: i64, value: String },

    #[error("operation {index}: invalid currency: {reason}")]
    InvalidCurrency { index: i64, reason: String },

    #[error("operations carry different tokens: {0} and {1}")]
    CurrencyMismatch(TokenTypeId, TokenTypeId),

    #[error("operation {index} must be related to operation {related}")]
    Unrelated { index: i64, related: i64 },

    #[error("operation {index}: missing metadata key {key}")]
    MissingMetadata { index: i64, key: &'static str },

    #[error("operation {index}: invalid metadata {key}: {reason}")]
    InvalidMetadata {
        index: i64,
        key: &'static str,
        reason: String,
    },

    #[error("burn must target the mint address, got {0}")]
    BurnAddress(String),

    #[error("could not match operations: {0}")]
    NoMatch(Box<MatchError>),
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Match an operation list against the known shapes.
///
/// The shapes are disjoint by operation count and leading operation type,
/// so at most one can apply; its failure is reported wrapped in
/// [`MatchError::NoMatch`].
pub fn match_transaction(operations: &[Operation]) -> Result<TransactionDescription, MatchError> {
    let attempt = match operations {
        [] => return Err(MatchError::Empty),
        [_, _] | [_, _, _] => match_pair(operations),
        [single] if CREDIT_TYPES.contains(&single.op_type) => match_response(operations),
        [single] if single.op_type == OperationType::Burn => match_burn(operations),
        [_] => match_request(operations),
        _ => Err(MatchError::OperationCount {
            expected: "1 to 3",
            actual: operations.len(),
        }),
    };
    attempt.map_err(|err| MatchError::NoMatch(Box::new(err)))
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// Debit leg, credit leg, optional FEE.
pub fn match_pair(operations: &[Operation]) -> Result<TransactionDescription, MatchError> {
    let (debit, credit, fee_op) = match operations {
        [debit, credit] => (debit, credit, None),
        [debit, credit, fee] => (debit, credit, Some(fee)),
        _ => {
            return Err(MatchError::OperationCount {
                expected: "2 or 3",
                actual: operations.len(),
            })
        }
    };

    expect_type(debit, &DEBIT_TYPES)?;
    let credit_types = [
        debit.op_type,
        OperationType::Response,
        OperationType::ResponseFail,
        OperationType::Burn,
    ];
    expect_type(credit, &credit_types)?;

    let debit_account = account_of(debit)?;
    let credit_account = account_of(credit)?;

    let (debit_sign, debit_magnitude, debit_amount) = amount_of(debit)?;
    if debit_sign == AmountSign::Positive {
        return Err(sign_error(debit, debit_amount, "zero or negative"));
    }

    if !credit.is_related_to(debit.index()) {
        return Err(MatchError::Unrelated {
            index: credit.index(),
            related: debit.index(),
        });
    }

    let fee = fee_op.map(match_fee).transpose()?;
    let data = data_of(debit)?.or(data_of(credit)?);

    if credit.op_type == OperationType::Burn {
        // Send to the mint address: the credit leg is the amount-less BURN
        // the codec emits for it, so the value comes from the debit leg.
        if credit_account.address != MINT_ADDRESS {
            return Err(MatchError::BurnAddress(credit_account.address));
        }
        if credit.amount.is_some() {
            return Err(MatchError::UnexpectedAmount {
                index: credit.index(),
            });
        }
        token_of(debit, debit_amount)?;
        return Ok(TransactionDescription {
            operation_type: debit.op_type,
            account: debit_account.clone(),
            from_account: Some(debit_account),
            to_account: credit_account,
            amount: Amount::positive(&debit_magnitude, debit_amount.currency.clone()),
            fee,
            send_block_hash: None,
            data,
        });
    }

    let (credit_sign, credit_magnitude, credit_amount) = amount_of(credit)?;
    if credit_sign == AmountSign::Negative {
        return Err(sign_error(credit, credit_amount, "zero or positive"));
    }

    let debit_token = token_of(debit, debit_amount)?;
    let credit_token = token_of(credit, credit_amount)?;
    if debit_token != credit_token {
        return Err(MatchError::CurrencyMismatch(debit_token, credit_token));
    }

    if credit_sign == AmountSign::Positive {
        // Receive pair: the send already debited the sender in an earlier
        // block, so the debit leg here is informational only.
        if debit_sign != AmountSign::Zero {
            return Err(MatchError::NonZeroPlaceholder {
                index: debit.index(),
                value: debit_amount.value.clone(),
            });
        }
        let operation_type = if CREDIT_TYPES.contains(&credit.op_type) {
            credit.op_type
        } else {
            OperationType::Response
        };
        Ok(TransactionDescription {
            operation_type,
            account: credit_account.clone(),
            from_account: Some(debit_account),
            to_account: credit_account,
            amount: Amount::positive(&credit_magnitude, credit_amount.currency.clone()),
            fee,
            send_block_hash: hash_of(credit)?,
            data,
        })
    } else {
        // Send pair. The credit leg is zero here by construction.
        Ok(TransactionDescription {
            operation_type: debit.op_type,
            account: debit_account.clone(),
            from_account: Some(debit_account),
            to_account: credit_account,
            amount: Amount::positive(&debit_magnitude, debit_amount.currency.clone()),
            fee,
            send_block_hash: None,
            data,
        })
    }
}

/// One debit leg naming its recipient in `toAddress` metadata.
pub fn match_request(operations: &[Operation]) -> Result<TransactionDescription, MatchError> {
    let op = single(operations)?;
    expect_type(op, &DEBIT_TYPES)?;
    let account = account_of(op)?;

    let (sign, magnitude, amount) = amount_of(op)?;
    if sign == AmountSign::Positive {
        return Err(sign_error(op, amount, "zero or negative"));
    }
    token_of(op, amount)?;

    let to_address = op.metadata_str(TO_ADDRESS_KEY).ok_or(MatchError::MissingMetadata {
        index: op.index(),
        key: TO_ADDRESS_KEY,
    })?;
    let to_address: Address = to_address.parse().map_err(|_| MatchError::InvalidAddress {
        index: op.index(),
        address: to_address.to_string(),
    })?;

    Ok(TransactionDescription {
        operation_type: op.op_type,
        account: account.clone(),
        from_account: Some(account),
        to_account: AccountIdentifier::new(to_address),
        amount: Amount::positive(&magnitude, amount.currency.clone()),
        fee: None,
        send_block_hash: None,
        data: data_of(op)?,
    })
}

/// One credit leg naming the acknowledged send in `sendBlockHash`
/// metadata.
pub fn match_response(operations: &[Operation]) -> Result<TransactionDescription, MatchError> {
    let op = single(operations)?;
    expect_type(op, &CREDIT_TYPES)?;
    let account = account_of(op)?;

    let (sign, magnitude, amount) = amount_of(op)?;
    if sign == AmountSign::Negative {
        return Err(sign_error(op, amount, "zero or positive"));
    }
    token_of(op, amount)?;

    let send_block_hash = hash_of(op)?.ok_or(MatchError::MissingMetadata {
        index: op.index(),
        key: SEND_BLOCK_HASH_KEY,
    })?;

    Ok(TransactionDescription {
        operation_type: op.op_type,
        account: account.clone(),
        from_account: None,
        to_account: account,
        amount: Amount::positive(&magnitude, amount.currency.clone()),
        fee: None,
        send_block_hash: Some(send_block_hash),
        data: data_of(op)?,
    })
}

/// One amount-less BURN on the mint address.
pub fn match_burn(operations: &[Operation]) -> Result<TransactionDescription, MatchError> {
    let op = single(operations)?;
    expect_type(op, &[OperationType::Burn])?;
    let account = account_of(op)?;
    if account.address != MINT_ADDRESS {
        return Err(MatchError::BurnAddress(account.address));
    }
    if op.amount.is_some() {
        return Err(MatchError::UnexpectedAmount { index: op.index() });
    }

    Ok(TransactionDescription {
        operation_type: OperationType::Burn,
        account: account.clone(),
        from_account: None,
        to_account: account,
        amount: Amount::positive(&Quantity::ZERO, Currency::vite()),
        fee: None,
        send_block_hash: None,
        data: None,
    })
}

/// A FEE leg: strictly negative amount on a valid account. Returns the
/// positive magnitude.
pub fn match_fee(op: &Operation) -> Result<Amount, MatchError> {
    expect_type(op, &[OperationType::Fee])?;
    account_of(op)?;
    let (sign, magnitude, amount) = amount_of(op)?;
    if sign != AmountSign::Negative {
        return Err(sign_error(op, amount, "negative"));
    }
    Ok(Amount::positive(&magnitude, amount.currency.clone()))
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn single(operations: &[Operation]) -> Result<&Operation, MatchError> {
    match operations {
        [op] => Ok(op),
        _ => Err(MatchError::OperationCount {
            expected: "1",
            actual: operations.len(),
        }),
    }
}

fn expect_type(op: &Operation, allowed: &[OperationType]) -> Result<(), MatchError> {
    if allowed.contains(&op.op_type) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(OperationType::as_str)
        .collect::<Vec<_>>()
        .join("|");
    Err(MatchError::OperationType {
        index: op.index(),
        expected,
        actual: op.op_type,
    })
}

fn account_of(op: &Operation) -> Result<AccountIdentifier, MatchError> {
    let account = op
        .account
        .as_ref()
        .ok_or(MatchError::MissingAccount { index: op.index() })?;
    account
        .address
        .parse::<Address>()
        .map_err(|_| MatchError::InvalidAddress {
            index: op.index(),
            address: account.address.clone(),
        })?;
    Ok(account.clone())
}

fn amount_of(op: &Operation) -> Result<(AmountSign, Quantity, &Amount), MatchError> {
    let amount = op
        .amount
        .as_ref()
        .ok_or(MatchError::MissingAmount { index: op.index() })?;
    let (sign, magnitude) = amount.parse().map_err(|_| MatchError::InvalidAmount {
        index: op.index(),
        value: amount.value.clone(),
    })?;
    Ok((sign, magnitude, amount))
}

fn token_of(op: &Operation, amount: &Amount) -> Result<TokenTypeId, MatchError> {
    amount
        .currency
        .token_id()
        .map_err(|err| MatchError::InvalidCurrency {
            index: op.index(),
            reason: err.to_string(),
        })
}

fn sign_error(op: &Operation, amount: &Amount, expected: &'static str) -> MatchError {
    MatchError::AmountSign {
        index: op.index(),
        value: amount.value.clone(),
        expected,
    }
}

fn hash_of(op: &Operation) -> Result<Option<Hash>, MatchError> {
    op.metadata_str(SEND_BLOCK_HASH_KEY)
        .map(|text| {
            text.parse().map_err(|_| MatchError::InvalidMetadata {
                index: op.index(),
                key: SEND_BLOCK_HASH_KEY,
                reason: format!("{} is not a valid hash", text),
            })
        })
        .transpose()
}

fn data_of(op: &Operation) -> Result<Option<Vec<u8>>, MatchError> {
    op.metadata_str(DATA_KEY)
        .filter(|text| !text.is_empty())
        .map(|text| {
            decode_base64(text).map_err(|err| MatchError::InvalidMetadata {
                index: op.index(),
                key: DATA_KEY,
                reason: err.to_string(),
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OperationIdentifier, OperationStatus};
    use serde_json::{json, Map, Value};

    fn addr(seed: u8) -> String {
        Address::from_public_key(&[seed; 32]).to_string()
    }

    fn op(index: i64, op_type: OperationType, account: &str, value: Option<&str>) -> Operation {
        Operation {
            operation_identifier: OperationIdentifier::new(index),
            related_operations: Vec::new(),
            op_type,
            status: None,
            account: Some(AccountIdentifier::new(account)),
            amount: value.map(|v| Amount::new(v, Currency::vite())),
            metadata: None,
        }
    }

    fn related(mut op: Operation, to: i64) -> Operation {
        op.related_operations.push(OperationIdentifier::new(to));
        op
    }

    fn with_metadata(mut op: Operation, key: &str, value: &str) -> Operation {
        let metadata = op.metadata.get_or_insert_with(Map::new);
        metadata.insert(key.to_string(), Value::String(value.to_string()));
        op
    }

    fn inner(err: MatchError) -> MatchError {
        match err {
            MatchError::NoMatch(inner) => *inner,
            other => panic!("expected NoMatch, got {other:?}"),
        }
    }

    #[test]
    fn test_request_pair_scenario() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Request, &b, Some("0")), 0),
        ];
        let desc = match_transaction(&ops).unwrap();
        assert_eq!(desc.operation_type, OperationType::Request);
        assert_eq!(desc.account.address, a);
        assert_eq!(desc.from_account.unwrap().address, a);
        assert_eq!(desc.to_account.address, b);
        assert_eq!(desc.amount.value, "100");
        assert!(desc.fee.is_none());
    }

    #[test]
    fn test_pair_with_fee() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Response, &b, Some("0")), 0),
            related(op(2, OperationType::Fee, &a, Some("-3")), 0),
        ];
        let desc = match_transaction(&ops).unwrap();
        assert_eq!(desc.fee.unwrap().value, "3");
    }

    #[test]
    fn test_fee_must_be_negative() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Response, &b, Some("0")), 0),
            op(2, OperationType::Fee, &a, Some("0")),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::AmountSign { index: 2, .. }
        ));
    }

    #[test]
    fn test_receive_pair() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("0")),
            related(op(1, OperationType::Response, &b, Some("100")), 0),
        ];
        let desc = match_transaction(&ops).unwrap();
        assert_eq!(desc.operation_type, OperationType::Response);
        assert_eq!(desc.account.address, b);
        assert_eq!(desc.from_account.unwrap().address, a);
        assert_eq!(desc.to_account.address, b);
        assert_eq!(desc.amount.value, "100");
        assert!(desc.send_block_hash.is_none());
    }

    #[test]
    fn test_receive_pair_requires_zero_debit() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Response, &b, Some("100")), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::NonZeroPlaceholder { index: 0, .. }
        ));
    }

    #[test]
    fn test_pair_rejects_positive_debit() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("100")),
            related(op(1, OperationType::Response, &b, Some("0")), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::AmountSign { index: 0, .. }
        ));
    }

    #[test]
    fn test_pair_requires_relation() {
        let (a, b) = (addr(1), addr(2));
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-1")),
            op(1, OperationType::Response, &b, Some("0")),
        ];
        assert_eq!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::Unrelated {
                index: 1,
                related: 0
            }
        );
    }

    #[test]
    fn test_pair_rejects_invalid_address() {
        let ops = vec![
            op(0, OperationType::Request, &addr(1), Some("-1")),
            related(op(1, OperationType::Response, "vite_bogus", Some("0")), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::InvalidAddress { index: 1, .. }
        ));
    }

    #[test]
    fn test_pair_rejects_type_mismatch() {
        let ops = vec![
            op(0, OperationType::Mint, &addr(1), Some("-1")),
            related(op(1, OperationType::Response, &addr(2), Some("0")), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::OperationType { index: 0, .. }
        ));

        let ops = vec![
            op(0, OperationType::Request, &addr(1), Some("-1")),
            related(op(1, OperationType::Refund, &addr(2), Some("0")), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::OperationType { index: 1, .. }
        ));
    }

    #[test]
    fn test_pair_rejects_currency_mismatch() {
        let mut credit = related(op(1, OperationType::Response, &addr(2), Some("0")), 0);
        let other: TokenTypeId = TokenTypeId::from_bytes(&[1u8; 10]).unwrap();
        credit.amount = Some(Amount::new("0", Currency::for_token("ABC", 2, &other)));
        let ops = vec![op(0, OperationType::Request, &addr(1), Some("-1")), credit];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::CurrencyMismatch(..)
        ));
    }

    #[test]
    fn test_single_request() {
        let request = with_metadata(
            op(0, OperationType::Request, &addr(1), Some("-5")),
            TO_ADDRESS_KEY,
            &addr(2),
        );
        let request = with_metadata(request, DATA_KEY, "AQID");
        let desc = match_transaction(&[request]).unwrap();
        assert_eq!(desc.to_account.address, addr(2));
        assert_eq!(desc.amount.value, "5");
        assert_eq!(desc.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_single_request_requires_recipient() {
        let request = op(0, OperationType::Request, &addr(1), Some("-5"));
        assert_eq!(
            inner(match_transaction(&[request]).unwrap_err()),
            MatchError::MissingMetadata {
                index: 0,
                key: TO_ADDRESS_KEY
            }
        );
    }

    #[test]
    fn test_single_response() {
        let hash = "ab".repeat(32);
        let response = with_metadata(
            op(0, OperationType::Response, &addr(2), Some("5")),
            SEND_BLOCK_HASH_KEY,
            &hash,
        );
        let desc = match_transaction(&[response]).unwrap();
        assert_eq!(desc.operation_type, OperationType::Response);
        assert!(desc.from_account.is_none());
        assert_eq!(desc.send_block_hash.unwrap().to_string(), hash);
    }

    #[test]
    fn test_single_response_rejects_bad_hash() {
        let response = with_metadata(
            op(0, OperationType::Response, &addr(2), Some("5")),
            SEND_BLOCK_HASH_KEY,
            "nothex",
        );
        assert!(matches!(
            inner(match_transaction(&[response]).unwrap_err()),
            MatchError::InvalidMetadata { .. }
        ));
    }

    #[test]
    fn test_burn() {
        let burn = op(0, OperationType::Burn, MINT_ADDRESS, None);
        let desc = match_transaction(&[burn]).unwrap();
        assert_eq!(desc.operation_type, OperationType::Burn);
        assert_eq!(desc.to_account.address, MINT_ADDRESS);
    }

    #[test]
    fn test_send_to_mint_address_pair() {
        let a = addr(1);
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Burn, MINT_ADDRESS, None), 0),
            related(op(2, OperationType::Fee, &a, Some("-1")), 0),
        ];
        let desc = match_transaction(&ops).unwrap();
        assert_eq!(desc.operation_type, OperationType::Request);
        assert_eq!(desc.account.address, a);
        assert_eq!(desc.to_account.address, MINT_ADDRESS);
        assert_eq!(desc.amount.value, "100");
        assert_eq!(desc.fee.unwrap().value, "1");
    }

    #[test]
    fn test_burn_leg_rules_in_pair() {
        let a = addr(1);
        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Burn, MINT_ADDRESS, Some("0")), 0),
        ];
        assert_eq!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::UnexpectedAmount { index: 1 }
        );

        let ops = vec![
            op(0, OperationType::Request, &a, Some("-100")),
            related(op(1, OperationType::Burn, &addr(2), None), 0),
        ];
        assert!(matches!(
            inner(match_transaction(&ops).unwrap_err()),
            MatchError::BurnAddress(_)
        ));
    }

    #[test]
    fn test_burn_with_amount_fails() {
        let burn = op(0, OperationType::Burn, MINT_ADDRESS, Some("10"));
        assert_eq!(
            inner(match_transaction(&[burn]).unwrap_err()),
            MatchError::UnexpectedAmount { index: 0 }
        );
    }

    #[test]
    fn test_burn_on_other_address_fails() {
        let burn = op(0, OperationType::Burn, &addr(1), None);
        assert!(matches!(
            inner(match_transaction(&[burn]).unwrap_err()),
            MatchError::BurnAddress(_)
        ));
    }

    #[test]
    fn test_empty_and_oversized_lists() {
        assert_eq!(match_transaction(&[]).unwrap_err(), MatchError::Empty);
        let many: Vec<_> = (0..4)
            .map(|i| op(i, OperationType::Request, &addr(1), Some("-1")))
            .collect();
        let err = match_transaction(&many).unwrap_err();
        assert!(err.to_string().starts_with("could not match operations"));
    }

    #[test]
    fn test_statuses_are_ignored() {
        let (a, b) = (addr(1), addr(2));
        let mut debit = op(0, OperationType::Request, &a, Some("-1"));
        debit.status = Some(OperationStatus::Success);
        let ops = vec![debit, related(op(1, OperationType::Response, &b, Some("0")), 0)];
        assert!(match_transaction(&ops).is_ok());
    }

    #[test]
    fn test_description_serializes() {
        let ops = vec![
            op(0, OperationType::Request, &addr(1), Some("-1")),
            related(op(1, OperationType::Response, &addr(2), Some("0")), 0),
        ];
        let json = serde_json::to_value(match_transaction(&ops).unwrap()).unwrap();
        assert_eq!(json["operation_type"], json!("REQUEST"));
    }
}
