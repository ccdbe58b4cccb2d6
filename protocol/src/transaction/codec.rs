//! # Block ↔ Operation Codec
//!
//! Projects native account blocks onto Rosetta operations and back at the
//! type level.
//!
//! A send block becomes a debit leg on the sender, a zero-valued credit leg
//! on the recipient (status INTENT: the credit only lands once a receive
//! acknowledges it, in a different block) and, if the block paid one, a
//! FEE leg:
//!
//! ```text
//! 0: <type of block>  sender     -amount   SUCCESS
//! 1: RESPONSE | BURN  recipient   0        INTENT    related [0]
//! 2: FEE              sender     -fee      SUCCESS   related [0], only when fee > 0
//! ```
//!
//! A receive block becomes the credit on its own account, followed by the
//! debit legs of every send block the contract execution spawned, expanded
//! depth-first.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{MAX_SEND_LIST_DEPTH, MINT_ADDRESS};
use crate::ledger::encoding::encode_base64;
use crate::ledger::{AccountBlock, Address, BlockDirection, BlockType, Hash};
use crate::model::{
    AccountIdentifier, Amount, Currency, Direction, Operation, OperationIdentifier,
    OperationStatus, OperationType, RelatedTransaction, Transaction, TransactionIdentifier,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("op {0} does not map to a block type")]
    NoBlockType(OperationType),

    #[error("incorrect account block type: nested block {0} is not a send block")]
    NestedReceive(Hash),
}

// ---------------------------------------------------------------------------
// Type mapping
// ---------------------------------------------------------------------------

/// Block type an operation type constructs. FEE and BURN have none.
pub fn operation_type_to_block_type(op_type: OperationType) -> Result<BlockType, CodecError> {
    match op_type {
        OperationType::CreateContract => Ok(BlockType::SendCreate),
        OperationType::Request => Ok(BlockType::SendCall),
        OperationType::Mint => Ok(BlockType::SendReward),
        OperationType::Response => Ok(BlockType::Receive),
        OperationType::ResponseFail => Ok(BlockType::ReceiveError),
        OperationType::Refund => Ok(BlockType::SendRefund),
        OperationType::Genesis => Ok(BlockType::GenesisReceive),
        OperationType::Fee | OperationType::Burn => Err(CodecError::NoBlockType(op_type)),
    }
}

pub fn block_type_to_operation_type(block_type: BlockType) -> OperationType {
    match block_type {
        BlockType::SendCreate => OperationType::CreateContract,
        BlockType::SendCall => OperationType::Request,
        BlockType::SendReward => OperationType::Mint,
        BlockType::Receive => OperationType::Response,
        BlockType::ReceiveError => OperationType::ResponseFail,
        BlockType::SendRefund => OperationType::Refund,
        BlockType::GenesisReceive => OperationType::Genesis,
    }
}

/// True for operation types that construct a send block.
pub fn is_send_operation(op_type: OperationType) -> bool {
    operation_type_to_block_type(op_type).is_ok_and(|t| t.is_send())
}

/// True for operation types that construct a receive block.
pub fn is_receive_operation(op_type: OperationType) -> bool {
    operation_type_to_block_type(op_type).is_ok_and(|t| t.is_receive())
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Currency of a block. Tokens the node has no info for are reported under
/// their tti with zero decimals.
pub fn currency_for_block(block: &AccountBlock) -> Currency {
    let token_id = block.token();
    match &block.token_info {
        Some(info) => Currency::for_token(info.token_symbol.clone(), info.decimals, &token_id),
        None => Currency::for_token(token_id.to_string(), 0, &token_id),
    }
}

fn amount_for_block(block: &AccountBlock, negate: bool) -> Amount {
    let value = block.amount.unwrap_or_default();
    let currency = currency_for_block(block);
    if negate {
        Amount::negative(&value, currency)
    } else {
        Amount::positive(&value, currency)
    }
}

fn fee_amount_for_block(block: &AccountBlock) -> Option<Amount> {
    block
        .fee
        .filter(|fee| !fee.is_zero())
        .map(|fee| Amount::negative(&fee, currency_for_block(block)))
}

fn status(status: OperationStatus, include_status: bool) -> Option<OperationStatus> {
    include_status.then_some(status)
}

fn is_burn_target(address: &Address) -> bool {
    address.to_string() == MINT_ADDRESS
}

// ---------------------------------------------------------------------------
// Operation legs
// ---------------------------------------------------------------------------

fn from_operation(block: &AccountBlock, index: i64, include_status: bool) -> Operation {
    let op_type = block_type_to_operation_type(block.block_type);
    let amount = (op_type != OperationType::Mint).then(|| amount_for_block(block, true));
    Operation {
        operation_identifier: OperationIdentifier::new(index),
        related_operations: Vec::new(),
        op_type,
        status: status(OperationStatus::Success, include_status),
        account: Some(AccountIdentifier::new(block.address)),
        amount,
        metadata: None,
    }
}

fn to_operation(block: &AccountBlock, index: i64, include_status: bool) -> Operation {
    let (account, leg_status) = match block.block_type.direction() {
        BlockDirection::Send => (block.to_address, OperationStatus::Intent),
        BlockDirection::Receive if block.block_type == BlockType::ReceiveError => {
            (block.address, OperationStatus::Reverted)
        }
        BlockDirection::Receive => (block.address, OperationStatus::Success),
    };

    let (op_type, amount) = if is_burn_target(&account) {
        (OperationType::Burn, None)
    } else if block.is_send() {
        let placeholder = Amount::new("0", currency_for_block(block));
        (OperationType::Response, Some(placeholder))
    } else {
        (OperationType::Response, Some(amount_for_block(block, false)))
    };

    Operation {
        operation_identifier: OperationIdentifier::new(index),
        related_operations: Vec::new(),
        op_type,
        status: status(leg_status, include_status),
        account: Some(AccountIdentifier::new(account)),
        amount,
        metadata: None,
    }
}

fn fee_operation(block: &AccountBlock, index: i64, include_status: bool) -> Option<Operation> {
    fee_amount_for_block(block).map(|amount| Operation {
        operation_identifier: OperationIdentifier::new(index),
        related_operations: Vec::new(),
        op_type: OperationType::Fee,
        status: status(OperationStatus::Success, include_status),
        account: Some(AccountIdentifier::new(block.address)),
        amount: Some(amount),
        metadata: None,
    })
}

fn operations_for_send_block(block: &AccountBlock, include_status: bool) -> Vec<Operation> {
    let mut ops = vec![from_operation(block, 0, include_status)];

    let mut to_op = to_operation(block, 1, include_status);
    to_op.related_operations = vec![OperationIdentifier::new(0)];
    ops.push(to_op);

    if let Some(mut fee_op) = fee_operation(block, 2, include_status) {
        fee_op.related_operations = vec![OperationIdentifier::new(0)];
        ops.push(fee_op);
    }
    ops
}

fn operations_for_receive_block(
    block: &AccountBlock,
    include_status: bool,
) -> Result<Vec<Operation>, CodecError> {
    let mut ops = vec![to_operation(block, 0, include_status)];

    // Depth-first, pre-order; the stack is filled in reverse so siblings
    // come out in list order.
    let mut pending: Vec<(&AccountBlock, usize)> =
        block.send_block_list.iter().rev().map(|b| (b, 1)).collect();

    while let Some((nested, depth)) = pending.pop() {
        if !nested.is_send() {
            return Err(CodecError::NestedReceive(nested.hash));
        }

        let mut op = from_operation(nested, ops.len() as i64, include_status);
        op.related_operations = vec![OperationIdentifier::new(0)];
        if nested.block_type == BlockType::SendReward {
            op.amount = Some(Amount::new("0", currency_for_block(nested)));
        }

        if !nested.send_block_list.is_empty() {
            if depth >= MAX_SEND_LIST_DEPTH {
                op.status = status(OperationStatus::ExceedMaxDepth, include_status);
            } else {
                pending.extend(nested.send_block_list.iter().rev().map(|b| (b, depth + 1)));
            }
        }

        ops.push(op);
    }

    Ok(ops)
}

/// Operations describing a block.
///
/// With `include_status` false (construction parse) every status is left
/// empty; with it true (data API) each leg reports how it settled.
pub fn operations_for_block(
    block: &AccountBlock,
    include_status: bool,
) -> Result<Vec<Operation>, CodecError> {
    match block.block_type.direction() {
        BlockDirection::Send => Ok(operations_for_send_block(block, include_status)),
        BlockDirection::Receive => operations_for_receive_block(block, include_status),
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Links to the other half of each transfer this block takes part in.
pub fn related_transactions_for_block(block: &AccountBlock) -> Vec<RelatedTransaction> {
    match block.block_type.direction() {
        BlockDirection::Send => block
            .receive_block_hash
            .filter(|hash| !hash.is_zero())
            .map(|hash| RelatedTransaction::new(hash, Direction::Forward))
            .into_iter()
            .collect(),
        BlockDirection::Receive => {
            let mut related = Vec::with_capacity(1 + block.send_block_list.len());
            if !block.send_block_hash.is_zero() {
                related.push(RelatedTransaction::new(
                    block.send_block_hash,
                    Direction::Backward,
                ));
            }
            related.extend(
                block
                    .send_block_list
                    .iter()
                    .map(|nested| RelatedTransaction::new(nested.hash, Direction::Forward)),
            );
            related
        }
    }
}

fn transaction_metadata(block: &AccountBlock) -> Map<String, Value> {
    let mut metadata = Map::new();
    let mut put = |key: &str, value: Value| {
        metadata.insert(key.to_string(), value);
    };

    put("blockType", Value::from(block.block_type.as_byte()));
    put("height", Value::String(block.height.to_string()));
    put("previousHash", Value::String(block.previous_hash.to_string()));
    put("publicKey", Value::String(hex::encode(&block.public_key)));
    if let Some(producer) = &block.producer {
        put("producer", Value::String(producer.to_string()));
    }
    put("fromAddress", Value::String(block.from_address.to_string()));
    put("toAddress", Value::String(block.to_address.to_string()));
    if block.is_receive() {
        put("sendBlockHash", Value::String(block.send_block_hash.to_string()));
    }
    if let Some(vm_log_hash) = &block.vm_log_hash {
        put("vmLogHash", Value::String(vm_log_hash.to_string()));
    }
    put("fee", Value::String(block.fee.unwrap_or_default().to_string()));
    if let Some(data) = &block.data {
        put("data", Value::String(encode_base64(data)));
    }
    if let Some(difficulty) = &block.difficulty {
        put("difficulty", Value::String(difficulty.to_string()));
    }
    if let Some(nonce) = &block.nonce {
        put("nonce", Value::String(encode_base64(nonce)));
    }
    if let Some(signature) = &block.signature {
        put("signature", Value::String(encode_base64(signature)));
    }
    if let Some(quota_used) = &block.quota_used {
        put("quotaUsed", Value::String(quota_used.clone()));
    }
    if let Some(hash) = &block.first_snapshot_hash {
        put("firstSnapshotHash", Value::String(hash.to_string()));
    }
    if let Some(height) = &block.first_snapshot_height {
        put("firstSnapshotHeight", Value::String(height.clone()));
    }
    put("timestamp", Value::from(block.timestamp.saturating_mul(1000)));
    metadata
}

/// A block as a Rosetta transaction, with statuses.
pub fn block_to_transaction(block: &AccountBlock) -> Result<Transaction, CodecError> {
    Ok(Transaction {
        transaction_identifier: TransactionIdentifier::new(block.hash),
        operations: operations_for_block(block, true)?,
        related_transactions: related_transactions_for_block(block),
        metadata: Some(transaction_metadata(block)),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VITE_TOKEN_ID;
    use crate::ledger::{Quantity, TokenInfo};
    use crate::model::AmountSign;

    fn addr(seed: u8) -> Address {
        Address::from_public_key(&[seed; 32])
    }

    fn vite_info() -> TokenInfo {
        TokenInfo {
            token_symbol: "VITE".to_string(),
            decimals: 18,
            token_id: VITE_TOKEN_ID.parse().unwrap(),
        }
    }

    fn send(block_type: BlockType, from: Address, to: Address, amount: u64) -> AccountBlock {
        let mut block = AccountBlock::unsigned(block_type, 2, Hash::new([1; 32]), from);
        block.from_address = from;
        block.to_address = to;
        block.token_id = VITE_TOKEN_ID.parse().unwrap();
        block.token_info = Some(vite_info());
        block.amount = Some(Quantity::from(amount));
        block.hash = block.compute_hash();
        block
    }

    fn receive(block_type: BlockType, on: Address, amount: u64) -> AccountBlock {
        let mut block = AccountBlock::unsigned(block_type, 5, Hash::new([2; 32]), on);
        block.to_address = on;
        block.send_block_hash = Hash::new([3; 32]);
        block.token_id = VITE_TOKEN_ID.parse().unwrap();
        block.token_info = Some(vite_info());
        block.amount = Some(Quantity::from(amount));
        block
    }

    fn contract() -> Address {
        let mut bytes = *addr(9).as_bytes();
        bytes[20] = 1;
        Address::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_operation_block_type_mapping() {
        for op_type in OperationType::ALL {
            match operation_type_to_block_type(op_type) {
                Ok(block_type) => assert_eq!(block_type_to_operation_type(block_type), op_type),
                Err(err) => {
                    assert!(matches!(op_type, OperationType::Fee | OperationType::Burn));
                    assert_eq!(
                        err.to_string(),
                        format!("op {} does not map to a block type", op_type)
                    );
                }
            }
        }
    }

    #[test]
    fn test_send_receive_classification() {
        assert!(is_send_operation(OperationType::Request));
        assert!(is_send_operation(OperationType::Refund));
        assert!(is_receive_operation(OperationType::ResponseFail));
        assert!(!is_send_operation(OperationType::Fee));
        assert!(!is_receive_operation(OperationType::Burn));
    }

    #[test]
    fn test_send_block_operations() {
        let block = send(BlockType::SendCall, addr(1), addr(2), 100);
        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops.len(), 2);

        assert_eq!(ops[0].op_type, OperationType::Request);
        assert_eq!(ops[0].status, Some(OperationStatus::Success));
        assert_eq!(ops[0].account.as_ref().unwrap().address, addr(1).to_string());
        assert_eq!(ops[0].amount.as_ref().unwrap().value, "-100");

        assert_eq!(ops[1].op_type, OperationType::Response);
        assert_eq!(ops[1].status, Some(OperationStatus::Intent));
        assert_eq!(ops[1].account.as_ref().unwrap().address, addr(2).to_string());
        assert_eq!(ops[1].amount.as_ref().unwrap().value, "0");
        assert!(ops[1].is_related_to(0));
    }

    #[test]
    fn test_fee_leg_only_when_nonzero() {
        let mut block = send(BlockType::SendCall, addr(1), addr(2), 100);
        block.fee = Some(Quantity::ZERO);
        assert_eq!(operations_for_block(&block, false).unwrap().len(), 2);

        block.fee = Some(Quantity::from(7u64));
        let ops = operations_for_block(&block, false).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[2].op_type, OperationType::Fee);
        assert_eq!(ops[2].amount.as_ref().unwrap().value, "-7");
        assert_eq!(ops[2].operation_identifier.index, 2);
        assert!(ops[2].is_related_to(0));
    }

    #[test]
    fn test_statuses_omitted_without_include_status() {
        let block = send(BlockType::SendCall, addr(1), addr(2), 1);
        let ops = operations_for_block(&block, false).unwrap();
        assert!(ops.iter().all(|op| op.status.is_none()));
    }

    #[test]
    fn test_send_to_mint_is_burn() {
        let mint: Address = MINT_ADDRESS.parse().unwrap();
        let block = send(BlockType::SendCall, addr(1), mint, 50);
        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops[1].op_type, OperationType::Burn);
        assert!(ops[1].amount.is_none());
    }

    #[test]
    fn test_top_level_mint_has_no_amount() {
        let block = send(BlockType::SendReward, contract(), addr(2), 10);
        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops[0].op_type, OperationType::Mint);
        assert!(ops[0].amount.is_none());
    }

    #[test]
    fn test_receive_block_operations() {
        let block = receive(BlockType::Receive, addr(2), 100);
        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op_type, OperationType::Response);
        assert_eq!(ops[0].status, Some(OperationStatus::Success));
        assert_eq!(ops[0].account.as_ref().unwrap().address, addr(2).to_string());
        assert_eq!(ops[0].amount.as_ref().unwrap().parse().unwrap().0, AmountSign::Positive);
    }

    #[test]
    fn test_receive_error_is_reverted() {
        let block = receive(BlockType::ReceiveError, contract(), 100);
        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops[0].status, Some(OperationStatus::Reverted));
    }

    #[test]
    fn test_nested_sends_are_flattened_in_order() {
        let c = contract();
        let mut block = receive(BlockType::Receive, c, 100);
        block.send_block_list = vec![
            send(BlockType::SendCall, c, addr(3), 30),
            send(BlockType::SendReward, c, addr(4), 40),
            send(BlockType::SendRefund, c, addr(5), 50),
        ];

        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops.len(), 4);
        let indices: Vec<i64> = ops.iter().map(Operation::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        assert_eq!(ops[1].op_type, OperationType::Request);
        assert_eq!(ops[1].amount.as_ref().unwrap().value, "-30");
        assert_eq!(ops[2].op_type, OperationType::Mint);
        assert_eq!(ops[2].amount.as_ref().unwrap().value, "0");
        assert_eq!(ops[3].op_type, OperationType::Refund);
        assert!(ops[1..].iter().all(|op| op.is_related_to(0)));
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let c = contract();
        // Build a chain deeper than the cap: each nested send carries one
        // more nested send.
        let mut innermost = send(BlockType::SendCall, c, addr(3), 1);
        for _ in 0..MAX_SEND_LIST_DEPTH + 3 {
            let mut parent = send(BlockType::SendCall, c, addr(3), 1);
            parent.send_block_list = vec![innermost];
            innermost = parent;
        }
        let mut block = receive(BlockType::Receive, c, 1);
        block.send_block_list = vec![innermost];

        let ops = operations_for_block(&block, true).unwrap();
        assert_eq!(ops.len(), 1 + MAX_SEND_LIST_DEPTH);
        assert_eq!(
            ops.last().unwrap().status,
            Some(OperationStatus::ExceedMaxDepth)
        );
        assert!(ops[1..ops.len() - 1]
            .iter()
            .all(|op| op.status == Some(OperationStatus::Success)));
    }

    #[test]
    fn test_nested_receive_is_rejected() {
        let mut block = receive(BlockType::Receive, contract(), 1);
        block.send_block_list = vec![receive(BlockType::Receive, addr(1), 1)];
        assert!(matches!(
            operations_for_block(&block, false),
            Err(CodecError::NestedReceive(_))
        ));
    }

    #[test]
    fn test_related_transactions() {
        let mut sent = send(BlockType::SendCall, addr(1), addr(2), 1);
        assert!(related_transactions_for_block(&sent).is_empty());
        sent.receive_block_hash = Some(Hash::new([4; 32]));
        let related = related_transactions_for_block(&sent);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].direction, Direction::Forward);

        let mut received = receive(BlockType::Receive, contract(), 1);
        received.send_block_list = vec![send(BlockType::SendCall, contract(), addr(3), 1)];
        let related = related_transactions_for_block(&received);
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].direction, Direction::Backward);
        assert_eq!(
            related[0].transaction_identifier.hash,
            Hash::new([3; 32]).to_string()
        );
        assert_eq!(related[1].direction, Direction::Forward);
    }

    #[test]
    fn test_block_to_transaction_metadata() {
        let mut block = send(BlockType::SendCall, addr(1), addr(2), 1);
        block.timestamp = 1_600_000_000;
        block.data = Some(vec![1, 2, 3]);
        let tx = block_to_transaction(&block).unwrap();
        let metadata = tx.metadata.unwrap();
        assert_eq!(tx.transaction_identifier.hash, block.hash.to_string());
        assert_eq!(metadata["timestamp"], 1_600_000_000_000i64);
        assert_eq!(metadata["blockType"], 2);
        assert_eq!(metadata["data"], "AQID");
        assert!(metadata.get("sendBlockHash").is_none());
    }

    #[test]
    fn test_unknown_token_currency() {
        let mut block = send(BlockType::SendCall, addr(1), addr(2), 1);
        block.token_info = None;
        let currency = currency_for_block(&block);
        assert_eq!(currency.symbol, VITE_TOKEN_ID);
        assert_eq!(currency.decimals, 0);
    }
}
