//! # Account Blocks
//!
//! The ledger's unit of state change. Every account has its own chain of
//! account blocks, and every transfer takes two of them: a *send* block on
//! the sender's chain that debits the sender, and a later *receive* block
//! on the recipient's chain that acknowledges the send and credits the
//! recipient. Contract receives may in turn spawn nested send blocks,
//! carried inline in `send_block_list`.
//!
//! [`AccountBlock`] mirrors the node's JSON shape field for field so it can
//! be exchanged with gvite untouched. What a block *means* is decided by
//! its [`BlockType`], and every consumer dispatches on
//! [`BlockType::direction`] rather than on raw codes.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::encoding::{base64_bytes, base64_opt, null_as_default, u64_string};
use super::{Address, Hash, LedgerError, Quantity, TokenTypeId};
use crate::crypto::blake2b_256;

/// Width of the nonce in the content hash.
const NONCE_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// BlockType
// ---------------------------------------------------------------------------

/// Account block kinds, with the node's byte codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockType {
    /// Send that deploys a contract.
    SendCreate = 1,
    /// Ordinary transfer or contract call.
    SendCall = 2,
    /// Built-in contract minting value to an account.
    SendReward = 3,
    /// Acknowledges a send and credits the receiver.
    Receive = 4,
    /// Acknowledges a send whose contract execution failed.
    ReceiveError = 5,
    /// Contract returning value after a failed call.
    SendRefund = 6,
    /// First block of a genesis account.
    GenesisReceive = 7,
}

/// Which side of a transfer a block sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockDirection {
    Send,
    Receive,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::SendCreate,
        BlockType::SendCall,
        BlockType::SendReward,
        BlockType::Receive,
        BlockType::ReceiveError,
        BlockType::SendRefund,
        BlockType::GenesisReceive,
    ];

    pub fn from_byte(code: u8) -> Result<Self, LedgerError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_byte() == code)
            .ok_or(LedgerError::UnknownBlockType(code))
    }

    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    pub fn direction(&self) -> BlockDirection {
        match self {
            Self::SendCreate | Self::SendCall | Self::SendReward | Self::SendRefund => {
                BlockDirection::Send
            }
            Self::Receive | Self::ReceiveError | Self::GenesisReceive => BlockDirection::Receive,
        }
    }

    pub fn is_send(&self) -> bool {
        self.direction() == BlockDirection::Send
    }

    pub fn is_receive(&self) -> bool {
        self.direction() == BlockDirection::Receive
    }
}

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_byte())
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        BlockType::from_byte(code).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// TokenInfo
// ---------------------------------------------------------------------------

/// Token metadata the node embeds in blocks and returns from
/// `contract_getTokenInfoById`. Fields beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token_symbol: String,
    pub decimals: i32,
    pub token_id: TokenTypeId,
}

// ---------------------------------------------------------------------------
// AccountBlock
// ---------------------------------------------------------------------------

/// An account block in the node's JSON shape.
///
/// Optional fields are skipped when absent so the inter-stage payload stays
/// small and stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBlock {
    pub block_type: BlockType,

    #[serde(with = "u64_string")]
    pub height: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub hash: Hash,

    #[serde(default, deserialize_with = "null_as_default")]
    pub previous_hash: Hash,

    pub address: Address,

    #[serde(default, with = "base64_bytes")]
    pub public_key: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<Address>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub from_address: Address,

    #[serde(default, deserialize_with = "null_as_default")]
    pub to_address: Address,

    #[serde(default, deserialize_with = "null_as_default")]
    pub send_block_hash: Hash,

    #[serde(default, deserialize_with = "null_as_default")]
    pub token_id: TokenTypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Quantity>,

    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Quantity>,

    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<Vec<u8>>,

    #[serde(default, with = "base64_opt", skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_used: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_log_hash: Option<Hash>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub send_block_list: Vec<AccountBlock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_block_hash: Option<Hash>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_snapshot_hash: Option<Hash>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_snapshot_height: Option<String>,

    /// Seconds since the Unix epoch, as gvite reports it.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

impl AccountBlock {
    /// A bare block of the given type at the given chain position. Every
    /// other field starts empty.
    pub fn unsigned(
        block_type: BlockType,
        height: u64,
        previous_hash: Hash,
        address: Address,
    ) -> Self {
        Self {
            block_type,
            height,
            hash: Hash::ZERO,
            previous_hash,
            address,
            public_key: Vec::new(),
            producer: None,
            from_address: Address::ZERO,
            to_address: Address::ZERO,
            send_block_hash: Hash::ZERO,
            token_id: TokenTypeId::ZERO,
            token_info: None,
            amount: None,
            fee: None,
            data: None,
            difficulty: None,
            nonce: None,
            signature: None,
            quota_used: None,
            vm_log_hash: None,
            send_block_list: Vec::new(),
            receive_block_hash: None,
            first_snapshot_hash: None,
            first_snapshot_height: None,
            timestamp: 0,
        }
    }

    pub fn is_send(&self) -> bool {
        self.block_type.is_send()
    }

    pub fn is_receive(&self) -> bool {
        self.block_type.is_receive()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Token of the block. `token_id` is the hashed field and wins; the
    /// embedded token info only fills in when it is unset.
    pub fn token(&self) -> TokenTypeId {
        match &self.token_info {
            Some(info) if self.token_id.is_zero() => info.token_id,
            _ => self.token_id,
        }
    }

    /// Whether the embedded token info, if any, names `token_id`.
    pub fn token_info_consistent(&self) -> bool {
        self.token_info
            .as_ref()
            .map_or(true, |info| info.token_id == self.token_id)
    }

    /// Content hash of the block.
    ///
    /// BLAKE2b-256 over the fields below, in order. Signature, public key,
    /// stored hash and all node-side annotations are excluded.
    ///
    /// ```text
    /// blockType(1) | previousHash(32) | height(8, BE) | address(21)
    /// send:    toAddress(21) | amount(32, BE) | tokenId(10)
    /// receive: sendBlockHash(32)
    /// fee(32, BE) | vmLogHash(32)? | difficulty(32, BE)? | nonce(8, left-padded)
    /// blake2b256(data)?  (only when data is non-empty)
    /// hash of each nested send block
    /// ```
    pub fn compute_hash(&self) -> Hash {
        let mut source = Vec::with_capacity(256);
        source.push(self.block_type.as_byte());
        source.extend_from_slice(self.previous_hash.as_bytes());
        source.extend_from_slice(&self.height.to_be_bytes());
        source.extend_from_slice(self.address.as_bytes());

        match self.block_type.direction() {
            BlockDirection::Send => {
                source.extend_from_slice(self.to_address.as_bytes());
                source.extend_from_slice(&self.amount.unwrap_or_default().to_be_bytes());
                source.extend_from_slice(self.token_id.as_bytes());
            }
            BlockDirection::Receive => {
                source.extend_from_slice(self.send_block_hash.as_bytes());
            }
        }

        source.extend_from_slice(&self.fee.unwrap_or_default().to_be_bytes());
        if let Some(vm_log_hash) = &self.vm_log_hash {
            source.extend_from_slice(vm_log_hash.as_bytes());
        }
        if let Some(difficulty) = &self.difficulty {
            source.extend_from_slice(&difficulty.to_be_bytes());
        }
        source.extend_from_slice(&left_pad(self.nonce.as_deref().unwrap_or_default()));
        if let Some(data) = self.data.as_deref().filter(|d| !d.is_empty()) {
            source.extend_from_slice(&blake2b_256(data));
        }
        for nested in &self.send_block_list {
            source.extend_from_slice(nested.hash.as_bytes());
        }

        Hash::new(blake2b_256(&source))
    }
}

fn left_pad(nonce: &[u8]) -> Vec<u8> {
    if nonce.len() >= NONCE_SIZE {
        return nonce.to_vec();
    }
    let mut padded = vec![0u8; NONCE_SIZE - nonce.len()];
    padded.extend_from_slice(nonce);
    padded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VITE_TOKEN_ID;

    fn send_block() -> AccountBlock {
        let mut block = AccountBlock::unsigned(
            BlockType::SendCall,
            7,
            Hash::new([1u8; 32]),
            Address::from_public_key(&[1u8; 32]),
        );
        block.to_address = Address::from_public_key(&[2u8; 32]);
        block.token_id = VITE_TOKEN_ID.parse().unwrap();
        block.amount = Some(Quantity::from(1_000u64));
        block
    }

    fn receive_block() -> AccountBlock {
        let mut block = AccountBlock::unsigned(
            BlockType::Receive,
            1,
            Hash::ZERO,
            Address::from_public_key(&[2u8; 32]),
        );
        block.send_block_hash = Hash::new([9u8; 32]);
        block
    }

    #[test]
    fn test_block_type_codes() {
        for block_type in BlockType::ALL {
            assert_eq!(BlockType::from_byte(block_type.as_byte()).unwrap(), block_type);
        }
        assert!(BlockType::from_byte(0).is_err());
        assert!(BlockType::from_byte(8).is_err());
    }

    #[test]
    fn test_direction_classification() {
        let sends: Vec<_> = BlockType::ALL.into_iter().filter(|t| t.is_send()).collect();
        assert_eq!(
            sends,
            vec![
                BlockType::SendCreate,
                BlockType::SendCall,
                BlockType::SendReward,
                BlockType::SendRefund
            ]
        );
        assert!(BlockType::GenesisReceive.is_receive());
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(send_block().compute_hash(), send_block().compute_hash());
    }

    #[test]
    fn test_hash_covers_send_fields() {
        let base = send_block().compute_hash();

        let mut changed = send_block();
        changed.amount = Some(Quantity::from(1_001u64));
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.to_address = Address::from_public_key(&[3u8; 32]);
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.height = 8;
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.fee = Some(Quantity::from(1u64));
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.data = Some(b"memo".to_vec());
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.nonce = Some(vec![1, 2, 3]);
        assert_ne!(changed.compute_hash(), base);

        let mut changed = send_block();
        changed.difficulty = Some(Quantity::from(75_164_738u64));
        assert_ne!(changed.compute_hash(), base);
    }

    #[test]
    fn test_hash_ignores_signature_material() {
        let base = send_block().compute_hash();
        let mut signed = send_block();
        signed.signature = Some(vec![0xAA; 64]);
        signed.public_key = vec![0xBB; 32];
        signed.hash = Hash::new([0xCC; 32]);
        signed.timestamp = 1_700_000_000;
        assert_eq!(signed.compute_hash(), base);
    }

    #[test]
    fn test_empty_data_hashes_like_no_data() {
        let mut with_empty = send_block();
        with_empty.data = Some(Vec::new());
        assert_eq!(with_empty.compute_hash(), send_block().compute_hash());
    }

    #[test]
    fn test_receive_hash_ignores_transfer_fields() {
        let base = receive_block().compute_hash();

        let mut changed = receive_block();
        changed.amount = Some(Quantity::from(5u64));
        changed.to_address = Address::from_public_key(&[4u8; 32]);
        assert_eq!(changed.compute_hash(), base);

        let mut changed = receive_block();
        changed.send_block_hash = Hash::new([8u8; 32]);
        assert_ne!(changed.compute_hash(), base);
    }

    #[test]
    fn test_hash_covers_nested_sends() {
        let base = receive_block().compute_hash();
        let mut nested = send_block();
        nested.hash = nested.compute_hash();
        let mut parent = receive_block();
        parent.send_block_list.push(nested);
        assert_ne!(parent.compute_hash(), base);
    }

    #[test]
    fn test_node_json_shape() {
        let json = serde_json::json!({
            "blockType": 4,
            "height": "3",
            "hash": "ab".repeat(32),
            "previousHash": "00".repeat(32),
            "address": Address::from_public_key(&[2u8; 32]).to_string(),
            "publicKey": null,
            "fromAddress": Address::from_public_key(&[1u8; 32]).to_string(),
            "toAddress": Address::from_public_key(&[2u8; 32]).to_string(),
            "sendBlockHash": "09".repeat(32),
            "tokenId": VITE_TOKEN_ID,
            "amount": "100",
            "fee": "0",
            "data": null,
            "sendBlockList": null,
            "receiveBlockHash": null,
            "timestamp": 1_600_000_000
        });
        let block: AccountBlock = serde_json::from_value(json).unwrap();
        assert_eq!(block.block_type, BlockType::Receive);
        assert_eq!(block.height, 3);
        assert!(block.send_block_list.is_empty());
        assert!(block.data.is_none());
        assert_eq!(block.amount, Some(Quantity::from(100u64)));
    }

    #[test]
    fn test_token_id_wins_over_token_info() {
        let mut block = AccountBlock::unsigned(BlockType::SendCall, 1, Hash::ZERO, Address::ZERO);
        let other = TokenTypeId::from_bytes(&[7u8; 10]).unwrap();
        block.token_info = Some(TokenInfo {
            token_symbol: "ABC".into(),
            decimals: 2,
            token_id: other,
        });
        assert_eq!(block.token(), other);
        assert!(!block.token_info_consistent());

        block.token_id = VITE_TOKEN_ID.parse().unwrap();
        assert_eq!(block.token().to_string(), VITE_TOKEN_ID);
        assert!(!block.token_info_consistent());

        block.token_info = None;
        assert!(block.token_info_consistent());
    }

    #[test]
    fn test_unknown_block_type_is_rejected() {
        let json = serde_json::json!({
            "blockType": 9,
            "height": "1",
            "address": Address::ZERO.to_string(),
        });
        assert!(serde_json::from_value::<AccountBlock>(json).is_err());
    }
}
