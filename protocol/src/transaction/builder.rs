//! Account block construction via the builder pattern.
//!
//! [`AccountBlockBuilder`] assembles an unsigned [`AccountBlock`] field by
//! field; [`create_account_block`] drives it from a matched
//! [`TransactionDescription`] and the chain position fetched by the
//! Metadata stage.
//!
//! The builder does not sign. That happens in [`super::signing`], so
//! construction stays testable without key material.

use thiserror::Error;

use super::codec::{is_receive_operation, operation_type_to_block_type, CodecError};
use super::matcher::TransactionDescription;
use crate::construction::ConstructionMetadata;
use crate::crypto::VitePublicKey;
use crate::ledger::{AccountBlock, Address, BlockType, Hash, Quantity, TokenInfo};
use crate::model::{AccountIdentifier, Amount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    BlockType(#[from] CodecError),

    #[error("{0} is not a valid address")]
    InvalidAddress(String),

    #[error("invalid token type id: {0}")]
    InvalidToken(String),

    #[error("{0} is not a valid amount")]
    InvalidAmount(String),

    #[error("missing SendBlockHash")]
    MissingSendBlockHash,
}

// ---------------------------------------------------------------------------
// AccountBlockBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`AccountBlock`]s.
///
/// ```rust,no_run
/// use vite_rosetta::ledger::{Address, BlockType, Hash, Quantity};
/// use vite_rosetta::transaction::AccountBlockBuilder;
///
/// let block = AccountBlockBuilder::new(BlockType::SendCall, Address::ZERO)
///     .after(3, Hash::ZERO)
///     .to_address(Address::ZERO)
///     .amount(Quantity::from(10u64))
///     .build();
/// assert_eq!(block.height, 4);
/// ```
///
/// `build()` stamps the content hash, so the result can go straight into a
/// signing payload.
pub struct AccountBlockBuilder {
    block: AccountBlock,
}

impl AccountBlockBuilder {
    /// A block of `block_type` issued by `address` as the account's first
    /// block. Call [`after`](Self::after) to place it on an existing chain.
    pub fn new(block_type: BlockType, address: Address) -> Self {
        Self {
            block: AccountBlock::unsigned(block_type, 1, Hash::ZERO, address),
        }
    }

    /// Places the block directly after the account block at `height` with
    /// hash `previous_hash`.
    pub fn after(mut self, height: u64, previous_hash: Hash) -> Self {
        self.block.height = height + 1;
        self.block.previous_hash = previous_hash;
        self
    }

    pub fn public_key(mut self, public_key: &VitePublicKey) -> Self {
        self.block.public_key = public_key.as_bytes().to_vec();
        self
    }

    pub fn from_address(mut self, address: Address) -> Self {
        self.block.from_address = address;
        self
    }

    pub fn to_address(mut self, address: Address) -> Self {
        self.block.to_address = address;
        self
    }

    /// Sets the token id and the embedded token info.
    pub fn token(mut self, info: TokenInfo) -> Self {
        self.block.token_id = info.token_id;
        self.block.token_info = Some(info);
        self
    }

    pub fn amount(mut self, amount: Quantity) -> Self {
        self.block.amount = Some(amount);
        self
    }

    pub fn fee(mut self, fee: Option<Quantity>) -> Self {
        self.block.fee = fee;
        self
    }

    pub fn send_block_hash(mut self, hash: Hash) -> Self {
        self.block.send_block_hash = hash;
        self
    }

    pub fn data(mut self, data: Option<Vec<u8>>) -> Self {
        self.block.data = data.filter(|d| !d.is_empty());
        self
    }

    /// Attaches a proof-of-work quote. Either both or neither are set.
    pub fn pow(mut self, difficulty: Option<Quantity>, nonce: Option<Vec<u8>>) -> Self {
        if let (Some(difficulty), Some(nonce)) = (difficulty, nonce) {
            self.block.difficulty = Some(difficulty);
            self.block.nonce = Some(nonce);
        }
        self
    }

    pub fn build(self) -> AccountBlock {
        let mut block = self.block;
        block.hash = block.compute_hash();
        block
    }
}

// ---------------------------------------------------------------------------
// From a description
// ---------------------------------------------------------------------------

/// Assemble the unsigned block a description asks for, positioned by the
/// metadata.
///
/// Receive blocks need the hash of the send they acknowledge, taken from
/// the description first and the metadata second.
pub fn create_account_block(
    description: &TransactionDescription,
    metadata: &ConstructionMetadata,
    public_key: &VitePublicKey,
) -> Result<AccountBlock, BuildError> {
    let block_type = operation_type_to_block_type(description.operation_type)?;
    let address = parse_address(&description.account)?;
    let to_address = parse_address(&description.to_account)?;

    let currency = &description.amount.currency;
    let token_id = currency
        .token_id()
        .map_err(|e| BuildError::InvalidToken(e.to_string()))?;
    let token = TokenInfo {
        token_symbol: currency.symbol.clone(),
        decimals: currency.decimals,
        token_id,
    };

    let mut builder = AccountBlockBuilder::new(block_type, address)
        .after(metadata.height, metadata.previous_hash)
        .public_key(public_key)
        .to_address(to_address)
        .token(token)
        .amount(parse_magnitude(&description.amount)?)
        .fee(description.fee.as_ref().map(parse_magnitude).transpose()?)
        .data(description.data.clone().or_else(|| metadata.data.clone()))
        .pow(metadata.difficulty, metadata.nonce.clone());

    if let Some(from) = &description.from_account {
        builder = builder.from_address(parse_address(from)?);
    }

    if is_receive_operation(description.operation_type) {
        let send_block_hash = description
            .send_block_hash
            .or(metadata.send_block_hash)
            .ok_or(BuildError::MissingSendBlockHash)?;
        builder = builder.send_block_hash(send_block_hash);
    }

    Ok(builder.build())
}

fn parse_address(account: &AccountIdentifier) -> Result<Address, BuildError> {
    account
        .address
        .parse()
        .map_err(|_| BuildError::InvalidAddress(account.address.clone()))
}

fn parse_magnitude(amount: &Amount) -> Result<Quantity, BuildError> {
    amount
        .parse()
        .map(|(_, magnitude)| magnitude)
        .map_err(|_| BuildError::InvalidAmount(amount.value.clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VITE_TOKEN_ID;
    use crate::crypto::ViteKeypair;
    use crate::model::{Currency, OperationType};

    fn keypair(seed: u8) -> ViteKeypair {
        ViteKeypair::from_seed(&[seed; 32])
    }

    fn send_description(from: &ViteKeypair, to: Address) -> TransactionDescription {
        let account = AccountIdentifier::new(from.address());
        TransactionDescription {
            operation_type: OperationType::Request,
            account: account.clone(),
            from_account: Some(account),
            to_account: AccountIdentifier::new(to),
            amount: Amount::new("100", Currency::vite()),
            fee: None,
            send_block_hash: None,
            data: None,
        }
    }

    fn metadata() -> ConstructionMetadata {
        ConstructionMetadata {
            height: 7,
            previous_hash: Hash::new([9; 32]),
            ..Default::default()
        }
    }

    #[test]
    fn test_send_block_fields() {
        let sender = keypair(1);
        let receiver = keypair(2).address();
        let block = create_account_block(
            &send_description(&sender, receiver),
            &metadata(),
            &sender.public_key(),
        )
        .unwrap();

        assert_eq!(block.block_type, BlockType::SendCall);
        assert_eq!(block.height, 8);
        assert_eq!(block.previous_hash, Hash::new([9; 32]));
        assert_eq!(block.address, sender.address());
        assert_eq!(block.from_address, sender.address());
        assert_eq!(block.to_address, receiver);
        assert_eq!(block.amount, Some(Quantity::from(100u64)));
        assert_eq!(block.token_id.to_string(), VITE_TOKEN_ID);
        assert_eq!(block.public_key, sender.public_key().as_bytes().to_vec());
        assert!(!block.is_signed());
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn test_fee_data_and_pow() {
        let sender = keypair(1);
        let mut description = send_description(&sender, keypair(2).address());
        description.fee = Some(Amount::new("5", Currency::vite()));
        description.data = Some(vec![0xAB]);
        let metadata = ConstructionMetadata {
            difficulty: Some(Quantity::from(1000u64)),
            nonce: Some(vec![1, 2, 3]),
            ..metadata()
        };

        let block = create_account_block(&description, &metadata, &sender.public_key()).unwrap();
        assert_eq!(block.fee, Some(Quantity::from(5u64)));
        assert_eq!(block.data, Some(vec![0xAB]));
        assert_eq!(block.difficulty, Some(Quantity::from(1000u64)));
        assert_eq!(block.nonce, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_difficulty_without_nonce_is_dropped() {
        let block = AccountBlockBuilder::new(BlockType::SendCall, Address::ZERO)
            .pow(Some(Quantity::from(1u64)), None)
            .build();
        assert!(block.difficulty.is_none());
        assert!(block.nonce.is_none());
    }

    #[test]
    fn test_receive_needs_send_block_hash() {
        let receiver = keypair(2);
        let account = AccountIdentifier::new(receiver.address());
        let mut description = TransactionDescription {
            operation_type: OperationType::Response,
            account: account.clone(),
            from_account: Some(AccountIdentifier::new(keypair(1).address())),
            to_account: account,
            amount: Amount::new("100", Currency::vite()),
            fee: None,
            send_block_hash: None,
            data: None,
        };

        let err = create_account_block(&description, &metadata(), &receiver.public_key());
        assert_eq!(err.unwrap_err(), BuildError::MissingSendBlockHash);

        let from_metadata = ConstructionMetadata {
            send_block_hash: Some(Hash::new([4; 32])),
            ..metadata()
        };
        let block =
            create_account_block(&description, &from_metadata, &receiver.public_key()).unwrap();
        assert_eq!(block.block_type, BlockType::Receive);
        assert_eq!(block.send_block_hash, Hash::new([4; 32]));

        description.send_block_hash = Some(Hash::new([5; 32]));
        let block =
            create_account_block(&description, &from_metadata, &receiver.public_key()).unwrap();
        assert_eq!(block.send_block_hash, Hash::new([5; 32]));
    }

    #[test]
    fn test_burn_has_no_block_type() {
        let sender = keypair(1);
        let mut description = send_description(&sender, Address::ZERO);
        description.operation_type = OperationType::Burn;
        let err = create_account_block(&description, &metadata(), &sender.public_key());
        assert!(matches!(err, Err(BuildError::BlockType(_))));
    }

    #[test]
    fn test_invalid_address() {
        let sender = keypair(1);
        let mut description = send_description(&sender, Address::ZERO);
        description.to_account = AccountIdentifier::new("vite_nope");
        let err = create_account_block(&description, &metadata(), &sender.public_key());
        assert_eq!(
            err.unwrap_err(),
            BuildError::InvalidAddress("vite_nope".to_string())
        );
    }

    #[test]
    fn test_deterministic_hash() {
        let sender = keypair(1);
        let description = send_description(&sender, keypair(2).address());
        let a = create_account_block(&description, &metadata(), &sender.public_key()).unwrap();
        let b = create_account_block(&description, &metadata(), &sender.public_key()).unwrap();
        assert_eq!(a.hash, b.hash);

        let later = ConstructionMetadata {
            height: 8,
            ..metadata()
        };
        let c = create_account_block(&description, &later, &sender.public_key()).unwrap();
        assert_ne!(a.hash, c.hash);
    }
}
