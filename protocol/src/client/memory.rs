//! Scripted in-process [`NodeClient`].
//!
//! Holds canned answers for every node call and records what the engine
//! asked for, so construction flows and services can be exercised without
//! a gvite process.

use std::collections::{HashMap, HashSet};
use async_trait::async_trait;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{NodeClient, NodeError, NodeStatus, PowDifficultyParams};
use crate::config::GENESIS_BLOCK_INDEX;
use crate::ledger::{AccountBlock, Address, Hash, Quantity};
use crate::model::api::AccountBalanceResponse;
use crate::model::{
    Amount, Block, BlockIdentifier, Currency, PartialBlockIdentifier, Transaction,
    TransactionIdentifier,
};
use crate::transaction::block_to_transaction;

#[derive(Default)]
struct State {
    status: Option<NodeStatus>,
    blocks: Vec<(Block, Vec<TransactionIdentifier>)>,
    account_blocks: HashMap<Hash, AccountBlock>,
    latest: HashMap<Address, AccountBlock>,
    unreceived: HashMap<Address, Vec<AccountBlock>>,
    /// Addresses whose every page returns the full unreceived list.
    endless: HashSet<Address>,
    balances: HashMap<Address, Vec<Amount>>,
    pow: Option<(Quantity, Vec<u8>)>,
    send_failure: Option<String>,

    calls: usize,
    pages: Vec<u64>,
    pow_params: Vec<PowDifficultyParams>,
    nonce_requests: Vec<(Quantity, Hash)>,
    broadcasts: Vec<AccountBlock>,
}

#[derive(Default)]
pub struct InMemoryNode {
    state: RwLock<State>,
}

impl InMemoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write()
    }

    fn touch(&self) -> RwLockWriteGuard<'_, State> {
        let mut state = self.write();
        state.calls += 1;
        state
    }

    // -- scripting ----------------------------------------------------------

    pub fn set_status(&self, status: NodeStatus) {
        self.write().status = Some(status);
    }

    pub fn add_block(&self, block: Block, other_transactions: Vec<TransactionIdentifier>) {
        self.write().blocks.push((block, other_transactions));
    }

    /// Makes `block` retrievable by hash and, if it is the highest seen for
    /// its account, the account's latest block.
    pub fn add_account_block(&self, block: AccountBlock) {
        let mut state = self.write();
        let newer = state
            .latest
            .get(&block.address)
            .map_or(true, |latest| latest.height < block.height);
        if newer {
            state.latest.insert(block.address, block.clone());
        }
        state.account_blocks.insert(block.hash, block);
    }

    /// Queues a send for `block.to_address`.
    pub fn add_unreceived(&self, block: AccountBlock) {
        let mut state = self.write();
        state.account_blocks.insert(block.hash, block.clone());
        state.unreceived.entry(block.to_address).or_default().push(block);
    }

    /// Every page requested for `address` returns its full queue.
    pub fn repeat_unreceived(&self, address: Address) {
        self.write().endless.insert(address);
    }

    pub fn set_balances(&self, address: Address, balances: Vec<Amount>) {
        self.write().balances.insert(address, balances);
    }

    pub fn set_pow(&self, difficulty: Quantity, nonce: Vec<u8>) {
        self.write().pow = Some((difficulty, nonce));
    }

    pub fn fail_sends(&self, message: impl Into<String>) {
        self.write().send_failure = Some(message.into());
    }

    // -- inspection ---------------------------------------------------------

    /// Number of node calls served so far.
    pub fn call_count(&self) -> usize {
        self.read().calls
    }

    /// Unreceived pages requested, in order.
    pub fn pages_requested(&self) -> Vec<u64> {
        self.read().pages.clone()
    }

    pub fn pow_requests(&self) -> Vec<PowDifficultyParams> {
        self.read().pow_params.clone()
    }

    pub fn nonce_requests(&self) -> Vec<(Quantity, Hash)> {
        self.read().nonce_requests.clone()
    }

    pub fn broadcasts(&self) -> Vec<AccountBlock> {
        self.read().broadcasts.clone()
    }
}

#[async_trait]
impl NodeClient for InMemoryNode {
    async fn status(&self) -> Result<NodeStatus, NodeError> {
        self.touch()
            .status
            .clone()
            .ok_or_else(|| NodeError::NotFound("node status".into()))
    }

    fn genesis_block_identifier(&self) -> BlockIdentifier {
        BlockIdentifier {
            index: GENESIS_BLOCK_INDEX as i64,
            hash: Hash::new([1; 32]).to_string(),
        }
    }

    async fn block(
        &self,
        id: Option<&PartialBlockIdentifier>,
    ) -> Result<(Block, Vec<TransactionIdentifier>), NodeError> {
        let state = self.touch();
        let found = match id {
            Some(PartialBlockIdentifier {
                hash: Some(hash), ..
            }) => state
                .blocks
                .iter()
                .find(|(b, _)| &b.block_identifier.hash == hash),
            Some(PartialBlockIdentifier {
                index: Some(index), ..
            }) => state
                .blocks
                .iter()
                .find(|(b, _)| b.block_identifier.index == *index),
            _ => state.blocks.last(),
        };
        found
            .cloned()
            .ok_or_else(|| NodeError::NotFound("snapshot block".into()))
    }

    async fn block_transaction(
        &self,
        id: &TransactionIdentifier,
    ) -> Result<Transaction, NodeError> {
        let hash: Hash = id.hash.parse()?;
        let block = self
            .touch()
            .account_blocks
            .get(&hash)
            .cloned()
            .ok_or_else(|| NodeError::NotFound(format!("account block {}", hash)))?;
        Ok(block_to_transaction(&block)?)
    }

    async fn balance(
        &self,
        address: &Address,
        currencies: &[Currency],
        _block: Option<&PartialBlockIdentifier>,
    ) -> Result<AccountBalanceResponse, NodeError> {
        let state = self.touch();
        let held = state.balances.get(address).cloned().unwrap_or_default();
        let balances = if currencies.is_empty() {
            held
        } else {
            currencies
                .iter()
                .map(|currency| {
                    held.iter()
                        .find(|amount| &amount.currency == currency)
                        .cloned()
                        .unwrap_or_else(|| Amount::new("0", currency.clone()))
                })
                .collect()
        };
        let block_identifier = state
            .status
            .as_ref()
            .map(|s| s.current_block_identifier.clone())
            .unwrap_or_else(|| self.genesis_block_identifier());
        Ok(AccountBalanceResponse {
            block_identifier,
            balances,
        })
    }

    async fn latest_account_block(
        &self,
        address: &Address,
    ) -> Result<Option<AccountBlock>, NodeError> {
        Ok(self.touch().latest.get(address).cloned())
    }

    async fn unreceived_blocks(
        &self,
        address: &Address,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<AccountBlock>, NodeError> {
        let mut state = self.touch();
        state.pages.push(page);
        let queue = state.unreceived.get(address).cloned().unwrap_or_default();
        if state.endless.contains(address) {
            return Ok(queue);
        }
        let start = (page * page_size) as usize;
        Ok(queue
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect())
    }

    async fn pow_difficulty(
        &self,
        params: &PowDifficultyParams,
    ) -> Result<Option<Quantity>, NodeError> {
        let mut state = self.touch();
        state.pow_params.push(params.clone());
        Ok(state.pow.as_ref().map(|(difficulty, _)| *difficulty))
    }

    async fn pow_nonce(&self, difficulty: &Quantity, hash: &Hash) -> Result<Vec<u8>, NodeError> {
        let mut state = self.touch();
        state.nonce_requests.push((*difficulty, *hash));
        state
            .pow
            .as_ref()
            .map(|(_, nonce)| nonce.clone())
            .ok_or_else(|| NodeError::NotFound("pow nonce".into()))
    }

    async fn send_raw_transaction(&self, block: &AccountBlock) -> Result<(), NodeError> {
        let mut state = self.touch();
        if let Some(message) = &state.send_failure {
            return Err(NodeError::Rpc {
                code: -32002,
                message: message.clone(),
            });
        }
        state.broadcasts.push(block.clone());
        Ok(())
    }
}
