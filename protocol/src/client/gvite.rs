//! [`NodeClient`] over gvite's JSON-RPC API.
//!
//! Rosetta blocks are snapshot blocks. A snapshot block lists, per
//! account, the newest account block it confirms; the account blocks it
//! confirmed are found by walking each account's chain backwards until a
//! block first confirmed by an earlier snapshot shows up.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::rpc::{RpcMethod, RpcTransport};
use super::{NodeClient, NodeError, NodeStatus, PowDifficultyParams};
use crate::config::{GENESIS_BLOCK_INDEX, VITE_TOKEN_ID};
use crate::ledger::encoding::{decode_base64, null_as_default, u64_string};
use crate::ledger::{AccountBlock, Address, Hash, Quantity, TokenInfo, TokenTypeId};
use crate::model::api::AccountBalanceResponse;
use crate::model::{
    Amount, Block, BlockIdentifier, Currency, PartialBlockIdentifier, Peer, SyncStatus,
    Transaction, TransactionIdentifier,
};
use crate::transaction::block_to_transaction;

/// gvite reports "sync finished" as state 2.
const SYNC_STATE_DONE: i64 = 2;

// ---------------------------------------------------------------------------
// Node-side shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotBlock {
    hash: Hash,
    #[serde(default)]
    previous_hash: Option<Hash>,
    #[serde(default)]
    prev_hash: Option<Hash>,
    #[serde(deserialize_with = "u64_string::deserialize")]
    height: u64,
    /// Seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    timestamp: i64,
    #[serde(default)]
    producer: Value,
    #[serde(default)]
    public_key: Value,
    #[serde(default)]
    signature: Value,
    #[serde(default)]
    seed: Value,
    #[serde(default)]
    next_seed_hash: Value,
    #[serde(default)]
    version: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    snapshot_data: BTreeMap<String, HashHeight>,
}

impl SnapshotBlock {
    fn identifier(&self) -> BlockIdentifier {
        BlockIdentifier {
            index: self.height as i64,
            hash: self.hash.to_string(),
        }
    }

    fn parent_hash(&self) -> Hash {
        self.previous_hash.or(self.prev_hash).unwrap_or_default()
    }

    fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("producer".into(), self.producer.clone());
        metadata.insert("publicKey".into(), self.public_key.clone());
        metadata.insert("signature".into(), self.signature.clone());
        metadata.insert("seed".into(), self.seed.clone());
        metadata.insert("nextSeedHash".into(), self.next_seed_hash.clone());
        metadata.insert("version".into(), self.version.clone());
        metadata
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HashHeight {
    hash: Hash,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeInfo {
    #[serde(default, deserialize_with = "u64_string::deserialize")]
    height: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    peers: Vec<PeerInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeerInfo {
    id: String,
    #[serde(default)]
    name: Value,
    #[serde(default)]
    height: Value,
    #[serde(default)]
    address: Value,
    #[serde(default)]
    create_at: Value,
}

impl From<PeerInfo> for Peer {
    fn from(info: PeerInfo) -> Self {
        let mut metadata = Map::new();
        metadata.insert("name".into(), info.name);
        metadata.insert("height".into(), info.height);
        metadata.insert("address".into(), info.address);
        metadata.insert("createdAt".into(), info.create_at);
        Peer {
            peer_id: info.id,
            metadata: Some(metadata),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SyncInfo {
    #[serde(default)]
    current: String,
    #[serde(default)]
    to: String,
    #[serde(default)]
    state: i64,
}

impl From<SyncInfo> for SyncStatus {
    fn from(info: SyncInfo) -> Self {
        SyncStatus {
            current_index: info.current.parse().ok(),
            target_index: info.to.parse().ok().filter(|to: &i64| *to > 0),
            stage: Some(info.state.to_string()),
            synced: Some(info.state == SYNC_STATE_DONE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    balance_info_map: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct PowDifficultyResult {
    #[serde(default)]
    difficulty: String,
}

/// `address → tti → balance`, balances as strings or numbers.
type ConfirmedBalances = BTreeMap<String, BTreeMap<String, Value>>;

// ---------------------------------------------------------------------------
// GviteClient
// ---------------------------------------------------------------------------

pub struct GviteClient {
    rpc: RpcTransport,
    inline_transactions: bool,
    genesis: BlockIdentifier,
}

impl GviteClient {
    /// Connects to `url` and caches the genesis snapshot block.
    pub async fn connect(
        url: &str,
        timeout: Duration,
        inline_transactions: bool,
    ) -> Result<Self, NodeError> {
        let rpc = RpcTransport::new(url, timeout)?;
        let genesis: SnapshotBlock = rpc
            .call(
                RpcMethod::GetSnapshotBlockByHeight,
                json!([GENESIS_BLOCK_INDEX]),
            )
            .await?;
        info!(url, genesis = %genesis.hash, "connected to gvite");

        Ok(Self {
            rpc,
            inline_transactions,
            genesis: genesis.identifier(),
        })
    }

    async fn snapshot_block(
        &self,
        id: Option<&PartialBlockIdentifier>,
    ) -> Result<SnapshotBlock, NodeError> {
        if let Some(id) = id {
            if let Some(hash) = &id.hash {
                let hash: Hash = hash.parse()?;
                return self.snapshot_block_by_hash(&hash).await;
            }
            if let Some(index) = id.index {
                return self
                    .rpc
                    .call_nullable(RpcMethod::GetSnapshotBlockByHeight, json!([index]))
                    .await?
                    .ok_or_else(|| NodeError::NotFound(format!("snapshot block {}", index)));
            }
        }

        let latest: Hash = self
            .rpc
            .call(RpcMethod::GetLatestSnapshotHash, json!([]))
            .await?;
        self.snapshot_block_by_hash(&latest).await
    }

    async fn snapshot_block_by_hash(&self, hash: &Hash) -> Result<SnapshotBlock, NodeError> {
        self.rpc
            .call_nullable(RpcMethod::GetSnapshotBlockByHash, json!([hash]))
            .await?
            .ok_or_else(|| NodeError::NotFound(format!("snapshot block {}", hash)))
    }

    async fn account_block(&self, hash: &Hash) -> Result<Option<AccountBlock>, NodeError> {
        self.rpc
            .call_nullable(RpcMethod::GetAccountBlockByHash, json!([hash]))
            .await
    }

    /// Account blocks first confirmed by `snapshot`, newest first per
    /// account.
    async fn confirmed_account_blocks(
        &self,
        snapshot: &SnapshotBlock,
    ) -> Result<Vec<AccountBlock>, NodeError> {
        let mut blocks = Vec::new();
        for (address, head) in &snapshot.snapshot_data {
            let mut hash = head.hash;
            while let Some(block) = self.account_block(&hash).await? {
                if block.first_snapshot_hash != Some(snapshot.hash) {
                    break;
                }
                hash = block.previous_hash;
                blocks.push(block);
            }
            debug!(%address, height = snapshot.height, "walked account chain");
        }
        Ok(blocks)
    }

    async fn currency(&self, token_id: &TokenTypeId) -> Result<Currency, NodeError> {
        let info: TokenInfo = self
            .rpc
            .call(RpcMethod::GetTokenInfoById, json!([token_id]))
            .await?;
        Ok(Currency::for_token(info.token_symbol, info.decimals, token_id))
    }

    async fn held_tokens(&self, address: &Address) -> Result<Vec<TokenTypeId>, NodeError> {
        let info: Option<AccountInfo> = self
            .rpc
            .call_nullable(RpcMethod::GetAccountInfoByAddress, json!([address]))
            .await?;
        let Some(info) = info else {
            return Ok(Vec::new());
        };
        info.balance_info_map
            .keys()
            .map(|tti| tti.parse().map_err(NodeError::from))
            .collect()
    }
}

fn quantity_from_value(value: &Value) -> Result<Quantity, NodeError> {
    if value.is_null() {
        return Ok(Quantity::ZERO);
    }
    serde_json::from_value(value.clone()).map_err(|e| NodeError::Decode {
        what: "balance".into(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl NodeClient for GviteClient {
    async fn status(&self) -> Result<NodeStatus, NodeError> {
        let node: NodeInfo = self.rpc.call(RpcMethod::NodeInfo, json!([])).await?;
        let head: SnapshotBlock = self
            .rpc
            .call(RpcMethod::GetSnapshotBlockByHeight, json!([node.height]))
            .await?;
        let sync: Option<SyncInfo> = self
            .rpc
            .call_nullable(RpcMethod::SyncInfo, json!([]))
            .await?;

        Ok(NodeStatus {
            current_block_identifier: head.identifier(),
            current_block_timestamp: head.timestamp * 1000,
            sync_status: sync.map(SyncStatus::from),
            peers: node.peers.into_iter().map(Peer::from).collect(),
        })
    }

    fn genesis_block_identifier(&self) -> BlockIdentifier {
        self.genesis.clone()
    }

    async fn block(
        &self,
        id: Option<&PartialBlockIdentifier>,
    ) -> Result<(Block, Vec<TransactionIdentifier>), NodeError> {
        let snapshot = self.snapshot_block(id).await?;
        let current = snapshot.identifier();

        let mut parent = current.clone();
        let mut transactions = Vec::new();
        let mut other_transactions = Vec::new();

        // The genesis snapshot confirms a very large batch of blocks; they
        // are left out.
        if snapshot.height != GENESIS_BLOCK_INDEX {
            parent = BlockIdentifier {
                index: current.index - 1,
                hash: snapshot.parent_hash().to_string(),
            };
            for account_block in self.confirmed_account_blocks(&snapshot).await? {
                if self.inline_transactions {
                    transactions.push(block_to_transaction(&account_block)?);
                } else {
                    other_transactions.push(TransactionIdentifier::new(account_block.hash));
                }
            }
        }

        let block = Block {
            block_identifier: current,
            parent_block_identifier: parent,
            timestamp: snapshot.timestamp * 1000,
            transactions,
            metadata: Some(snapshot.metadata()),
        };
        Ok((block, other_transactions))
    }

    async fn block_transaction(
        &self,
        id: &TransactionIdentifier,
    ) -> Result<Transaction, NodeError> {
        let hash: Hash = id.hash.parse()?;
        let block = self
            .account_block(&hash)
            .await?
            .ok_or_else(|| NodeError::NotFound(format!("account block {}", hash)))?;
        Ok(block_to_transaction(&block)?)
    }

    async fn balance(
        &self,
        address: &Address,
        currencies: &[Currency],
        block: Option<&PartialBlockIdentifier>,
    ) -> Result<AccountBalanceResponse, NodeError> {
        let snapshot = self.snapshot_block(block).await?;

        // Currencies without a usable tti are skipped.
        let mut token_ids: Vec<TokenTypeId> = currencies
            .iter()
            .filter_map(|currency| currency.token_id().ok())
            .collect();
        if currencies.is_empty() {
            token_ids = self.held_tokens(address).await?;
        }

        let confirmed: Option<ConfirmedBalances> = self
            .rpc
            .call_nullable(
                RpcMethod::GetConfirmedBalances,
                json!([snapshot.hash, [address], token_ids]),
            )
            .await?;

        let balances = match confirmed {
            None => {
                let mut zeros: Vec<Amount> = currencies
                    .iter()
                    .map(|currency| Amount::new("0", currency.clone()))
                    .collect();
                if zeros.is_empty() {
                    zeros.push(Amount::new("0", Currency::vite()));
                }
                zeros
            }
            Some(confirmed) => {
                let held = confirmed.get(&address.to_string());
                let mut balances = Vec::with_capacity(token_ids.len());
                for token_id in &token_ids {
                    let value = held
                        .and_then(|by_token| by_token.get(&token_id.to_string()))
                        .map(quantity_from_value)
                        .transpose()?
                        .unwrap_or_default();
                    let currency = if token_id.to_string() == VITE_TOKEN_ID {
                        Currency::vite()
                    } else {
                        self.currency(token_id).await?
                    };
                    balances.push(Amount::positive(&value, currency));
                }
                balances
            }
        };

        Ok(AccountBalanceResponse {
            block_identifier: snapshot.identifier(),
            balances,
        })
    }

    async fn latest_account_block(
        &self,
        address: &Address,
    ) -> Result<Option<AccountBlock>, NodeError> {
        self.rpc
            .call_nullable(RpcMethod::GetLatestAccountBlock, json!([address]))
            .await
    }

    async fn unreceived_blocks(
        &self,
        address: &Address,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<AccountBlock>, NodeError> {
        Ok(self
            .rpc
            .call_nullable(
                RpcMethod::GetUnreceivedBlocksByAddress,
                json!([address, page, page_size]),
            )
            .await?
            .unwrap_or_default())
    }

    async fn pow_difficulty(
        &self,
        params: &PowDifficultyParams,
    ) -> Result<Option<Quantity>, NodeError> {
        let result: PowDifficultyResult = self
            .rpc
            .call(RpcMethod::GetPoWDifficulty, json!([params]))
            .await?;
        if result.difficulty.is_empty() {
            return Ok(None);
        }
        Ok(Some(result.difficulty.parse()?))
    }

    async fn pow_nonce(&self, difficulty: &Quantity, hash: &Hash) -> Result<Vec<u8>, NodeError> {
        let nonce: String = self
            .rpc
            .call(RpcMethod::GetPoWNonce, json!([difficulty, hash]))
            .await?;
        Ok(decode_base64(&nonce)?)
    }

    async fn send_raw_transaction(&self, block: &AccountBlock) -> Result<(), NodeError> {
        self.rpc
            .call_nullable::<Value>(RpcMethod::SendRawTransaction, json!([block]))
            .await?;
        Ok(())
    }
}
