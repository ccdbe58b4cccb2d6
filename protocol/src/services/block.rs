//! `/block` and `/block/transaction`.
//!
//! A Rosetta block is one snapshot block; its transactions are the account
//! blocks that snapshot confirmed.

use std::sync::Arc;

use super::{check_network, node_error, require_online};
use crate::client::NodeClient;
use crate::config::Configuration;
use crate::error::ApiError;
use crate::model::api::{
    BlockRequest, BlockResponse, BlockTransactionRequest, BlockTransactionResponse,
};

pub struct BlockService {
    config: Arc<Configuration>,
    client: Arc<dyn NodeClient>,
}

impl BlockService {
    pub fn new(config: Arc<Configuration>, client: Arc<dyn NodeClient>) -> Self {
        Self { config, client }
    }

    /// An empty identifier selects the latest snapshot block.
    pub async fn block(&self, request: &BlockRequest) -> Result<BlockResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;

        let id = &request.block_identifier;
        let selector = (id.index.is_some() || id.hash.is_some()).then_some(id);
        let (block, other_transactions) = self.client.block(selector).await.map_err(node_error)?;
        Ok(BlockResponse {
            block,
            other_transactions,
        })
    }

    pub async fn block_transaction(
        &self,
        request: &BlockTransactionRequest,
    ) -> Result<BlockTransactionResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;

        let transaction = self
            .client
            .block_transaction(&request.transaction_identifier)
            .await
            .map_err(node_error)?;
        Ok(BlockTransactionResponse { transaction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryNode;
    use crate::config::{Mode, Network};
    use crate::error::ErrorKind;
    use crate::ledger::{AccountBlock, Address, BlockType, Hash, Quantity};
    use crate::model::{Block, BlockIdentifier, PartialBlockIdentifier, TransactionIdentifier};

    fn service(mode: Mode) -> (BlockService, Arc<InMemoryNode>) {
        let node = Arc::new(InMemoryNode::new());
        let config = Arc::new(Configuration::new(mode, Network::Mainnet));
        (BlockService::new(config, node.clone()), node)
    }

    fn snapshot(index: i64) -> Block {
        Block {
            block_identifier: BlockIdentifier {
                index,
                hash: format!("{:064x}", index),
            },
            parent_block_identifier: BlockIdentifier {
                index: index - 1,
                hash: format!("{:064x}", index - 1),
            },
            timestamp: 1_600_000_000_000 + index,
            transactions: Vec::new(),
            metadata: None,
        }
    }

    fn block_request(index: Option<i64>) -> BlockRequest {
        BlockRequest {
            network_identifier: Network::Mainnet.network_identifier(),
            block_identifier: PartialBlockIdentifier { index, hash: None },
        }
    }

    #[tokio::test]
    async fn test_block_by_index_and_latest() {
        let (svc, node) = service(Mode::Online);
        node.add_block(snapshot(2), Vec::new());
        node.add_block(snapshot(3), vec![TransactionIdentifier::new("aa")]);

        let by_index = svc.block(&block_request(Some(2))).await.unwrap();
        assert_eq!(by_index.block.block_identifier.index, 2);
        assert!(by_index.other_transactions.is_empty());

        let latest = svc.block(&block_request(None)).await.unwrap();
        assert_eq!(latest.block.block_identifier.index, 3);
        assert_eq!(latest.other_transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_block_is_node_error() {
        let (svc, _) = service(Mode::Online);
        let err = svc.block(&block_request(Some(9))).await.unwrap_err();
        assert!(err.is(ErrorKind::Node));
    }

    #[tokio::test]
    async fn test_block_transaction() {
        let (svc, node) = service(Mode::Online);
        let sender = Address::from_public_key(&[1; 32]);
        let mut send = AccountBlock::unsigned(BlockType::SendCall, 1, Hash::ZERO, sender);
        send.to_address = Address::from_public_key(&[2; 32]);
        send.amount = Some(Quantity::from(10u64));
        send.hash = Hash::new([3; 32]);
        node.add_account_block(send.clone());

        let response = svc
            .block_transaction(&BlockTransactionRequest {
                network_identifier: Network::Mainnet.network_identifier(),
                block_identifier: snapshot(2).block_identifier,
                transaction_identifier: TransactionIdentifier::new(send.hash),
            })
            .await
            .unwrap();
        assert_eq!(
            response.transaction.transaction_identifier.hash,
            send.hash.to_string()
        );
        assert_eq!(response.transaction.operations.len(), 2);
    }

    #[tokio::test]
    async fn test_offline_block_calls() {
        let (svc, node) = service(Mode::Offline);
        let err = svc.block(&block_request(Some(1))).await.unwrap_err();
        assert!(err.is(ErrorKind::UnavailableOffline));
        assert_eq!(node.call_count(), 0);
    }
}
