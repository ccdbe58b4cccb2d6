//! `/network/list`, `/network/options` and `/network/status`.

use std::sync::Arc;

use super::{check_network, node_error, require_online};
use crate::client::NodeClient;
use crate::config::{
    Configuration, HISTORICAL_BALANCE_SUPPORTED, MIDDLEWARE_VERSION, MIN_UNIX_EPOCH_MS,
    NODE_VERSION, ROSETTA_VERSION,
};
use crate::error::{ApiError, ErrorKind};
use crate::model::api::{
    Allow, MetadataRequest, NetworkListResponse, NetworkOptionsResponse, NetworkRequest,
    NetworkStatusResponse, Version,
};
use crate::model::{OperationStatus, OperationStatusInfo, OperationType};

pub struct NetworkService {
    config: Arc<Configuration>,
    client: Arc<dyn NodeClient>,
}

impl NetworkService {
    pub fn new(config: Arc<Configuration>, client: Arc<dyn NodeClient>) -> Self {
        Self { config, client }
    }

    /// The single network this server is configured for.
    pub fn list(&self, _request: &MetadataRequest) -> NetworkListResponse {
        NetworkListResponse {
            network_identifiers: vec![self.config.network_identifier()],
        }
    }

    pub fn options(&self, request: &NetworkRequest) -> Result<NetworkOptionsResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        Ok(NetworkOptionsResponse {
            version: Version {
                rosetta_version: ROSETTA_VERSION.to_string(),
                node_version: NODE_VERSION.to_string(),
                middleware_version: MIDDLEWARE_VERSION.to_string(),
            },
            allow: Allow {
                operation_statuses: OperationStatus::ALL
                    .into_iter()
                    .map(OperationStatusInfo::from)
                    .collect(),
                operation_types: OperationType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
                errors: ApiError::catalog(),
                historical_balance_lookup: HISTORICAL_BALANCE_SUPPORTED,
                call_methods: Vec::new(),
                balance_exemptions: Vec::new(),
                mempool_coins: false,
            },
        })
    }

    pub async fn status(&self, request: &NetworkRequest) -> Result<NetworkStatusResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;

        let status = self.client.status().await.map_err(node_error)?;
        // A head this old means the node has not synced past genesis yet.
        if status.current_block_timestamp < MIN_UNIX_EPOCH_MS {
            return Err(ApiError::wrap(
                ErrorKind::NodeNotReady,
                format!(
                    "current block timestamp {} is before {}",
                    status.current_block_timestamp, MIN_UNIX_EPOCH_MS
                ),
            ));
        }

        Ok(NetworkStatusResponse {
            current_block_identifier: status.current_block_identifier,
            current_block_timestamp: status.current_block_timestamp,
            genesis_block_identifier: self.client.genesis_block_identifier(),
            sync_status: status.sync_status,
            peers: status.peers,
        })
    }
}
