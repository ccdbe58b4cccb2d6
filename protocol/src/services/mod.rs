//! # Data API Services
//!
//! Read-side endpoints: network discovery, account balances and block
//! retrieval. Each service shares the runtime [`Configuration`] and a
//! [`NodeClient`](crate::client::NodeClient) with the construction
//! pipeline.
//!
//! The request guards below are shared by every endpoint, construction
//! included.

pub mod account;
pub mod block;
pub mod network;

pub use account::AccountService;
pub use block::BlockService;
pub use network::NetworkService;

use crate::client::NodeError;
use crate::config::Configuration;
use crate::error::{ApiError, ErrorKind};
use crate::model::NetworkIdentifier;

/// Rejects requests addressed to another network.
pub fn check_network(
    config: &Configuration,
    network_identifier: &NetworkIdentifier,
) -> Result<(), ApiError> {
    let expected = config.network_identifier();
    if network_identifier != &expected {
        return Err(ApiError::wrap(
            ErrorKind::CallParametersInvalid,
            format!(
                "network {}/{} is not served here, expected {}/{}",
                network_identifier.blockchain,
                network_identifier.network,
                expected.blockchain,
                expected.network
            ),
        ));
    }
    Ok(())
}

/// Fails with `UnavailableOffline` before any node call is attempted.
pub fn require_online(config: &Configuration) -> Result<(), ApiError> {
    if config.is_online() {
        Ok(())
    } else {
        Err(ApiError::new(ErrorKind::UnavailableOffline))
    }
}

pub(crate) fn node_error(err: NodeError) -> ApiError {
    ApiError::wrap(ErrorKind::Node, err)
}
