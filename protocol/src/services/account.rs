//! `/account/balance` and `/account/coins`.
//!
//! Vite is account based, so coin queries are not supported.

use std::sync::Arc;

use tracing::debug;

use super::{check_network, node_error, require_online};
use crate::client::NodeClient;
use crate::config::Configuration;
use crate::error::{ApiError, ErrorKind};
use crate::ledger::Address;
use crate::model::api::{AccountBalanceRequest, AccountBalanceResponse, AccountCoinsRequest};

pub struct AccountService {
    config: Arc<Configuration>,
    client: Arc<dyn NodeClient>,
}

impl AccountService {
    pub fn new(config: Arc<Configuration>, client: Arc<dyn NodeClient>) -> Self {
        Self { config, client }
    }

    pub async fn balance(
        &self,
        request: &AccountBalanceRequest,
    ) -> Result<AccountBalanceResponse, ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        require_online(&self.config)?;

        let address: Address = request
            .account_identifier
            .address
            .parse()
            .map_err(|e| ApiError::wrap(ErrorKind::InvalidAddress, e))?;
        let currencies = request.currencies.as_deref().unwrap_or_default();

        let response = self
            .client
            .balance(&address, currencies, request.block_identifier.as_ref())
            .await
            .map_err(node_error)?;
        debug!(%address, balances = response.balances.len(), "fetched balance");
        Ok(response)
    }

    pub fn coins(&self, request: &AccountCoinsRequest) -> Result<(), ApiError> {
        check_network(&self.config, &request.network_identifier)?;
        Err(ApiError::new(ErrorKind::Unimplemented))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryNode;
    use crate::config::{Mode, Network};
    use crate::model::{AccountIdentifier, Amount, Currency};

    fn service(mode: Mode) -> (AccountService, Arc<InMemoryNode>) {
        let node = Arc::new(InMemoryNode::new());
        let config = Arc::new(Configuration::new(mode, Network::Mainnet));
        (AccountService::new(config, node.clone()), node)
    }

    fn request(address: impl ToString) -> AccountBalanceRequest {
        AccountBalanceRequest {
            network_identifier: Network::Mainnet.network_identifier(),
            account_identifier: AccountIdentifier::new(address),
            block_identifier: None,
            currencies: None,
        }
    }

    #[tokio::test]
    async fn test_balance_returns_held_tokens() {
        let (svc, node) = service(Mode::Online);
        let address = Address::from_public_key(&[7; 32]);
        node.set_balances(address, vec![Amount::new("1000", Currency::vite())]);

        let response = svc.balance(&request(address)).await.unwrap();
        assert_eq!(response.balances, vec![Amount::new("1000", Currency::vite())]);
    }

    #[tokio::test]
    async fn test_balance_of_requested_currency_defaults_to_zero() {
        let (svc, _) = service(Mode::Online);
        let mut req = request(Address::from_public_key(&[7; 32]));
        req.currencies = Some(vec![Currency::vite()]);

        let response = svc.balance(&req).await.unwrap();
        assert_eq!(response.balances, vec![Amount::new("0", Currency::vite())]);
    }

    #[tokio::test]
    async fn test_balance_rejects_bad_address() {
        let (svc, node) = service(Mode::Online);
        let err = svc.balance(&request("vite_nothex")).await.unwrap_err();
        assert!(err.is(ErrorKind::InvalidAddress));
        assert_eq!(node.call_count(), 0);
    }

    #[tokio::test]
    async fn test_balance_offline() {
        let (svc, _) = service(Mode::Offline);
        let err = svc
            .balance(&request(Address::ZERO))
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::UnavailableOffline));
    }

    #[test]
    fn test_coins_unimplemented() {
        let (svc, _) = service(Mode::Online);
        let err = svc
            .coins(&AccountCoinsRequest {
                network_identifier: Network::Mainnet.network_identifier(),
                account_identifier: AccountIdentifier::new(Address::ZERO),
                include_mempool: false,
            })
            .unwrap_err();
        assert!(err.is(ErrorKind::Unimplemented));
    }
}
