//! Unreceived-block resolution.
//!
//! A receive block must name the send it acknowledges. When a client asks
//! for a receive without naming it, the recipient's unreceived queue is
//! scanned for a send with the same sender, recipient, token and amount.
//!
//! The scan reads fixed-size pages from page 0 and stops at the first
//! match, at an empty page, or after `max_pages` pages. Each page request
//! is an await point, so dropping the future stops the scan between pages.

use thiserror::Error;
use tracing::debug;

use crate::client::{NodeClient, NodeError};
use crate::config::{DEFAULT_MAX_UNRECEIVED_PAGES, UNRECEIVED_PAGE_SIZE};
use crate::ledger::{AccountBlock, Address, Hash, Quantity, TokenTypeId};
use crate::transaction::{is_send_operation, match_transaction, operations_for_block};

use super::ConstructionOptions;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("no match found for the given transaction")]
    NoMatch,

    #[error("no match found within {pages} pages of unreceived blocks")]
    Exhausted { pages: u64 },

    #[error("invalid transfer query: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Node(#[from] NodeError),
}

/// The transfer a receive is looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferQuery {
    pub from: Address,
    pub to: Address,
    pub token_id: TokenTypeId,
    pub amount: Quantity,
}

impl TransferQuery {
    /// Builds the query from receive options. The sender is required.
    pub fn from_options(options: &ConstructionOptions) -> Result<Self, ResolverError> {
        let from = options
            .from_account
            .as_ref()
            .ok_or_else(|| ResolverError::InvalidInput("missing from account".into()))?;
        let invalid = |e: crate::ledger::LedgerError| ResolverError::InvalidInput(e.to_string());

        let (_, amount) = options.amount.parse().map_err(invalid)?;
        Ok(Self {
            from: from.address.parse().map_err(invalid)?,
            to: options.to_account.address.parse().map_err(invalid)?,
            token_id: options.amount.currency.token_id().map_err(invalid)?,
            amount,
        })
    }

    /// True when `block` is a send carrying exactly this transfer.
    pub fn matches(&self, block: &AccountBlock) -> bool {
        let Ok(operations) = operations_for_block(block, false) else {
            return false;
        };
        let description = match match_transaction(&operations) {
            Ok(description) if is_send_operation(description.operation_type) => description,
            _ => return false,
        };

        let from = description
            .from_account
            .as_ref()
            .and_then(|account| account.address.parse::<Address>().ok());
        let to = description.to_account.address.parse::<Address>().ok();
        let token_id = description.amount.currency.token_id().ok();
        let amount = description.amount.parse().ok().map(|(_, q)| q);

        from == Some(self.from)
            && to == Some(self.to)
            && token_id == Some(self.token_id)
            && amount == Some(self.amount)
    }
}

pub struct UnreceivedBlockResolver<'a> {
    client: &'a dyn NodeClient,
    page_size: u64,
    max_pages: u64,
}

impl<'a> UnreceivedBlockResolver<'a> {
    pub fn new(client: &'a dyn NodeClient) -> Self {
        Self {
            client,
            page_size: UNRECEIVED_PAGE_SIZE,
            max_pages: DEFAULT_MAX_UNRECEIVED_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Hash of the first unreceived send matching `query`.
    pub async fn resolve(&self, query: &TransferQuery) -> Result<Hash, ResolverError> {
        for page in 0..self.max_pages {
            let blocks = self
                .client
                .unreceived_blocks(&query.to, page, self.page_size)
                .await?;
            if blocks.is_empty() {
                return Err(ResolverError::NoMatch);
            }

            for block in &blocks {
                if query.matches(block) {
                    debug!(hash = %block.hash, page, "resolved unreceived block");
                    return Ok(block.hash);
                }
                debug!(hash = %block.hash, page, "skipping unreceived block");
            }
        }
        Err(ResolverError::Exhausted {
            pages: self.max_pages,
        })
    }
}
