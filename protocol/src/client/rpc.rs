//! # JSON-RPC Transport
//!
//! JSON-RPC 2.0 envelopes and an HTTP transport for talking to gvite.
//!
//! ## Method Index
//!
//! | Method                                | Used for                          |
//! |---------------------------------------|-----------------------------------|
//! | `ledger_getSnapshotBlockByHeight`     | genesis, `/block` by index        |
//! | `ledger_getSnapshotBlockByHash`       | `/block` by hash, latest block    |
//! | `ledger_getLatestSnapshotHash`        | latest block                      |
//! | `ledger_getAccountBlockByHash`        | `/block/transaction`, block walk  |
//! | `ledger_getAccountInfoByAddress`      | tokens held by an account         |
//! | `ledger_getConfirmedBalances`         | `/account/balance`                |
//! | `ledger_getLatestAccountBlock`        | construction metadata             |
//! | `ledger_getUnreceivedBlocksByAddress` | receive resolution                |
//! | `ledger_getPoWDifficulty`             | PoW quote                         |
//! | `ledger_sendRawTransaction`           | submit                            |
//! | `contract_getTokenInfoById`           | balance currencies                |
//! | `util_getPoWNonce`                    | PoW nonce                         |
//! | `net_nodeInfo` / `net_syncInfo`       | `/network/status`                 |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use super::NodeError;

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "ledger_getSnapshotBlockByHeight")]
    GetSnapshotBlockByHeight,
    #[serde(rename = "ledger_getSnapshotBlockByHash")]
    GetSnapshotBlockByHash,
    #[serde(rename = "ledger_getLatestSnapshotHash")]
    GetLatestSnapshotHash,
    #[serde(rename = "ledger_getAccountBlockByHash")]
    GetAccountBlockByHash,
    #[serde(rename = "ledger_getAccountInfoByAddress")]
    GetAccountInfoByAddress,
    #[serde(rename = "ledger_getConfirmedBalances")]
    GetConfirmedBalances,
    #[serde(rename = "ledger_getLatestAccountBlock")]
    GetLatestAccountBlock,
    #[serde(rename = "ledger_getUnreceivedBlocksByAddress")]
    GetUnreceivedBlocksByAddress,
    #[serde(rename = "ledger_getPoWDifficulty")]
    GetPoWDifficulty,
    #[serde(rename = "ledger_sendRawTransaction")]
    SendRawTransaction,
    #[serde(rename = "contract_getTokenInfoById")]
    GetTokenInfoById,
    #[serde(rename = "util_getPoWNonce")]
    GetPoWNonce,
    #[serde(rename = "net_nodeInfo")]
    NodeInfo,
    #[serde(rename = "net_syncInfo")]
    SyncInfo,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetSnapshotBlockByHeight => "ledger_getSnapshotBlockByHeight",
            Self::GetSnapshotBlockByHash => "ledger_getSnapshotBlockByHash",
            Self::GetLatestSnapshotHash => "ledger_getLatestSnapshotHash",
            Self::GetAccountBlockByHash => "ledger_getAccountBlockByHash",
            Self::GetAccountInfoByAddress => "ledger_getAccountInfoByAddress",
            Self::GetConfirmedBalances => "ledger_getConfirmedBalances",
            Self::GetLatestAccountBlock => "ledger_getLatestAccountBlock",
            Self::GetUnreceivedBlocksByAddress => "ledger_getUnreceivedBlocksByAddress",
            Self::GetPoWDifficulty => "ledger_getPoWDifficulty",
            Self::SendRawTransaction => "ledger_sendRawTransaction",
            Self::GetTokenInfoById => "contract_getTokenInfoById",
            Self::GetPoWNonce => "util_getPoWNonce",
            Self::NodeInfo => "net_nodeInfo",
            Self::SyncInfo => "net_syncInfo",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request. `params` is always a positional array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: RpcMethod,
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response. gvite answers "not found" with a `null`
/// result and no error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// The result, with `null` mapped to `None`, or the node's error.
    pub fn into_result(self) -> Result<Option<Value>, NodeError> {
        if let Some(error) = self.error {
            return Err(NodeError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.filter(|v| !v.is_null()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// HTTP JSON-RPC transport. Cheap to share; request ids are taken from an
/// atomic counter.
pub struct RpcTransport {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Calls `method`, treating a `null` result as an error.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: Value,
    ) -> Result<R, NodeError> {
        self.call_nullable(method, params)
            .await?
            .ok_or_else(|| NodeError::MissingResult {
                method: method.to_string(),
            })
    }

    /// Calls `method`; a `null` result is `Ok(None)`.
    pub async fn call_nullable<R: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: Value,
    ) -> Result<Option<R>, NodeError> {
        let request = RpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        trace!(id = request.id, %method, "rpc call");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .into_result()?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| NodeError::Decode {
                    what: format!("{} result", method),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}
