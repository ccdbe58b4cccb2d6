//! # Rosetta HTTP API
//!
//! Builds the axum router exposing the Rosetta Data and Construction APIs.
//! Handlers share the engine services through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                        | Mode    |
//! |--------|-----------------------------|---------|
//! | GET    | `/health`                   | any     |
//! | GET    | `/metrics`                  | any     |
//! | POST   | `/network/list`             | any     |
//! | POST   | `/network/options`          | any     |
//! | POST   | `/network/status`           | online  |
//! | POST   | `/account/balance`          | online  |
//! | POST   | `/account/coins`            | any     |
//! | POST   | `/block`                    | online  |
//! | POST   | `/block/transaction`        | online  |
//! | POST   | `/construction/derive`      | any     |
//! | POST   | `/construction/preprocess`  | any     |
//! | POST   | `/construction/metadata`    | online  |
//! | POST   | `/construction/payloads`    | any     |
//! | POST   | `/construction/combine`     | any     |
//! | POST   | `/construction/hash`        | any     |
//! | POST   | `/construction/parse`       | any     |
//! | POST   | `/construction/submit`      | online  |
//!
//! Failures are answered with HTTP 500 and the catalog error as the body.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use vite_rosetta::client::NodeClient;
use vite_rosetta::config::Configuration;
use vite_rosetta::error::{ApiError, ErrorKind};
use vite_rosetta::model::api::{
    AccountBalanceRequest, AccountCoinsRequest, BlockRequest, BlockTransactionRequest,
    ConstructionCombineRequest, ConstructionDeriveRequest, ConstructionHashRequest,
    ConstructionMetadataRequest, ConstructionParseRequest, ConstructionPayloadsRequest,
    ConstructionPreprocessRequest, ConstructionSubmitRequest, MetadataRequest, NetworkRequest,
};
use vite_rosetta::{AccountService, BlockService, ConstructionService, NetworkService};

use crate::metrics::{metrics_handler, SharedMetrics};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state for every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub network: Arc<NetworkService>,
    pub account: Arc<AccountService>,
    pub block: Arc<BlockService>,
    pub construction: Arc<ConstructionService>,
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(
        config: Arc<Configuration>,
        client: Arc<dyn NodeClient>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            network: Arc::new(NetworkService::new(config.clone(), client.clone())),
            account: Arc::new(AccountService::new(config.clone(), client.clone())),
            block: Arc::new(BlockService::new(config.clone(), client.clone())),
            construction: Arc::new(ConstructionService::new(config, client)),
            metrics,
        }
    }

    /// Records the outcome and renders it.
    fn finish<T: Serialize>(
        &self,
        endpoint: &'static str,
        started: Instant,
        result: Result<T, ApiError>,
    ) -> Response {
        self.metrics
            .record_request(endpoint, started.elapsed().as_secs_f64());
        match result {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(err) => {
                self.metrics.record_error(endpoint, err.code);
                warn!(endpoint, code = err.code, error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(err)).into_response()
            }
        }
    }
}

impl FromRef<AppState> for SharedMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/network/list", post(network_list))
        .route("/network/options", post(network_options))
        .route("/network/status", post(network_status))
        .route("/account/balance", post(account_balance))
        .route("/account/coins", post(account_coins))
        .route("/block", post(block))
        .route("/block/transaction", post(block_transaction))
        .route("/construction/derive", post(construction_derive))
        .route("/construction/preprocess", post(construction_preprocess))
        .route("/construction/metadata", post(construction_metadata))
        .route("/construction/payloads", post(construction_payloads))
        .route("/construction/combine", post(construction_combine))
        .route("/construction/hash", post(construction_hash))
        .route("/construction/parse", post(construction_parse))
        .route("/construction/submit", post(construction_submit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unwraps a JSON body, reporting malformed input as invalid parameters.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| ApiError::wrap(ErrorKind::CallParametersInvalid, rejection.body_text()))
}

type Payload<T> = Result<Json<T>, JsonRejection>;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Liveness probe. Does not touch the node.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn network_list(State(s): State<AppState>, payload: Payload<MetadataRequest>) -> Response {
    let started = Instant::now();
    let result = body(payload).map(|r| s.network.list(&r));
    s.finish("/network/list", started, result)
}

async fn network_options(State(s): State<AppState>, payload: Payload<NetworkRequest>) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.network.options(&r));
    s.finish("/network/options", started, result)
}

async fn network_status(State(s): State<AppState>, payload: Payload<NetworkRequest>) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.network.status(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/network/status", started, result)
}

async fn account_balance(
    State(s): State<AppState>,
    payload: Payload<AccountBalanceRequest>,
) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.account.balance(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/account/balance", started, result)
}

async fn account_coins(
    State(s): State<AppState>,
    payload: Payload<AccountCoinsRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.account.coins(&r));
    s.finish("/account/coins", started, result)
}

async fn block(State(s): State<AppState>, payload: Payload<BlockRequest>) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.block.block(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/block", started, result)
}

async fn block_transaction(
    State(s): State<AppState>,
    payload: Payload<BlockTransactionRequest>,
) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.block.block_transaction(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/block/transaction", started, result)
}

async fn construction_derive(
    State(s): State<AppState>,
    payload: Payload<ConstructionDeriveRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.derive(&r));
    s.finish("/construction/derive", started, result)
}

async fn construction_preprocess(
    State(s): State<AppState>,
    payload: Payload<ConstructionPreprocessRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.preprocess(&r));
    s.finish("/construction/preprocess", started, result)
}

async fn construction_metadata(
    State(s): State<AppState>,
    payload: Payload<ConstructionMetadataRequest>,
) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.construction.metadata(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/construction/metadata", started, result)
}

async fn construction_payloads(
    State(s): State<AppState>,
    payload: Payload<ConstructionPayloadsRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.payloads(&r));
    s.finish("/construction/payloads", started, result)
}

async fn construction_combine(
    State(s): State<AppState>,
    payload: Payload<ConstructionCombineRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.combine(&r));
    s.finish("/construction/combine", started, result)
}

async fn construction_hash(
    State(s): State<AppState>,
    payload: Payload<ConstructionHashRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.hash(&r));
    s.finish("/construction/hash", started, result)
}

async fn construction_parse(
    State(s): State<AppState>,
    payload: Payload<ConstructionParseRequest>,
) -> Response {
    let started = Instant::now();
    let result = body(payload).and_then(|r| s.construction.parse(&r));
    s.finish("/construction/parse", started, result)
}

async fn construction_submit(
    State(s): State<AppState>,
    payload: Payload<ConstructionSubmitRequest>,
) -> Response {
    let started = Instant::now();
    let result = match body(payload) {
        Ok(r) => s.construction.submit(&r).await,
        Err(e) => Err(e),
    };
    s.finish("/construction/submit", started, result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
