//! REST API for the explorer.
//!
//! Thin axum handlers over [`Explorer`]: each one extracts the path key and
//! paging parameters, calls the matching explorer operation and maps
//! [`ExplorerError`] to a distinct HTTP status.

use axum::{
    extract::{Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ExplorerError;
use crate::explorer::{BlockDetail, Explorer, MasternodePage, TransactionDetail, TransactionPage};
use crate::model::{CoinSnapshot, Peer, Transaction};
use crate::pagination::{PageParams, DEFAULT_LIMIT, PEER_LIMIT};

type ApiResult<T> = Result<Json<T>, ExplorerError>;

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            ExplorerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ExplorerError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ExplorerError::UpstreamUnavailable(_) => {
                tracing::error!(error = %self, "api.upstream_failure");
                (StatusCode::BAD_GATEWAY, "upstream node unavailable".to_string())
            }
            ExplorerError::StorageUnavailable(_) => {
                tracing::error!(error = %self, "api.storage_failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message, code })).into_response()
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(explorer: Arc<Explorer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![http::Method::GET, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/address/:hash", get(get_address))
        .route("/block/:hash", get(get_block))
        .route("/coin", get(get_coin))
        .route("/coin/history", get(get_coin_history))
        .route("/masternode", get(get_masternodes))
        .route("/peer", get(get_peer))
        .route("/peer/history", get(get_peer_history))
        .route("/tx/latest", get(get_tx_latest))
        .route("/tx/:hash", get(get_tx))
        .route("/tx", get(get_txs))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(explorer);

    Router::new().nest("/api", api_routes).layer(cors)
}

/// Serve the API on `addr` until ctrl-c.
pub async fn run_api_server(
    explorer: Arc<Explorer>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(explorer);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to install ctrl-c handler");
            }
        })
        .await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_address(
    State(explorer): State<Arc<Explorer>>,
    Path(hash): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Transaction>> {
    let txs = explorer
        .address_transactions(&hash, params.page(DEFAULT_LIMIT))
        .await?;
    Ok(Json(txs))
}

async fn get_block(
    State(explorer): State<Arc<Explorer>>,
    Path(hash): Path<String>,
) -> ApiResult<BlockDetail> {
    Ok(Json(explorer.block_detail(&hash).await?))
}

async fn get_coin(State(explorer): State<Arc<Explorer>>) -> ApiResult<Option<CoinSnapshot>> {
    Ok(Json(explorer.latest_coin().await?))
}

async fn get_coin_history(
    State(explorer): State<Arc<Explorer>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<CoinSnapshot>> {
    Ok(Json(explorer.coin_history(params.page(DEFAULT_LIMIT)).await?))
}

async fn get_masternodes(
    State(explorer): State<Arc<Explorer>>,
    Query(params): Query<PageParams>,
) -> ApiResult<MasternodePage> {
    Ok(Json(explorer.masternodes(params.page(DEFAULT_LIMIT)).await?))
}

async fn get_peer(
    State(explorer): State<Arc<Explorer>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Peer>> {
    Ok(Json(explorer.peers(params.page(PEER_LIMIT)).await?))
}

async fn get_peer_history(
    State(explorer): State<Arc<Explorer>>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Peer>> {
    Ok(Json(explorer.peer_history(params.page(PEER_LIMIT)).await?))
}

async fn get_tx_latest(State(explorer): State<Arc<Explorer>>) -> ApiResult<Vec<Transaction>> {
    Ok(Json(explorer.latest_transactions().await?))
}

async fn get_tx(
    State(explorer): State<Arc<Explorer>>,
    Path(hash): Path<String>,
) -> ApiResult<TransactionDetail> {
    Ok(Json(explorer.transaction_detail(&hash).await?))
}

async fn get_txs(
    State(explorer): State<Arc<Explorer>>,
    Query(params): Query<PageParams>,
) -> ApiResult<TransactionPage> {
    Ok(Json(explorer.transactions(params.page(DEFAULT_LIMIT)).await?))
}
