//! HTTP Server for the Gate
//!
//! Public `POST /query` endpoint. Request processing is strictly ordered:
//! authenticate, validate, classify, forward. Authentication runs before
//! the body is even parsed, so a caller with a bad key learns nothing
//! about query handling.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use sqlrelay_common::auth::{AuthConfig, API_KEY_HEADER};
use sqlrelay_common::{classify, Classification, ErrorBody, QueryRequest, RelayError};

use crate::upstream::RouterClient;

/// Read-only state shared by all gate request handlers.
pub struct GateState {
    pub auth: AuthConfig,
    pub upstream: RouterClient,
}

/// HTTP server for the gate service.
pub struct HttpServer {
    state: Arc<GateState>,
}

impl HttpServer {
    pub fn new(auth: AuthConfig, upstream: RouterClient) -> Self {
        Self {
            state: Arc::new(GateState { auth, upstream }),
        }
    }

    /// Binds to `addr` and serves until shutdown.
    pub async fn run(self, addr: SocketAddr) -> Result<(), RelayError> {
        let app = axum::Router::new()
            .route("/query", axum::routing::post(handle_query))
            .route("/__health", axum::routing::get(health_check))
            .layer(CorsLayer::permissive())
            .with_state(self.state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Transport(format!("Failed to bind to {}: {}", addr, e)))?;

        info!(
            "Gate HTTP server listening on {}",
            listener
                .local_addr()
                .map_err(|e| RelayError::Transport(format!("Failed to get local addr: {}", e)))?
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| RelayError::Transport(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Handles `POST /query`: authenticate, validate, filter, forward.
async fn handle_query(
    State(state): State<Arc<GateState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provided_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if !state.auth.validate(provided_key) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Unauthorized - Invalid or missing API key")),
        )
            .into_response();
    }

    // An unparseable body carries no usable query
    let request: QueryRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new("No query provided")),
            )
                .into_response()
        }
    };

    let query = request.query.trim().to_string();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("No query provided")),
        )
            .into_response();
    }

    if classify(&query) == Classification::Blocked {
        warn!("blocked query: {}", query);
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody::new("Query blocked for security reasons")),
        )
            .into_response();
    }

    let forwarded = QueryRequest {
        query,
        strategy: request.strategy,
    };
    match state.upstream.forward(&forwarded).await {
        Ok((status, body)) => relay(status, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(format!("Proxy communication failed: {}", e))),
        )
            .into_response(),
    }
}

/// Relays the router's status and body to the caller unchanged.
fn relay(status: StatusCode, body: Bytes) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        // infallible: status and header are already validated values
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
