//! HTTP Server for the Router
//!
//! Exposes the internal `POST /query` endpoint using axum, plus a
//! `GET /__health` liveness endpoint. Handlers share only the read-only
//! cluster directory and database settings through an `Arc`; every request
//! is an independent tokio task with no cross-request state.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use sqlrelay_common::{
    classify, Classification, ErrorBody, QueryRequest, QueryResponse, RelayError, Strategy,
};

use crate::cluster::{Cluster, DbConfig};
use crate::{executor, strategy};

/// Read-only state shared by all router request handlers.
pub struct RouterState {
    pub cluster: Cluster,
    pub db: DbConfig,
}

/// HTTP server for the router service.
pub struct HttpServer {
    state: Arc<RouterState>,
}

impl HttpServer {
    pub fn new(cluster: Cluster, db: DbConfig) -> Self {
        Self {
            state: Arc::new(RouterState { cluster, db }),
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
            "Router HTTP server listening on {}",
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

/// Handles `POST /query`: classify, select a target, execute, respond.
async fn handle_query(State(state): State<Arc<RouterState>>, body: Bytes) -> Response {
    let request: QueryRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new("No SQL query provided.")),
            )
                .into_response()
        }
    };

    let query = request.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("No SQL query provided.")),
        )
            .into_response();
    }

    let classification = classify(query);

    // The gate filters these before forwarding, but a blocked statement
    // must never reach the execution adapter even when the router is
    // addressed directly.
    if classification == Classification::Blocked {
        warn!("blocked query reached the router: {}", query);
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorBody::new("Query blocked for security reasons")),
        )
            .into_response();
    }

    let decision = strategy::decide(
        &state.cluster,
        state.db.port,
        classification,
        Strategy::parse(&request.strategy),
    )
    .await;

    info!(
        "routing {} query to {} as {}",
        if classification == Classification::Read { "read" } else { "write" },
        decision.target,
        decision.role
    );

    let is_read = classification == Classification::Read;
    match executor::execute(&state.db, &decision.target, query, is_read).await {
        Ok(data) => Json(QueryResponse {
            executed_on: decision.target,
            role: decision.role,
            strategy: request.strategy,
            data,
        })
        .into_response(),
        Err(RelayError::Execution { node, message }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::with_node(message, node)),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::with_node(e.to_string(), decision.target)),
        )
            .into_response(),
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
