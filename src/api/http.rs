// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use crate::api::handlers::{ApiHandlers, ApiResponse, ApiResult, StatusRequest};
use crate::api::websocket::ws_handler;
use crate::discovery::DiscoveryService;
use crate::registry::Record;

pub struct HttpServer {
    handlers: Arc<ApiHandlers>,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(service: Arc<DiscoveryService>, addr: SocketAddr) -> Self {
        Self {
            handlers: Arc::new(ApiHandlers::new(service)),
            addr,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/records", post(publish_handler).get(list_records_handler))
            .route("/api/records/first", get(first_record_handler))
            .route(
                "/api/records/:id",
                get(get_record_handler)
                    .put(update_record_handler)
                    .delete(unpublish_handler),
            )
            .route("/api/records/:id/status", put(set_status_handler))
            .route("/ws", get(ws_handler))
            .with_state(self.handlers.clone())
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on(self, listener: TcpListener) -> anyhow::Result<()> {
        info!(addr = %listener.local_addr()?, "Starting HTTP server");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn health_handler() -> Json<ApiResponse<&'static str>> {
    ApiHandlers::health().await
}

async fn publish_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Json(record): Json<Record>,
) -> ApiResult<Record> {
    handlers.publish(Json(record)).await
}

async fn list_records_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    query: Query<HashMap<String, String>>,
) -> ApiResult<Vec<Record>> {
    handlers.list_records(query).await
}

async fn first_record_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    query: Query<HashMap<String, String>>,
) -> ApiResult<Option<Record>> {
    handlers.first_record(query).await
}

async fn get_record_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(id): Path<String>,
) -> ApiResult<Record> {
    handlers.get_record(Path(id)).await
}

async fn update_record_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(id): Path<String>,
    Json(record): Json<Record>,
) -> ApiResult<Record> {
    handlers.update_record(Path(id), Json(record)).await
}

async fn set_status_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Record> {
    handlers.set_status(Path(id), Json(request)).await
}

async fn unpublish_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    handlers.unpublish(Path(id)).await
}
