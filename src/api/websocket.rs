// SPDX-License-Identifier: GPL-3.0-only
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use crate::api::handlers::{ApiHandlers, ApiResponse, ApiResult};
use crate::notifier::StatusEvent;
use crate::registry::{Filter, Record};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WsMessage {
    Publish { record: Record },
    Unpublish { id: String },
    Update { record: Record },
    GetRecord { #[serde(default)] filter: Filter },
    GetRecords { #[serde(default)] filter: Filter },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum WsOutbound {
    Response {
        success: bool,
        data: Option<serde_json::Value>,
        error: Option<String>,
    },
    Event(StatusEvent),
}

pub async fn ws_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, handlers))
}

async fn handle_socket(socket: WebSocket, handlers: Arc<ApiHandlers>) {
    let (sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsOutbound>();

    // Push every status event to this client
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<StatusEvent>();
    let subscription = match handlers.service().subscribe(Arc::new(event_tx)).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "Rejecting WebSocket client");
            return;
        }
    };
    info!(subscription = %subscription, "WebSocket client connected");

    let event_out = tx.clone();
    let mut event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if event_out.send(WsOutbound::Event(event)).is_err() {
                break;
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        let mut sender = sender;
        while let Some(outbound) = rx.recv().await {
            let text = match serde_json::to_string(&outbound) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to encode WebSocket message");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(text)).await {
                error!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    let handlers_clone = handlers.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let response = handle_message(&text, &handlers_clone).await;
                    if tx.send(response).is_err() {
                        break;
                    }
                }
                Message::Close(_) => {
                    info!("WebSocket connection closed");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
        _ = (&mut event_task) => {
            // Notifier shut down: the service is closing
            recv_task.abort();
            send_task.abort();
        }
    };
    event_task.abort();

    // Already gone when the service closed
    let _ = handlers.service().unsubscribe(subscription).await;
}

fn respond<T: Serialize>(result: ApiResult<T>) -> WsOutbound {
    match result {
        Ok(Json(api_response)) => WsOutbound::Response {
            success: api_response.success,
            data: api_response.data.map(|v| serde_json::to_value(v).unwrap_or_default()),
            error: api_response.error,
        },
        Err(e) => WsOutbound::Response {
            success: false,
            data: None,
            error: Some(e.0.to_string()),
        },
    }
}

async fn handle_message(text: &str, handlers: &ApiHandlers) -> WsOutbound {
    let msg: WsMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            return WsOutbound::Response {
                success: false,
                data: None,
                error: Some(format!("Invalid message format: {}", e)),
            };
        }
    };

    let service = handlers.service();
    match msg {
        WsMessage::Publish { record } => respond(handlers.publish(Json(record)).await),
        WsMessage::Unpublish { id } => respond(handlers.unpublish(axum::extract::Path(id)).await),
        WsMessage::Update { record } => respond(
            service
                .update(record)
                .await
                .map(|r| Json(ApiResponse::success(r)))
                .map_err(Into::into),
        ),
        WsMessage::GetRecord { filter } => respond(
            service
                .get_record(&filter)
                .await
                .map(|r| Json(ApiResponse::success(r)))
                .map_err(Into::into),
        ),
        WsMessage::GetRecords { filter } => respond(
            service
                .get_records(&filter)
                .await
                .map(|r| Json(ApiResponse::success(r)))
                .map_err(Into::into),
        ),
    }
}
