//! WebSocket handler for the shared notepad.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::server::state::AppState;
use crate::sync::{ConnectionEvents, Engine, Payload};

/// WebSocket upgrade handler.
///
/// Requests that cannot be upgraded get a 500, matching what clients of
/// the notepad expect from a failed upgrade.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => {
            let engine = Arc::clone(&state.engine);
            ws.on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
                .on_upgrade(move |socket| handle_socket(socket, engine))
        }
        Err(rejection) => {
            tracing::warn!(%rejection, "Rejected WebSocket upgrade");
            (StatusCode::INTERNAL_SERVER_ERROR, "WebSocket upgrade failed").into_response()
        }
    }
}

/// Handles an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, engine: Arc<Engine>) {
    let (mut sender, mut receiver) = socket.split();

    // Registering queues the current notepad as the first outbound frame
    let (handle, mut outbound) = engine.connect();
    let id = handle.id();
    engine.on_open(handle);
    if !engine.is_registered(id) {
        return;
    }
    tracing::info!(connection = %id, "Client connected");

    // Drain this connection's queue into the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(content) = outbound.recv().await {
            if sender.send(Message::Text(content.to_string())).await.is_err() {
                break;
            }
        }
        // Queue closed: the engine dropped us for lagging
        let _ = sender.close().await;
    });

    let recv_engine = Arc::clone(&engine);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            // Evicted for lagging: stop accepting edits from this client
            if !recv_engine.is_registered(id) {
                tracing::debug!(connection = %id, "Connection dropped by engine");
                break;
            }
            match msg {
                Ok(Message::Text(text)) => recv_engine.on_message(id, Payload::Text(text)),
                Ok(Message::Binary(bytes)) => recv_engine.on_message(id, Payload::Binary(bytes)),
                Ok(Message::Close(_)) => break,
                // Pong is handled automatically by axum
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    tracing::debug!(connection = %id, error = %e, "WebSocket read failed");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    engine.on_close(id);
    tracing::info!(connection = %id, "Client disconnected");
}
