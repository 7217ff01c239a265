//! HTTP server: the notepad page, the WebSocket endpoint, and a health check.

pub mod routes;
pub mod state;
pub mod ws;

use crate::server::routes::health;
use crate::server::state::AppState;
use crate::server::ws::ws_handler;

use axum::{routing::get, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;

/// Builds the router. `index` is the page served at `/`.
pub fn router(state: Arc<AppState>, index: &Path) -> Router {
    // CORS layer for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Notepad page
        .route_service("/", ServeFile::new(index))
        // Health check
        .route("/health", get(health::health_check))
        // WebSocket
        .route("/ws", get(ws_handler))
        .fallback(routes::not_found)
        .layer(cors)
        .with_state(state)
}

/// Serves `app` on `addr` until `shutdown` resolves.
pub async fn run_server(
    addr: SocketAddr,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use crate::sync::Engine;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use futures::{SinkExt, Stream, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};
    use tower::ServiceExt;

    fn app(index: &Path) -> Router {
        let engine = Engine::start(Arc::new(MemoryStore::with_content("abc")), 8).unwrap();
        router(Arc::new(AppState::new(Arc::new(engine))), index)
    }

    async fn get_path(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_serves_page() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<h1>notes</h1>").unwrap();

        let (status, body) = get_path(app(&index), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>notes</h1>");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_path(app(&dir.path().join("index.html")), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Not Found");
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_path(app(&dir.path().join("index.html")), "/ws").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "WebSocket upgrade failed");
    }

    #[tokio::test]
    async fn test_health_reports_engine() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_path(app(&dir.path().join("index.html")), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 0);
        assert_eq!(json["revision"], 0);
        assert_eq!(json["content_length"], 3);
    }

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = msg {
                return text.to_string();
            }
        }
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_notepad_over_websocket() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(Engine::start(store.clone(), 8).unwrap());
        let app = router(
            Arc::new(AppState::new(Arc::clone(&engine))),
            &dir.path().join("index.html"),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let url = format!("ws://{addr}/ws");

        // First client sees the empty notepad and writes to it alone
        let (mut c1, _) = connect_async(&url).await.unwrap();
        assert_eq!(next_text(&mut c1).await, "");
        c1.send(Message::text("hello".to_string())).await.unwrap();
        wait_until(|| engine.content().as_ref() == "hello").await;
        assert!(engine.wait_persisted(1).await);
        assert_eq!(store.load().unwrap(), "hello");

        // Second client gets the current text on connect
        let (mut c2, _) = connect_async(&url).await.unwrap();
        assert_eq!(next_text(&mut c2).await, "hello");
        assert_eq!(engine.connection_count(), 2);

        // Binary is ignored, clear reaches both clients
        c2.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
        c2.send(Message::text("clear".to_string())).await.unwrap();
        assert_eq!(next_text(&mut c1).await, "");
        assert_eq!(next_text(&mut c2).await, "");
        assert_eq!(engine.snapshot().revision, 2);
        assert!(engine.wait_persisted(2).await);
        assert_eq!(store.load().unwrap(), "");

        // Closing unregisters, and later edits skip the closed client
        c1.close(None).await.unwrap();
        wait_until(|| engine.connection_count() == 1).await;
        c2.send(Message::text("solo".to_string())).await.unwrap();
        wait_until(|| engine.content().as_ref() == "solo").await;
        assert_eq!(engine.connection_count(), 1);
    }
}
