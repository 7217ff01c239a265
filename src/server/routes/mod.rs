//! Route handlers module.

pub mod health;

use axum::http::StatusCode;

/// Fallback for every path that is neither the page nor the socket.
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
