//! Shared application state for the HTTP server.

use crate::sync::Engine;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The notepad every WebSocket connection is attached to.
    pub engine: Arc<Engine>,

    /// When the server started, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates new app state around the given engine.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }
}
