//! Real-time synchronization of the shared notepad.
//!
//! The [`Engine`] owns the document and the set of open connections. The
//! WebSocket layer only ever talks to it through [`ConnectionEvents`].

pub mod document;
pub mod engine;
pub mod registry;
pub mod types;

pub use document::SharedDocument;
pub use engine::{Applied, Engine};
pub use registry::ConnectionRegistry;
pub use types::*;

/// Lifecycle callbacks driven by a transport, one call per event.
pub trait ConnectionEvents: Send + Sync {
    /// A connection opened; it should immediately get the current notepad.
    fn on_open(&self, handle: ConnectionHandle);

    /// A frame arrived from `from`. Errors are handled internally.
    fn on_message(&self, from: ConnectionId, payload: Payload);

    /// The connection closed. Safe to call more than once.
    fn on_close(&self, id: ConnectionId);
}
