//! syncpad - a shared real-time notepad.
//!
//! Clients connect over a WebSocket, receive the current text, and every
//! edit they send replaces the notepad for everyone else. The latest value
//! is mirrored to SQLite in the background.

pub mod config;
pub mod database;
pub mod error;
pub mod server;
pub mod store;
pub mod sync;
