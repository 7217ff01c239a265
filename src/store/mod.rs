//! Durable storage for the shared notepad.
//!
//! The engine talks to storage only through [`DocumentStore`]. Saves are
//! driven by the background [`Persister`] so that I/O never sits on the
//! real-time update path.

pub mod memory_store;
pub mod persister;
pub mod sqlite_store;

pub use memory_store::*;
pub use persister::*;
pub use sqlite_store::*;

use crate::error::PersistError;

/// Load/save contract for the single persisted document.
pub trait DocumentStore: Send + Sync {
    /// Returns the persisted content, or an empty string if nothing was
    /// ever saved. An error means storage exists but cannot be read.
    fn load(&self) -> Result<String, PersistError>;

    /// Durably replaces the stored content with `content`.
    fn save(&self, content: &str) -> Result<(), PersistError>;
}
