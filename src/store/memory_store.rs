//! In-process document store.
//!
//! Used for `--ephemeral` runs, where notes live only as long as the
//! process, and by tests that need to observe or break the save path.

use super::DocumentStore;
use crate::error::PersistError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    content: Mutex<Option<String>>,
    fail_saves: AtomicBool,
    saves: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `content`.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
            ..Default::default()
        }
    }

    /// Makes every subsequent `save` fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    #[cfg(test)]
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Raw stored value, `None` if never saved.
    pub fn stored(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<String, PersistError> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, content: &str) -> Result<(), PersistError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable(
                "memory store is set to fail".to_string(),
            ));
        }
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = Some(content.to_string());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
