//! The single shared notepad value.

use crate::store::Snapshot;
use std::sync::Arc;

/// Current notepad text and how many updates produced it.
///
/// Lives inside the engine lock; every replace is a whole-value swap, so a
/// reader sees either the old or the new content, never a mix.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    content: Arc<str>,
    revision: u64,
}

impl SharedDocument {
    /// Creates the document at revision 0.
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        Self {
            content: content.into(),
            revision: 0,
        }
    }

    pub fn get(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Swaps in `content` and returns the new revision.
    pub fn replace(&mut self, content: Arc<str>) -> u64 {
        self.content = content;
        self.revision += 1;
        self.revision
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            content: self.get(),
        }
    }
}

impl Default for SharedDocument {
    fn default() -> Self {
        Self::new("")
    }
}
