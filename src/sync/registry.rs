//! Set of currently open connections.

use super::types::{ConnectionHandle, ConnectionId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Connections that have opened and not yet closed.
///
/// Not synchronized on its own; the engine keeps it behind the same lock as
/// the document so joins, leaves, and broadcasts are totally ordered.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    handles: HashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `handle`. Returns `false` if its id was already registered.
    pub fn add(&mut self, handle: ConnectionHandle) -> bool {
        match self.handles.entry(handle.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Removes the handle with `id`, if present.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.handles.remove(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Calls `f` for every registered handle except `excluded`.
    ///
    /// Iteration order is unspecified.
    pub fn for_each_except(
        &self,
        excluded: Option<ConnectionId>,
        f: impl FnMut(&ConnectionHandle),
    ) {
        self.handles
            .values()
            .filter(|handle| Some(handle.id()) != excluded)
            .for_each(f);
    }
}
