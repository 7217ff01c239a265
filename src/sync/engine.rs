//! Broadcast engine: the single writer of the shared notepad.
//!
//! Every update runs the same short critical section: replace the document,
//! queue the new value on each recipient's outbound channel, release the
//! lock. Nothing inside the lock awaits or touches storage, so the order in
//! which updates take the lock is the order every client observes them.
//! Persistence is signalled after the lock is dropped.

use super::document::SharedDocument;
use super::registry::ConnectionRegistry;
use super::types::{ConnectionHandle, ConnectionId, Delivery, Payload, CLEAR_COMMAND};
use super::ConnectionEvents;
use crate::error::{EngineError, PersistError};
use crate::store::{DocumentStore, Persister, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Result of one applied update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub revision: u64,
    /// Connections the new value was queued for.
    pub recipients: usize,
    pub cleared: bool,
}

#[derive(Debug)]
struct EngineState {
    document: SharedDocument,
    registry: ConnectionRegistry,
}

impl EngineState {
    /// Queues `content` for every connection except `excluded`.
    ///
    /// Handles that are closed or not keeping up are dropped from the
    /// registry; dropping a full handle ends its writer and the socket.
    fn fan_out(&mut self, content: &Arc<str>, excluded: Option<ConnectionId>) -> usize {
        let mut delivered = 0;
        let mut dropped = Vec::new();

        self.registry
            .for_each_except(excluded, |handle| match handle.deliver(content) {
                Delivery::Sent => delivered += 1,
                Delivery::Closed => {
                    tracing::debug!(connection = %handle.id(), "Skipping closed connection");
                    dropped.push(handle.id());
                }
                Delivery::Full => {
                    tracing::warn!(connection = %handle.id(), "Connection lagging, disconnecting");
                    dropped.push(handle.id());
                }
            });

        for id in dropped {
            self.registry.remove(id);
        }

        delivered
    }
}

/// Owns the shared document, the connection registry, and the persistence
/// worker for one notepad.
pub struct Engine {
    state: Mutex<EngineState>,
    persister: Persister,
    client_buffer: usize,
}

impl Engine {
    /// Loads the notepad from `store` and starts the persistence worker.
    ///
    /// A load error is returned as-is; callers treat it as fatal. Must be
    /// called from within a tokio runtime.
    pub fn start(store: Arc<dyn DocumentStore>, client_buffer: usize) -> Result<Self, PersistError> {
        let content = store.load()?;
        tracing::info!(bytes = content.len(), "Notepad loaded");

        let document = SharedDocument::new(content);
        if document.is_empty() {
            tracing::debug!("Starting with an empty notepad");
        }
        let persister = Persister::spawn(store, document.snapshot());

        Ok(Self {
            state: Mutex::new(EngineState {
                document,
                registry: ConnectionRegistry::new(),
            }),
            persister,
            client_buffer,
        })
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // State is only ever swapped whole, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a handle for a new connection, sized by the engine's buffer.
    pub fn connect(&self) -> (ConnectionHandle, mpsc::Receiver<Arc<str>>) {
        ConnectionHandle::new(self.client_buffer)
    }

    /// Registers `handle` and queues the current content for it alone.
    ///
    /// Returns `false` if the connection was already gone.
    pub fn open(&self, handle: ConnectionHandle) -> bool {
        let mut state = self.lock();
        let id = handle.id();

        match handle.deliver(&state.document.get()) {
            Delivery::Sent => {
                state.registry.add(handle);
                tracing::debug!(
                    connection = %id,
                    connections = state.registry.len(),
                    "Connection registered"
                );
                true
            }
            delivery => {
                tracing::warn!(connection = %id, ?delivery, "Could not send initial notepad");
                false
            }
        }
    }

    /// Removes `id` from future broadcasts. Returns whether it was registered.
    pub fn close(&self, id: ConnectionId) -> bool {
        let removed = self.lock().registry.remove(id).is_some();
        if removed {
            tracing::debug!(connection = %id, "Connection unregistered");
        }
        removed
    }

    /// Applies one inbound message from `from`.
    ///
    /// Text replaces the whole notepad and goes to everyone but the sender.
    /// [`CLEAR_COMMAND`] empties it and goes to everyone, sender included.
    /// Senders that are no longer registered are refused.
    pub fn apply(&self, from: ConnectionId, payload: Payload) -> Result<Applied, EngineError> {
        let text = match payload {
            Payload::Text(text) => text,
            Payload::Binary(bytes) => {
                return Err(EngineError::NonTextPayload { len: bytes.len() });
            }
        };

        let cleared = text == CLEAR_COMMAND;
        let (content, excluded): (Arc<str>, _) = if cleared {
            (Arc::from(""), None)
        } else {
            (Arc::from(text), Some(from))
        };

        let (applied, snapshot) = {
            let mut state = self.lock();
            if !state.registry.contains(from) {
                return Err(EngineError::UnknownConnection { connection: from });
            }
            let revision = state.document.replace(Arc::clone(&content));
            let recipients = state.fan_out(&content, excluded);
            (
                Applied {
                    revision,
                    recipients,
                    cleared,
                },
                state.document.snapshot(),
            )
        };

        self.persister.publish(snapshot);

        tracing::debug!(
            connection = %from,
            revision = applied.revision,
            recipients = applied.recipients,
            cleared,
            "Update applied"
        );

        Ok(applied)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().document.snapshot()
    }

    pub fn content(&self) -> Arc<str> {
        self.lock().document.get()
    }

    /// Length of the current content in bytes.
    pub fn content_len(&self) -> usize {
        self.lock().document.len()
    }

    pub fn connection_count(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn is_registered(&self, id: ConnectionId) -> bool {
        self.lock().registry.contains(id)
    }

    pub fn saved_revision(&self) -> u64 {
        self.persister.saved_revision()
    }

    pub fn persist_failures(&self) -> u64 {
        self.persister.failures()
    }

    /// Waits until `revision` is durable. `false` if persistence stopped first.
    pub async fn wait_persisted(&self, revision: u64) -> bool {
        self.persister.wait_persisted(revision).await
    }

    /// Flushes the latest value to storage and stops the worker.
    pub async fn shutdown(&self) {
        self.persister.shutdown().await;
        tracing::info!(revision = self.saved_revision(), "Notepad engine stopped");
    }
}

impl ConnectionEvents for Engine {
    fn on_open(&self, handle: ConnectionHandle) {
        self.open(handle);
    }

    fn on_message(&self, from: ConnectionId, payload: Payload) {
        if let Err(e) = self.apply(from, payload) {
            tracing::warn!(connection = %from, error = %e, "Ignoring message");
        }
    }

    fn on_close(&self, id: ConnectionId) {
        self.close(id);
    }
}
