//! Connection-facing types for the broadcast engine.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Client command that resets the notepad to empty for everyone.
pub const CLEAR_COMMAND: &str = "clear";

/// Default number of updates queued per connection before it is evicted.
pub const DEFAULT_CLIENT_BUFFER: usize = 256;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Inbound frame from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

/// Outcome of queueing one update for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The connection's writer is gone.
    Closed,
    /// The connection is not draining its queue.
    Full,
}

/// Write side of one live connection.
///
/// The matching receiver is drained by that connection's writer task.
/// Dropping every handle closes the receiver, which ends the writer.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Arc<str>>,
}

impl ConnectionHandle {
    /// Creates a handle with a fresh id and an outbound queue of `capacity`.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Arc<str>>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::next(),
                outbound,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Queues `content` without waiting.
    pub fn deliver(&self, content: &Arc<str>) -> Delivery {
        match self.outbound.try_send(Arc::clone(content)) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
            Err(TrySendError::Full(_)) => Delivery::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let (a, _rx_a) = ConnectionHandle::new(1);
        let (b, _rx_b) = ConnectionHandle::new(1);
        assert_ne!(a.id(), b.id());
        assert!(a.id().to_string().starts_with("conn-"));
    }

    #[test]
    fn test_deliver_reports_full_and_closed() {
        let (handle, rx) = ConnectionHandle::new(1);
        let content: Arc<str> = Arc::from("x");

        assert!(handle.is_open());
        assert_eq!(handle.deliver(&content), Delivery::Sent);
        assert_eq!(handle.deliver(&content), Delivery::Full);

        drop(rx);
        assert!(!handle.is_open());
        assert_eq!(handle.deliver(&content), Delivery::Closed);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (handle, mut rx) = ConnectionHandle::new(0);
        assert_eq!(handle.deliver(&Arc::from("a")), Delivery::Sent);
        assert_eq!(rx.try_recv().unwrap().as_ref(), "a");
    }
}
