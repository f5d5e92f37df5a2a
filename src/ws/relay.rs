//! Broadcast relay
//!
//! Owns the registry of live connections, keyed by document id, and fans raw
//! frames out among the connections of one document.

use serde::de::IgnoredAny;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type ConnId = Uuid;

/// Frames are shared between all recipients of one fan-out round
pub type Frame = Arc<str>;

/// A registered connection: its identity plus the sending half of its
/// bounded outbound buffer.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub user_id: String,
    tx: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a connection with a server-issued id and user id, returning the
    /// receiver the transport drains.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let conn = Self {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4().to_string(),
            tx,
        };
        (conn, rx)
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    pub rooms: usize,
    pub connections: usize,
}

/// Registry of open connections per document.
///
/// Fan-out rounds run under one lock, so the order in which frames are
/// accepted is a total order and every recipient is offered frames in that
/// order. Sends never wait: a recipient with a full buffer misses the frame.
#[derive(Debug, Default)]
pub struct Relay {
    rooms: Mutex<HashMap<String, HashMap<ConnId, Connection>>>,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, doc_id: &str, conn: Connection) {
        info!(doc_id = %doc_id, conn_id = %conn.id, user_id = %conn.user_id, "Connection registered");
        let mut rooms = self.rooms.lock().await;
        rooms.entry(doc_id.to_string()).or_default().insert(conn.id, conn);
    }

    /// Remove a connection. Returns false if it was not registered.
    pub async fn unregister(&self, doc_id: &str, conn_id: ConnId) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(doc_id) else {
            return false;
        };
        let removed = room.remove(&conn_id).is_some();
        if room.is_empty() {
            rooms.remove(doc_id);
        }
        if removed {
            info!(doc_id = %doc_id, conn_id = %conn_id, "Connection unregistered");
        }
        removed
    }

    /// Forward `raw` to every other open connection of `doc_id`.
    ///
    /// Frames that are not valid JSON are dropped without a reply. The
    /// original text is forwarded as-is, never re-serialized. Returns the
    /// number of recipients the frame was enqueued for.
    pub async fn on_message(&self, doc_id: &str, sender: ConnId, raw: &str) -> usize {
        if let Err(e) = serde_json::from_str::<IgnoredAny>(raw) {
            debug!(doc_id = %doc_id, conn_id = %sender, error = %e, "Dropping malformed frame");
            return 0;
        }

        let frame: Frame = Arc::from(raw);
        let rooms = self.rooms.lock().await;
        let Some(room) = rooms.get(doc_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (id, conn) in room.iter() {
            if *id == sender || !conn.is_open() {
                continue;
            }
            match conn.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(doc_id = %doc_id, conn_id = %id, "Outbound buffer full, dropping frame");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(doc_id = %doc_id, conn_id = %id, "Recipient closed during fan-out");
                }
            }
        }
        delivered
    }

    pub async fn stats(&self) -> RelayStats {
        let rooms = self.rooms.lock().await;
        RelayStats {
            rooms: rooms.len(),
            connections: rooms.values().map(HashMap::len).sum(),
        }
    }

    pub async fn room_size(&self, doc_id: &str) -> usize {
        self.rooms.lock().await.get(doc_id).map_or(0, HashMap::len)
    }
}
