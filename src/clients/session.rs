use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::doc_api_client::DocumentApi;
use super::local_cache::LocalCache;
use super::relay_link::{connect_relay, RelayInput};
use super::ClientError;
use crate::models::{CursorMessage, RelayMessage, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Where the initial state of a session came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Store,
    Cache,
    Empty,
}

/// Outcome of one relay input
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Local state was replaced by a received snapshot
    Replaced,
    /// Another session moved its cursor; nothing is rendered yet
    RemoteCursor(CursorMessage),
    Welcome { user_id: String },
    Ignored,
    Closed,
}

/// One client's local document model, reconciled against the store and the
/// relay with last-received-wins semantics.
///
/// A received `content` snapshot replaces local state unconditionally; local
/// edits that were not yet pushed are lost. Replacements are neither cached
/// nor re-broadcast.
pub struct ClientSession<A, C> {
    api: A,
    cache: C,
    content: Value,
    user_id: Option<String>,
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl<A: DocumentApi, C: LocalCache> ClientSession<A, C> {
    pub fn new(api: A, cache: C) -> Self {
        Self {
            api,
            cache,
            content: Value::Null,
            user_id: None,
            state: ConnectionState::Disconnected,
            outbound: None,
        }
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Server-issued id, known once the relay welcomed this session
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Initial load: stored content if any, else the local cache, else empty.
    /// An unreachable store is treated like an empty one.
    pub async fn load(&mut self) -> LoadSource {
        match self.api.get_document().await {
            Ok(doc) if doc.has_content() => {
                self.content = doc.content;
                return LoadSource::Store;
            }
            Ok(_) => debug!("Stored document is empty, trying local cache"),
            Err(e) => warn!("Document store unavailable, trying local cache: {}", e),
        }

        match self.cache.load() {
            Ok(Some(content)) => {
                self.content = content;
                LoadSource::Cache
            }
            Ok(None) => {
                self.content = Value::Null;
                LoadSource::Empty
            }
            Err(e) => {
                warn!("Local cache unreadable, starting empty: {}", e);
                self.content = Value::Null;
                LoadSource::Empty
            }
        }
    }

    /// Apply a local edit: update state, mirror it to the cache and push it to
    /// the relay if connected. Returns whether the edit was broadcast.
    pub fn apply_local_edit(&mut self, content: Value) -> bool {
        self.content = content;
        if let Err(e) = self.cache.store(&self.content) {
            warn!("Failed to write local cache: {}", e);
        }
        let message = RelayMessage::Content { content: self.content.clone() };
        self.push(&message)
    }

    /// Broadcast the local selection. Needs a server-issued id first.
    pub fn send_cursor(&mut self, from: u32, to: u32) -> bool {
        let Some(user_id) = self.user_id.clone() else {
            return false;
        };
        self.push(&RelayMessage::Cursor(CursorMessage { from, to, user_id }))
    }

    fn push(&mut self, message: &RelayMessage) -> bool {
        if self.state != ConnectionState::Connected {
            return false;
        }
        let Some(outbound) = &self.outbound else {
            return false;
        };
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to encode relay frame: {}", e);
                return false;
            }
        };
        if outbound.send(frame).is_err() {
            self.mark_closed();
            return false;
        }
        true
    }

    /// Open a relay connection. Frames arrive on the returned receiver and
    /// must be fed back through [`ClientSession::handle_input`].
    pub async fn connect(&mut self, url: &str) -> Result<mpsc::UnboundedReceiver<RelayInput>, ClientError> {
        self.state = ConnectionState::Connecting;
        self.user_id = None;
        match connect_relay(url).await {
            Ok(link) => {
                self.attach(link.outbound);
                Ok(link.inbound)
            }
            Err(e) => {
                warn!("Relay connection to {} failed: {}", url, e);
                self.mark_closed();
                Err(e)
            }
        }
    }

    /// Mark the handshake as done and start pushing through `outbound`
    pub fn attach(&mut self, outbound: mpsc::UnboundedSender<String>) {
        self.outbound = Some(outbound);
        self.state = ConnectionState::Connected;
        info!("Session connected to relay");
    }

    /// Drop the relay connection. Local edits keep updating state and cache.
    pub fn disconnect(&mut self) {
        self.mark_closed();
    }

    fn mark_closed(&mut self) {
        if self.state != ConnectionState::Closed {
            info!("Session relay connection closed");
        }
        self.outbound = None;
        self.state = ConnectionState::Closed;
    }

    pub fn handle_input(&mut self, input: RelayInput) -> Inbound {
        match input {
            RelayInput::Frame(text) => self.handle_frame(&text),
            RelayInput::Closed => {
                self.mark_closed();
                Inbound::Closed
            }
        }
    }

    pub fn handle_frame(&mut self, raw: &str) -> Inbound {
        let message = match serde_json::from_str::<RelayMessage>(raw) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring unreadable relay frame: {}", e);
                return Inbound::Ignored;
            }
        };

        match message {
            RelayMessage::Content { content } => {
                self.content = content;
                Inbound::Replaced
            }
            RelayMessage::Cursor(cursor) => {
                if self.user_id.as_deref() == Some(cursor.user_id.as_str()) {
                    Inbound::Ignored
                } else {
                    Inbound::RemoteCursor(cursor)
                }
            }
            RelayMessage::Welcome(welcome) => {
                // Only the first welcome of a connection carries our identity
                if self.user_id.is_some() || self.state != ConnectionState::Connected {
                    return Inbound::Ignored;
                }
                self.user_id = Some(welcome.user_id.clone());
                Inbound::Welcome { user_id: welcome.user_id }
            }
        }
    }

    /// Persist the current state as a new version
    pub async fn save(&self) -> Result<(), ClientError> {
        self.api.put_document(&self.content, true).await
    }

    pub async fn versions(&self) -> Result<Vec<Version>, ClientError> {
        self.api.list_versions().await
    }

    /// Adopt an older version as a local edit
    pub fn restore_version(&mut self, version: &Version) -> bool {
        self.apply_local_edit(version.content.clone())
    }

    /// Empty the local state and forget the cached copy, without broadcasting
    pub fn clear(&mut self) {
        self.content = Value::Null;
        if let Err(e) = self.cache.clear() {
            warn!("Failed to clear local cache: {}", e);
        }
    }
}
