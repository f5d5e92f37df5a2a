use std::sync::Arc;
use std::time::Duration;
use axum::{
    extract::{Path, State, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::models::{RelayMessage, WelcomeMessage};
use crate::state::AppState;
use crate::ws::relay::{Connection, Relay};

/// Knobs of one connection loop
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub outbound_buffer: usize,
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
}

impl ConnectionSettings {
    fn from_state(state: &AppState) -> Self {
        Self {
            outbound_buffer: state.config.ws_outbound_buffer,
            // tokio intervals reject a zero period
            ping_interval: state.config.ws_ping_interval().max(Duration::from_secs(1)),
            idle_timeout: state.config.ws_idle_timeout(),
        }
    }
}

/// WebSocket handler for the default document
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let document_id = state.config.default_doc_id.clone();
    upgrade(ws, document_id, state)
}

/// WebSocket handler for an explicit document
pub async fn websocket_document_handler(
    Path(document_id): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    upgrade(ws, document_id, state)
}

fn upgrade(ws: WebSocketUpgrade, document_id: String, state: Arc<AppState>) -> Response {
    info!("New WebSocket connection attempt for document {}", document_id);
    let settings = ConnectionSettings::from_state(&state);
    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, document_id, relay, settings))
}

/// Drive one relay connection until it closes, errors or goes silent
pub async fn handle_socket(socket: WebSocket, document_id: String, relay: Arc<Relay>, settings: ConnectionSettings) {
    let (conn, mut outbound) = Connection::new(settings.outbound_buffer);
    let conn_id = conn.id;
    let welcome = RelayMessage::Welcome(WelcomeMessage {
        connection_id: conn_id.to_string(),
        user_id: conn.user_id.clone(),
    });

    let (mut sender, mut receiver) = socket.split();

    relay.register(&document_id, conn).await;

    // The welcome frame tells the client its server-issued identity
    match welcome.to_frame() {
        Ok(frame) => {
            if sender.send(Message::Text(frame)).await.is_err() {
                relay.unregister(&document_id, conn_id).await;
                return;
            }
        }
        Err(e) => error!("Failed to encode welcome frame for {}: {}", conn_id, e),
    }

    let mut ping_interval = tokio::time::interval_at(Instant::now() + settings.ping_interval, settings.ping_interval);
    let mut last_recv = Instant::now();

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_recv = Instant::now();
                        let delivered = relay.on_message(&document_id, conn_id, &text).await;
                        debug!(conn_id = %conn_id, delivered, "Frame relayed");
                    }
                    Some(Ok(Message::Binary(_))) => {
                        last_recv = Instant::now();
                        debug!(conn_id = %conn_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        last_recv = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket transport error");
                        break;
                    }
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if sender.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if last_recv.elapsed() > settings.idle_timeout {
                    info!(conn_id = %conn_id, "Idle timeout, evicting connection");
                    break;
                }
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    relay.unregister(&document_id, conn_id).await;
    info!("WebSocket connection {} for document {} terminated", conn_id, document_id);
}
