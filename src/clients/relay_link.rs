use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::ClientError;

/// What the transport reports back to the session
#[derive(Debug, Clone, PartialEq)]
pub enum RelayInput {
    Frame(String),
    Closed,
}

/// Channels bridging a session to its relay socket
#[derive(Debug)]
pub struct RelayLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<RelayInput>,
}

/// Open a relay connection and spawn the task that pumps frames both ways.
///
/// The task ends when either side closes: the socket closes or errors, or
/// every outbound sender is dropped. `RelayInput::Closed` is always the last
/// item delivered on `inbound`.
pub async fn connect_relay(url: &str) -> Result<RelayLink, ClientError> {
    let (socket, _) = connect_async(url).await?;
    info!("Connected to relay at {}", url);

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<RelayInput>();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                outgoing = out_rx.recv() => {
                    match outgoing {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text.into())).await {
                                warn!("Relay send failed: {}", e);
                                break;
                            }
                        }
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    }
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if in_tx.send(RelayInput::Frame(text.as_str().to_owned())).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!("Relay transport error: {}", e);
                            break;
                        }
                        Some(Ok(_)) => {}
                    }
                }
            }
        }
        debug!("Relay link closed");
        let _ = in_tx.send(RelayInput::Closed);
    });

    Ok(RelayLink {
        outbound: out_tx,
        inbound: in_rx,
    })
}
