//! Client side of the synchronization core: a session that keeps one local
//! document model in sync with the store and the relay.

pub mod doc_api_client;
pub mod local_cache;
pub mod relay_link;
pub mod session;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("document service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("local cache error: {0}")]
    Cache(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("relay transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}
