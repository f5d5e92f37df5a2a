use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorMessage {
    pub from: u32,
    pub to: u32,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMessage {
    pub connection_id: String,
    pub user_id: String,
}

/// Frames exchanged over the relay.
///
/// The relay itself never decodes into this type; it only checks that a frame
/// is a JSON object and forwards the raw text. Sessions decode it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum RelayMessage {
    #[serde(rename = "content")]
    Content { content: Value },
    #[serde(rename = "cursor")]
    Cursor(CursorMessage),
    /// Sent by the server right after the handshake
    #[serde(rename = "welcome")]
    Welcome(WelcomeMessage),
}

impl RelayMessage {
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
