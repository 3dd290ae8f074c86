/*
[INPUT]:  Raw WebSocket frames and outgoing control requests
[OUTPUT]: Decoded JSON payloads and serialized control frames
[POS]:    WebSocket layer - frame decoding and control message format
[UPDATE]: When adding control messages or changing frame encoding
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::debug;

const RAW_LOG_MAX_BYTES: usize = 1024;

/// Client to server control frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// `{"type":"authenticate","data":{"token":"..."}}`
    Authenticate { data: AuthenticateData },
    /// `{"type":"ping"}`
    Ping,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateData {
    pub token: String,
}

impl ControlMessage {
    pub fn authenticate(token: impl Into<String>) -> Self {
        ControlMessage::Authenticate {
            data: AuthenticateData {
                token: token.into(),
            },
        }
    }
}

/// Decode a data frame into JSON. Control frames and undecodable
/// payloads yield `None`.
pub(crate) fn decode_frame(message: WsMessage) -> Option<Value> {
    let text: String = match message {
        WsMessage::Text(text) => text.to_string(),
        WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => text,
            Err(err) => {
                debug!(error = %err, bytes = bytes.len(), "ws binary frame is not utf-8");
                return None;
            }
        },
        _ => return None,
    };

    debug!(
        bytes = text.len(),
        message = %truncate_for_log(&text, RAW_LOG_MAX_BYTES),
        "received message"
    );

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(
                error = %err,
                bytes = text.len(),
                message = %truncate_for_log(&text, RAW_LOG_MAX_BYTES),
                "ws message parse failed"
            );
            None
        }
    }
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
