/*
[INPUT]:  Decoded stream payloads
[OUTPUT]: Caller-defined side effects
[POS]:    WebSocket layer - pluggable message callback
[UPDATE]: When the callback contract changes
*/

use serde_json::Value;

use crate::ws::StreamingClient;

/// Error a handler may return; it is logged and otherwise ignored
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every decoded server frame.
///
/// Runs on the receive loop itself: a slow handler delays further messages
/// and heartbeats, so hand long work off to another task.
///
/// The client stores the handler, so a handler must not own a
/// `StreamingClient` clone: that forms a reference cycle and the connection
/// state is never freed. Use the `client` argument to reply instead.
pub trait MessageHandler: Send + Sync + 'static {
    fn on_message(&self, client: &StreamingClient, payload: Value) -> Result<(), HandlerError>;
}

impl<F> MessageHandler for F
where
    F: Fn(&StreamingClient, Value) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn on_message(&self, client: &StreamingClient, payload: Value) -> Result<(), HandlerError> {
        self(client, payload)
    }
}
