/*
[INPUT]:  Stream configuration, bearer token and message handler
[OUTPUT]: Real-time push data delivered to the handler
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When changing connection logic or the handler contract
*/

pub mod client;
pub mod handler;
pub mod message;

pub use client::{StreamConfig, StreamState, StreamingClient};
pub use handler::{HandlerError, MessageHandler};
pub use message::{AuthenticateData, ControlMessage};
