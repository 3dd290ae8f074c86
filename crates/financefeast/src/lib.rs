/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Financefeast client crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{ClientCredentials, Credentials, ResolvedCredentials, TokenData, TokenStore};

// Re-export commonly used types from http
pub use http::{ClientConfig, FinanceFeastClient, FinanceFeastError, Query, Result, unwrap_data};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    ControlMessage, HandlerError, MessageHandler, StreamConfig, StreamState, StreamingClient,
};
