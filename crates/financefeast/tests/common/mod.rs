/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for financefeast tests

#![allow(dead_code)]

use std::time::Duration;

use financefeast::{ClientConfig, Credentials, FinanceFeastClient};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use wiremock::MockServer;

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    init_tracing();
    MockServer::start().await
}

/// Client pointed at `server`, resolving credentials without touching the
/// process environment
pub fn client_for(server: &MockServer, credentials: Credentials) -> FinanceFeastClient {
    client_with_config(
        credentials,
        ClientConfig {
            base_url: Some(server.uri()),
            ..ClientConfig::default()
        },
    )
}

pub fn client_with_config(credentials: Credentials, config: ClientConfig) -> FinanceFeastClient {
    let resolved = credentials
        .resolve_with(|_| None)
        .expect("credentials should resolve");
    FinanceFeastClient::from_resolved(resolved, config).expect("client init")
}

/// Mock bearer token for testing
pub fn mock_token() -> String {
    "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.test.signature".to_string()
}

/// Bind a websocket server on an ephemeral port; returns the listener and its `ws://` URL
pub async fn bind_ws_server() -> (TcpListener, String) {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, format!("ws://{addr}"))
}

pub async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("client should connect")
        .expect("accept");
    accept_async(stream).await.expect("websocket handshake")
}

/// Read the next text frame as JSON
pub async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("json frame");
        }
    }
}
