/*
[INPUT]:  Deployment target selection
[OUTPUT]: Typed environment enum with REST and stream base URLs
[POS]:    Data layer - environment definitions shared by REST and stream clients
[UPDATE]: When Financefeast adds or moves a deployment
*/

use std::fmt;

use serde::{Deserialize, Serialize};

const TEST_REST_URL: &str = "https://api.test.financefeast.io";
const PRODUCTION_REST_URL: &str = "https://api.financefeast.io";
const LOCAL_REST_URL: &str = "http://localhost:8000";

const TEST_STREAM_URL: &str = "wss://stream.test.financefeast.io";
const PRODUCTION_STREAM_URL: &str = "wss://stream.financefeast.io";
const LOCAL_STREAM_URL: &str = "ws://localhost:8001";

/// Named deployment target. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Test,
    #[default]
    #[serde(alias = "prod")]
    Production,
    Local,
}

impl Environment {
    /// Base URL for REST calls
    pub fn rest_url(self) -> &'static str {
        match self {
            Environment::Test => TEST_REST_URL,
            Environment::Production => PRODUCTION_REST_URL,
            Environment::Local => LOCAL_REST_URL,
        }
    }

    /// Websocket URL for the push stream
    pub fn stream_url(self) -> &'static str {
        match self {
            Environment::Test => TEST_STREAM_URL,
            Environment::Production => PRODUCTION_STREAM_URL,
            Environment::Local => LOCAL_STREAM_URL,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Environment::Test => "test",
            Environment::Production => "prod",
            Environment::Local => "local",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
