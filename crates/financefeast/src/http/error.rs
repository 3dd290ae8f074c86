/*
[INPUT]:  Error sources (credentials, HTTP, API bodies, serialization, WebSocket)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

use crate::types::ApiErrorBody;

/// Main error type for the Financefeast client
#[derive(Error, Debug)]
pub enum FinanceFeastError {
    /// No client id passed or found in `FF-CLIENT-ID`
    #[error(
        "parameter 'client_id' must be either passed or set as an environment variable 'FF-CLIENT-ID', or pass parameter 'token' with a valid bearer token"
    )]
    MissingClientId,

    /// No client secret passed or found in `FF-CLIENT-SECRET`
    #[error(
        "parameter 'client_secret' must be either passed or set as an environment variable 'FF-CLIENT-SECRET', or pass parameter 'token' with a valid bearer token"
    )]
    MissingClientSecret,

    /// A required `ticker` query parameter was empty
    #[error("parameter `ticker` must be passed")]
    MissingTicker,

    /// No usable credential, or the server answered 403
    #[error("Not authorised")]
    NotAuthorised,

    /// Login answered without an access token
    #[error("Authorization failed: {message}")]
    Authorization { message: String },

    /// Structured server-side rejection
    #[error("API error (code {code}): {message}")]
    Api {
        code: String,
        message: String,
        status: Option<StatusCode>,
    },

    /// Connect or response timeout
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Stream `send` while no connection is live
    #[error("WebSocket not connected")]
    NotConnected,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FinanceFeastError {
    /// Check if the error is worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        match self {
            FinanceFeastError::Timeout { .. } | FinanceFeastError::WebSocket(_) => true,
            FinanceFeastError::Http(err) => err.is_connect() || err.is_timeout(),
            FinanceFeastError::Api { status, .. } => status
                .map(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        match self {
            FinanceFeastError::MissingClientId
            | FinanceFeastError::MissingClientSecret
            | FinanceFeastError::NotAuthorised
            | FinanceFeastError::Authorization { .. } => true,
            FinanceFeastError::Api { status, .. } => *status == Some(StatusCode::UNAUTHORIZED),
            FinanceFeastError::Http(err) => err.status() == Some(StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }

    /// HTTP status behind the error, when there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FinanceFeastError::NotAuthorised => None,
            FinanceFeastError::Api { status, .. } => *status,
            FinanceFeastError::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Build an API error from a structured body
    pub fn api_error(body: &ApiErrorBody, status: Option<StatusCode>) -> Self {
        FinanceFeastError::Api {
            code: body.code_text(),
            message: body.message_text(),
            status,
        }
    }

    /// Map a transport error, pulling timeouts out into their own kind
    pub(crate) fn from_transport(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            FinanceFeastError::Timeout { duration: timeout }
        } else {
            FinanceFeastError::Http(err)
        }
    }
}

/// Result type alias for Financefeast operations
pub type Result<T> = std::result::Result<T, FinanceFeastError>;
