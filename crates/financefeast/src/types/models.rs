/*
[INPUT]:  Raw JSON bodies from login, error and response headers
[OUTPUT]: Typed wire models for token, structured errors and quota state
[POS]:    Data layer - wire models used by the REST pipeline
[UPDATE]: When the login/error body or rate-limit headers change
*/

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a successful `/oauth/login`.
///
/// Both fields are optional on the wire: a rejected login still answers 2xx
/// with only `detail` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

/// Structured error body: `{"code":..., "message":..., "detail":...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }

    /// Machine code as text; numeric codes are rendered verbatim
    pub fn code_text(&self) -> String {
        match &self.code {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Human message, falling back to the detail
    pub fn message_text(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        detail_text(self.detail.as_ref())
    }
}

/// Render a `detail` value as plain text.
pub(crate) fn detail_text(detail: Option<&Value>) -> String {
    match detail {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Most recently observed quota state. Advisory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Reset time exactly as the server sent it
    pub reset: Option<String>,
}

impl RateLimit {
    pub fn is_known(&self) -> bool {
        self.limit.is_some() || self.remaining.is_some() || self.reset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_numeric_code() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"code": 1002, "message": "Invalid ticker", "detail": "ticker foo not found"}"#,
        )
        .unwrap();

        assert!(body.has_detail());
        assert_eq!(body.code_text(), "1002");
        assert_eq!(body.message_text(), "Invalid ticker");
    }

    #[test]
    fn test_error_body_message_falls_back_to_detail() {
        let body: ApiErrorBody = serde_json::from_str(r#"{"detail": "Token expired"}"#).unwrap();

        assert_eq!(body.code_text(), "");
        assert_eq!(body.message_text(), "Token expired");
    }

    #[test]
    fn test_login_response_without_token() {
        let body: LoginResponse =
            serde_json::from_str(r#"{"detail": "Invalid client credentials"}"#).unwrap();

        assert!(body.access_token.is_none());
        assert_eq!(detail_text(body.detail.as_ref()), "Invalid client credentials");
    }

    #[test]
    fn test_rate_limit_default_unknown() {
        assert!(!RateLimit::default().is_known());
    }
}
