/*
[INPUT]:  Resolved credentials and HTTP client
[OUTPUT]: Cached bearer token, validation results
[POS]:    Auth layer - login (`/oauth/login`) and validation (`/oauth/validate`) flow
[UPDATE]: When auth endpoints or token lifecycle change
*/

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::{ClientCredentials, TokenSource};
use crate::http::query::Query;
use crate::http::response::is_truthy;
use crate::http::{FinanceFeastClient, FinanceFeastError, Result};
use crate::types::{LoginResponse, models::detail_text};

pub const LOGIN_PATH: &str = "oauth/login";
pub const VALIDATE_PATH: &str = "oauth/validate";
pub const CLIENT_ID_HEADER: &str = "X-FF-ID";
pub const CLIENT_SECRET_HEADER: &str = "X-FF-SECRET";

impl FinanceFeastClient {
    /// Return the cached token, logging in with the client id/secret first
    /// when there is none.
    ///
    /// Concurrent callers share one login.
    pub async fn authorize(&self) -> Result<String> {
        if let Some(token) = self.tokens.get_token() {
            return Ok(token);
        }

        let _guard = self.tokens.refresh_guard().await;
        if let Some(token) = self.tokens.get_token() {
            return Ok(token);
        }

        let Some(client) = self.credentials.client.as_ref() else {
            warn!(
                "no client_id/client_secret or valid token available; pass a valid token or client credentials"
            );
            return Err(FinanceFeastError::NotAuthorised);
        };

        let token = self.login(client).await?;
        self.tokens.set_token(token.clone(), TokenSource::Login);
        info!("client successfully authorized using client credentials");
        Ok(token)
    }

    /// GET /oauth/login with `X-FF-ID` / `X-FF-SECRET`
    async fn login(&self, client: &ClientCredentials) -> Result<String> {
        debug!(path = LOGIN_PATH, "authorizing client credentials");

        let builder = self
            .request_builder(Method::GET, LOGIN_PATH, &Query::new())?
            .header(CLIENT_ID_HEADER, &client.client_id)
            .header(CLIENT_SECRET_HEADER, &client.client_secret);

        let payload = self.send(builder).await?.ok_or_else(|| {
            FinanceFeastError::Authorization {
                message: "empty login response".to_string(),
            }
        })?;
        let login: LoginResponse = serde_json::from_value(payload)?;

        match login.access_token {
            Some(token) if !token.is_empty() => {
                debug!("found a valid access_token");
                Ok(token)
            }
            _ => {
                let message = detail_text(login.detail.as_ref());
                error!(%message, "login response has no access_token");
                Err(FinanceFeastError::Authorization { message })
            }
        }
    }

    /// Validate the current token against GET /oauth/validate.
    ///
    /// An invalid or expired token is not an error: the cached token is
    /// cleared and `Ok(None)` returned, so the next protected call logs in
    /// again.
    pub async fn validate(&self) -> Result<Option<Value>> {
        let token = self.authorize().await?;
        debug!("introspecting token");

        let builder = self
            .request_builder(Method::GET, VALIDATE_PATH, &Query::new())?
            .bearer_auth(&token);

        match self.send(builder).await {
            Ok(payload) if is_truthy(payload.as_ref()) => {
                debug!("token is valid");
                Ok(payload)
            }
            Ok(_) => {
                self.invalidate(&token);
                Ok(None)
            }
            Err(FinanceFeastError::NotAuthorised) => {
                self.invalidate(&token);
                Ok(None)
            }
            Err(err) if err.status() == Some(StatusCode::UNAUTHORIZED) => {
                self.invalidate(&token);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Whether the current token is still usable
    pub async fn check_authorization(&self) -> Result<bool> {
        Ok(self.validate().await?.is_some())
    }

    fn invalidate(&self, token: &str) {
        self.tokens.clear_if(token);
        warn!("token is not valid or has expired");
    }
}
