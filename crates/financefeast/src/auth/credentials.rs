/*
[INPUT]:  Explicit credential options and process environment
[OUTPUT]: Resolved token and/or client id/secret pair
[POS]:    Auth layer - credential resolution performed once at client construction
[UPDATE]: When credential sources or environment variable names change
*/

use std::fmt;

use tracing::debug;

use crate::http::{FinanceFeastError, Result};

pub const CLIENT_ID_ENV: &str = "FF-CLIENT-ID";
pub const CLIENT_SECRET_ENV: &str = "FF-CLIENT-SECRET";

/// Credential options as supplied by the caller.
///
/// Any field left `None` may still be filled from the environment during
/// [`Credentials::resolve`].
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token: Option<String>,
}

/// Client id/secret pair used against `/oauth/login`
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Outcome of credential resolution. At least one field is set.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub token: Option<String>,
    pub client: Option<ClientCredentials>,
}

impl Credentials {
    /// Rely entirely on `FF-CLIENT-ID` / `FF-CLIENT-SECRET`
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Use a pre-issued bearer token; login is skipped
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Use a client id/secret pair
    pub fn with_client(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            token: None,
        }
    }

    /// Resolve against the process environment
    pub fn resolve(self) -> Result<ResolvedCredentials> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// An explicit token always wins. Without one, both halves of the
    /// id/secret pair are required.
    pub fn resolve_with<F>(self, lookup: F) -> Result<ResolvedCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = non_empty(self.client_id).or_else(|| non_empty(lookup(CLIENT_ID_ENV)));
        let client_secret =
            non_empty(self.client_secret).or_else(|| non_empty(lookup(CLIENT_SECRET_ENV)));
        let token = non_empty(self.token);

        let client = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
                client_id,
                client_secret,
            }),
            (None, None) if token.is_none() => return Err(FinanceFeastError::NotAuthorised),
            (None, Some(_)) if token.is_none() => return Err(FinanceFeastError::MissingClientId),
            (Some(_), None) if token.is_none() => {
                return Err(FinanceFeastError::MissingClientSecret);
            }
            _ => None,
        };

        if token.is_some() {
            debug!("using supplied bearer token");
        } else {
            debug!("using client credentials");
        }

        Ok(ResolvedCredentials { token, client })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("client", &self.client)
            .finish()
    }
}
