/*
[INPUT]:  HTTP configuration (environment, timeouts, base URL), resolved credentials
[OUTPUT]: Configured reqwest client, authorized requests, mapped errors, rate-limit state
[POS]:    HTTP layer - core client implementation shared by every REST call
[UPDATE]: When adding connection options or changing request/error behavior
*/

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use crate::auth::{Credentials, ResolvedCredentials, TokenSource, TokenStore};
use crate::http::query::Query;
use crate::http::rate_limit::parse_rate_limit;
use crate::http::response::unwrap_data;
use crate::http::{FinanceFeastError, Result};
use crate::types::{ApiErrorBody, Environment, RateLimit};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Longest wait for the next chunk of a response, not a deadline on the
    /// whole transfer
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Overrides the environment's base URL
    pub base_url: Option<String>,
    /// Attached to the client's tracing span to tell clients apart
    pub label: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            base_url: None,
            label: None,
        }
    }
}

impl ClientConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }
}

/// Main HTTP client for the Financefeast API.
///
/// Cheap to clone; clones share the token cache and rate-limit state.
#[derive(Debug, Clone)]
pub struct FinanceFeastClient {
    http_client: Client,
    base_url: Url,
    environment: Environment,
    timeout: Duration,
    pub(crate) credentials: Arc<ResolvedCredentials>,
    pub(crate) tokens: TokenStore,
    rate_limit: Arc<Mutex<RateLimit>>,
    span: Span,
}

impl FinanceFeastClient {
    /// Create a new client against production, credentials resolved from
    /// arguments and environment
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Self::from_resolved(credentials.resolve()?, config)
    }

    /// Create a client from already resolved credentials
    pub fn from_resolved(credentials: ResolvedCredentials, config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .read_timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let base = config
            .base_url
            .as_deref()
            .unwrap_or(config.environment.rest_url());
        let base_url = Url::parse(base)?;
        if base_url.cannot_be_a_base() {
            return Err(FinanceFeastError::Config(format!(
                "base URL {base} cannot be used as a base"
            )));
        }

        let span = info_span!(
            "financefeast_client",
            environment = %config.environment,
            label = config.label.as_deref().unwrap_or("default"),
        );

        let tokens = TokenStore::new();
        if let Some(token) = &credentials.token {
            tokens.set_token(token.clone(), TokenSource::Supplied);
        }

        span.in_scope(|| {
            info!(base_url = %base_url, "API environment set");
            if credentials.token.is_some() {
                debug!("authorized using supplied token");
            }
        });

        Ok(Self {
            http_client,
            base_url,
            environment: config.environment,
            timeout: config.timeout,
            credentials: Arc::new(credentials),
            tokens,
            rate_limit: Arc::new(Mutex::new(RateLimit::default())),
            span,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Currently cached bearer token
    pub fn token(&self) -> Option<String> {
        self.tokens.get_token()
    }

    /// Rate-limit triple from the most recent response
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build the full URL `{base_url}/{path}`
    fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build an unauthenticated request builder
    pub(crate) fn request_builder(
        &self,
        method: Method,
        path: &str,
        query: &Query,
    ) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        let mut builder = self.http_client.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query.pairs());
        }
        Ok(builder)
    }

    /// Issue a request against `path`.
    ///
    /// With `requires_auth` the bearer token is attached, logging in first
    /// when none is cached. A 401 on a protected call clears the token and
    /// retries once, provided a client id/secret pair is available to log in
    /// again.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        requires_auth: bool,
    ) -> Result<Option<Value>> {
        self.request_in_span(method, path, query, requires_auth)
            .instrument(self.span.clone())
            .await
    }

    async fn request_in_span(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        requires_auth: bool,
    ) -> Result<Option<Value>> {
        if !requires_auth {
            let builder = self.request_builder(method, path, query)?;
            return self.send(builder).await;
        }

        let token = self.authorize().await?;
        let builder = self
            .request_builder(method.clone(), path, query)?
            .bearer_auth(&token);

        match self.send(builder).await {
            Err(err)
                if err.status() == Some(StatusCode::UNAUTHORIZED)
                    && self.credentials.client.is_some() =>
            {
                warn!(path, "token rejected; re-authorizing once");
                self.tokens.clear_if(&token);
                let token = self.authorize().await?;
                let builder = self
                    .request_builder(method, path, query)?
                    .bearer_auth(&token);
                self.send(builder).await
            }
            other => other,
        }
    }

    /// GET `path` and unwrap the `data` field of the payload
    pub async fn get_data(&self, path: &str, query: &Query, requires_auth: bool) -> Result<Value> {
        let payload = self.request(Method::GET, path, query, requires_auth).await?;
        Ok(unwrap_data(payload))
    }

    /// Send a built request and decode the JSON body.
    ///
    /// An empty body yields `Ok(None)`.
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Option<Value>> {
        let response = builder
            .send()
            .await
            .map_err(|err| FinanceFeastError::from_transport(err, self.timeout))?;

        let status = response.status();
        let url = response.url().clone();
        debug!(url = %url, status = status.as_u16(), "request completed");

        self.capture_rate_limit(parse_rate_limit(response.headers()));

        if status == StatusCode::FORBIDDEN {
            return Err(FinanceFeastError::NotAuthorised);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            error!(url = %url, "rate limit exceeded");
        }
        if status == StatusCode::NOT_FOUND {
            error!(url = %url, "URL not found");
        }

        let status_error = response.error_for_status_ref().err();
        let body = response
            .text()
            .await
            .map_err(|err| FinanceFeastError::from_transport(err, self.timeout))?;

        if let Some(err) = status_error {
            if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(&body)
                && api_error.has_detail()
            {
                return Err(FinanceFeastError::api_error(&api_error, Some(status)));
            }
            return Err(FinanceFeastError::Http(err));
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&body)?))
    }

    fn capture_rate_limit(&self, rate_limit: RateLimit) {
        let mut guard = self
            .rate_limit
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = rate_limit;
    }
}
