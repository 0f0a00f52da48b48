//! Authenticated Connect API client with per-call retry.

use crate::error::ConnectError;
use crate::jwt::TokenMinter;
use crate::retry::RetryPolicy;
use crate::types::ApiResponse;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Default Connect API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.appstoreconnect.apple.com/v1";

/// Per-attempt timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connect API client.
///
/// Every call mints a fresh token, then runs under the configured
/// [`RetryPolicy`]. Transport errors and HTTP error statuses are retried;
/// signing and decoding failures surface immediately.
#[derive(Clone)]
pub struct ConnectClient {
    client: Client,
    base_url: String,
    minter: TokenMinter,
    retry: RetryPolicy,
}

impl ConnectClient {
    /// Create a new client with a fixed per-attempt timeout.
    pub fn new(
        base_url: impl Into<String>,
        minter: TokenMinter,
        timeout: Duration,
    ) -> Result<Self, ConnectError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            minter,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Execute an authenticated call against `path` (relative to the base URL).
    #[instrument(skip(self, query, body))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ConnectError> {
        let token = self.minter.mint().map_err(|e| {
            error!("Could not create token, cannot make API request: {}", e);
            ConnectError::from(e)
        })?;

        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        let bearer = token.expose();

        self.retry
            .run(path, move |attempt| {
                debug!(attempt, url, "Sending request");
                self.send_once(method.clone(), url, query, body, bearer)
            })
            .await
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ConnectError> {
        self.execute(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse, ConnectError> {
        self.execute(Method::POST, path, &[], Some(body)).await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        bearer: &str,
    ) -> Result<ApiResponse, ConnectError> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(bearer)
            .header(ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Map a response to a body, a no-content marker, or an error.
    async fn handle_response(response: reqwest::Response) -> Result<ApiResponse, ConnectError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(ApiResponse::NoContent);
        }

        debug!("Response body: {}", body.chars().take(200).collect::<String>());
        serde_json::from_str(&body)
            .map(ApiResponse::Json)
            .map_err(ConnectError::from)
    }
}
