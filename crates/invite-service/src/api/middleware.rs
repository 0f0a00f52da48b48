//! Authentication and logging middleware.

use super::AppState;
use crate::error::ServiceError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Hash a secret for comparison.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the username from an HTTP Basic `Authorization` header value.
pub fn basic_username(value: &str) -> Option<String> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let username = match decoded.split_once(':') {
        Some((username, _)) => username,
        None => decoded.as_str(),
    };
    (!username.is_empty()).then(|| username.to_string())
}

/// Require Basic auth whose username is the configured API key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let username = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(basic_username);

    match username {
        Some(username)
            if hash_secret(&username) == hash_secret(state.api_key.expose_secret()) =>
        {
            debug!("API key accepted");
            Ok(next.run(request).await)
        }
        _ => {
            warn!(uri = %request.uri(), "Rejected unauthenticated control request");
            Err(ServiceError::Unauthorized)
        }
    }
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}
