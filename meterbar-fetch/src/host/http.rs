//! HTTP client with tracing and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist so credentials only ever reach provider hosts
//! - JSON helpers that classify HTTP status codes into fetch errors

use reqwest::{Client, Response, header, header::HeaderMap};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{FetchError, HttpError};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for MeterBar.
const USER_AGENT: &str = concat!("MeterBar/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::default()
            });

        Self {
            inner: client,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains (and their subdomains).
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<Response, HttpError> {
        self.is_domain_allowed(url)?;
        debug!("GET request with headers");

        let response = self.inner.get(url).headers(headers).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request and decodes a JSON body.
    ///
    /// Non-success statuses are mapped with [`FetchError::from_status`], so a
    /// 401/403 surfaces as an authentication failure.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, headers: HeaderMap) -> Result<T, FetchError> {
        let response = self.get_with_headers(url, headers).await?;
        let status = response.status();

        if !status.is_success() {
            if response.is_rate_limited() {
                return Err(FetchError::RateLimited {
                    retry_after: response.retry_after_secs(),
                });
            }
            return Err(FetchError::from_status(status, url));
        }

        let body = response.text().await.map_err(HttpError::from)?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, len = body.len(), "Response body did not match expected shape");
            FetchError::InvalidResponse(format!("unexpected response shape: {e}"))
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Header Helpers
// ============================================================================

/// Builds headers carrying a bearer token plus JSON accept.
///
/// Returns `None` if the token contains characters not valid in a header.
pub fn bearer_headers(token: &str) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().ok()?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    Some(headers)
}

/// Builds headers carrying a cookie string plus JSON accept.
pub fn cookie_headers(cookie: &str) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, cookie.parse().ok()?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    Some(headers)
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new().with_allowed_domains(vec![
            "api.anthropic.com".to_string(),
            "z.ai".to_string(),
        ]);

        assert!(client.is_domain_allowed("https://api.anthropic.com/v1/usage").is_ok());
        assert!(client.is_domain_allowed("https://api.z.ai/v1/usage").is_ok());
        assert!(client.is_domain_allowed("https://evil.com/steal").is_err());
    }

    #[test]
    fn test_no_domain_restrictions() {
        let client = HttpClient::new();
        assert!(client.is_domain_allowed("https://any.domain.com").is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::new().with_allowed_domains(vec!["example.com".to_string()]);
        assert!(client.is_domain_allowed("not-a-valid-url").is_err());
    }

    #[test]
    fn test_bearer_headers() {
        let headers = bearer_headers("tok").unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer tok");
        assert!(bearer_headers("bad\ntoken").is_none());
    }
}
