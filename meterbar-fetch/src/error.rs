//! Fetch error types.

use reqwest::StatusCode;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type used inside strategies while performing a fetch.
///
/// Strategies convert these into a [`FetchResult`](crate::FetchResult) with
/// [`FetchResult::from_result`](crate::FetchResult::from_result); only
/// [`FetchError::is_fatal`] errors abort the remaining strategies.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the provider.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// The provider rejected the credential (expired, revoked, invalid).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found, e.g. no active subscription.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider returned a server error.
    #[error("Server error: HTTP {0}")]
    Server(u16),

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential disappeared between the availability check and the fetch.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Response parsed but carried no usage periods.
    #[error("No usage data in response")]
    NoUsageData,
}

impl FetchError {
    /// Returns true if this error is an authentication rejection.
    ///
    /// Such errors stop the pipeline: no other acquisition method can succeed
    /// with a credential the provider has already rejected.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Maps a non-success HTTP status to an error.
    ///
    /// 401/403 are authentication rejections; 404 usually means there is no
    /// active subscription for the account.
    pub fn from_status(status: StatusCode, context: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Self::AuthenticationFailed(format!("{context}: credential rejected ({status})"))
            }
            StatusCode::NOT_FOUND => Self::NotFound(format!("{context}: no active data ({status})")),
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { retry_after: None },
            s if s.is_server_error() => Self::Server(s.as_u16()),
            s => Self::InvalidResponse(format!("{context}: unexpected status {s}")),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err)
        }
    }
}

// ============================================================================
// Credential Error
// ============================================================================

/// Error type for writing or removing stored credentials.
///
/// Reading never errors: an unreadable credential is simply absent.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Secret was empty after trimming.
    #[error("Credential is empty")]
    Empty,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Cache Error
// ============================================================================

/// Error reported by a [`SnapshotCache`](crate::SnapshotCache) write.
///
/// Never escalated to a pipeline failure.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing the entry failed.
    #[error("Cache write failed: {0}")]
    Write(String),

    /// Removing entries failed.
    #[error("Cache clear failed: {0}")]
    Clear(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(FetchError::from_status(StatusCode::UNAUTHORIZED, "x").is_fatal());
        assert!(FetchError::from_status(StatusCode::FORBIDDEN, "x").is_fatal());
        assert!(matches!(
            FetchError::from_status(StatusCode::NOT_FOUND, "x"),
            FetchError::NotFound(_)
        ));
        assert!(matches!(
            FetchError::from_status(StatusCode::BAD_GATEWAY, "x"),
            FetchError::Server(502)
        ));
        assert!(!FetchError::from_status(StatusCode::TOO_MANY_REQUESTS, "x").is_fatal());
    }

    #[test]
    fn test_only_auth_is_fatal() {
        assert!(!FetchError::Timeout(5).is_fatal());
        assert!(!FetchError::NoUsageData.is_fatal());
        assert!(!FetchError::InvalidResponse("bad".into()).is_fatal());
    }
}
