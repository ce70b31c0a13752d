//! Fetch context providing access to host APIs.
//!
//! The fetch context is shared by every strategy of a run. It bundles the
//! HTTP client, the credential resolver, the per-attempt settings and the
//! run-wide cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::host::{credentials::CredentialResolver, http::HttpClient};

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Upper bound for a single strategy attempt.
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to fetch strategies, giving access to host APIs.
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Credential lookup shared by all providers.
    pub credentials: Arc<CredentialResolver>,
    /// Fetch settings.
    pub settings: FetchSettings,
    cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a new fetch context with default host API implementations.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the effective timeout for a single attempt.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// Returns the run-wide cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns true once the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels the run. In-flight attempts are abandoned.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    credentials: Option<Arc<CredentialResolver>>,
    settings: FetchSettings,
    cancel: Option<CancellationToken>,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            http: None,
            credentials: None,
            settings: FetchSettings::default(),
            cancel: None,
        }
    }

    /// Sets the HTTP client.
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the credential resolver.
    pub fn credentials(mut self, credentials: Arc<CredentialResolver>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the fetch settings.
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Uses an externally owned cancellation token (e.g. wired to Ctrl-C).
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        FetchContext {
            http: self.http.unwrap_or_else(|| Arc::new(HttpClient::new())),
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(CredentialResolver::new())),
            settings: self.settings,
            cancel: self.cancel.unwrap_or_default(),
        }
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = FetchContext::builder()
            .timeout(Duration::from_secs(60))
            .build();

        assert_eq!(ctx.settings.timeout, Duration::from_secs(60));
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_default_timeout() {
        let ctx = FetchContext::new();
        assert_eq!(ctx.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_shared_cancel_token() {
        let token = CancellationToken::new();
        let ctx = FetchContext::builder().cancel_token(token.clone()).build();

        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
