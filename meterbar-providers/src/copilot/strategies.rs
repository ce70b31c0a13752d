//! Copilot fetch strategies.

use async_trait::async_trait;
use meterbar_core::UsageSnapshot;
use meterbar_fetch::host::http::bearer_headers;
use meterbar_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use tracing::{debug, instrument};

use super::api::{COPILOT_USER_ENDPOINT, CopilotUserResponse, GITHUB_API_BASE, add_github_headers};
use super::credentials;

// ============================================================================
// API Strategy
// ============================================================================

/// Copilot strategy using a GitHub token.
#[derive(Debug, Default)]
pub struct CopilotApiStrategy;

impl CopilotApiStrategy {
    /// Creates a new API strategy.
    pub fn new() -> Self {
        Self
    }

    async fn fetch_usage(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let credential = ctx
            .credentials
            .load(&credentials::OAUTH)
            .await
            .ok_or_else(|| FetchError::MissingCredential("GitHub token".to_string()))?;
        debug!(source = credential.source.label(), "Using GitHub token");

        let mut headers = bearer_headers(credential.secret())
            .ok_or_else(|| FetchError::AuthenticationFailed("GitHub token is not a valid header".to_string()))?;
        add_github_headers(&mut headers);

        let url = format!("{GITHUB_API_BASE}{COPILOT_USER_ENDPOINT}");
        let response: CopilotUserResponse = ctx.http.get_json(&url, headers).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl FetchStrategy for CopilotApiStrategy {
    fn id(&self) -> &str {
        "copilot.api"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::OAuth
    }

    fn label(&self) -> &str {
        "api"
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.probe(&credentials::OAUTH).await.present
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> FetchResult {
        self.fetch_usage(ctx).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use meterbar_fetch::CredentialResolver;

    fn resolver(dir: &std::path::Path) -> CredentialResolver {
        CredentialResolver::new()
            .with_root(dir.join("root"))
            .with_home(dir.join("home"))
            .with_env_vars(HashMap::new())
    }

    #[tokio::test]
    async fn test_available_from_gh_hosts_file() {
        let dir = tempfile::tempdir().unwrap();
        let gh_dir = dir.path().join("home/.config/gh");
        std::fs::create_dir_all(&gh_dir).unwrap();
        std::fs::write(
            gh_dir.join("hosts.yml"),
            "github.com:\n    user: octocat\n    oauth_token: gho_abc\n    git_protocol: https\n",
        )
        .unwrap();

        let ctx = FetchContext::builder()
            .credentials(Arc::new(resolver(dir.path())))
            .build();
        assert!(CopilotApiStrategy::new().is_available(&ctx).await);
    }

    #[tokio::test]
    async fn test_unavailable_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = FetchContext::builder()
            .credentials(Arc::new(resolver(dir.path())))
            .build();
        assert!(!CopilotApiStrategy::new().is_available(&ctx).await);
    }

    #[test]
    fn test_label() {
        let strategy = CopilotApiStrategy::new();
        assert_eq!(strategy.id(), "copilot.api");
        assert_eq!(strategy.label(), "api");
    }
}
