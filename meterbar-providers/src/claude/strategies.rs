//! Claude fetch strategies.
//!
//! 1. **OAuth Strategy** - token from env, stored file or the Claude CLI
//! 2. **Web Strategy** - claude.ai session key

use async_trait::async_trait;
use meterbar_core::UsageSnapshot;
use meterbar_fetch::host::http::{bearer_headers, cookie_headers};
use meterbar_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use reqwest::header::HeaderValue;
use tracing::{debug, instrument};

use super::api::{OAUTH_BETA, USAGE_URL, UsageApiResponse};
use super::credentials;
use super::web::{ORGANIZATIONS_URL, WebOrganization, WebUsageResponse, cookie_value, usage_url};

// ============================================================================
// OAuth Strategy (Highest Priority)
// ============================================================================

/// Claude OAuth strategy.
#[derive(Debug, Default)]
pub struct ClaudeOAuthStrategy;

impl ClaudeOAuthStrategy {
    /// Creates a new OAuth strategy.
    pub fn new() -> Self {
        Self
    }

    async fn fetch_usage(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let credential = ctx
            .credentials
            .load(&credentials::OAUTH)
            .await
            .ok_or_else(|| FetchError::MissingCredential("Claude OAuth token".to_string()))?;

        let mut headers = bearer_headers(credential.secret())
            .ok_or_else(|| FetchError::AuthenticationFailed("OAuth token is not a valid header".to_string()))?;
        headers.insert("anthropic-beta", HeaderValue::from_static(OAUTH_BETA));

        let response: UsageApiResponse = ctx.http.get_json(USAGE_URL, headers).await?;
        debug!(
            five_hour = response.five_hour.is_some(),
            seven_day = response.seven_day.is_some(),
            "Claude OAuth usage received"
        );
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl FetchStrategy for ClaudeOAuthStrategy {
    fn id(&self) -> &str {
        "claude.oauth"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::OAuth
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.probe(&credentials::OAUTH).await.present
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> FetchResult {
        self.fetch_usage(ctx).await.into()
    }
}

// ============================================================================
// Web Strategy
// ============================================================================

/// Claude web strategy using a claude.ai session key.
#[derive(Debug, Default)]
pub struct ClaudeWebStrategy;

impl ClaudeWebStrategy {
    /// Creates a new web strategy.
    pub fn new() -> Self {
        Self
    }

    async fn fetch_usage(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let credential = ctx
            .credentials
            .load(&credentials::SESSION)
            .await
            .ok_or_else(|| FetchError::MissingCredential("claude.ai session key".to_string()))?;

        let cookie = cookie_value(credential.secret());
        let headers = cookie_headers(&cookie)
            .ok_or_else(|| FetchError::AuthenticationFailed("session key is not a valid cookie".to_string()))?;

        let orgs: Vec<WebOrganization> = ctx.http.get_json(ORGANIZATIONS_URL, headers.clone()).await?;
        let org = orgs
            .first()
            .ok_or_else(|| FetchError::NotFound("no organization for this session".to_string()))?;
        debug!(org = %org.uuid, "Using claude.ai organization");

        let response: WebUsageResponse = ctx.http.get_json(&usage_url(&org.uuid), headers).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl FetchStrategy for ClaudeWebStrategy {
    fn id(&self) -> &str {
        "claude.web"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::WebSession
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.probe(&credentials::SESSION).await.present
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> FetchResult {
        self.fetch_usage(ctx).await.into()
    }
}

// ============================================================================
// Tests
// ============================================================================
