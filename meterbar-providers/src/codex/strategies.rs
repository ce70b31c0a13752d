//! Codex fetch strategies.

use async_trait::async_trait;
use meterbar_core::{Identity, UsageSnapshot};
use meterbar_fetch::host::http::bearer_headers;
use meterbar_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use reqwest::header::HeaderValue;
use tracing::{debug, instrument};

use super::api::{CodexUsageResponse, USAGE_URL};
use super::auth::decode_jwt_payload;
use super::credentials;

// ============================================================================
// OAuth Strategy
// ============================================================================

/// Codex strategy using the ChatGPT login shared with the Codex CLI.
#[derive(Debug, Default)]
pub struct CodexOAuthStrategy;

impl CodexOAuthStrategy {
    /// Creates a new OAuth strategy.
    pub fn new() -> Self {
        Self
    }

    async fn fetch_usage(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let credential = ctx
            .credentials
            .load(&credentials::OAUTH)
            .await
            .ok_or_else(|| FetchError::MissingCredential("Codex access token".to_string()))?;

        let mut headers = bearer_headers(credential.secret())
            .ok_or_else(|| FetchError::AuthenticationFailed("access token is not a valid header".to_string()))?;
        if let Some(account) = ctx.credentials.load(&credentials::ACCOUNT_ID).await {
            if let Ok(value) = HeaderValue::from_str(account.secret()) {
                headers.insert("chatgpt-account-id", value);
            }
        }

        let response: CodexUsageResponse = ctx.http.get_json(USAGE_URL, headers).await?;
        let mut snapshot = response.to_snapshot();
        merge_identity(&mut snapshot, id_token_identity(ctx).await);
        Ok(snapshot)
    }
}

/// Identity from the CLI's ID token. Any decoding problem just means no identity.
async fn id_token_identity(ctx: &FetchContext) -> Option<Identity> {
    let token = ctx.credentials.load(&credentials::ID_TOKEN).await?;
    match decode_jwt_payload(token.secret()) {
        Ok(payload) => payload.identity(),
        Err(e) => {
            debug!(error = %e, "Ignoring undecodable Codex ID token");
            None
        }
    }
}

fn merge_identity(snapshot: &mut UsageSnapshot, extra: Option<Identity>) {
    let Some(extra) = extra else {
        return;
    };
    let identity = snapshot.identity.get_or_insert_with(Identity::default);
    if identity.email.is_none() {
        identity.email = extra.email;
    }
    if identity.plan.is_none() {
        identity.plan = extra.plan;
    }
}

#[async_trait]
impl FetchStrategy for CodexOAuthStrategy {
    fn id(&self) -> &str {
        "codex.oauth"
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
// Tests
// ============================================================================
