//! z.ai fetch strategies.

use async_trait::async_trait;
use meterbar_core::UsageSnapshot;
use meterbar_fetch::host::http::bearer_headers;
use meterbar_fetch::{FetchContext, FetchError, FetchKind, FetchResult, FetchStrategy};
use tracing::instrument;

use super::api::{USAGE_URL, ZaiUsageResponse};
use super::credentials;

/// z.ai API key strategy.
#[derive(Debug, Default)]
pub struct ZaiApiStrategy;

impl ZaiApiStrategy {
    /// Creates a new API strategy.
    pub fn new() -> Self {
        Self
    }

    async fn fetch_usage(&self, ctx: &FetchContext) -> Result<UsageSnapshot, FetchError> {
        let credential = ctx
            .credentials
            .load(&credentials::API_KEY)
            .await
            .ok_or_else(|| FetchError::MissingCredential("z.ai API key".to_string()))?;
        let headers = bearer_headers(credential.secret())
            .ok_or_else(|| FetchError::AuthenticationFailed("API key is not a valid header".to_string()))?;

        let response: ZaiUsageResponse = ctx.http.get_json(USAGE_URL, headers).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl FetchStrategy for ZaiApiStrategy {
    fn id(&self) -> &str {
        "zai.api"
    }

    fn kind(&self) -> FetchKind {
        FetchKind::ApiKey
    }

    async fn is_available(&self, ctx: &FetchContext) -> bool {
        ctx.credentials.probe(&credentials::API_KEY).await.present
    }

    #[instrument(skip(self, ctx))]
    async fn fetch(&self, ctx: &FetchContext) -> FetchResult {
        self.fetch_usage(ctx).await.into()
    }
}
