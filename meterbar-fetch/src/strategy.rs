//! Fetch strategy trait and types.
//!
//! A strategy represents one method of acquiring usage data from a provider.
//! Providers can have multiple strategies (OAuth token, web session, API key)
//! that are tried in their declared order by the pipeline.

use async_trait::async_trait;
use meterbar_core::UsageSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Fetch Kind
// ============================================================================

/// The kind of acquisition mechanism a strategy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// OAuth token authentication
    OAuth,
    /// API key authentication
    ApiKey,
    /// Web session cookie
    WebSession,
}

impl FetchKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OAuth => "OAuth",
            Self::ApiKey => "API Key",
            Self::WebSession => "Web Session",
        }
    }

    /// Returns the source tag recorded on snapshots and outcomes.
    pub fn source_label(&self) -> &'static str {
        match self {
            Self::OAuth => "oauth",
            Self::ApiKey => "api",
            Self::WebSession => "web",
        }
    }
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Fetch Result
// ============================================================================

/// The result of a single strategy attempt.
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Usage data was fetched and parsed.
    Success(UsageSnapshot),
    /// Recoverable failure; the pipeline tries the next strategy.
    Fail(String),
    /// Unrecoverable failure; the pipeline stops for this provider.
    Fatal(String),
}

impl FetchResult {
    /// Converts a strategy-internal result into the tri-state result.
    ///
    /// Authentication rejections become [`FetchResult::Fatal`], everything
    /// else becomes [`FetchResult::Fail`].
    pub fn from_result(result: Result<UsageSnapshot, FetchError>) -> Self {
        match result {
            Ok(snapshot) => Self::Success(snapshot),
            Err(e) if e.is_fatal() => Self::Fatal(e.to_string()),
            Err(e) => Self::Fail(e.to_string()),
        }
    }

    /// Returns true for [`FetchResult::Fatal`].
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<Result<UsageSnapshot, FetchError>> for FetchResult {
    fn from(result: Result<UsageSnapshot, FetchError>) -> Self {
        Self::from_result(result)
    }
}

// ============================================================================
// Fetch Strategy Trait
// ============================================================================

/// A strategy for fetching usage data from a provider.
///
/// ## Implementing a Strategy
///
/// ```ignore
/// struct ZaiApiStrategy;
///
/// #[async_trait]
/// impl FetchStrategy for ZaiApiStrategy {
///     fn id(&self) -> &str {
///         "zai.api"
///     }
///
///     fn kind(&self) -> FetchKind {
///         FetchKind::ApiKey
///     }
///
///     async fn is_available(&self, ctx: &FetchContext) -> bool {
///         ctx.credentials.probe(&ZAI_API_KEY).await.present
///     }
///
///     async fn fetch(&self, ctx: &FetchContext) -> FetchResult {
///         FetchResult::from_result(self.fetch_usage(ctx).await)
///     }
/// }
/// ```
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Unique identifier for this strategy (e.g., "claude.oauth").
    ///
    /// Format: `{provider}.{method}`
    fn id(&self) -> &str;

    /// The kind of acquisition this strategy uses.
    fn kind(&self) -> FetchKind;

    /// Source tag recorded when this strategy succeeds.
    fn label(&self) -> &str {
        self.kind().source_label()
    }

    /// Human-readable name for this strategy.
    fn display_name(&self) -> String {
        format!("{} ({})", self.id(), self.kind().display_name())
    }

    /// Check if this strategy currently has what it needs to run.
    ///
    /// Must be local-only (credential present, file exists); never performs
    /// network I/O.
    async fn is_available(&self, ctx: &FetchContext) -> bool;

    /// Performs one fetch attempt.
    async fn fetch(&self, ctx: &FetchContext) -> FetchResult;
}

// ============================================================================
// Strategy Info
// ============================================================================

/// Information about a strategy (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy ID.
    pub id: String,
    /// Strategy kind.
    pub kind: FetchKind,
    /// Whether the strategy is available.
    pub available: bool,
}

impl StrategyInfo {
    /// Creates strategy info from a strategy implementation.
    pub async fn from_strategy(strategy: &dyn FetchStrategy, ctx: &FetchContext) -> Self {
        Self {
            id: strategy.id().to_string(),
            kind: strategy.kind(),
            available: strategy.is_available(ctx).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
