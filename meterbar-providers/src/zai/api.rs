//! z.ai usage API.

use chrono::{DateTime, Utc};
use meterbar_core::{Identity, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use serde::Deserialize;

/// Usage endpoint.
pub const USAGE_URL: &str = "https://api.z.ai/v1/usage";

// ============================================================================
// API Response Types
// ============================================================================

/// Response from z.ai usage API.
///
/// Older accounts report flat token/credit counters; newer ones nest a
/// request counter under `usage`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZaiUsageResponse {
    /// Tokens used.
    #[serde(default, alias = "tokens_used")]
    pub tokens_used: Option<u64>,
    /// Token limit.
    #[serde(default, alias = "token_limit")]
    pub token_limit: Option<u64>,
    /// Credits used.
    #[serde(default, alias = "credits_used")]
    pub credits_used: Option<f64>,
    /// Credit limit.
    #[serde(default, alias = "credit_limit")]
    pub credit_limit: Option<f64>,
    /// Request counter.
    #[serde(default)]
    pub usage: Option<ZaiRequests>,
    /// Reset time.
    #[serde(default, alias = "reset_at")]
    pub reset_at: Option<String>,
    /// Plan name.
    #[serde(default)]
    pub plan: Option<String>,
    /// Account info.
    #[serde(default)]
    pub account: Option<ZaiAccount>,
}

/// Request counter.
#[derive(Debug, Deserialize)]
pub struct ZaiRequests {
    /// Requests made.
    pub requests: u64,
    /// Request limit.
    pub limit: u64,
}

/// Account info.
#[derive(Debug, Deserialize)]
pub struct ZaiAccount {
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Plan name.
    #[serde(default)]
    pub plan: Option<String>,
}

impl ZaiUsageResponse {
    /// Returns (used, limit) from the first counter with a positive limit.
    ///
    /// Credits win over tokens, tokens over requests.
    #[allow(clippy::cast_precision_loss)]
    pub fn counters(&self) -> Option<(f64, f64)> {
        if let (Some(used), Some(limit)) = (self.credits_used, self.credit_limit) {
            if limit > 0.0 {
                return Some((used, limit));
            }
        }
        if let (Some(used), Some(limit)) = (self.tokens_used, self.token_limit) {
            if limit > 0 {
                return Some((used as f64, limit as f64));
            }
        }
        let requests = self.usage.as_ref()?;
        (requests.limit > 0).then_some((requests.requests as f64, requests.limit as f64))
    }

    /// Convert to a snapshot.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Zai);

        if let Some((used, limit)) = self.counters() {
            let resets_at = self.reset_at.as_deref().and_then(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            });
            snapshot.periods.push(
                UsagePeriod::from_counts("Monthly", PeriodType::Monthly, used, limit).resetting_at(resets_at),
            );
        }

        let identity = Identity {
            email: self.account.as_ref().and_then(|a| a.email.clone()),
            plan: self
                .plan
                .clone()
                .or_else(|| self.account.as_ref().and_then(|a| a.plan.clone())),
        };
        if !identity.is_empty() {
            snapshot.identity = Some(identity);
        }

        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================
