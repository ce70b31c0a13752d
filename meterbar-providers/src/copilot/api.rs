//! GitHub Copilot quota API.
//!
//! ```json
//! {
//!   "copilot_plan": "individual",
//!   "quota_reset_date": "2025-02-01",
//!   "quota_snapshots": {
//!     "premium_interactions": { "entitlement": 300, "remaining": 250, "percent_remaining": 83.3, "unlimited": false },
//!     "chat": { "unlimited": true }
//!   }
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use meterbar_core::{Identity, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;

/// GitHub API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Copilot quota endpoint.
pub const COPILOT_USER_ENDPOINT: &str = "/copilot_internal/user";

/// GitHub API version header.
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Editor identification expected by the Copilot endpoints.
const EDITOR_VERSION: &str = "vscode/1.96.2";

/// Adds the GitHub-specific headers to an authenticated header map.
pub fn add_github_headers(headers: &mut HeaderMap) {
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert("x-github-api-version", HeaderValue::from_static(GITHUB_API_VERSION));
    headers.insert("editor-version", HeaderValue::from_static(EDITOR_VERSION));
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response from the Copilot user endpoint.
#[derive(Debug, Deserialize)]
pub struct CopilotUserResponse {
    /// Plan (e.g. "individual", "business").
    #[serde(default)]
    pub copilot_plan: Option<String>,
    /// Date the monthly quotas reset (YYYY-MM-DD).
    #[serde(default)]
    pub quota_reset_date: Option<String>,
    /// Per-feature quotas.
    #[serde(default)]
    pub quota_snapshots: Option<QuotaSnapshots>,
}

/// Per-feature quotas.
#[derive(Debug, Deserialize)]
pub struct QuotaSnapshots {
    /// Premium model requests.
    #[serde(default)]
    pub premium_interactions: Option<Quota>,
    /// Chat messages.
    #[serde(default)]
    pub chat: Option<Quota>,
    /// Code completions.
    #[serde(default)]
    pub completions: Option<Quota>,
}

/// One quota.
#[derive(Debug, Deserialize)]
pub struct Quota {
    /// Allowed count for the month.
    #[serde(default)]
    pub entitlement: Option<f64>,
    /// Remaining count.
    #[serde(default)]
    pub remaining: Option<f64>,
    /// Remaining percentage.
    #[serde(default)]
    pub percent_remaining: Option<f64>,
    /// Whether the quota is unlimited.
    #[serde(default)]
    pub unlimited: bool,
}

impl Quota {
    fn to_period(&self, name: &str, resets_at: Option<DateTime<Utc>>) -> Option<UsagePeriod> {
        if self.unlimited {
            return None;
        }
        let period = match (self.percent_remaining, self.entitlement, self.remaining) {
            (Some(pct), _, _) => UsagePeriod::from_percent(name, PeriodType::Monthly, 100.0 - pct),
            (None, Some(limit), Some(remaining)) => {
                UsagePeriod::from_counts(name, PeriodType::Monthly, limit - remaining, limit)
            }
            _ => return None,
        };
        Some(period.resetting_at(resets_at))
    }
}

impl CopilotUserResponse {
    /// Converts to a snapshot. Unlimited quotas produce no period.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Copilot);
        let resets_at = self.quota_reset_date.as_deref().and_then(parse_reset_date);

        if let Some(quotas) = &self.quota_snapshots {
            let entries = [
                (&quotas.premium_interactions, "Premium requests"),
                (&quotas.chat, "Chat"),
                (&quotas.completions, "Completions"),
            ];
            for (quota, name) in entries {
                if let Some(period) = quota.as_ref().and_then(|q| q.to_period(name, resets_at)) {
                    snapshot.periods.push(period);
                }
            }
        }

        if let Some(plan) = &self.copilot_plan {
            snapshot.identity = Some(Identity {
                email: None,
                plan: Some(plan.clone()),
            });
        }
        snapshot
    }
}

/// Accepts a bare date (midnight UTC) or a full RFC 3339 timestamp.
fn parse_reset_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Tests
// ============================================================================
