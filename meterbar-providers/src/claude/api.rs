//! Claude OAuth usage API.
//!
//! The endpoint returns one object per rolling window:
//!
//! ```json
//! {
//!   "fiveHour": { "utilization": 25.5, "resetsAt": "2025-01-01T12:00:00Z" },
//!   "sevenDay": { "utilization": 45.0, "resetsAt": "2025-01-05T00:00:00Z" },
//!   "sevenDaySonnet": { "utilization": 30.0 },
//!   "extraUsage": { "isEnabled": true, "usedCredits": 500, "monthlyLimit": 10000, "currency": "USD" },
//!   "account": { "email": "user@example.com", "plan": "pro" }
//! }
//! ```
//!
//! Snake-case field names are accepted as well.

use chrono::{DateTime, Utc};
use meterbar_core::{Identity, Overage, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use serde::Deserialize;

/// OAuth usage endpoint.
pub const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Beta header value required by the OAuth usage endpoint.
pub const OAUTH_BETA: &str = "oauth-2025-04-20";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the usage API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageApiResponse {
    /// 5-hour usage window.
    #[serde(default, alias = "five_hour")]
    pub five_hour: Option<UsageWindow>,
    /// 7-day usage window (all models).
    #[serde(default, alias = "seven_day")]
    pub seven_day: Option<UsageWindow>,
    /// 7-day Opus usage window.
    #[serde(default, alias = "seven_day_opus")]
    pub seven_day_opus: Option<UsageWindow>,
    /// 7-day Sonnet usage window.
    #[serde(default, alias = "seven_day_sonnet")]
    pub seven_day_sonnet: Option<UsageWindow>,
    /// Extra usage/credits info.
    #[serde(default, alias = "extra_usage")]
    pub extra_usage: Option<ExtraUsage>,
    /// Account info.
    #[serde(default)]
    pub account: Option<AccountInfo>,
}

/// Individual usage window from API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageWindow {
    /// Utilization percentage (0-100).
    #[serde(default)]
    pub utilization: Option<f64>,
    /// When this window resets (RFC 3339).
    #[serde(default, alias = "resets_at")]
    pub resets_at: Option<String>,
    /// Remaining percentage (alternative field).
    #[serde(default)]
    pub remaining: Option<f64>,
    /// Used percentage (alternative field).
    #[serde(default, alias = "used_percent")]
    pub used_percent: Option<f64>,
}

impl UsageWindow {
    /// Get the used percentage, handling various field names.
    pub fn used_percent(&self) -> Option<f64> {
        self.utilization
            .or(self.used_percent)
            .or_else(|| self.remaining.map(|r| 100.0 - r))
    }

    /// Parse the reset timestamp.
    pub fn resets_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.resets_at.as_deref()?)
    }

    fn to_period(&self, name: &str, period_type: PeriodType) -> Option<UsagePeriod> {
        let percent = self.used_percent()?;
        Some(UsagePeriod::from_percent(name, period_type, percent).resetting_at(self.resets_at()))
    }
}

/// Extra usage/credits information.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraUsage {
    /// Whether extra usage is enabled.
    #[serde(default, alias = "is_enabled")]
    pub is_enabled: Option<bool>,
    /// Credits used this month, in cents.
    #[serde(default, alias = "used_credits")]
    pub used_credits: Option<f64>,
    /// Monthly credit limit, in cents.
    #[serde(default, alias = "monthly_limit")]
    pub monthly_limit: Option<f64>,
    /// Currency (e.g., "USD").
    #[serde(default)]
    pub currency: Option<String>,
}

/// Account information from API.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Plan name.
    #[serde(default)]
    pub plan: Option<String>,
}

// ============================================================================
// Conversion to Core Types
// ============================================================================

impl UsageApiResponse {
    /// Convert to a snapshot. Missing windows are omitted.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Claude);

        let windows = [
            (&self.five_hour, "Session", PeriodType::Session),
            (&self.seven_day, "Weekly", PeriodType::Weekly),
            (&self.seven_day_opus, "Weekly (Opus)", PeriodType::Weekly),
            (&self.seven_day_sonnet, "Weekly (Sonnet)", PeriodType::Weekly),
        ];
        for (window, name, period_type) in windows {
            if let Some(period) = window.as_ref().and_then(|w| w.to_period(name, period_type)) {
                snapshot.periods.push(period);
            }
        }

        if let Some(extra) = &self.extra_usage {
            if let Some(used) = extra.used_credits {
                snapshot.overage = Some(Overage {
                    used: used / 100.0,
                    limit: extra.monthly_limit.map(|l| l / 100.0),
                    currency: extra.currency.clone().unwrap_or_else(|| "USD".to_string()),
                    enabled: extra.is_enabled.unwrap_or(false),
                });
            }
        }

        if let Some(account) = &self.account {
            let identity = Identity {
                email: account.email.clone(),
                plan: account.plan.clone(),
            };
            if !identity.is_empty() {
                snapshot.identity = Some(identity);
            }
        }

        snapshot
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Tests
// ============================================================================
