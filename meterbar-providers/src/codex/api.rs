//! ChatGPT usage endpoint used by Codex.
//!
//! ```json
//! {
//!   "plan_type": "plus",
//!   "rate_limit": {
//!     "primary_window": { "used_percent": 12, "limit_window_seconds": 18000, "reset_at": 1735000000 },
//!     "secondary_window": { "used_percent": 40, "limit_window_seconds": 604800, "reset_at": 1735500000 }
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use meterbar_core::{Identity, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use serde::Deserialize;

/// Usage endpoint.
pub const USAGE_URL: &str = "https://chatgpt.com/backend-api/wham/usage";

const DAY_SECONDS: u64 = 24 * 60 * 60;

// ============================================================================
// Response Types
// ============================================================================

/// Usage response.
#[derive(Debug, Deserialize)]
pub struct CodexUsageResponse {
    /// ChatGPT plan.
    #[serde(default)]
    pub plan_type: Option<String>,
    /// Rate limit windows.
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

/// Rate limit windows.
#[derive(Debug, Deserialize)]
pub struct RateLimit {
    /// Short rolling window.
    #[serde(default)]
    pub primary_window: Option<RateWindow>,
    /// Long rolling window.
    #[serde(default)]
    pub secondary_window: Option<RateWindow>,
}

/// One rate limit window.
#[derive(Debug, Deserialize)]
pub struct RateWindow {
    /// Usage percentage (0-100).
    pub used_percent: f64,
    /// Window length.
    #[serde(default)]
    pub limit_window_seconds: Option<u64>,
    /// Reset time, seconds since epoch.
    #[serde(default)]
    pub reset_at: Option<i64>,
}

impl RateWindow {
    fn period_type(&self) -> PeriodType {
        match self.limit_window_seconds {
            Some(secs) if secs < DAY_SECONDS => PeriodType::Session,
            Some(secs) if secs == DAY_SECONDS => PeriodType::Daily,
            Some(secs) if secs <= 7 * DAY_SECONDS => PeriodType::Weekly,
            Some(_) => PeriodType::Monthly,
            None => PeriodType::Other,
        }
    }

    fn to_period(&self, fallback_name: &str) -> UsagePeriod {
        let period_type = self.period_type();
        let name = match period_type {
            PeriodType::Session => "Session",
            PeriodType::Daily => "Daily",
            PeriodType::Weekly => "Weekly",
            PeriodType::Monthly => "Monthly",
            PeriodType::Other => fallback_name,
        };
        let resets_at = self
            .reset_at
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
        UsagePeriod::from_percent(name, period_type, self.used_percent).resetting_at(resets_at)
    }
}

impl CodexUsageResponse {
    /// Converts to a snapshot.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Codex);
        if let Some(limits) = &self.rate_limit {
            if let Some(window) = &limits.primary_window {
                snapshot.periods.push(window.to_period("Primary"));
            }
            if let Some(window) = &limits.secondary_window {
                snapshot.periods.push(window.to_period("Secondary"));
            }
        }
        if let Some(plan) = &self.plan_type {
            snapshot.identity = Some(Identity {
                email: None,
                plan: Some(plan.clone()),
            });
        }
        snapshot
    }
}
