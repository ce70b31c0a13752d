//! claude.ai web usage endpoints, authenticated with the browser session key.

use meterbar_core::{Identity, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use serde::Deserialize;

use super::api::parse_timestamp;

/// Lists the organizations the session belongs to.
pub const ORGANIZATIONS_URL: &str = "https://claude.ai/api/organizations";

/// Cookie name carrying the session key.
pub const SESSION_COOKIE: &str = "sessionKey";

/// Usage endpoint for one organization.
pub fn usage_url(org_id: &str) -> String {
    format!("{ORGANIZATIONS_URL}/{org_id}/usage")
}

/// Builds the cookie header value for a stored secret.
///
/// A secret that already looks like a cookie string (`name=value`) is sent
/// unchanged; a bare key is wrapped as `sessionKey=<key>`.
pub fn cookie_value(secret: &str) -> String {
    if secret.contains('=') {
        secret.to_string()
    } else {
        format!("{SESSION_COOKIE}={secret}")
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Entry in the organizations list.
#[derive(Debug, Deserialize)]
pub struct WebOrganization {
    /// Organization id.
    #[serde(alias = "id")]
    pub uuid: String,
}

/// Response from the web usage endpoint.
#[derive(Debug, Deserialize)]
pub struct WebUsageResponse {
    /// Rolling 5-hour window.
    #[serde(default, alias = "session")]
    pub five_hour: Option<WebUsageWindow>,
    /// Rolling 7-day window.
    #[serde(default, alias = "weekly")]
    pub seven_day: Option<WebUsageWindow>,
    /// 7-day Opus window.
    #[serde(default, alias = "opus")]
    pub seven_day_opus: Option<WebUsageWindow>,
    /// Logged-in user.
    #[serde(default)]
    pub user: Option<WebUser>,
}

/// Window from the web usage endpoint.
#[derive(Debug, Deserialize)]
pub struct WebUsageWindow {
    /// Utilization percentage.
    #[serde(default, alias = "usedPercent", alias = "used_percent")]
    pub utilization: Option<f64>,
    /// Remaining percentage.
    #[serde(default, alias = "remainingPercent")]
    pub remaining_percent: Option<f64>,
    /// Reset timestamp.
    #[serde(default, alias = "resetsAt")]
    pub resets_at: Option<String>,
}

/// User info from the web usage endpoint.
#[derive(Debug, Deserialize)]
pub struct WebUser {
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl WebUsageWindow {
    fn to_period(&self, name: &str, period_type: PeriodType) -> Option<UsagePeriod> {
        let percent = self
            .utilization
            .or_else(|| self.remaining_percent.map(|r| 100.0 - r))?;
        let resets_at = self.resets_at.as_deref().and_then(parse_timestamp);
        Some(UsagePeriod::from_percent(name, period_type, percent).resetting_at(resets_at))
    }
}

impl WebUsageResponse {
    /// Converts to a snapshot.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Claude);
        let windows = [
            (&self.five_hour, "Session", PeriodType::Session),
            (&self.seven_day, "Weekly", PeriodType::Weekly),
            (&self.seven_day_opus, "Weekly (Opus)", PeriodType::Weekly),
        ];
        for (window, name, period_type) in windows {
            if let Some(period) = window.as_ref().and_then(|w| w.to_period(name, period_type)) {
                snapshot.periods.push(period);
            }
        }
        if let Some(email) = self.user.as_ref().and_then(|u| u.email.clone()) {
            snapshot.identity = Some(Identity {
                email: Some(email),
                plan: None,
            });
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        assert_eq!(cookie_value("sk-ant-sid01-abc"), "sessionKey=sk-ant-sid01-abc");
        assert_eq!(cookie_value("sessionKey=abc; other=1"), "sessionKey=abc; other=1");
    }

    #[test]
    fn test_usage_url() {
        assert_eq!(
            usage_url("org-1"),
            "https://claude.ai/api/organizations/org-1/usage"
        );
    }

    #[test]
    fn test_parse_web_usage() {
        let json = r#"{
            "five_hour": { "utilization": 12.0, "resets_at": "2025-01-01T12:00:00Z" },
            "seven_day": { "utilization": 40.0 },
            "seven_day_opus": null
        }"#;
        let response: WebUsageResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot();
        assert_eq!(snapshot.periods.len(), 2);
        assert_eq!(snapshot.periods[0].period_type, PeriodType::Session);
        assert!(snapshot.periods[0].resets_at.is_some());
    }

    #[test]
    fn test_parse_legacy_web_shape() {
        let json = r#"{
            "session": { "remainingPercent": 70 },
            "user": { "email": "me@example.com" }
        }"#;
        let response: WebUsageResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.to_snapshot();
        assert_eq!(snapshot.periods[0].utilization, 30);
        assert_eq!(snapshot.identity.unwrap().email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_parse_organizations() {
        let json = r#"[{"uuid": "abc", "name": "Personal"}, {"id": "def"}]"#;
        let orgs: Vec<WebOrganization> = serde_json::from_str(json).unwrap();
        assert_eq!(orgs[0].uuid, "abc");
        assert_eq!(orgs[1].uuid, "def");
    }
}
