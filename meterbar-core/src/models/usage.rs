//! Usage-related types.
//!
//! This module contains types related to usage tracking:
//! - [`UsageSnapshot`] - One provider's usage at a point in time
//! - [`UsagePeriod`] - Individual metered period
//! - [`Overage`] - Spend beyond the plan allowance
//! - [`Identity`] - Account identity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::ProviderKind;
use crate::error::CoreError;

// ============================================================================
// Usage Snapshot
// ============================================================================

/// A snapshot of one provider's usage.
///
/// Periods are ordered as the provider reports them, shortest window first
/// by convention. A snapshot without periods carries no usage information and
/// is never cached or reported as a successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Provider this snapshot belongs to.
    pub provider: ProviderKind,
    /// When the data was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Metered periods.
    #[serde(default)]
    pub periods: Vec<UsagePeriod>,
    /// Overage / extra usage spend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overage: Option<Overage>,
    /// Account identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// Acquisition method that produced the data (e.g. "oauth", "web").
    #[serde(default)]
    pub source: String,
}

impl UsageSnapshot {
    /// Creates a new empty snapshot for a provider.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            fetched_at: Utc::now(),
            periods: Vec::new(),
            overage: None,
            identity: None,
            source: String::new(),
        }
    }

    /// Sets the source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Appends a period.
    pub fn with_period(mut self, period: UsagePeriod) -> Self {
        self.periods.push(period);
        self
    }

    /// Returns true if at least one period is present.
    pub fn has_data(&self) -> bool {
        !self.periods.is_empty()
    }

    /// Returns the highest utilization across all periods.
    pub fn max_utilization(&self) -> u8 {
        self.periods.iter().map(|p| p.utilization).max().unwrap_or(0)
    }

    /// Returns true if any period is approaching its limit (>80%).
    pub fn is_approaching_limit(&self) -> bool {
        self.periods.iter().any(UsagePeriod::is_approaching_limit)
    }

    /// Returns how long ago this snapshot was fetched.
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Finds a period by name.
    pub fn period(&self, name: &str) -> Option<&UsagePeriod> {
        self.periods.iter().find(|p| p.name == name)
    }

    /// Validates the snapshot data.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if any period reports a utilization
    /// above 100 or has an empty name.
    pub fn validate(&self) -> Result<(), CoreError> {
        for period in &self.periods {
            period
                .validate()
                .map_err(|e| CoreError::InvalidData(format!("period '{}': {e}", period.name)))?;
        }
        Ok(())
    }
}

// ============================================================================
// Usage Period
// ============================================================================

/// Kind of period a usage figure is metered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    /// Rolling session window (e.g. 5 hours).
    Session,
    /// Daily quota.
    Daily,
    /// Weekly quota.
    Weekly,
    /// Monthly quota / billing cycle.
    Monthly,
    /// Anything else the provider reports.
    Other,
}

impl PeriodType {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single metered period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePeriod {
    /// Name of the period as shown to the user (e.g. "5h", "Weekly").
    pub name: String,
    /// Integer percent of the allowance used, 0-100.
    pub utilization: u8,
    /// Kind of period.
    pub period_type: PeriodType,
    /// When this period resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl UsagePeriod {
    /// Creates a period from a raw percentage.
    ///
    /// The value is rounded and clamped into 0-100; non-finite input becomes 0.
    pub fn from_percent(name: impl Into<String>, period_type: PeriodType, percent: f64) -> Self {
        Self {
            name: name.into(),
            utilization: clamp_percent(percent),
            period_type,
            resets_at: None,
        }
    }

    /// Creates a period from used/limit counts.
    ///
    /// A zero limit yields 0% utilization.
    pub fn from_counts(name: impl Into<String>, period_type: PeriodType, used: f64, limit: f64) -> Self {
        let percent = if limit > 0.0 { used / limit * 100.0 } else { 0.0 };
        Self::from_percent(name, period_type, percent)
    }

    /// Sets the reset time.
    pub fn resetting_at(mut self, resets_at: Option<DateTime<Utc>>) -> Self {
        self.resets_at = resets_at;
        self
    }

    /// Returns the remaining percentage.
    pub fn remaining(&self) -> u8 {
        100u8.saturating_sub(self.utilization)
    }

    /// Returns true if usage is approaching the limit (>80%).
    pub fn is_approaching_limit(&self) -> bool {
        self.utilization > 80
    }

    /// Returns true if the allowance is exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.utilization >= 100
    }

    /// Returns time until reset, if known.
    pub fn time_until_reset(&self) -> Option<Duration> {
        self.resets_at.map(|reset| reset - Utc::now())
    }

    /// Validates the period.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` when utilization exceeds 100 or the
    /// name is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.utilization > 100 {
            return Err(CoreError::InvalidData(format!(
                "utilization {} out of valid range [0, 100]",
                self.utilization
            )));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidData("period name is empty".to_string()));
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_percent(percent: f64) -> u8 {
    if !percent.is_finite() {
        return 0;
    }
    percent.round().clamp(0.0, 100.0) as u8
}

// ============================================================================
// Overage
// ============================================================================

/// Spend beyond the plan allowance (extra usage, pay-as-you-go).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overage {
    /// Amount used in the current cycle.
    pub used: f64,
    /// Spending limit, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    /// Currency code (e.g. "USD").
    pub currency: String,
    /// Whether overage billing is enabled on the account.
    pub enabled: bool,
}

impl Overage {
    /// Returns usage as a percentage of the limit, if a positive limit is set.
    pub fn percent_of_limit(&self) -> Option<f64> {
        self.limit
            .filter(|limit| *limit > 0.0)
            .map(|limit| self.used / limit * 100.0)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Account identity information.
///
/// Siloed per provider: never mix identity from different providers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account email address or login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Plan/subscription name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl Identity {
    /// Returns true if neither field is set.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.plan.is_none()
    }

    /// Returns a display string for this identity.
    pub fn display_string(&self) -> Option<String> {
        match (&self.email, &self.plan) {
            (Some(email), Some(plan)) => Some(format!("{email} ({plan})")),
            (Some(email), None) => Some(email.clone()),
            (None, Some(plan)) => Some(plan.clone()),
            (None, None) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_percent_clamps() {
        assert_eq!(UsagePeriod::from_percent("s", PeriodType::Session, 150.0).utilization, 100);
        assert_eq!(UsagePeriod::from_percent("s", PeriodType::Session, -3.0).utilization, 0);
        assert_eq!(UsagePeriod::from_percent("s", PeriodType::Session, f64::NAN).utilization, 0);
        assert_eq!(UsagePeriod::from_percent("s", PeriodType::Session, 42.6).utilization, 43);
    }

    #[test]
    fn test_from_counts() {
        let period = UsagePeriod::from_counts("Requests", PeriodType::Monthly, 50.0, 200.0);
        assert_eq!(period.utilization, 25);
        assert_eq!(period.remaining(), 75);

        let zero = UsagePeriod::from_counts("Requests", PeriodType::Monthly, 50.0, 0.0);
        assert_eq!(zero.utilization, 0);
    }

    #[test]
    fn test_snapshot_has_data() {
        let snapshot = UsageSnapshot::new(ProviderKind::Claude);
        assert!(!snapshot.has_data());

        let snapshot = snapshot.with_period(UsagePeriod::from_percent("5h", PeriodType::Session, 10.0));
        assert!(snapshot.has_data());
    }

    #[test]
    fn test_max_utilization_and_limit() {
        let snapshot = UsageSnapshot::new(ProviderKind::Claude)
            .with_period(UsagePeriod::from_percent("5h", PeriodType::Session, 50.0))
            .with_period(UsagePeriod::from_percent("Weekly", PeriodType::Weekly, 85.0));

        assert_eq!(snapshot.max_utilization(), 85);
        assert!(snapshot.is_approaching_limit());
        assert_eq!(snapshot.period("Weekly").map(|p| p.utilization), Some(85));
    }

    #[test]
    fn test_validate_rejects_bad_period() {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Zai)
            .with_period(UsagePeriod::from_percent("Monthly", PeriodType::Monthly, 10.0));
        assert!(snapshot.validate().is_ok());

        snapshot.periods[0].utilization = 140;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_overage_percent() {
        let overage = Overage {
            used: 25.0,
            limit: Some(100.0),
            currency: "USD".to_string(),
            enabled: true,
        };
        assert_eq!(overage.percent_of_limit(), Some(25.0));

        let unlimited = Overage { limit: None, ..overage };
        assert_eq!(unlimited.percent_of_limit(), None);
    }

    #[test]
    fn test_identity_display() {
        let identity = Identity {
            email: Some("me@example.com".to_string()),
            plan: Some("pro".to_string()),
        };
        assert_eq!(identity.display_string().as_deref(), Some("me@example.com (pro)"));
        assert!(Identity::default().is_empty());
    }
}
