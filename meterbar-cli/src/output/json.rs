//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use meterbar_core::{CacheEntry, Identity, Overage, UsagePeriod};
use meterbar_fetch::{Attempt, CredentialProbe, CredentialSpec, FetchOutcome, RunResults, RunSummary, StrategyInfo};
use meterbar_providers::ProviderDescriptor;
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for a whole usage run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub summary: &'static str,
    pub providers: Vec<ProviderOutput>,
}

/// JSON output for a single provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput {
    pub provider: String,
    pub success: bool,
    pub source: String,
    pub cached: bool,
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_reauth: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not_configured: bool,
    pub duration_ms: u64,
    pub attempts: Vec<AttemptOutput>,
}

/// Usage periods and account details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub periods: Vec<PeriodOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overage: Option<OverageOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityOutput>,
    #[serde(serialize_with = "serialize_datetime")]
    pub fetched_at: DateTime<Utc>,
}

/// A single usage period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodOutput {
    pub name: String,
    pub period_type: &'static str,
    pub used_percent: u8,
    pub remaining_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub resets_at: Option<DateTime<Utc>>,
}

/// Extra usage beyond the plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverageOutput {
    pub used: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    pub currency: String,
    pub enabled: bool,
}

/// Identity info.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// One strategy attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput {
    pub strategy: String,
    pub kind: &'static str,
    pub result: &'static str,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One cache entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntryOutput {
    pub provider: String,
    pub freshness: &'static str,
    pub age_seconds: i64,
    #[serde(serialize_with = "serialize_datetime")]
    pub fetched_at: DateTime<Utc>,
    pub usage: UsageOutput,
}

/// One credential presence check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialOutput {
    pub provider: String,
    pub kind: &'static str,
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

/// Provider info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfoOutput {
    pub id: String,
    pub display_name: String,
    pub enabled: bool,
    pub strategies: Vec<StrategyInfo>,
    pub credential_kinds: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<&'static str>,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Conversions
// ============================================================================

impl From<&UsagePeriod> for PeriodOutput {
    fn from(period: &UsagePeriod) -> Self {
        Self {
            name: period.name.clone(),
            period_type: period.period_type.label(),
            used_percent: period.utilization,
            remaining_percent: period.remaining(),
            resets_at: period.resets_at,
        }
    }
}

impl From<&Overage> for OverageOutput {
    fn from(overage: &Overage) -> Self {
        Self {
            used: overage.used,
            limit: overage.limit,
            currency: overage.currency.clone(),
            enabled: overage.enabled,
        }
    }
}

impl From<&Identity> for IdentityOutput {
    fn from(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            plan: identity.plan.clone(),
        }
    }
}

impl From<&meterbar_core::UsageSnapshot> for UsageOutput {
    fn from(snapshot: &meterbar_core::UsageSnapshot) -> Self {
        Self {
            periods: snapshot.periods.iter().map(PeriodOutput::from).collect(),
            overage: snapshot.overage.as_ref().map(OverageOutput::from),
            identity: snapshot.identity.as_ref().map(IdentityOutput::from),
            fetched_at: snapshot.fetched_at,
        }
    }
}

impl From<&Attempt> for AttemptOutput {
    fn from(attempt: &Attempt) -> Self {
        Self {
            strategy: attempt.strategy.clone(),
            kind: attempt.kind.source_label(),
            result: attempt.classification.label(),
            duration_ms: millis(attempt.duration),
            message: attempt.message.clone(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a usage run.
    pub fn format_results(&self, results: &RunResults, threshold: Duration) -> Result<String> {
        let output = RunOutput {
            summary: RunSummary::from_results(results).label(),
            providers: results
                .values()
                .map(|outcome| Self::outcome_to_output(outcome, threshold))
                .collect(),
        };
        self.format(&output)
    }

    /// Converts an outcome to output.
    pub fn outcome_to_output(outcome: &FetchOutcome, threshold: Duration) -> ProviderOutput {
        ProviderOutput {
            provider: outcome.provider.cli_name().to_string(),
            success: outcome.success,
            source: outcome.source.clone(),
            cached: outcome.cached,
            stale: outcome.is_stale(threshold),
            cache_age_seconds: outcome.cache_age.map(|age| age.num_seconds()),
            cache_warning: outcome.cache_warning.clone(),
            usage: outcome
                .snapshot
                .as_ref()
                .filter(|_| outcome.success)
                .map(UsageOutput::from),
            error: outcome.error.clone(),
            needs_reauth: outcome.needs_reauth(),
            not_configured: outcome.is_unconfigured(),
            duration_ms: millis(outcome.duration),
            attempts: outcome.attempts.iter().map(AttemptOutput::from).collect(),
        }
    }

    /// Formats cache entries.
    pub fn format_cache_entries(&self, entries: &[CacheEntry], threshold: Duration) -> Result<String> {
        let outputs: Vec<CacheEntryOutput> = entries
            .iter()
            .map(|entry| CacheEntryOutput {
                provider: entry.snapshot.provider.cli_name().to_string(),
                freshness: entry.freshness(threshold).label(),
                age_seconds: entry.age().num_seconds(),
                fetched_at: entry.fetched_at,
                usage: UsageOutput::from(&entry.snapshot),
            })
            .collect();
        self.format(&outputs)
    }

    /// Formats credential presence checks.
    pub fn format_credentials(&self, checks: &[(&ProviderDescriptor, &CredentialSpec, CredentialProbe)]) -> Result<String> {
        let outputs: Vec<CredentialOutput> = checks
            .iter()
            .map(|(desc, spec, probe)| CredentialOutput {
                provider: desc.cli_name().to_string(),
                kind: spec.kind.as_str(),
                present: probe.present,
                source: probe.source.map(|s| s.label()),
            })
            .collect();
        self.format(&outputs)
    }

    /// Formats provider list.
    pub fn format_providers(&self, providers: &[ProviderInfoOutput]) -> Result<String> {
        self.format(&providers)
    }
}

impl ProviderInfoOutput {
    /// Builds provider info from a descriptor.
    pub fn new(desc: &ProviderDescriptor, enabled: bool, strategies: Vec<StrategyInfo>) -> Self {
        Self {
            id: desc.cli_name().to_string(),
            display_name: desc.display_name().to_string(),
            enabled,
            strategies,
            credential_kinds: desc.credentials.iter().map(|spec| spec.kind.as_str()).collect(),
            dashboard_url: desc.dashboard_url,
        }
    }
}
