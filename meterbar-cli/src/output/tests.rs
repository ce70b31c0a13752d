//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

use std::collections::BTreeMap;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use meterbar_core::{CacheEntry, Identity, Overage, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};
use meterbar_fetch::{Attempt, AttemptClass, FetchKind, FetchOutcome, NO_USABLE_STRATEGY, RunResults};
use meterbar_providers::ProviderRegistry;

use super::json::JsonFormatter;
use super::text::{TextFormatter, format_age, format_reset_time};

fn snapshot(provider: ProviderKind) -> UsageSnapshot {
    let mut snapshot = UsageSnapshot::new(provider)
        .with_source("oauth")
        .with_period(UsagePeriod::from_percent("Session", PeriodType::Session, 28.0))
        .with_period(UsagePeriod::from_percent("Weekly", PeriodType::Weekly, 90.0));
    snapshot.identity = Some(Identity {
        email: Some("dev@example.com".to_string()),
        plan: Some("max".to_string()),
    });
    snapshot
}

fn attempt(id: &str, classification: AttemptClass, message: Option<&str>) -> Attempt {
    Attempt {
        strategy: id.to_string(),
        kind: FetchKind::OAuth,
        duration: StdDuration::from_millis(120),
        classification,
        message: message.map(str::to_string),
    }
}

fn threshold() -> Duration {
    Duration::minutes(60)
}

// ============================================================================
// Text formatter
// ============================================================================

mod text_formatter_tests {
    use super::*;

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (75.0, "████████░░"), // 7.5 rounds to 8 blocks
            (100.0, "██████████"),
            (140.0, "██████████"),
            (-5.0, "░░░░░░░░░░"),
        ];

        for (percent, expected) in test_cases {
            let bar = formatter.progress_bar(percent);
            assert_eq!(bar, expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(10.0).contains("\x1b[31m"), "red below 20%");
        assert!(formatter.progress_bar(35.0).contains("\x1b[33m"), "yellow below 50%");
        assert!(formatter.progress_bar(80.0).contains("\x1b[32m"), "green otherwise");
    }

    #[test]
    fn test_no_color_output_has_no_escapes() {
        let formatter = TextFormatter::new(false);
        let outcome = FetchOutcome::fetched(ProviderKind::Claude, snapshot(ProviderKind::Claude), "oauth", vec![]);
        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn test_format_live_outcome() {
        let formatter = TextFormatter::new(false);
        let registry = ProviderRegistry::bootstrap();
        let outcome = FetchOutcome::fetched(ProviderKind::Claude, snapshot(ProviderKind::Claude), "oauth", vec![]);

        let output = formatter.format_outcome(&outcome, registry.get(ProviderKind::Claude), threshold());
        assert!(output.starts_with("Claude (oauth)"));
        assert!(output.contains("Session:"));
        assert!(output.contains("72% left"));
        assert!(output.contains("10% left"));
        assert!(output.contains("dev@example.com (max)"));
    }

    #[test]
    fn test_format_overage() {
        let formatter = TextFormatter::new(false);
        let mut snap = snapshot(ProviderKind::Claude);
        snap.overage = Some(Overage {
            used: 12.5,
            limit: Some(50.0),
            currency: "USD".to_string(),
            enabled: true,
        });
        let outcome = FetchOutcome::fetched(ProviderKind::Claude, snap, "oauth", vec![]);
        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(output.contains("12.50 / 50.00 USD"));
    }

    #[test]
    fn test_format_cached_outcome_marks_age_and_staleness() {
        let formatter = TextFormatter::new(false);

        let fresh_entry = CacheEntry::at(snapshot(ProviderKind::Codex), Utc::now() - Duration::minutes(5));
        let fresh = FetchOutcome::from_cache(ProviderKind::Codex, fresh_entry, vec![]);
        let output = formatter.format_outcome(&fresh, None, threshold());
        assert!(output.contains("(oauth, cached 5m ago)"));
        assert!(!output.contains("stale"));

        let stale_entry = CacheEntry::at(snapshot(ProviderKind::Codex), Utc::now() - Duration::hours(3));
        let stale = FetchOutcome::from_cache(
            ProviderKind::Codex,
            stale_entry,
            vec![attempt("codex.oauth", AttemptClass::Fail, Some("HTTP 503"))],
        );
        let output = formatter.format_outcome(&stale, None, threshold());
        assert!(output.contains("cached 3h ago, stale"));
    }

    #[test]
    fn test_format_cache_warning() {
        let formatter = TextFormatter::new(false);
        let mut outcome = FetchOutcome::fetched(ProviderKind::Zai, snapshot(ProviderKind::Zai), "api", vec![]);
        outcome.cache_warning = Some("failed to write cache".to_string());
        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(output.contains("Warning: failed to write cache"));
    }

    #[test]
    fn test_format_unconfigured_outcome_shows_setup_hint() {
        let formatter = TextFormatter::new(false);
        let registry = ProviderRegistry::bootstrap();
        let outcome = FetchOutcome::failed(ProviderKind::Zai, NO_USABLE_STRATEGY, vec![]);

        let output = formatter.format_outcome(&outcome, registry.get(ProviderKind::Zai), threshold());
        assert!(output.contains("z.ai: not configured"));
        assert!(output.contains("meterbar auth set zai"));
        assert!(output.contains("ZAI_API_KEY"));
        assert!(!output.contains("Error"));
    }

    #[test]
    fn test_format_fatal_outcome_suggests_reauth() {
        let formatter = TextFormatter::new(false);
        let outcome = FetchOutcome::failed(
            ProviderKind::Claude,
            "authentication failed: token expired",
            vec![attempt("claude.oauth", AttemptClass::Fatal, Some("token expired"))],
        );

        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(output.contains("Error - authentication failed"));
        assert!(output.contains("meterbar auth set claude"));
    }

    #[test]
    fn test_format_stale_outcome_after_fatal_suggests_reauth() {
        let formatter = TextFormatter::new(false);
        let entry = CacheEntry::at(snapshot(ProviderKind::Claude), Utc::now() - Duration::hours(2));
        let outcome = FetchOutcome::from_cache(
            ProviderKind::Claude,
            entry,
            vec![attempt("claude.oauth", AttemptClass::Fatal, Some("token expired"))],
        );

        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(output.contains("cached 2h ago, stale"));
        assert!(output.contains("Credentials were rejected"));
        assert!(output.contains("meterbar auth set claude"));
        assert!(!output.contains("Error"));

        let json = JsonFormatter::outcome_to_output(&outcome, threshold());
        assert!(json.needs_reauth);
    }

    #[test]
    fn test_format_attempts_when_enabled() {
        let formatter = TextFormatter::new(false).with_attempts(true);
        let outcome = FetchOutcome::fetched(
            ProviderKind::Claude,
            snapshot(ProviderKind::Claude),
            "web",
            vec![
                attempt("claude.oauth", AttemptClass::Fail, Some("HTTP 500")),
                attempt("claude.web", AttemptClass::Ok, None),
            ],
        );
        let output = formatter.format_outcome(&outcome, None, threshold());
        assert!(output.contains("claude.oauth"));
        assert!(output.contains("HTTP 500"));
        assert!(output.contains("claude.web"));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(10)), "just now");
        assert_eq!(format_age(Duration::minutes(5)), "5m ago");
        assert_eq!(format_age(Duration::hours(2)), "2h ago");
        assert_eq!(format_age(Duration::days(3)), "3d ago");
    }

    #[test]
    fn test_format_reset_time() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_reset_time(now - Duration::minutes(1), now), "now");
        assert_eq!(format_reset_time(now + Duration::minutes(30), now), "in 30 minutes");
        assert_eq!(format_reset_time(now + Duration::minutes(1), now), "in 1 minute");
        assert_eq!(format_reset_time(now + Duration::minutes(125), now), "in 2h 5m");
        assert_eq!(format_reset_time(now + Duration::hours(1), now), "in 1 hour");
        assert!(format_reset_time(now + Duration::days(3), now).contains(" at "));
    }

    #[test]
    fn test_format_cache_entry() {
        let formatter = TextFormatter::new(false);
        let entry = CacheEntry::at(snapshot(ProviderKind::Copilot), Utc::now() - Duration::hours(2));
        let line = formatter.format_cache_entry(&entry, threshold());
        assert!(line.starts_with("Copilot"));
        assert!(line.contains("2h ago"));
        assert!(line.contains("stale"));
        assert!(line.contains("peak 90%"));
    }
}

// ============================================================================
// JSON formatter
// ============================================================================

mod json_formatter_tests {
    use super::*;

    #[test]
    fn test_format_pretty_and_compact() {
        let data = serde_json::json!({"key": "value"});
        assert!(JsonFormatter::new(true).format(&data).unwrap().contains('\n'));
        assert!(!JsonFormatter::new(false).format(&data).unwrap().contains('\n'));
    }

    #[test]
    fn test_format_results() {
        let mut results: RunResults = BTreeMap::new();
        results.insert(
            ProviderKind::Claude,
            FetchOutcome::fetched(
                ProviderKind::Claude,
                snapshot(ProviderKind::Claude),
                "oauth",
                vec![attempt("claude.oauth", AttemptClass::Ok, None)],
            ),
        );
        results.insert(
            ProviderKind::Zai,
            FetchOutcome::failed(ProviderKind::Zai, NO_USABLE_STRATEGY, vec![]),
        );

        let output = JsonFormatter::new(false).format_results(&results, threshold()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["summary"], "partial_failure");
        let providers = value["providers"].as_array().unwrap();
        assert_eq!(providers.len(), 2);

        let claude = &providers[0];
        assert_eq!(claude["provider"], "claude");
        assert_eq!(claude["success"], true);
        assert_eq!(claude["cached"], false);
        assert_eq!(claude["usage"]["periods"][0]["usedPercent"], 28);
        assert_eq!(claude["usage"]["periods"][0]["remainingPercent"], 72);
        assert_eq!(claude["usage"]["periods"][0]["periodType"], "session");
        assert_eq!(claude["usage"]["identity"]["email"], "dev@example.com");
        assert_eq!(claude["attempts"][0]["strategy"], "claude.oauth");
        assert_eq!(claude["attempts"][0]["result"], "ok");
        assert!(claude.get("error").is_none());

        let zai = &providers[1];
        assert_eq!(zai["success"], false);
        assert_eq!(zai["notConfigured"], true);
        assert!(zai.get("usage").is_none());
        assert!(zai.get("needsReauth").is_none());
    }

    #[test]
    fn test_cached_outcome_output() {
        let entry = CacheEntry::at(snapshot(ProviderKind::Codex), Utc::now() - Duration::hours(2));
        let outcome = FetchOutcome::from_cache(ProviderKind::Codex, entry, vec![]);
        let output = JsonFormatter::outcome_to_output(&outcome, threshold());

        assert!(output.cached);
        assert!(output.stale);
        assert!(output.cache_age_seconds.unwrap() >= 7200);
        assert_eq!(output.source, "cache");
    }

    #[test]
    fn test_format_cache_entries() {
        let entry = CacheEntry::at(snapshot(ProviderKind::Copilot), Utc::now());
        let output = JsonFormatter::new(false).format_cache_entries(&[entry], threshold()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["provider"], "copilot");
        assert_eq!(value[0]["freshness"], "fresh");
        assert!(value[0]["fetchedAt"].as_str().unwrap().contains('T'));
    }
}
