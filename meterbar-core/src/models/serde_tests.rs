//! Serde tests for the persisted core types.
//!
//! Cache entries are read back from disk across versions, so these tests pin
//! the JSON shape rather than just round-tripping.

use chrono::{TimeZone, Utc};

use crate::{CacheEntry, Identity, Overage, PeriodType, ProviderKind, UsagePeriod, UsageSnapshot};

#[test]
fn test_provider_kind_lowercase() {
    let test_cases = vec![
        (r#""claude""#, ProviderKind::Claude),
        (r#""codex""#, ProviderKind::Codex),
        (r#""copilot""#, ProviderKind::Copilot),
        (r#""zai""#, ProviderKind::Zai),
    ];

    for (json, expected) in test_cases {
        let result: ProviderKind = serde_json::from_str(json).unwrap();
        assert_eq!(result, expected, "Failed for {}", json);
    }
}

#[test]
fn test_provider_kind_invalid_deserialize() {
    let result: Result<ProviderKind, _> = serde_json::from_str(r#""invalid_provider""#);
    assert!(result.is_err());
}

#[test]
fn test_period_type_snake_case() {
    let json = serde_json::to_string(&PeriodType::Weekly).unwrap();
    assert_eq!(json, r#""weekly""#);
}

#[test]
fn test_cache_entry_shape() {
    let fetched_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let mut snapshot = UsageSnapshot::new(ProviderKind::Claude)
        .with_source("oauth")
        .with_period(
            UsagePeriod::from_percent("5h", PeriodType::Session, 12.0)
                .resetting_at(Some(fetched_at)),
        );
    snapshot.fetched_at = fetched_at;
    snapshot.overage = Some(Overage {
        used: 3.5,
        limit: Some(50.0),
        currency: "USD".to_string(),
        enabled: true,
    });
    snapshot.identity = Some(Identity {
        email: Some("a@b.c".to_string()),
        plan: None,
    });

    let entry = CacheEntry::at(snapshot, fetched_at);
    let value = serde_json::to_value(&entry).unwrap();

    assert_eq!(value["fetched_at"], "2025-01-02T03:04:05Z");
    assert_eq!(value["snapshot"]["provider"], "claude");
    assert_eq!(value["snapshot"]["source"], "oauth");
    assert_eq!(value["snapshot"]["periods"][0]["utilization"], 12);
    assert_eq!(value["snapshot"]["periods"][0]["period_type"], "session");
    assert_eq!(value["snapshot"]["overage"]["currency"], "USD");
    assert!(value["snapshot"]["identity"].get("plan").is_none());

    let parsed: CacheEntry = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, entry);
}

#[test]
fn test_snapshot_tolerates_missing_optional_fields() {
    let json = r#"{
        "provider": "zai",
        "fetched_at": "2025-01-01T00:00:00Z",
        "periods": [{"name": "Monthly", "utilization": 40, "period_type": "monthly"}]
    }"#;
    let snapshot: UsageSnapshot = serde_json::from_str(json).unwrap();
    assert_eq!(snapshot.periods.len(), 1);
    assert!(snapshot.overage.is_none());
    assert!(snapshot.source.is_empty());
}

#[test]
fn test_utilization_out_of_u8_range_rejected() {
    let json = r#"{"name": "x", "utilization": 300, "period_type": "daily"}"#;
    let result: Result<UsagePeriod, _> = serde_json::from_str(json);
    assert!(result.is_err());
}
