//! Cache entry model and freshness classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::usage::UsageSnapshot;

/// The last successful snapshot persisted for a provider.
///
/// Entries are only ever replaced wholesale, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached snapshot.
    pub snapshot: UsageSnapshot,
    /// When the snapshot was fetched and stored.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(snapshot: UsageSnapshot) -> Self {
        Self::at(snapshot, Utc::now())
    }

    /// Creates an entry with an explicit fetch time.
    pub fn at(snapshot: UsageSnapshot, fetched_at: DateTime<Utc>) -> Self {
        Self { snapshot, fetched_at }
    }

    /// Age of the entry relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Age of the entry relative to the current time.
    pub fn age(&self) -> Duration {
        self.age_at(Utc::now())
    }

    /// Classifies this entry against a threshold.
    pub fn freshness(&self, threshold: Duration) -> Freshness {
        Freshness::classify_at(Some(self), threshold, Utc::now())
    }
}

/// Usability of a cached snapshot based on its age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Younger than the threshold; may be served without fetching.
    Fresh,
    /// At or past the threshold; served only as a last resort.
    Stale,
    /// No usable entry.
    Absent,
}

impl Freshness {
    /// Classifies an optional entry using the current time.
    pub fn classify(entry: Option<&CacheEntry>, threshold: Duration) -> Self {
        Self::classify_at(entry, threshold, Utc::now())
    }

    /// Classifies an optional entry relative to `now`.
    ///
    /// An entry whose snapshot has no periods counts as absent.
    pub fn classify_at(entry: Option<&CacheEntry>, threshold: Duration, now: DateTime<Utc>) -> Self {
        match entry {
            Some(entry) if entry.snapshot.has_data() => {
                if entry.age_at(now) < threshold {
                    Self::Fresh
                } else {
                    Self::Stale
                }
            }
            _ => Self::Absent,
        }
    }

    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Absent => "absent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PeriodType, ProviderKind, UsagePeriod};

    fn snapshot() -> UsageSnapshot {
        UsageSnapshot::new(ProviderKind::Claude)
            .with_period(UsagePeriod::from_percent("5h", PeriodType::Session, 30.0))
    }

    #[test]
    fn test_fresh_within_threshold() {
        let now = Utc::now();
        let entry = CacheEntry::at(snapshot(), now - Duration::minutes(30));
        assert_eq!(
            Freshness::classify_at(Some(&entry), Duration::minutes(60), now),
            Freshness::Fresh
        );
    }

    #[test]
    fn test_stale_past_threshold() {
        let now = Utc::now();
        let entry = CacheEntry::at(snapshot(), now - Duration::minutes(120));
        assert_eq!(
            Freshness::classify_at(Some(&entry), Duration::minutes(60), now),
            Freshness::Stale
        );
    }

    #[test]
    fn test_boundary_is_stale() {
        let now = Utc::now();
        let entry = CacheEntry::at(snapshot(), now - Duration::minutes(60));
        assert_eq!(
            Freshness::classify_at(Some(&entry), Duration::minutes(60), now),
            Freshness::Stale
        );
    }

    #[test]
    fn test_absent_and_empty() {
        assert_eq!(Freshness::classify(None, Duration::minutes(60)), Freshness::Absent);

        let empty = CacheEntry::new(UsageSnapshot::new(ProviderKind::Claude));
        assert_eq!(empty.freshness(Duration::minutes(60)), Freshness::Absent);
    }
}
