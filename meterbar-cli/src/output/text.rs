//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Duration, Local, Utc};
use meterbar_core::{CacheEntry, Overage, ProviderKind, UsagePeriod};
use meterbar_fetch::{CompletionEvent, CredentialProbe, CredentialSpec, FetchOutcome, RunSummary, StrategyInfo};
use meterbar_providers::ProviderDescriptor;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

const LABEL_WIDTH: usize = 18;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    show_attempts: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            show_attempts: false,
            bar_width: 10,
        }
    }

    /// Also list every strategy attempt under each provider.
    pub fn with_attempts(mut self, show: bool) -> Self {
        self.show_attempts = show;
        self
    }

    // ========================================================================
    // Usage
    // ========================================================================

    /// Formats one provider's outcome.
    ///
    /// `threshold` is the cache freshness threshold, used to flag stale data.
    pub fn format_outcome(
        &self,
        outcome: &FetchOutcome,
        desc: Option<&ProviderDescriptor>,
        threshold: Duration,
    ) -> String {
        let name = desc.map_or(outcome.provider.display_name(), |d| d.display_name());
        let mut lines = Vec::new();

        match (&outcome.snapshot, outcome.success) {
            (Some(snapshot), true) => {
                lines.push(format!("{} {}", self.bold(name), self.format_origin(outcome, threshold)));

                for period in &snapshot.periods {
                    lines.push(self.format_period(period));
                }
                if let Some(overage) = &snapshot.overage {
                    lines.push(self.format_overage(overage));
                }
                if let Some(identity) = snapshot.identity.as_ref().and_then(|id| id.display_string()) {
                    lines.push(format!("{:<LABEL_WIDTH$} {}", "Account:", self.cyan(&identity)));
                }
                if let Some(warning) = &outcome.cache_warning {
                    lines.push(self.yellow(&format!("Warning: {warning}")));
                }
                if outcome.needs_reauth() {
                    lines.push(self.reauth_hint(outcome.provider));
                }
            }
            _ => {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                if outcome.is_unconfigured() {
                    lines.push(format!("{}: {}", self.bold(name), self.dim("not configured")));
                    lines.push(self.dim(&setup_hint(outcome.provider.cli_name(), desc)));
                } else if outcome.was_cancelled() {
                    lines.push(format!("{}: {}", self.bold(name), self.dim(error)));
                } else {
                    lines.push(self.format_error(name, error));
                    if outcome.needs_reauth() {
                        lines.push(self.reauth_hint(outcome.provider));
                    }
                }
            }
        }

        if self.show_attempts {
            for attempt in &outcome.attempts {
                let mut line = format!(
                    "  {} {:<16} {:<9} {}ms",
                    self.dim("·"),
                    attempt.strategy,
                    attempt.classification.label(),
                    attempt.duration.as_millis()
                );
                if let Some(message) = &attempt.message {
                    line.push_str(&format!(" {}", self.dim(message)));
                }
                lines.push(line);
            }
        }

        lines.join("\n")
    }

    /// Formats where an outcome's data came from, e.g. `(oauth)` or
    /// `(oauth, cached 5m ago, stale)`.
    fn format_origin(&self, outcome: &FetchOutcome, threshold: Duration) -> String {
        let source = outcome
            .snapshot
            .as_ref()
            .map_or(outcome.source.as_str(), |s| s.source.as_str());

        if !outcome.cached {
            return format!("({source})");
        }

        let age = outcome.cache_age.map_or_else(|| "cached".to_string(), |age| {
            format!("cached {}", format_age(age))
        });
        if outcome.is_stale(threshold) {
            self.yellow(&format!("({source}, {age}, stale)"))
        } else {
            self.dim(&format!("({source}, {age})"))
        }
    }

    /// Formats a usage period with progress bar.
    pub fn format_period(&self, period: &UsagePeriod) -> String {
        let remaining = f64::from(period.remaining());
        let bar = self.progress_bar(remaining);
        let pct = self.color_for_percent(remaining, &format!("{remaining:.0}% left"));

        let mut result = format!("{:<LABEL_WIDTH$} {bar} {pct}", format!("{}:", period.name));

        if let Some(resets_at) = period.resets_at {
            result.push_str(&format!(
                "\n{:<LABEL_WIDTH$} Resets {}",
                "",
                self.dim(&format_reset_time(resets_at, Utc::now()))
            ));
        }

        result
    }

    fn format_overage(&self, overage: &Overage) -> String {
        let amount = match overage.limit {
            Some(limit) => format!("{:.2} / {:.2} {}", overage.used, limit, overage.currency),
            None => format!("{:.2} {}", overage.used, overage.currency),
        };
        let state = if overage.enabled { "" } else { " (disabled)" };
        format!("{:<LABEL_WIDTH$} {}{}", "Extra usage:", self.blue(&amount), self.dim(state))
    }

    /// Formats a progress bar.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn progress_bar(&self, percent_remaining: f64) -> String {
        let clamped = percent_remaining.clamp(0.0, 100.0);
        let filled = ((clamped / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_remaining, &bar)
    }

    /// Formats a live progress line for a finished provider.
    pub fn format_event(&self, event: &CompletionEvent) -> String {
        let status = if event.success {
            self.green("✓")
        } else {
            self.red("✗")
        };
        let detail = if event.cached {
            format!("{} (cache)", event.source)
        } else if event.success {
            format!("{} in {}ms", event.source, event.duration.as_millis())
        } else {
            event.error.clone().unwrap_or_default()
        };
        format!("{status} {:<16} {}", event.provider.display_name(), self.dim(&detail))
    }

    /// Formats the trailing run summary, or nothing when every provider succeeded.
    pub fn format_summary(&self, summary: RunSummary, succeeded: usize, total: usize) -> Option<String> {
        match summary {
            RunSummary::Empty => Some(self.dim("No providers selected. Enable one with `meterbar config enable <provider>`.")),
            RunSummary::AllSucceeded => None,
            RunSummary::PartialFailure => Some(self.yellow(&format!("{succeeded} of {total} providers reported usage."))),
            RunSummary::TotalFailure => Some(self.red("No provider reported usage.")),
        }
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Formats one cache entry line.
    pub fn format_cache_entry(&self, entry: &CacheEntry, threshold: Duration) -> String {
        let freshness = entry.freshness(threshold);
        let state = match freshness {
            meterbar_core::Freshness::Fresh => self.green(freshness.label()),
            meterbar_core::Freshness::Stale => self.yellow(freshness.label()),
            meterbar_core::Freshness::Absent => self.dim(freshness.label()),
        };
        let peak = if entry.snapshot.has_data() {
            format!("peak {}%", entry.snapshot.max_utilization())
        } else {
            "no periods".to_string()
        };
        format!(
            "{:<16} {:<8} {:<10} {:<12} {}",
            entry.snapshot.provider.display_name(),
            entry.snapshot.source,
            format_age(entry.age()),
            state,
            self.dim(&peak)
        )
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    /// Formats one credential presence line.
    pub fn format_credential(&self, name: &str, spec: &CredentialSpec, probe: CredentialProbe) -> String {
        let status = match probe.source {
            Some(source) if probe.present => self.green(&format!("✓ {}", source.label())),
            _ => self.dim("− missing"),
        };
        format!("{:<16} {:<9} {}", name, spec.kind.as_str(), status)
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{} {} {} {}",
            self.bold(&format!("{:<16}", "Provider")),
            self.bold(&format!("{:<9}", "CLI")),
            self.bold(&format!("{:<8}", "Enabled")),
            self.bold("Strategies")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(&self, desc: &ProviderDescriptor, enabled: bool, strategies: &[StrategyInfo]) -> String {
        let enabled_str = if enabled { self.green("✓") } else { self.dim("−") };
        let strategies = strategies
            .iter()
            .map(|info| {
                if info.available {
                    self.green(&info.id)
                } else {
                    self.dim(&info.id)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut line = format!(
            "{:<16} {:<9} {:<8} {}",
            desc.display_name(),
            desc.cli_name(),
            enabled_str,
            strategies
        );
        if let Some(url) = desc.dashboard_url {
            line.push_str(&format!("\n{:<16} {}", "", self.dim(url)));
        }
        line
    }

    /// Formats an error message.
    pub fn format_error(&self, provider: &str, error: &str) -> String {
        format!("{}: {} - {}", self.bold(provider), self.red("Error"), error)
    }

    fn reauth_hint(&self, provider: ProviderKind) -> String {
        self.dim(&format!(
            "Credentials were rejected. Update them with `meterbar auth set {}`.",
            provider.cli_name()
        ))
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    pub(crate) fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Bold text.
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    /// Dimmed text.
    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Green text.
    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    /// Yellow text.
    pub fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

// ============================================================================
// Free helpers
// ============================================================================

/// How to configure a provider that has no usable credential.
fn setup_hint(cli_name: &str, desc: Option<&ProviderDescriptor>) -> String {
    let env_vars: Vec<&str> = desc
        .map(|d| d.credentials.iter().flat_map(|spec| spec.env_vars.iter().copied()).collect())
        .unwrap_or_default();
    if env_vars.is_empty() {
        format!("Run `meterbar auth set {cli_name} <secret>`.")
    } else {
        format!(
            "Run `meterbar auth set {cli_name} <secret>` or set {}.",
            env_vars.join(" / ")
        )
    }
}

/// Formats an age as a short relative string ("just now", "5m ago", "3h ago").
pub fn format_age(age: Duration) -> String {
    if age < Duration::minutes(1) {
        "just now".to_string()
    } else if age < Duration::hours(1) {
        format!("{}m ago", age.num_minutes())
    } else if age < Duration::days(1) {
        format!("{}h ago", age.num_hours())
    } else {
        format!("{}d ago", age.num_days())
    }
}

/// Formats reset time as countdown within a day, absolute otherwise.
pub fn format_reset_time(resets_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if resets_at <= now {
        return "now".to_string();
    }

    let diff = resets_at - now;
    if diff < Duration::hours(1) {
        let mins = diff.num_minutes().max(1);
        format!("in {} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else if diff < Duration::hours(24) {
        let hours = diff.num_hours();
        let mins = diff.num_minutes() % 60;
        if mins > 0 {
            format!("in {hours}h {mins}m")
        } else {
            format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
        }
    } else {
        let local_reset = resets_at.with_timezone(&Local);
        local_reset.format("%a %b %e at %l:%M %p").to_string().split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
