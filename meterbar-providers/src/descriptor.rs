//! Provider descriptor system.
//!
//! A descriptor contains all the static configuration for a provider:
//! - Display name and dashboard link
//! - Credential specs the provider's strategies resolve
//! - Fetch plan (ordered strategies)
//! - Domains its strategies are allowed to contact

use std::sync::Arc;

use meterbar_core::ProviderKind;
use meterbar_fetch::{CredentialSpec, FetchKind, FetchStrategy};

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a provider.
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Name shown in output.
    pub display_name: &'static str,
    /// Where the user can inspect usage in a browser.
    pub dashboard_url: Option<&'static str>,
    /// Credentials the strategies look for, in strategy order.
    pub credentials: &'static [CredentialSpec],
    /// How to fetch usage data.
    pub fetch_plan: FetchPlan,
    /// Hosts the strategies talk to.
    pub allowed_domains: &'static [&'static str],
}

impl ProviderDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder(id: ProviderKind) -> ProviderDescriptorBuilder {
        ProviderDescriptorBuilder::new(id)
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        self.display_name
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &'static str {
        self.id.cli_name()
    }

    /// Builds the ordered strategies for this provider.
    pub fn build_strategies(&self) -> Vec<Arc<dyn FetchStrategy>> {
        (self.fetch_plan.build_strategies)()
    }

    /// Finds the credential spec of a given kind.
    pub fn credential(&self, kind: meterbar_fetch::CredentialKind) -> Option<&'static CredentialSpec> {
        self.credentials.iter().find(|spec| spec.kind == kind)
    }
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("source_kinds", &self.fetch_plan.source_kinds)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Plan
// ============================================================================

/// Configuration for how to fetch usage data.
pub struct FetchPlan {
    /// Acquisition methods in the order they are tried.
    pub source_kinds: &'static [FetchKind],
    /// Function to build the strategies, in the same order.
    pub build_strategies: fn() -> Vec<Arc<dyn FetchStrategy>>,
}

impl Default for FetchPlan {
    fn default() -> Self {
        Self {
            source_kinds: &[],
            build_strategies: Vec::new,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ProviderDescriptor`].
pub struct ProviderDescriptorBuilder {
    id: ProviderKind,
    display_name: Option<&'static str>,
    dashboard_url: Option<&'static str>,
    credentials: &'static [CredentialSpec],
    fetch_plan: FetchPlan,
    allowed_domains: &'static [&'static str],
}

impl ProviderDescriptorBuilder {
    /// Creates a new builder for the given provider.
    pub fn new(id: ProviderKind) -> Self {
        Self {
            id,
            display_name: None,
            dashboard_url: None,
            credentials: &[],
            fetch_plan: FetchPlan::default(),
            allowed_domains: &[],
        }
    }

    /// Overrides the display name.
    pub fn display_name(mut self, name: &'static str) -> Self {
        self.display_name = Some(name);
        self
    }

    /// Sets the dashboard link.
    pub fn dashboard_url(mut self, url: &'static str) -> Self {
        self.dashboard_url = Some(url);
        self
    }

    /// Sets the credential specs.
    pub fn credentials(mut self, specs: &'static [CredentialSpec]) -> Self {
        self.credentials = specs;
        self
    }

    /// Sets the fetch plan.
    pub fn fetch_plan(mut self, plan: FetchPlan) -> Self {
        self.fetch_plan = plan;
        self
    }

    /// Sets the allowed domains.
    pub fn allowed_domains(mut self, domains: &'static [&'static str]) -> Self {
        self.allowed_domains = domains;
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: self.id,
            display_name: self.display_name.unwrap_or_else(|| self.id.display_name()),
            dashboard_url: self.dashboard_url,
            credentials: self.credentials,
            fetch_plan: self.fetch_plan,
            allowed_domains: self.allowed_domains,
        }
    }
}
