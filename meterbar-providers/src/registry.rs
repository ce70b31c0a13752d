//! Provider registry.
//!
//! The registry is built explicitly with [`ProviderRegistry::bootstrap`] and
//! handed to whoever needs it; there is no global instance.

use meterbar_core::ProviderKind;
use meterbar_fetch::ProviderPlans;

use crate::claude::claude_descriptor;
use crate::codex::codex_descriptor;
use crate::copilot::copilot_descriptor;
use crate::descriptor::ProviderDescriptor;
use crate::zai::zai_descriptor;

// ============================================================================
// Provider Registry
// ============================================================================

/// Set of known provider descriptors, in display order.
#[derive(Debug)]
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Builds the registry with every supported provider.
    pub fn bootstrap() -> Self {
        Self::from_descriptors(vec![
            claude_descriptor(),
            codex_descriptor(),
            copilot_descriptor(),
            zai_descriptor(),
        ])
    }

    /// Builds a registry from explicit descriptors.
    ///
    /// A later descriptor for an already registered provider is ignored.
    pub fn from_descriptors(descriptors: Vec<ProviderDescriptor>) -> Self {
        let mut unique: Vec<ProviderDescriptor> = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            if unique.iter().any(|d| d.id == desc.id) {
                tracing::warn!(provider = %desc.id, "Duplicate provider descriptor ignored");
                continue;
            }
            unique.push(desc);
        }
        Self { descriptors: unique }
    }

    /// Returns all provider descriptors.
    pub fn all(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Gets a provider descriptor by kind.
    pub fn get(&self, id: ProviderKind) -> Option<&ProviderDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    /// Looks up a provider by CLI name or alias.
    pub fn by_cli_name(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.get(ProviderKind::from_cli_name(name)?)
    }

    /// Returns all registered provider kinds.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.descriptors.iter().map(|d| d.id).collect()
    }

    /// Returns the number of registered providers.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Builds fetch plans for the given providers.
    ///
    /// Kinds that are not registered are skipped.
    pub fn plans(&self, kinds: &[ProviderKind]) -> ProviderPlans {
        kinds
            .iter()
            .filter_map(|kind| self.get(*kind))
            .map(|desc| (desc.id, desc.build_strategies()))
            .collect()
    }

    /// Union of every provider's allowed domains.
    pub fn allowed_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .descriptors
            .iter()
            .flat_map(|d| d.allowed_domains.iter().map(|s| (*s).to_string()))
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }
}

// ============================================================================
// Tests
// ============================================================================
