//! Provider-related types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported AI-assistant providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude
    Claude,
    /// OpenAI Codex
    Codex,
    /// GitHub Copilot
    Copilot,
    /// z.ai
    Zai,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Codex => "Codex",
            Self::Copilot => "Copilot",
            Self::Zai => "z.ai",
        }
    }

    /// Returns all available provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Claude, Self::Codex, Self::Copilot, Self::Zai]
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    ///
    /// Also used as the file stem for cache and credential files.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Copilot => "copilot",
            Self::Zai => "zai",
        }
    }

    /// Alternative names accepted on the command line.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Claude => &["anthropic"],
            Self::Codex => &["openai", "chatgpt"],
            Self::Copilot => &["github", "gh"],
            Self::Zai => &["z.ai", "glm"],
        }
    }

    /// Looks up a provider by CLI name or alias (case-insensitive).
    pub fn from_cli_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name() == name || kind.aliases().contains(&name.as_str()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cli_name(s).ok_or_else(|| CoreError::UnknownProvider(s.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
