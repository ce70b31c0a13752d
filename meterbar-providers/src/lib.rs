// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # MeterBar Providers
//!
//! Provider-specific implementations for MeterBar.
//!
//! Each provider module includes:
//!
//! - **Credentials**: `CredentialSpec`s naming env vars, stored keys and
//!   first-party CLI session files
//! - **Strategies**: `FetchStrategy` implementations, one per acquisition method
//! - **Descriptor**: static configuration and the ordered fetch plan
//!
//! ## Supported Providers
//!
//! | Provider | OAuth | API Key | Web |
//! |----------|-------|---------|-----|
//! | Claude (Anthropic) | ✅ | ❌ | ✅ |
//! | Codex (OpenAI) | ✅ | ❌ | ❌ |
//! | Copilot (GitHub) | ✅ | ❌ | ❌ |
//! | z.ai | ❌ | ✅ | ❌ |
//!
//! ## Usage
//!
//! ```ignore
//! use meterbar_providers::ProviderRegistry;
//! use meterbar_core::ProviderKind;
//!
//! let registry = ProviderRegistry::bootstrap();
//! let plans = registry.plans(&[ProviderKind::Claude]);
//! let results = coordinator.run(plans, true).await;
//! ```

pub mod descriptor;
pub mod registry;

// Provider modules (alphabetical)
pub mod claude;
pub mod codex;
pub mod copilot;
pub mod zai;

// Re-export key types
pub use descriptor::{FetchPlan, ProviderDescriptor, ProviderDescriptorBuilder};
pub use registry::ProviderRegistry;

// Re-export provider descriptors
pub use claude::claude_descriptor;
pub use codex::codex_descriptor;
pub use copilot::copilot_descriptor;
pub use zai::zai_descriptor;

// Re-export strategy types for convenience
pub use claude::{ClaudeOAuthStrategy, ClaudeWebStrategy};
pub use codex::CodexOAuthStrategy;
pub use copilot::CopilotApiStrategy;
pub use zai::ZaiApiStrategy;
