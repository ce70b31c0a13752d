//! GitHub Copilot provider implementation.
//!
//! Reads monthly quotas from the Copilot user endpoint. The GitHub token is
//! taken from `COPILOT_API_TOKEN`/`GITHUB_TOKEN`, a stored credential, or the
//! GitHub CLI's `~/.config/gh/hosts.yml`.

mod api;
pub mod credentials;
mod descriptor;
mod strategies;

pub use api::CopilotUserResponse;
pub use descriptor::copilot_descriptor;
pub use strategies::CopilotApiStrategy;
