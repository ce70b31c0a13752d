//! Claude (Anthropic) provider implementation.
//!
//! ## Fetch Strategies
//!
//! 1. **OAuth API**: token from `CLAUDE_CODE_OAUTH_TOKEN`, a stored
//!    credential, or the Claude CLI's `~/.claude/.credentials.json`
//!    (`claudeAiOauth.accessToken`).
//! 2. **Web API**: claude.ai session key from `CLAUDE_SESSION_KEY` or a
//!    stored credential (`session_key`, `sessionKey` or `cookie`).

mod api;
pub mod credentials;
mod descriptor;
mod strategies;
mod web;

pub use api::UsageApiResponse;
pub use descriptor::claude_descriptor;
pub use strategies::{ClaudeOAuthStrategy, ClaudeWebStrategy};
pub use web::WebUsageResponse;
