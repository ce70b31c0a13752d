//! Codex (OpenAI) provider implementation.
//!
//! Usage comes from the ChatGPT backend, authenticated with the access token
//! the Codex CLI stores in `~/.codex/auth.json` (or `CODEX_ACCESS_TOKEN`).
//! The ID token in the same file supplies the account email and plan.

mod api;
mod auth;
pub mod credentials;
mod descriptor;
mod strategies;

pub use api::CodexUsageResponse;
pub use auth::{JwtPayload, decode_jwt_payload};
pub use descriptor::codex_descriptor;
pub use strategies::CodexOAuthStrategy;
