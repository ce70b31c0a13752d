//! z.ai provider implementation.
//!
//! Uses an API key from `ZAI_API_KEY`/`ZAI_API_TOKEN` or a stored credential.

mod api;
pub mod credentials;
mod descriptor;
mod strategies;

pub use api::ZaiUsageResponse;
pub use descriptor::zai_descriptor;
pub use strategies::ZaiApiStrategy;
