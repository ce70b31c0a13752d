//! Host APIs for MeterBar fetch strategies.
//!
//! - [`http`] - HTTP client with tracing and domain allowlist
//! - [`credentials`] - Credential lookup across env, stored files and provider CLIs

pub mod credentials;
pub mod http;

pub use credentials::{
    CliSession, Credential, CredentialKind, CredentialProbe, CredentialResolver, CredentialSource,
    CredentialSpec, SessionFormat,
};
pub use http::HttpClient;
