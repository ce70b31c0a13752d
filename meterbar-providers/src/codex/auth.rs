//! Account details decoded from the Codex ID token.
//!
//! The ID token is a JWT whose payload contains:
//! - `email` - Account email
//! - `https://api.openai.com/auth` - Object with `chatgpt_plan_type`
//!
//! The signature is not checked; the payload is only used for display.

use base64::prelude::*;
use meterbar_core::Identity;
use meterbar_fetch::FetchError;
use serde::Deserialize;
use tracing::trace;

// ============================================================================
// JWT Payload
// ============================================================================

/// JWT payload extracted from the ID token.
#[derive(Debug, Deserialize)]
pub struct JwtPayload {
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration timestamp (seconds since epoch).
    #[serde(default)]
    pub exp: Option<i64>,
    /// OpenAI-specific auth data.
    #[serde(default, rename = "https://api.openai.com/auth")]
    pub openai_auth: Option<OpenAiAuthData>,
}

/// OpenAI-specific authentication data embedded in the JWT.
#[derive(Debug, Deserialize)]
pub struct OpenAiAuthData {
    /// ChatGPT plan type (e.g., "free", "plus", "pro").
    #[serde(default)]
    pub chatgpt_plan_type: Option<String>,
}

impl JwtPayload {
    /// Returns true if the token's `exp` lies in the past.
    pub fn is_expired(&self) -> bool {
        self.exp
            .is_some_and(|exp| exp < chrono::Utc::now().timestamp())
    }

    /// Converts to an identity, or `None` if the payload names nothing.
    pub fn identity(&self) -> Option<Identity> {
        let identity = Identity {
            email: self.email.clone(),
            plan: self
                .openai_auth
                .as_ref()
                .and_then(|auth| auth.chatgpt_plan_type.clone()),
        };
        (!identity.is_empty()).then_some(identity)
    }
}

/// Decodes the payload segment of a JWT.
pub fn decode_jwt_payload(token: &str) -> Result<JwtPayload, FetchError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(FetchError::InvalidResponse(format!(
            "invalid JWT: expected 3 parts, got {}",
            parts.len()
        )));
    }

    // base64url without padding, standard alphabet as a fallback
    let decoded = BASE64_URL_SAFE_NO_PAD
        .decode(parts[1])
        .or_else(|_| BASE64_STANDARD.decode(parts[1]))
        .map_err(|e| FetchError::InvalidResponse(format!("JWT base64: {e}")))?;

    trace!(len = decoded.len(), "Decoded JWT payload");
    Ok(serde_json::from_slice(&decoded)?)
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(payload: &serde_json::Value) -> String {
    let body = BASE64_URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("eyJhbGciOiJub25lIn0.{body}.sig")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_identity() {
        let token = encode_test_jwt(&json!({
            "email": "dev@example.com",
            "exp": 4_102_444_800_i64,
            "https://api.openai.com/auth": { "chatgpt_plan_type": "plus" }
        }));

        let payload = decode_jwt_payload(&token).unwrap();
        assert!(!payload.is_expired());
        let identity = payload.identity().unwrap();
        assert_eq!(identity.email.as_deref(), Some("dev@example.com"));
        assert_eq!(identity.plan.as_deref(), Some("plus"));
    }

    #[test]
    fn test_expired_token() {
        let token = encode_test_jwt(&json!({ "exp": 1 }));
        let payload = decode_jwt_payload(&token).unwrap();
        assert!(payload.is_expired());
        assert!(payload.identity().is_none());
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(decode_jwt_payload("not-a-jwt").is_err());
        assert!(decode_jwt_payload("a.!!!.c").is_err());
        let not_json = format!("a.{}.c", BASE64_URL_SAFE_NO_PAD.encode("plain"));
        assert!(decode_jwt_payload(&not_json).is_err());
    }
}
