//! Access-token expiry checks.
//!
//! Tokens are opaque three-part strings whose middle segment is base64url
//! JSON carrying an `exp` claim in seconds. Nothing here verifies a
//! signature; the backend does that on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::Deserialize;

/// Why a token's claims could not be read.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token must have three dot-separated segments, found {0}")]
    Segments(usize),
    #[error("token payload is not valid base64url")]
    Base64,
    #[error("token payload is not valid JSON: {0}")]
    Json(String),
    #[error("token payload has no exp claim")]
    MissingExp,
}

/// The claims this client reads from a token payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: Option<i64>,
    /// Subject, usually the user id.
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Decode the payload segment of `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not three segments or the middle
    /// segment is not base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(TokenError::Segments(segments.len()));
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|_| TokenError::Base64)?;
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Json(e.to_string()))
    }

    /// Expiry in milliseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MissingExp`] when the payload carries no `exp`.
    pub fn expires_at_ms(&self) -> Result<i64, TokenError> {
        self.exp
            .map(|exp| exp.saturating_mul(1000))
            .ok_or(TokenError::MissingExp)
    }
}

/// Whether `token` is expired at `now_ms` (milliseconds since the epoch).
///
/// Any token that cannot be decoded, or that has no `exp`, counts as expired.
#[must_use]
pub fn is_token_expired_at(token: &str, now_ms: i64) -> bool {
    match TokenClaims::decode(token).and_then(|claims| claims.expires_at_ms()) {
        Ok(expires_at) => expires_at < now_ms,
        Err(_) => true,
    }
}

/// Whether `token` is expired right now.
#[must_use]
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp_millis())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Build an unsigned token with the given JSON payload.
    fn token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.as_bytes());
        format!("{header}.{body}.signature")
    }

    #[test]
    fn test_garbage_payload_is_expired() {
        assert!(is_token_expired("a.!!!.c"));
        assert!(is_token_expired("not-a-token"));
        assert!(is_token_expired(""));
        assert!(is_token_expired(&token_with_payload("not json")));
    }

    #[test]
    fn test_exp_in_the_past_is_expired() {
        let exp = Utc::now().timestamp() - 3600;
        assert!(is_token_expired(&token_with_payload(&format!(r#"{{"exp":{exp}}}"#))));
    }

    #[test]
    fn test_exp_in_the_future_is_valid() {
        let exp = Utc::now().timestamp() + 3600;
        assert!(!is_token_expired(&token_with_payload(&format!(r#"{{"exp":{exp}}}"#))));
    }

    #[test]
    fn test_missing_exp_is_expired() {
        assert!(is_token_expired(&token_with_payload(r#"{"sub":"7"}"#)));
    }

    #[test]
    fn test_boundary_uses_milliseconds() {
        let token = token_with_payload(r#"{"exp":100}"#);
        assert!(!is_token_expired_at(&token, 100_000));
        assert!(is_token_expired_at(&token, 100_001));
    }

    #[test]
    fn test_padded_payload_is_accepted() {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let token = format!("{header}.eyJleHAiOjF9==.sig");
        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.exp, Some(1));
    }

    #[test]
    fn test_decode_reports_segment_count() {
        assert_eq!(
            TokenClaims::decode("a.b"),
            Err(TokenError::Segments(2))
        );
    }
}
