use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub role: Option<String>,
}

/// Decode JWT claims without validation.
///
/// Only used to read `exp` from the session cookie before deciding whether to
/// refresh. Identity is always confirmed by the provider, never by these claims.
pub fn decode_jwt_claims(token: &str) -> Result<JwtClaims> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() != 3 {
        return Err(anyhow::anyhow!("Invalid JWT format"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| anyhow::anyhow!("Failed to decode JWT payload: {}", e))?;

    let claims: JwtClaims = serde_json::from_slice(&payload)
        .map_err(|e| anyhow::anyhow!("Failed to parse JWT claims: {}", e))?;

    Ok(claims)
}

/// True when the token expires within `margin_secs` of `now`, or cannot be read.
pub fn expires_within(token: &str, now: i64, margin_secs: i64) -> bool {
    match decode_jwt_claims(token) {
        Ok(claims) => claims.exp <= now + margin_secs,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Payload: {"sub":"user_123","email":"test@example.com","exp":9999999999,"role":"authenticated"}
    const TOKEN: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJzdWIiOiJ1c2VyXzEyMyIsImVtYWlsIjoidGVzdEBleGFtcGxlLmNvbSIsImV4cCI6OTk5OTk5OTk5OSwicm9sZSI6ImF1dGhlbnRpY2F0ZWQifQ.signature";

    #[test]
    fn test_decode_jwt_claims() {
        let claims = decode_jwt_claims(TOKEN).unwrap();
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert_eq!(claims.exp, 9_999_999_999);
        assert_eq!(claims.role.as_deref(), Some("authenticated"));
    }

    #[test]
    fn expiry_respects_margin() {
        assert!(!expires_within(TOKEN, 1_700_000_000, 30));
        assert!(expires_within(TOKEN, 9_999_999_980, 30));
    }

    #[test]
    fn unreadable_token_counts_as_expired() {
        assert!(expires_within("not-a-jwt", 0, 0));
    }
}
