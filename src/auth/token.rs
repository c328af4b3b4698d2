//! Bearer tokens
//!
//! HS256 JSON Web Tokens signed with the configured shared secret.
//! Stateless: a token is valid while its signature checks out and `exp`
//! lies in the future. There is no refresh or revocation.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Email of the authenticated user
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

fn new_mac(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid token secret: {e}")))
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AppError> {
    let json = serde_json::to_vec(value).map_err(|e| AppError::Internal(e.into()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AppError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::unauthorized("Invalid token claims"))
}

/// Issue a token for `email`, valid for `ttl`
///
/// Token format: base64(header).base64(claims).base64(hmac_sha256)
pub fn create_token(email: &str, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    let header = Header {
        alg: ALGORITHM.to_string(),
        typ: "JWT".to_string(),
    };

    let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);

    let mut mac = new_mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Verify a token and return its claims
///
/// # Errors
/// `Unauthorized` if the token is malformed, uses another algorithm,
/// carries a bad signature or has expired
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::unauthorized("Unauthorized"));
    };

    let header: Header = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(AppError::unauthorized("Unauthorized"));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    let mut mac = new_mac(secret)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    let claims: Claims = decode_segment(claims_b64)?;
    if claims.exp <= Utc::now().timestamp() {
        return Err(AppError::unauthorized("Token expired"));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-32-bytes!";

    #[test]
    fn round_trip_keeps_email_and_expiry() {
        let token = create_token("a@example.com", SECRET, Duration::hours(24)).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.email, "a@example.com");
        let expected = (Utc::now() + Duration::hours(24)).timestamp();
        assert!((claims.exp - expected).abs() <= 5);
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_token("a@example.com", SECRET, Duration::hours(1)).unwrap();
        assert!(verify_token(&token, "another-secret-that-is-32-bytes!!").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = create_token("a@example.com", SECRET, Duration::seconds(-10)).unwrap();
        let error = verify_token(&token, SECRET).unwrap_err();
        assert!(matches!(error, AppError::Unauthorized(_)));
    }

    #[test]
    fn rejects_tampered_claims() {
        let token = create_token("a@example.com", SECRET, Duration::hours(1)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = encode_segment(&Claims {
            email: "admin@example.com".to_string(),
            iat: 0,
            exp: i64::MAX,
        })
        .unwrap();
        parts[1] = &forged;

        assert!(verify_token(&parts.join("."), SECRET).is_err());
    }

    #[test]
    fn rejects_unsigned_algorithm() {
        let header = encode_segment(&Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        })
        .unwrap();
        let claims = encode_segment(&Claims {
            email: "a@example.com".to_string(),
            iat: 0,
            exp: i64::MAX,
        })
        .unwrap();

        assert!(verify_token(&format!("{header}.{claims}."), SECRET).is_err());
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.!!.!!"] {
            assert!(verify_token(token, SECRET).is_err(), "{token:?} must be rejected");
        }
    }
}
