use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{BLOB_SUFFIX_BYTES, BLOCK_ID_BYTES, SHARE_TOKEN_BYTES};
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Fixed JOSE header for every token this server issues
const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

// =============================================================================
// Bearer Tokens
// =============================================================================

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    /// Expiry as a Unix timestamp (seconds)
    pub exp: i64,
}

/// Sign `data` with HMAC-SHA256 and return the raw MAC bytes
fn sign(data: &[u8], secret: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Unauthorized("Token signing unavailable".to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify an HMAC-SHA256 signature in constant time
fn verify_hmac(data: &[u8], signature: &[u8], secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data);
    mac.verify_slice(signature).is_ok()
}

/// Issue a compact HS256 token for the given user
///
/// Format: `base64url(header).base64url(claims).base64url(hmac)`, all unpadded.
pub fn issue_token(user_id: i64, email: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let claims = Claims {
        user_id,
        email: email.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_hours * 3600,
    };

    let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let signing_input = format!("{}.{}", header, payload);
    let signature = URL_SAFE_NO_PAD.encode(sign(signing_input.as_bytes(), secret)?);

    Ok(format!("{}.{}", signing_input, signature))
}

/// Validate a bearer token and return its claims
///
/// Rejects malformed tokens, foreign algorithms, bad signatures and expired claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let invalid = || AppError::Unauthorized("Invalid token".to_string());

    let mut parts = token.split('.');
    let (header, payload, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) => (h, p, s),
        _ => return Err(invalid()),
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header).map_err(|_| invalid())?;
    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| invalid())?;
    if header_json["alg"] != "HS256" {
        tracing::warn!("Rejected token with unexpected algorithm");
        return Err(invalid());
    }

    let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;
    let signing_input = format!("{}.{}", header, payload);
    if !verify_hmac(signing_input.as_bytes(), &signature, secret) {
        tracing::warn!("Rejected token with invalid signature");
        return Err(invalid());
    }

    let payload = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| invalid())?;

    if claims.exp <= chrono::Utc::now().timestamp() {
        return Err(AppError::Unauthorized("Token expired".to_string()));
    }

    Ok(claims)
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password with Argon2id and a random salt, returning a PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

// =============================================================================
// Random Identifiers
// =============================================================================

/// Generate an unguessable, URL-safe share token
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an opaque block identifier, independent of row ids
pub fn generate_block_id() -> String {
    let mut bytes = [0u8; BLOCK_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("block_{}", hex::encode(bytes))
}

/// Random hex component that keeps stored file names distinct within one second
pub fn generate_blob_suffix() -> String {
    let mut bytes = [0u8; BLOB_SUFFIX_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip() {
        let token = issue_token(7, "a@x.com", SECRET, 24).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = issue_token(7, "a@x.com", SECRET, 24).unwrap();
        assert!(matches!(
            verify_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_token_expired() {
        let token = issue_token(7, "a@x.com", SECRET, -1).unwrap();
        match verify_token(&token, SECRET) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("expected expiry rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_token_tampered_claims() {
        let token = issue_token(7, "a@x.com", SECRET, 24).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let forged = Claims {
            user_id: 8,
            email: "a@x.com".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(verify_token(&forged_token, SECRET).is_err());
    }

    #[test]
    fn test_token_malformed() {
        assert!(verify_token("", SECRET).is_err());
        assert!(verify_token("a.b", SECRET).is_err());
        assert!(verify_token("a.b.c.d", SECRET).is_err());
        assert!(verify_token("!!.??.##", SECRET).is_err());
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(verify_password("pw1", &hash));
        assert!(!verify_password("pw2", &hash));
    }

    #[test]
    fn test_password_hash_is_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(!verify_password("pw", "not-a-phc-string"));
    }

    #[test]
    fn test_share_token_shape() {
        let token = generate_share_token();
        // 32 bytes -> 43 unpadded base64url chars
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(token, generate_share_token());
    }

    #[test]
    fn test_block_id_shape() {
        let id = generate_block_id();
        assert!(id.starts_with("block_"));
        assert_eq!(id.len(), "block_".len() + BLOCK_ID_BYTES * 2);
        assert!(id["block_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_blob_suffix_shape() {
        let suffix = generate_blob_suffix();
        assert_eq!(suffix.len(), BLOB_SUFFIX_BYTES * 2);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(suffix, generate_blob_suffix());
    }
}
