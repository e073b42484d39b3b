//! JWT token service

use std::sync::LazyLock;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::sync::Cache;

use crate::model::SessionClaims;

/// Cache key: the signing secret and the token it verified
type CacheKey = (String, String);

fn cache_key(token: &str, secret_key: &str) -> CacheKey {
    (secret_key.to_string(), token.to_string())
}

/// JWT token cache to avoid repeated signature checks of the same token.
/// Entries are keyed by secret too, so a rotated secret never reuses claims
/// verified under the old one. Revocation is still enforced by the
/// access-token row lookup.
static TOKEN_CACHE: LazyLock<Cache<CacheKey, SessionClaims>> = LazyLock::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(300))
        .build()
});

/// Decode and validate JWT token with caching
pub fn decode_jwt_token_cached(
    token: &str,
    secret_key: &str,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    let key = cache_key(token, secret_key);
    if let Some(cached) = TOKEN_CACHE.get(&key) {
        let now = chrono::Utc::now().timestamp();
        if cached.exp > now {
            return Ok(cached);
        }
        // Token expired in cache, invalidate it
        TOKEN_CACHE.invalidate(&key);
    }

    let claims = decode_jwt_token(token, secret_key)?;
    TOKEN_CACHE.insert(key, claims.clone());
    Ok(claims)
}

/// Decode and validate JWT token without caching
pub fn decode_jwt_token(
    token: &str,
    secret_key: &str,
) -> jsonwebtoken::errors::Result<SessionClaims> {
    let decoding_key = DecodingKey::from_base64_secret(secret_key)?;
    decode::<SessionClaims>(token, &decoding_key, &Validation::new(Algorithm::HS256))
        .map(|data| data.claims)
}

/// Invalidate a token from the cache
pub fn invalidate_token(token: &str, secret_key: &str) {
    TOKEN_CACHE.invalidate(&cache_key(token, secret_key));
}

/// Encode a JWT for the access-token row `token_id`. Returns the token and its `exp`.
pub fn encode_jwt_token(
    user_id: i64,
    token_id: &str,
    secret_key: &str,
    expire_seconds: i64,
) -> jsonwebtoken::errors::Result<(String, i64)> {
    let exp = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::seconds(expire_seconds))
        .unwrap_or_else(chrono::Utc::now)
        .timestamp();

    let claims = SessionClaims {
        sub: user_id.to_string(),
        jti: token_id.to_string(),
        exp,
    };

    let encoding_key = EncodingKey::from_base64_secret(secret_key)?;
    let token = encode(&Header::new(Algorithm::HS256), &claims, &encoding_key)?;
    Ok((token, exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of "cho-test-secret-key-0123456789abcdef"
    const SECRET: &str = "Y2hvLXRlc3Qtc2VjcmV0LWtleS0wMTIzNDU2Nzg5YWJjZGVm";

    #[test]
    fn test_encode_then_decode_carries_claims() {
        let (token, exp) = encode_jwt_token(42, "token-abc", SECRET, 3600).unwrap();
        let claims = decode_jwt_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.jti, "token-abc");
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let (token, _) = encode_jwt_token(1, "old", SECRET, -3600).unwrap();
        let err = decode_jwt_token(&token, SECRET).unwrap_err();
        assert_eq!(
            crate::model::jwt_error_string(&err),
            "token expired!".to_string()
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (token, _) = encode_jwt_token(1, "t", SECRET, 3600).unwrap();
        // base64 of "another-secret-key-for-testing-only"
        let other = "YW5vdGhlci1zZWNyZXQta2V5LWZvci10ZXN0aW5nLW9ubHk=";
        assert!(decode_jwt_token(&token, other).is_err());
    }

    #[test]
    fn test_cached_decode_and_invalidate() {
        let (token, _) = encode_jwt_token(7, "cached", SECRET, 3600).unwrap();
        let first = decode_jwt_token_cached(&token, SECRET).unwrap();
        let second = decode_jwt_token_cached(&token, SECRET).unwrap();
        assert_eq!(first, second);
        invalidate_token(&token, SECRET);
        assert!(TOKEN_CACHE.get(&cache_key(&token, SECRET)).is_none());
    }

    #[test]
    fn test_cached_claims_need_the_same_secret() {
        let (token, _) = encode_jwt_token(8, "rotated", SECRET, 3600).unwrap();
        assert!(decode_jwt_token_cached(&token, SECRET).is_ok());

        // base64 of "another-secret-key-for-testing-only"
        let other = "YW5vdGhlci1zZWNyZXQta2V5LWZvci10ZXN0aW5nLW9ubHk=";
        assert!(decode_jwt_token_cached(&token, other).is_err());
        assert!(decode_jwt_token_cached(&token, SECRET).is_ok());
    }
}
