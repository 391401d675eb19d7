//! Signed session tokens.
//!
//! Tokens are stateless HS256-signed claims carrying the account id, role and
//! contact identifier, valid for one hour from issuance. A token is valid only
//! if its signature verifies against the server secret and the current time is
//! before its expiry (with a bounded clock-skew leeway).

use axum::http::HeaderValue;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::Role;

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "inkpost_session";

/// Token lifetime from issuance, in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Tolerated clock skew when validating expiry, in seconds.
const CLOCK_SKEW_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id as a uuid string.
    pub sub: String,
    pub role: Role,
    /// Contact identifier (email or phone) used at login.
    pub contact: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    enc: EncodingKey,
    dec: DecodingKey,
}

impl TokenKeys {
    /// Fails closed on an empty secret rather than signing with a default key.
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.trim().is_empty() {
            return Err(AppError::auth("missing_secret", "token signing secret is not configured"));
        }
        Ok(Self {
            enc: EncodingKey::from_secret(secret.as_bytes()),
            dec: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, account_id: Uuid, role: Role, contact: &str) -> AppResult<String> {
        self.issue_with_ttl(account_id, role, contact, TOKEN_TTL_SECS)
    }

    /// Issue with an explicit lifetime. Exposed for expiry tests.
    pub fn issue_with_ttl(&self, account_id: Uuid, role: Role, contact: &str, ttl_secs: i64) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            role,
            contact: contact.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.enc)
            .map_err(|e| AppError::store("token_sign_failed", e.to_string()))
    }

    /// Verify signature and expiry. Any failure is surfaced as a single 401
    /// error; callers never learn whether the signature or the expiry failed.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY_SECS;
        decode::<Claims>(token, &self.dec, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::auth("invalid_token", "session token is invalid or expired"))
    }
}

/// HttpOnly, SameSite=Strict, root-path session cookie. `Secure` is added for
/// production deployments.
pub fn set_session_cookie(token: &str, secure: bool) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Max-Age={}; Path=/",
        SESSION_COOKIE, token, TOKEN_TTL_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap()
}
