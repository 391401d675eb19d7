//! Environment configuration.
//!
//! Two settings are required and the server refuses to start without them:
//! the document-store root (`INKPOST_DB_ROOT`) and the token-signing secret
//! (`INKPOST_JWT_SECRET`). An absent or empty secret fails closed rather than
//! signing with a default key.

use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root folder of the document store.
    pub db_root: String,
    /// HS256 secret for session tokens.
    pub jwt_secret: String,
    pub http_port: u16,
    /// Add the `Secure` attribute to session cookies (production deployments).
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self> {
        let Some(db_root) = get("INKPOST_DB_ROOT").filter(|v| !v.trim().is_empty()) else {
            bail!("INKPOST_DB_ROOT must point at the document store root");
        };
        let Some(jwt_secret) = get("INKPOST_JWT_SECRET").filter(|v| !v.trim().is_empty()) else {
            bail!("INKPOST_JWT_SECRET is required; refusing to sign session tokens without it");
        };
        let http_port = get("INKPOST_HTTP_PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(7878);
        let secure_cookies = get("INKPOST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        Ok(Self { db_root, jwt_secret, http_port, secure_cookies })
    }
}
