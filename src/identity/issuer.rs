//! Credential Issuer: password hashing and login verification.
//!
//! Runs once per login. Looks the account up by email or phone number
//! (disambiguated by shape), verifies the password against the stored argon2
//! hash and hands the account back for token issuance. Stateless: no session
//! table, no audit log.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use once_cell::sync::Lazy;
use password_hash::{PasswordHash, SaltString};
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::model::Account;
use crate::store::Store;
use crate::tprintln;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

// Verified against when the identifier is unknown, so a lookup miss costs the
// same as a password mismatch.
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("inkpost-dummy-password").unwrap_or_default());

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

/// Login identifiers are either emails or phone numbers; shape decides which
/// account field is consulted.
pub fn looks_like_email(identifier: &str) -> bool {
    EMAIL_RE.is_match(identifier)
}

/// Validate login credentials against the stored hash.
///
/// Unknown identifiers and wrong passwords fail with the same code and cost,
/// so responses do not reveal whether an identifier is registered.
pub fn authenticate(store: &Store, identifier: &str, password: &str) -> AppResult<Account> {
    let account = if looks_like_email(identifier) {
        store.find_account_by_email(identifier)
    } else {
        store.find_account_by_phone(identifier)
    };

    let Some(account) = account else {
        let _ = verify_password(&DUMMY_HASH, password);
        return Err(invalid_credentials());
    };
    if !verify_password(&account.password_hash, password) {
        return Err(invalid_credentials());
    }
    tprintln!("auth.login ok account={} contact={}", account.id, account.contact());
    Ok(account)
}

fn invalid_credentials() -> AppError {
    AppError::auth("invalid_credentials", "identifier or password is incorrect")
}
