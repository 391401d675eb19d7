//! Access Guard: per-request identity recovery and ownership checks.
//!
//! Runs on every protected request before the underlying store operation.
//! Per-request state machine: NoToken -> TokenPresent -> Authenticated ->
//! Authorized, with terminal failures Unauthenticated (401), Forbidden (403)
//! and NotFound (404). Each request is evaluated independently; no lockout,
//! no rate limiting.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::principal::Principal;
use super::token::{TokenKeys, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::model::Role;

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name {
                return Some(v[1..].to_string());
            }
        }
    }
    None
}

/// Extract and verify the session token from the request cookies.
///
/// Missing cookie, bad signature, expired token and a malformed subject all
/// yield 401; verification failure is never surfaced as a server error.
pub fn authenticate_request(headers: &HeaderMap, keys: &TokenKeys) -> AppResult<Principal> {
    let Some(token) = parse_cookie(headers, SESSION_COOKIE) else {
        return Err(AppError::auth("missing_token", "Kindly login!"));
    };
    let claims = keys.verify(&token)?;
    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::auth("bad_subject", "session token carries a malformed account id"))?;
    Ok(Principal { account_id, role: claims.role, contact: claims.contact })
}

/// Resource-scoped ownership check: the acting account must match the
/// resource's recorded owning account.
pub fn require_owner(principal: &Principal, owner: Uuid) -> AppResult<()> {
    if principal.account_id != owner {
        return Err(AppError::forbidden(
            "not_owner",
            "You are not authorized to modify this resource",
        ));
    }
    Ok(())
}

/// Role gate for administrative operations.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> AppResult<()> {
    if !allowed.contains(&principal.role) {
        return Err(AppError::forbidden("role_not_allowed", "User is not allowed"));
    }
    Ok(())
}
