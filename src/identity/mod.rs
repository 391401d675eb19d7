//! Credential issuance and request authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod token;
mod issuer;
mod guard;

pub use principal::Principal;
pub use token::{Claims, TokenKeys, SESSION_COOKIE, TOKEN_TTL_SECS, set_session_cookie};
pub use issuer::{authenticate, hash_password, looks_like_email, verify_password};
pub use guard::{authenticate_request, parse_cookie, require_owner, require_role};
