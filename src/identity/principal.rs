use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Role;

/// Verified caller identity recovered from a session token.
/// Passed explicitly into handlers; there is no ambient "current user".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub account_id: Uuid,
    pub role: Role,
    /// Contact identifier (email or phone) the token was issued for.
    pub contact: String,
}
