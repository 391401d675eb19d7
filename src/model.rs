//! Record types held by the document store.
//!
//! Ownership relationships: Article -> Account (required), Comment -> Article
//! and Comment -> Account, Like -> Article and Like -> Account with a
//! compound-unique (article, account) constraint enforced by the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounds on the article description, inherited from the published interface.
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 200;

/// Bounds on the account `about` summary, same range as descriptions.
pub const ABOUT_MIN: usize = 10;
pub const ABOUT_MAX: usize = 200;

/// Wire spellings (including `CONTENT_WRITTER`) are the published interface;
/// clients already store and send them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
    #[serde(rename = "QA-TESTER")]
    QaTester,
    #[serde(rename = "CONTENT_WRITTER")]
    ContentWriter,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommunicationAddress {
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone_number_country_code: String,
    #[serde(default)]
    pub state: String,
}

/// A registered user identity with credentials and profile data.
///
/// At least one of `email` / `phone_number` is present; each is unique across
/// the store when present, as is `username`. Accounts are never hard-deleted
/// except via the administrative bulk-delete-by-email operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub about: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_subscribed: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub communication_address: Option<CommunicationAddress>,
    /// Ids of articles authored by this account.
    #[serde(default)]
    pub articles: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// The contact identifier embedded in session tokens: email when present,
    /// otherwise the phone number (one of the two always exists).
    pub fn contact(&self) -> String {
        self.email
            .clone()
            .or_else(|| self.phone_number.clone())
            .unwrap_or_default()
    }

    /// JSON projection safe to return to clients: the password hash is stripped.
    pub fn public_json(&self) -> serde_json::Value {
        let mut v = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = v.as_object_mut() {
            obj.remove("password_hash");
        }
        v
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    /// Required, 10..=200 characters.
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Free-form tag strings, unbounded.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owning account. Only the owner may delete the article.
    pub user: Uuid,
    #[serde(default)]
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub article: Uuid,
    pub user: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub article: Uuid,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}
