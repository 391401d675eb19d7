//!
//! inkpost document store
//! ----------------------
//! Embedded document store holding the four record collections (accounts,
//! articles, comments, likes) in memory and persisting each collection as a
//! JSON file under a configured root folder: `accounts.json`,
//! `articles.json`, `comments.json`, `likes.json`.
//!
//! Key responsibilities:
//! - Unique-field enforcement for accounts (email, phone number, username).
//! - Compound-unique enforcement for likes: at most one Like per
//!   (article, account), guaranteed by an index mutated in the same critical
//!   section as the insert, so concurrent duplicate likes cannot occur.
//! - Paired writes performed atomically under one lock acquisition: an
//!   article create also pushes the id onto its owner's article list, a
//!   delete pulls it, and a comment create appends to the article's comment
//!   list. No partially-applied state is ever observable.
//!
//! The public API centers around the `Store` type, which is wrapped in a
//! thread-safe `SharedStore` (`Arc<Mutex<Store>>`) for use from handlers.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{Account, Article, Comment, CommunicationAddress, Like, Role};

/// Persistence faults below the application error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("corrupt collection file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Input record for account creation. The password arrives already hashed;
/// the store never sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub firstname: String,
    pub lastname: String,
    pub about: String,
    pub username: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub dob: Option<NaiveDate>,
    pub communication_address: Option<CommunicationAddress>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    /// Owning account, taken from the verified request identity.
    pub user: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub article: Uuid,
    pub user: Uuid,
    pub comment: String,
}

/// Core store handle owning the in-memory collections and their root folder.
pub struct Store {
    root: PathBuf,
    accounts: HashMap<Uuid, Account>,
    articles: HashMap<Uuid, Article>,
    comments: HashMap<Uuid, Comment>,
    likes: HashMap<Uuid, Like>,
    /// (article, account) pairs backing the compound-unique Like constraint.
    like_index: HashSet<(Uuid, Uuid)>,
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        path: path.display().to_string(),
        source,
    })
}

impl Store {
    /// Open a store rooted at the given folder, creating it if absent and
    /// loading any previously persisted collections.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create or access store root: {}", root.display()))?;

        let accounts: Vec<Account> = load_collection(&root.join("accounts.json"))?;
        let articles: Vec<Article> = load_collection(&root.join("articles.json"))?;
        let comments: Vec<Comment> = load_collection(&root.join("comments.json"))?;
        let likes: Vec<Like> = load_collection(&root.join("likes.json"))?;

        let like_index = likes.iter().map(|l| (l.article, l.user)).collect();
        debug!(
            target: "inkpost::store",
            "open: root='{}' accounts={} articles={} comments={} likes={}",
            root.display(), accounts.len(), articles.len(), comments.len(), likes.len()
        );
        Ok(Self {
            root,
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            articles: articles.into_iter().map(|a| (a.id, a)).collect(),
            comments: comments.into_iter().map(|c| (c.id, c)).collect(),
            likes: likes.into_iter().map(|l| (l.id, l)).collect(),
            like_index,
        })
    }

    fn save_collection<T: Serialize + Clone>(
        &self,
        name: &str,
        items: &HashMap<Uuid, T>,
        sort_key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid),
    ) -> Result<(), StoreError> {
        let mut rows: Vec<&T> = items.values().collect();
        rows.sort_by_key(|t| sort_key(t));
        let path = self.root.join(name);
        fs::write(&path, serde_json::to_string_pretty(&rows).map_err(|source| {
            StoreError::Corrupt { path: path.display().to_string(), source }
        })?)?;
        Ok(())
    }

    fn save_accounts(&self) -> AppResult<()> {
        self.save_collection("accounts.json", &self.accounts, |a| (a.created_at, a.id))
            .map_err(|e| AppError::store("store_error", e.to_string()))
    }

    fn save_articles(&self) -> AppResult<()> {
        self.save_collection("articles.json", &self.articles, |a| (a.created_at, a.id))
            .map_err(|e| AppError::store("store_error", e.to_string()))
    }

    fn save_comments(&self) -> AppResult<()> {
        self.save_collection("comments.json", &self.comments, |c| (c.created_at, c.id))
            .map_err(|e| AppError::store("store_error", e.to_string()))
    }

    fn save_likes(&self) -> AppResult<()> {
        self.save_collection("likes.json", &self.likes, |l| (l.created_at, l.id))
            .map_err(|e| AppError::store("store_error", e.to_string()))
    }

    // ---- accounts ----

    /// Create an account, enforcing email shape and unique email, phone
    /// number and username. A non-email-shaped email would be unreachable at
    /// login, which routes identifiers by shape.
    pub fn create_account(&mut self, new: NewAccount) -> AppResult<Account> {
        if let Some(email) = new.email.as_deref() {
            if !crate::identity::looks_like_email(email) {
                return Err(AppError::user("bad_email", "Please provide a valid email address"));
            }
            if self.find_account_by_email(email).is_some() {
                return Err(AppError::conflict("duplicate_email", "Email already exists"));
            }
        }
        if let Some(phone) = new.phone_number.as_deref() {
            if self.find_account_by_phone(phone).is_some() {
                return Err(AppError::conflict("duplicate_phone", "Phone number already exists"));
            }
        }
        if self.accounts.values().any(|a| a.username == new.username) {
            return Err(AppError::conflict("duplicate_username", "Username already exists"));
        }

        let account = Account {
            id: Uuid::new_v4(),
            firstname: new.firstname,
            lastname: new.lastname,
            about: new.about,
            username: new.username,
            email: new.email,
            phone_number: new.phone_number,
            password_hash: new.password_hash,
            role: new.role,
            is_subscribed: false,
            avatar: new.avatar,
            dob: new.dob,
            communication_address: new.communication_address,
            articles: Vec::new(),
            created_at: Utc::now(),
        };
        debug!(target: "inkpost::store", "create_account: id={} username='{}'", account.id, account.username);
        self.accounts.insert(account.id, account.clone());
        self.save_accounts()?;
        Ok(account)
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.accounts.get(&id).cloned()
    }

    pub fn find_account_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .values()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned()
    }

    pub fn find_account_by_phone(&self, phone: &str) -> Option<Account> {
        self.accounts
            .values()
            .find(|a| a.phone_number.as_deref() == Some(phone))
            .cloned()
    }

    pub fn set_subscribed(&mut self, id: Uuid) -> AppResult<Account> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("account_missing", "Account not found"))?;
        account.is_subscribed = true;
        let updated = account.clone();
        self.save_accounts()?;
        Ok(updated)
    }

    /// Administrative bulk delete: removes every account carrying the email.
    pub fn delete_accounts_by_email(&mut self, email: &str) -> AppResult<usize> {
        let doomed: Vec<Uuid> = self
            .accounts
            .values()
            .filter(|a| a.email.as_deref() == Some(email))
            .map(|a| a.id)
            .collect();
        for id in &doomed {
            self.accounts.remove(id);
        }
        if !doomed.is_empty() {
            debug!(target: "inkpost::store", "delete_accounts_by_email: email='{}' removed={}", email, doomed.len());
            self.save_accounts()?;
        }
        Ok(doomed.len())
    }

    // ---- articles ----

    /// Insert an article and push its id onto the owner's article list.
    /// Both writes land in the same critical section and persistence pass.
    pub fn create_article(&mut self, new: NewArticle) -> AppResult<Article> {
        let owner = self
            .accounts
            .get_mut(&new.user)
            .ok_or_else(|| AppError::not_found("account_missing", "Account not found"))?;

        let article = Article {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            content: new.content,
            summary: new.summary,
            image_url: new.image_url,
            tags: new.tags,
            user: new.user,
            comments: Vec::new(),
            created_at: Utc::now(),
        };
        owner.articles.push(article.id);
        self.articles.insert(article.id, article.clone());
        debug!(target: "inkpost::store", "create_article: id={} user={}", article.id, article.user);
        self.save_articles()?;
        self.save_accounts()?;
        Ok(article)
    }

    /// All articles, newest first.
    pub fn articles(&self) -> Vec<Article> {
        let mut all: Vec<Article> = self.articles.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        all
    }

    pub fn article(&self, id: Uuid) -> Option<Article> {
        self.articles.get(&id).cloned()
    }

    /// Remove an article and pull its id from the owner's article list.
    pub fn delete_article(&mut self, id: Uuid) -> AppResult<Article> {
        let article = self
            .articles
            .remove(&id)
            .ok_or_else(|| AppError::not_found("post_missing", "Post not found"))?;
        if let Some(owner) = self.accounts.get_mut(&article.user) {
            owner.articles.retain(|a| *a != id);
        }
        debug!(target: "inkpost::store", "delete_article: id={} user={}", article.id, article.user);
        self.save_articles()?;
        self.save_accounts()?;
        Ok(article)
    }

    // ---- comments ----

    /// Insert a comment and append its id to the article's comment list.
    pub fn create_comment(&mut self, new: NewComment) -> AppResult<Comment> {
        let article = self
            .articles
            .get_mut(&new.article)
            .ok_or_else(|| AppError::not_found("post_missing", "Post not found"))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            article: new.article,
            user: new.user,
            comment: new.comment,
            created_at: Utc::now(),
        };
        article.comments.push(comment.id);
        self.comments.insert(comment.id, comment.clone());
        self.save_comments()?;
        self.save_articles()?;
        Ok(comment)
    }

    pub fn comments_for_article(&self, article: Uuid) -> Vec<Comment> {
        let mut all: Vec<Comment> = self
            .comments
            .values()
            .filter(|c| c.article == article)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    // ---- likes ----

    /// Record a like. Returns `None` when the (article, account) pair already
    /// exists; the compound index makes the operation idempotent.
    pub fn add_like(&mut self, article: Uuid, user: Uuid) -> AppResult<Option<Like>> {
        if !self.like_index.insert((article, user)) {
            return Ok(None);
        }
        let like = Like {
            id: Uuid::new_v4(),
            article,
            user,
            created_at: Utc::now(),
        };
        self.likes.insert(like.id, like.clone());
        self.save_likes()?;
        Ok(Some(like))
    }

    /// Remove the caller's like on an article. Returns whether one existed.
    pub fn remove_like(&mut self, article: Uuid, user: Uuid) -> AppResult<bool> {
        if !self.like_index.remove(&(article, user)) {
            return Ok(false);
        }
        self.likes.retain(|_, l| !(l.article == article && l.user == user));
        self.save_likes()?;
        Ok(true)
    }

    pub fn likes_for_article(&self, article: Uuid) -> Vec<Like> {
        let mut all: Vec<Like> = self
            .likes
            .values()
            .filter(|l| l.article == article)
            .cloned()
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }
}

/// Thread-safe store handle shared across request handlers.
#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::open(root)?))))
    }
}
