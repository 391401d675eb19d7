//!
//! inkpost HTTP server
//! -------------------
//! Axum-based JSON API for the social-blogging service.
//!
//! Responsibilities:
//! - Signup and login endpoints backed by the credential issuer, with the
//!   signed session token delivered as an HTTP-only cookie.
//! - Article, comment and like endpoints gated by the access guard; mutating
//!   operations verify the token, resource-scoped ones additionally check
//!   ownership (or role) before touching the store.
//! - Error mapping at the handler boundary: every failure becomes one of the
//!   `AppError` variants and a JSON body.
//!
//! Route paths mirror the published interface of the service, including its
//! historical `artical` spelling, which clients already depend on.

use std::net::SocketAddr;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{
    authenticate, authenticate_request, hash_password, looks_like_email, require_owner,
    require_role, set_session_cookie, TokenKeys,
};
use crate::model::{
    CommunicationAddress, Role, ABOUT_MAX, ABOUT_MIN, DESCRIPTION_MAX, DESCRIPTION_MIN,
};
use crate::store::{NewAccount, NewArticle, NewComment, SharedStore};

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub keys: TokenKeys,
    pub secure_cookies: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "inkpost ok" }))
        .route("/api/user/createuser", post(create_user))
        .route("/api/user/login", post(login))
        .route("/api/user/getuser_by_id/{id}", get(get_user_by_id))
        .route("/api/user/subscribeuser", patch(subscribe_user))
        .route("/api/user/delete", delete(delete_users))
        .route("/api/artical/create", post(create_article))
        .route("/api/artical/get_post", get(get_posts))
        .route("/api/artical/delete", delete(delete_article))
        .route("/api/comment", post(create_comment).get(get_comments))
        .route("/api/like", post(like_post).get(get_likes).delete(unlike_post))
        .with_state(state)
}

/// Start the inkpost HTTP server with the given configuration.
pub async fn run(cfg: Config) -> anyhow::Result<()> {
    let store = SharedStore::new(&cfg.db_root)?;
    let keys = TokenKeys::new(&cfg.jwt_secret)?;
    let state = AppState { store, keys, secure_cookies: cfg.secure_cookies };
    let app = router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ---- payloads ----

#[derive(Debug, Deserialize)]
struct SignupPayload {
    #[serde(default)]
    firstname: String,
    #[serde(default)]
    lastname: String,
    #[serde(default)]
    about: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "phoneNumber")]
    phone_number: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    dob: Option<NaiveDate>,
    #[serde(default)]
    communication_address: Option<CommunicationAddress>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "phoneNumber")]
    phone_number: Option<String>,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct ArticlePayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    #[serde(default, rename = "postId")]
    post_id: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct DeleteUsersPayload {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
struct PostIdQuery {
    #[serde(default, rename = "postId")]
    post_id: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

fn parse_post_id(raw: Option<&str>) -> AppResult<Uuid> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| AppError::user("bad_post_id", "Invalid or missing postId"))
}

// ---- user handlers ----

async fn create_user(
    State(state): State<AppState>,
    Json(p): Json<SignupPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let email = non_empty(p.email);
    let phone_number = non_empty(p.phone_number);

    let mut missing: Vec<&str> = Vec::new();
    for (name, value) in [
        ("firstname", &p.firstname),
        ("lastname", &p.lastname),
        ("about", &p.about),
        ("password", &p.password),
        ("username", &p.username),
    ] {
        if value.trim().is_empty() {
            missing.push(name);
        }
    }
    if email.is_none() && phone_number.is_none() {
        missing.push("email or phoneNumber");
    }
    if !missing.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Validation Error", "missingFields": missing })),
        ));
    }

    if let Some(email) = email.as_deref() {
        if !looks_like_email(email) {
            return Err(AppError::user("bad_email", "Please provide a valid email address"));
        }
    }
    let about_len = p.about.chars().count();
    if !(ABOUT_MIN..=ABOUT_MAX).contains(&about_len) {
        return Err(AppError::user(
            "bad_about_length",
            "About must be between 10 and 200 characters",
        ));
    }

    let password_hash = hash_password(&p.password)?;
    let account = state.store.0.lock().create_account(NewAccount {
        firstname: p.firstname,
        lastname: p.lastname,
        about: p.about,
        username: p.username,
        email,
        phone_number,
        password_hash,
        role: p.role.unwrap_or_default(),
        avatar: p.avatar,
        dob: p.dob,
        communication_address: p.communication_address,
    })?;
    info!(target: "inkpost::auth", "signup: account={} username='{}'", account.id, account.username);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully", "response": account.public_json() })),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(p): Json<LoginPayload>,
) -> Result<(StatusCode, HeaderMap, Json<Value>), AppError> {
    let identifier = non_empty(p.email)
        .or_else(|| non_empty(p.phone_number))
        .unwrap_or_default();
    let account = authenticate(&state.store.0.lock(), &identifier, &p.password)?;
    let token = state.keys.issue(account.id, account.role, &account.contact())?;

    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", set_session_cookie(&token, state.secure_cookies));
    info!(target: "inkpost::auth", "login: account={}", account.id);
    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "message": "You have successfully logged in" })),
    ))
}

async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::user("bad_id", "Invalid user id"))?;
    let account = state
        .store
        .0
        .lock()
        .account(id)
        .ok_or_else(|| AppError::not_found("account_missing", "Account not found"))?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User fetched successfully", "response": account.public_json() })),
    ))
}

async fn subscribe_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let principal = authenticate_request(&headers, &state.keys)?;
    state.store.0.lock().set_subscribed(principal.account_id)?;
    Ok((StatusCode::OK, Json(json!({ "message": "User is Subscribed" }))))
}

async fn delete_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(p): Json<DeleteUsersPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let principal = authenticate_request(&headers, &state.keys)?;
    require_role(&principal, &[Role::Admin])?;
    if p.email.trim().is_empty() {
        return Err(AppError::user("missing_email", "email is required"));
    }
    let deleted = state.store.0.lock().delete_accounts_by_email(&p.email)?;
    info!(target: "inkpost::admin", "bulk delete: email='{}' deleted={} by={}", p.email, deleted, principal.account_id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Users deleted successfully", "deleted": deleted })),
    ))
}

// ---- article handlers ----

async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(p): Json<ArticlePayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if p.title.trim().is_empty() || p.description.trim().is_empty() {
        return Err(AppError::user(
            "missing_title_or_description",
            "Title and description are required.",
        ));
    }
    let description_len = p.description.chars().count();
    if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&description_len) {
        return Err(AppError::user(
            "bad_description_length",
            "Article description must be between 10 and 200 characters",
        ));
    }

    let principal = authenticate_request(&headers, &state.keys)?;
    let article = state.store.0.lock().create_article(NewArticle {
        title: p.title,
        description: p.description,
        content: p.content,
        summary: p.summary,
        image_url: p.image_url,
        tags: p.tags,
        user: principal.account_id,
    })?;
    info!(target: "inkpost::articles", "create: article={} user={}", article.id, article.user);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Article created successfully!", "article": article })),
    ))
}

async fn get_posts(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), AppError> {
    let articles = state.store.0.lock().articles();
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Posts are Successfully fetched!", "response": articles })),
    ))
}

async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PostIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post_id = parse_post_id(q.post_id.as_deref())?;
    let principal = authenticate_request(&headers, &state.keys)?;

    let mut store = state.store.0.lock();
    let owner = store
        .article(post_id)
        .map(|a| a.user)
        .ok_or_else(|| AppError::not_found("post_missing", "Post not found"))?;
    require_owner(&principal, owner)?;
    store.delete_article(post_id)?;
    info!(target: "inkpost::articles", "delete: article={} user={}", post_id, principal.account_id);
    Ok((StatusCode::OK, Json(json!({ "message": "Post deleted successfully" }))))
}

// ---- comment handlers ----

async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(p): Json<CommentPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mut missing: Vec<&str> = Vec::new();
    if p.post_id.trim().is_empty() {
        missing.push("postId");
    }
    if p.comment.trim().is_empty() {
        missing.push("comment");
    }
    if !missing.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Validation Error", "missingFields": missing })),
        ));
    }

    let principal = authenticate_request(&headers, &state.keys)?;
    let post_id = parse_post_id(Some(p.post_id.as_str()))?;
    let comment = state.store.0.lock().create_comment(NewComment {
        article: post_id,
        user: principal.account_id,
        comment: p.comment,
    })?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Comment is created Successfully!", "response": comment })),
    ))
}

async fn get_comments(
    State(state): State<AppState>,
    Query(q): Query<PostIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post_id = parse_post_id(q.post_id.as_deref())?;
    let comments = state.store.0.lock().comments_for_article(post_id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Comments fetched successfully", "response": comments })),
    ))
}

// ---- like handlers ----

async fn get_likes(
    State(state): State<AppState>,
    Query(q): Query<PostIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post_id = parse_post_id(q.post_id.as_deref())?;
    let likes = state.store.0.lock().likes_for_article(post_id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Likes fetched successfully", "response": likes })),
    ))
}

async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PostIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post_id = parse_post_id(q.post_id.as_deref())?;
    let principal = authenticate_request(&headers, &state.keys)?;

    let mut store = state.store.0.lock();
    let inserted = store.add_like(post_id, principal.account_id)?;
    let likes = store.likes_for_article(post_id);
    match inserted {
        Some(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Post liked", "response": likes })),
        )),
        None => Ok((
            StatusCode::OK,
            Json(json!({ "message": "Already liked", "response": likes })),
        )),
    }
}

async fn unlike_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PostIdQuery>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let post_id = parse_post_id(q.post_id.as_deref())?;
    let principal = authenticate_request(&headers, &state.keys)?;

    let mut store = state.store.0.lock();
    store.remove_like(post_id, principal.account_id)?;
    let likes = store.likes_for_article(post_id);
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Post unliked", "response": likes })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SESSION_COOKIE;

    fn test_state() -> (AppState, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SharedStore::new(tmp.path()).unwrap();
        let keys = TokenKeys::new("server-test-secret").unwrap();
        (AppState { store, keys, secure_cookies: false }, tmp)
    }

    fn signup_payload(username: &str, email: &str) -> SignupPayload {
        serde_json::from_value(json!({
            "firstname": "A",
            "lastname": "B",
            "about": "aaaaaaaaaa",
            "password": "pw",
            "username": username,
            "email": email,
        }))
        .unwrap()
    }

    async fn signup(state: &AppState, username: &str, email: &str) -> Uuid {
        let (status, Json(body)) =
            create_user(State(state.clone()), Json(signup_payload(username, email)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let id = body["response"]["id"].as_str().unwrap();
        Uuid::parse_str(id).unwrap()
    }

    fn cookie_for(state: &AppState, account_id: Uuid) -> HeaderMap {
        let account = state.store.0.lock().account(account_id).unwrap();
        let token = state.keys.issue(account.id, account.role, &account.contact()).unwrap();
        let mut h = HeaderMap::new();
        h.insert("cookie", format!("{}={}", SESSION_COOKIE, token).parse().unwrap());
        h
    }

    fn post_query(id: &str) -> Query<PostIdQuery> {
        Query(PostIdQuery { post_id: Some(id.to_string()) })
    }

    fn article_payload() -> ArticlePayload {
        serde_json::from_value(json!({ "title": "T", "description": "desc1234567" })).unwrap()
    }

    #[tokio::test]
    async fn signup_validation_names_missing_fields() {
        let (state, _tmp) = test_state();
        let empty: SignupPayload = serde_json::from_value(json!({})).unwrap();
        let (status, Json(body)) = create_user(State(state), Json(empty)).await.unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<&str> = body["missingFields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(fields.contains(&"firstname"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"email or phoneNumber"));
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_at_signup() {
        let (state, _tmp) = test_state();
        let err = create_user(State(state.clone()), Json(signup_payload("ab", "notanemail")))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.code_str(), "bad_email");

        // No account was minted, so login with that identifier fails like any
        // unknown one.
        assert!(state.store.0.lock().find_account_by_email("notanemail").is_none());
        let payload: LoginPayload =
            serde_json::from_value(json!({ "email": "notanemail", "password": "pw" })).unwrap();
        let err = login(State(state), Json(payload)).await.unwrap_err();
        assert_eq!(err.http_status(), 401);
    }

    #[tokio::test]
    async fn about_length_is_bounded_at_signup() {
        let (state, _tmp) = test_state();
        let long = "a".repeat(201);
        for about in ["short", long.as_str()] {
            let payload: SignupPayload = serde_json::from_value(json!({
                "firstname": "A",
                "lastname": "B",
                "about": about,
                "password": "pw",
                "username": "ab",
                "email": "a@b.com",
            }))
            .unwrap();
            let err = create_user(State(state.clone()), Json(payload)).await.unwrap_err();
            assert_eq!(err.http_status(), 400);
            assert_eq!(err.code_str(), "bad_about_length");
        }
    }

    #[tokio::test]
    async fn duplicate_signup_is_a_conflict() {
        let (state, _tmp) = test_state();
        signup(&state, "ab", "a@b.com").await;
        let err = create_user(State(state), Json(signup_payload("other", "a@b.com")))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn login_sets_session_cookie() {
        let (state, _tmp) = test_state();
        signup(&state, "ab", "a@b.com").await;

        let payload: LoginPayload =
            serde_json::from_value(json!({ "email": "a@b.com", "password": "pw" })).unwrap();
        let (status, headers, _) = login(State(state.clone()), Json(payload)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let cookie = headers.get("Set-Cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("inkpost_session="));
        assert!(cookie.contains("HttpOnly"));

        // The issued token verifies and points at the account.
        let token = cookie.split(';').next().unwrap().split('=').nth(1).unwrap();
        let claims = state.keys.verify(token).unwrap();
        assert_eq!(claims.contact, "a@b.com");
    }

    #[tokio::test]
    async fn bad_password_and_unknown_email_both_401() {
        let (state, _tmp) = test_state();
        signup(&state, "ab", "a@b.com").await;

        for body in [
            json!({ "email": "a@b.com", "password": "nope" }),
            json!({ "email": "who@b.com", "password": "nope" }),
        ] {
            let payload: LoginPayload = serde_json::from_value(body).unwrap();
            let err = login(State(state.clone()), Json(payload)).await.unwrap_err();
            assert_eq!(err.http_status(), 401);
        }
    }

    #[tokio::test]
    async fn article_lifecycle_with_ownership() {
        let (state, _tmp) = test_state();
        let owner = signup(&state, "owner", "owner@b.com").await;
        let intruder = signup(&state, "intruder", "intruder@b.com").await;

        // Create with the owner's cookie.
        let (status, Json(body)) = create_article(
            State(state.clone()),
            cookie_for(&state, owner),
            Json(article_payload()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["article"]["user"].as_str().unwrap(), owner.to_string());
        let article_id = body["article"]["id"].as_str().unwrap().to_string();

        // A different account may not delete it.
        let err = delete_article(
            State(state.clone()),
            cookie_for(&state, intruder),
            post_query(&article_id),
        )
        .await
        .unwrap_err();
        assert_eq!(err.http_status(), 403);
        assert!(state.store.0.lock().article(Uuid::parse_str(&article_id).unwrap()).is_some());

        // The owner may.
        let (status, _) = delete_article(
            State(state.clone()),
            cookie_for(&state, owner),
            post_query(&article_id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(state.store.0.lock().account(owner).unwrap().articles.is_empty());

        // Deleting again reports the article as absent.
        let err = delete_article(
            State(state.clone()),
            cookie_for(&state, owner),
            post_query(&article_id),
        )
        .await
        .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn create_article_requires_token_and_valid_description() {
        let (state, _tmp) = test_state();

        let err = create_article(State(state.clone()), HeaderMap::new(), Json(article_payload()))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 401);

        let owner = signup(&state, "owner", "owner@b.com").await;
        let short: ArticlePayload =
            serde_json::from_value(json!({ "title": "T", "description": "short" })).unwrap();
        let err = create_article(State(state.clone()), cookie_for(&state, owner), Json(short))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn like_is_idempotent_per_account() {
        let (state, _tmp) = test_state();
        let owner = signup(&state, "owner", "owner@b.com").await;
        let (_, Json(body)) = create_article(
            State(state.clone()),
            cookie_for(&state, owner),
            Json(article_payload()),
        )
        .await
        .unwrap();
        let article_id = body["article"]["id"].as_str().unwrap().to_string();

        let (status, _) = like_post(
            State(state.clone()),
            cookie_for(&state, owner),
            post_query(&article_id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let (status, Json(body)) = like_post(
            State(state.clone()),
            cookie_for(&state, owner),
            post_query(&article_id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"].as_array().unwrap().len(), 1);

        let (status, Json(body)) = unlike_post(
            State(state.clone()),
            cookie_for(&state, owner),
            post_query(&article_id),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_append_to_articles() {
        let (state, _tmp) = test_state();
        let owner = signup(&state, "owner", "owner@b.com").await;

        // Missing article -> 404.
        let payload: CommentPayload = serde_json::from_value(
            json!({ "postId": Uuid::new_v4().to_string(), "comment": "hi" }),
        )
        .unwrap();
        let err = create_comment(State(state.clone()), cookie_for(&state, owner), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);

        let (_, Json(body)) = create_article(
            State(state.clone()),
            cookie_for(&state, owner),
            Json(article_payload()),
        )
        .await
        .unwrap();
        let article_id = body["article"]["id"].as_str().unwrap().to_string();

        let payload: CommentPayload =
            serde_json::from_value(json!({ "postId": article_id, "comment": "hi" })).unwrap();
        let (status, _) =
            create_comment(State(state.clone()), cookie_for(&state, owner), Json(payload))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let (_, Json(body)) = get_comments(State(state.clone()), post_query(&article_id))
            .await
            .unwrap();
        assert_eq!(body["response"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscribe_requires_token_and_flips_flag() {
        let (state, _tmp) = test_state();
        let err = subscribe_user(State(state.clone()), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.http_status(), 401);

        let owner = signup(&state, "owner", "owner@b.com").await;
        let (status, _) = subscribe_user(State(state.clone()), cookie_for(&state, owner))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(state.store.0.lock().account(owner).unwrap().is_subscribed);
    }

    #[tokio::test]
    async fn bulk_delete_is_admin_only() {
        let (state, _tmp) = test_state();
        let plain = signup(&state, "plain", "plain@b.com").await;

        let admin_payload: SignupPayload = serde_json::from_value(json!({
            "firstname": "Root",
            "lastname": "Admin",
            "about": "administrator",
            "password": "pw",
            "username": "root",
            "email": "root@b.com",
            "role": "ADMIN",
        }))
        .unwrap();
        let (_, Json(body)) = create_user(State(state.clone()), Json(admin_payload)).await.unwrap();
        let admin = Uuid::parse_str(body["response"]["id"].as_str().unwrap()).unwrap();

        let payload: DeleteUsersPayload =
            serde_json::from_value(json!({ "email": "plain@b.com" })).unwrap();
        let err = delete_users(State(state.clone()), cookie_for(&state, plain), Json(payload))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 403);

        let payload: DeleteUsersPayload =
            serde_json::from_value(json!({ "email": "plain@b.com" })).unwrap();
        let (status, Json(body)) =
            delete_users(State(state.clone()), cookie_for(&state, admin), Json(payload))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"].as_u64().unwrap(), 1);
        assert!(state.store.0.lock().account(plain).is_none());
    }

    #[tokio::test]
    async fn get_user_by_id_strips_password_hash() {
        let (state, _tmp) = test_state();
        let owner = signup(&state, "owner", "owner@b.com").await;

        let (status, Json(body)) =
            get_user_by_id(State(state.clone()), Path(owner.to_string())).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].get("password_hash").is_none());

        let err = get_user_by_id(State(state.clone()), Path("junk".into())).await.unwrap_err();
        assert_eq!(err.http_status(), 400);
        let err = get_user_by_id(State(state), Path(Uuid::new_v4().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn posts_listing_is_newest_first() {
        let (state, _tmp) = test_state();
        let owner = signup(&state, "owner", "owner@b.com").await;
        for title in ["first", "second"] {
            let p: ArticlePayload = serde_json::from_value(
                json!({ "title": title, "description": "desc1234567" }),
            )
            .unwrap();
            create_article(State(state.clone()), cookie_for(&state, owner), Json(p))
                .await
                .unwrap();
        }
        let (_, Json(body)) = get_posts(State(state)).await.unwrap();
        let titles: Vec<&str> = body["response"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0], "second");
    }
}
