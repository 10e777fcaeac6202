use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context};
use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{app::AppState, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i64,
    kind: TokenKind,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid(i64),
    Expired,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Opaque bearer tokens kept in process memory.
#[derive(Clone)]
pub struct SessionManager {
    access_ttl: Duration,
    refresh_ttl: Duration,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionManager {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let access_ttl = if access_ttl.is_zero() {
            Duration::from_secs(300)
        } else {
            access_ttl
        };
        let refresh_ttl = refresh_ttl.max(access_ttl);

        Self {
            access_ttl,
            refresh_ttl,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl.as_secs()
    }

    pub async fn issue_pair(&self, user_id: i64) -> TokenPair {
        self.prune_expired().await;
        let access = self.insert(user_id, TokenKind::Access).await;
        let refresh = self.insert(user_id, TokenKind::Refresh).await;
        TokenPair { access, refresh }
    }

    /// New access token for a live refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Option<String> {
        match self.check(refresh_token, TokenKind::Refresh).await {
            SessionStatus::Valid(user_id) => Some(self.insert(user_id, TokenKind::Access).await),
            SessionStatus::Expired | SessionStatus::Invalid => None,
        }
    }

    pub async fn validate_access(&self, token: &str) -> SessionStatus {
        self.check(token, TokenKind::Access).await
    }

    /// Drops every token issued to `user_id`.
    pub async fn revoke_user(&self, user_id: i64) {
        self.sessions
            .write()
            .await
            .retain(|_, session| session.user_id != user_id);
    }

    async fn insert(&self, user_id: i64, kind: TokenKind) -> String {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id,
            kind,
            expires_at: Instant::now() + ttl,
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }

    async fn check(&self, token: &str, kind: TokenKind) -> SessionStatus {
        let mut guard = self.sessions.write().await;
        let now = Instant::now();
        match guard.get(token).copied() {
            Some(session) if session.kind != kind => SessionStatus::Invalid,
            Some(session) if session.expires_at > now => SessionStatus::Valid(session.user_id),
            Some(_) => {
                guard.remove(token);
                SessionStatus::Expired
            }
            None => SessionStatus::Invalid,
        }
    }

    async fn prune_expired(&self) {
        let now = Instant::now();
        self.sessions
            .write()
            .await
            .retain(|_, session| session.expires_at > now);
    }
}

/// Identity of the caller, inserted by [`require_user`].
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    pub id: i64,
}

pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return unauthorized("authentication credentials were not provided");
    };

    match state.sessions.validate_access(&token).await {
        SessionStatus::Valid(user_id) => {
            // The account may have been deleted out of band while the token lived.
            match state.store.find_user_by_id(user_id).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!(user_id, "token belongs to a deleted user, revoking");
                    state.sessions.revoke_user(user_id).await;
                    return unauthorized("user no longer exists");
                }
                Err(err) => return AppError::from(err).into_response(),
            }
            req.extensions_mut().insert(CurrentUser { id: user_id });
            next.run(req).await
        }
        SessionStatus::Expired => {
            tracing::debug!(path = %req.uri().path(), "access token expired");
            unauthorized("token is expired")
        }
        SessionStatus::Invalid => unauthorized("token is invalid"),
    }
}

fn unauthorized(message: &str) -> Response {
    let mut response = AppError::Unauthorized(message.to_string()).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
    response
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let raw = value.to_str().ok()?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?;
    if token.trim().is_empty() {
        None
    } else {
        Some(token.trim().to_string())
    }
}

/// PHC-format argon2id hash of `password` with a fresh random salt.
///
/// Hashing is CPU-bound, so it runs on the blocking pool.
pub async fn hash_password(password: &str) -> anyhow::Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .context("password hashing task failed")?
}

/// `false` for a wrong password and for anything that is not a valid stored hash.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let password = password.to_owned();
    let stored = stored.to_owned();
    match tokio::task::spawn_blocking(move || verify_blocking(&password, &stored)).await {
        Ok(matches) => matches,
        Err(err) => {
            tracing::error!(error = %err, "password verification task failed");
            false
        }
    }
}

fn hash_blocking(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

fn verify_blocking(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn invalid_credentials_error() -> AppError {
    AppError::Unauthorized("no active account found with the given credentials".to_string())
}
