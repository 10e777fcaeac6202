use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated news item as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItemOut {
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub summary: String,
    pub published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveArticlePayload {
    pub title: String,
    pub url: String,
    pub source_name: String,
    #[serde(default)]
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedArticleOut {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub summary: String,
    pub published_at: String,
    pub saved_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    pub expires_in: u64,
}
