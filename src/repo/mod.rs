pub mod articles;
pub mod maintenance;
pub mod memory;
pub mod migrations;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SavedArticleRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSavedArticle {
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

/// Users and their saved articles.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<UserRow, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError>;

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRow>, StoreError>;

    /// Removes the user and, with it, every article they saved. Returns the number
    /// of articles removed, or `None` when no such user exists.
    async fn delete_user(&self, user_id: i64) -> Result<Option<u64>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the user already saved this URL.
    async fn save_article(
        &self,
        user_id: i64,
        article: NewSavedArticle,
    ) -> Result<SavedArticleRow, StoreError>;

    /// The user's articles, most recently saved first.
    async fn list_articles(&self, user_id: i64) -> Result<Vec<SavedArticleRow>, StoreError>;

    async fn clear_articles(&self) -> Result<u64, StoreError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRow, StoreError> {
        let username = user.username.clone();
        users::insert_user(&self.pool, user)
            .await?
            .ok_or_else(|| StoreError::Duplicate(format!("username {username} is already taken")))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        Ok(users::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRow>, StoreError> {
        Ok(users::find_by_id(&self.pool, user_id).await?)
    }

    async fn delete_user(&self, user_id: i64) -> Result<Option<u64>, StoreError> {
        Ok(users::delete_user(&self.pool, user_id).await?)
    }

    async fn save_article(
        &self,
        user_id: i64,
        article: NewSavedArticle,
    ) -> Result<SavedArticleRow, StoreError> {
        let url = article.url.clone();
        articles::insert_saved_article(&self.pool, user_id, article)
            .await?
            .ok_or_else(|| StoreError::Duplicate(duplicate_article_message(&url)))
    }

    async fn list_articles(&self, user_id: i64) -> Result<Vec<SavedArticleRow>, StoreError> {
        Ok(articles::list_saved_articles(&self.pool, user_id).await?)
    }

    async fn clear_articles(&self) -> Result<u64, StoreError> {
        Ok(maintenance::clear_saved_articles(&self.pool).await?)
    }
}

pub(crate) fn duplicate_article_message(url: &str) -> String {
    format!("article {url} is already saved")
}
