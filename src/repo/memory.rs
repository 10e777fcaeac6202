use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    duplicate_article_message, NewSavedArticle, NewUser, SavedArticleRow, Store, StoreError,
    UserRow,
};

#[derive(Default)]
struct MemoryState {
    users: Vec<UserRow>,
    articles: Vec<SavedArticleRow>,
    next_user_id: i64,
    next_article_id: i64,
}

/// Process-local store for development and tests. Data is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<UserRow, StoreError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!(
                "username {} is already taken",
                user.username
            )));
        }

        state.next_user_id += 1;
        let row = UserRow {
            id: state.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<UserRow>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn delete_user(&self, user_id: i64) -> Result<Option<u64>, StoreError> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() == before {
            return Ok(None);
        }

        let owned = state.articles.len();
        state.articles.retain(|a| a.user_id != user_id);
        Ok(Some((owned - state.articles.len()) as u64))
    }

    async fn save_article(
        &self,
        user_id: i64,
        article: NewSavedArticle,
    ) -> Result<SavedArticleRow, StoreError> {
        let mut state = self.state.write().await;
        if state
            .articles
            .iter()
            .any(|a| a.user_id == user_id && a.url == article.url)
        {
            return Err(StoreError::Duplicate(duplicate_article_message(&article.url)));
        }

        state.next_article_id += 1;
        let row = SavedArticleRow {
            id: state.next_article_id,
            user_id,
            title: article.title,
            url: article.url,
            source_name: article.source_name,
            summary: article.summary,
            published_at: article.published_at,
            saved_at: Utc::now(),
        };
        state.articles.push(row.clone());
        Ok(row)
    }

    async fn list_articles(&self, user_id: i64) -> Result<Vec<SavedArticleRow>, StoreError> {
        let state = self.state.read().await;
        let mut rows: Vec<_> = state
            .articles
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn clear_articles(&self) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let deleted = state.articles.len() as u64;
        state.articles.clear();
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
        }
    }

    fn article(url: &str) -> NewSavedArticle {
        NewSavedArticle {
            title: format!("Title for {url}"),
            url: url.to_string(),
            source_name: "Test Source".to_string(),
            summary: "A summary.".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 7, 14, 13, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user(user("ana")).await.unwrap();
        let err = store.create_user(user("ana")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.find_user_by_username("ana").await.unwrap().is_some());
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_url_saved_once_per_user() {
        let store = MemoryStore::new();
        let ana = store.create_user(user("ana")).await.unwrap();
        let bob = store.create_user(user("bob")).await.unwrap();

        store.save_article(ana.id, article("http://a.test/1")).await.unwrap();
        let err = store
            .save_article(ana.id, article("http://a.test/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.list_articles(ana.id).await.unwrap().len(), 1);

        // another user may save the same URL
        store.save_article(bob.id, article("http://a.test/1")).await.unwrap();
        assert_eq!(store.list_articles(bob.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_is_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let ana = store.create_user(user("ana")).await.unwrap();
        let bob = store.create_user(user("bob")).await.unwrap();

        store.save_article(ana.id, article("http://a.test/1")).await.unwrap();
        store.save_article(bob.id, article("http://b.test/1")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/2")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/3")).await.unwrap();

        let urls: Vec<_> = store
            .list_articles(ana.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.url)
            .collect();
        assert_eq!(urls, ["http://a.test/3", "http://a.test/2", "http://a.test/1"]);
    }

    #[tokio::test]
    async fn deleting_user_cascades() {
        let store = MemoryStore::new();
        let ana = store.create_user(user("ana")).await.unwrap();
        let bob = store.create_user(user("bob")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/1")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/2")).await.unwrap();
        store.save_article(bob.id, article("http://b.test/1")).await.unwrap();

        assert_eq!(store.delete_user(ana.id).await.unwrap(), Some(2));
        assert!(store.find_user_by_id(ana.id).await.unwrap().is_none());
        assert!(store.find_user_by_id(bob.id).await.unwrap().is_some());
        assert!(store.list_articles(ana.id).await.unwrap().is_empty());
        assert_eq!(store.list_articles(bob.id).await.unwrap().len(), 1);
        assert_eq!(store.delete_user(ana.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_removes_every_article() {
        let store = MemoryStore::new();
        let ana = store.create_user(user("ana")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/1")).await.unwrap();
        store.save_article(ana.id, article("http://a.test/2")).await.unwrap();

        assert_eq!(store.clear_articles().await.unwrap(), 2);
        assert!(store.list_articles(ana.id).await.unwrap().is_empty());
        assert!(store.find_user_by_username("ana").await.unwrap().is_some());
    }
}
