use crate::{
    auth::{self, SessionManager},
    error::{AppError, AppResult},
    model::{RegisterPayload, RegisterResponse, TokenPayload, TokenResponse},
    repo::{NewUser, Store},
};

const MAX_USERNAME_CHARS: usize = 150;
const MIN_PASSWORD_CHARS: usize = 8;

pub async fn register(store: &dyn Store, payload: RegisterPayload) -> AppResult<RegisterResponse> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::BadRequest(format!(
            "username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if payload.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("enter a valid email address".into()));
    }

    let password_hash = auth::hash_password(&payload.password).await?;
    let row = store
        .create_user(NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = row.id, username = %row.username, "user registered");

    Ok(RegisterResponse {
        id: row.id,
        username: row.username,
        email: row.email,
    })
}

pub async fn login(
    store: &dyn Store,
    sessions: &SessionManager,
    payload: TokenPayload,
) -> AppResult<TokenResponse> {
    let user = store
        .find_user_by_username(payload.username.trim())
        .await?
        .ok_or_else(auth::invalid_credentials_error)?;
    if !auth::verify_password(&payload.password, &user.password_hash).await {
        return Err(auth::invalid_credentials_error());
    }

    let pair = sessions.issue_pair(user.id).await;
    tracing::debug!(user_id = user.id, "issued token pair");

    Ok(TokenResponse {
        access: pair.access,
        refresh: pair.refresh,
        expires_in: sessions.access_ttl_secs(),
    })
}

/// Removes a user and the articles they saved. `Ok(None)` when there is no such user.
pub async fn delete_by_username(store: &dyn Store, username: &str) -> AppResult<Option<u64>> {
    let Some(user) = store.find_user_by_username(username).await? else {
        return Ok(None);
    };
    let removed = store.delete_user(user.id).await?;
    if let Some(articles) = removed {
        tracing::info!(user_id = user.id, articles, "user deleted");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::SessionStatus, repo::memory::MemoryStore};
    use std::time::Duration;

    fn registration(username: &str, password: &str, email: &str) -> RegisterPayload {
        RegisterPayload {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    fn sessions() -> SessionManager {
        SessionManager::new(Duration::from_secs(300), Duration::from_secs(86_400))
    }

    #[tokio::test]
    async fn register_and_login() {
        let store = MemoryStore::new();
        let sessions = sessions();
        let user = register(&store, registration("reader", "long enough", "r@example.com"))
            .await
            .unwrap();
        assert_eq!(user.username, "reader");

        let stored = store.find_user_by_username("reader").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(!stored.password_hash.contains("long enough"));

        let tokens = login(
            &store,
            &sessions,
            TokenPayload {
                username: "reader".to_string(),
                password: "long enough".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(tokens.expires_in, 300);
        assert_eq!(
            sessions.validate_access(&tokens.access).await,
            SessionStatus::Valid(user.id)
        );
    }

    #[tokio::test]
    async fn wrong_password_or_user_is_unauthorized() {
        let store = MemoryStore::new();
        let sessions = sessions();
        register(&store, registration("reader", "long enough", "r@example.com"))
            .await
            .unwrap();

        for (username, password) in [("reader", "not the one"), ("nobody", "long enough")] {
            let err = login(
                &store,
                &sessions,
                TokenPayload {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn registration_is_validated() {
        let store = MemoryStore::new();
        let cases = [
            registration("  ", "long enough", "r@example.com"),
            registration(&"u".repeat(151), "long enough", "r@example.com"),
            registration("reader", "short", "r@example.com"),
            registration("reader", "long enough", "no-at-sign"),
        ];
        for case in cases {
            assert!(matches!(
                register(&store, case).await,
                Err(AppError::BadRequest(_))
            ));
        }

        register(&store, registration("reader", "long enough", "r@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            register(&store, registration("reader", "other pass", "x@example.com")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn delete_by_username_reports_missing_user() {
        let store = MemoryStore::new();
        register(&store, registration("reader", "long enough", "r@example.com"))
            .await
            .unwrap();
        assert_eq!(delete_by_username(&store, "reader").await.unwrap(), Some(0));
        assert_eq!(delete_by_username(&store, "reader").await.unwrap(), None);
    }
}
